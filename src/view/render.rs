use wgpu::*;

use crate::controller::frame_loop::{CameraUniform, FrameOutput, LightingUniform};
use crate::model::world::SceneMeshes;
use crate::utils::{Mesh, MeshBuffer, Vertex};
use crate::view::texture::{self, TextureResources};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

const VERTEX_ATTRIBUTES: [VertexAttribute; 5] = [
    VertexAttribute { offset: 0, shader_location: 0, format: VertexFormat::Float32x3 },
    VertexAttribute { offset: 12, shader_location: 1, format: VertexFormat::Float32x3 },
    VertexAttribute { offset: 24, shader_location: 2, format: VertexFormat::Float32x4 },
    VertexAttribute { offset: 40, shader_location: 3, format: VertexFormat::Float32x2 },
    VertexAttribute { offset: 48, shader_location: 4, format: VertexFormat::Float32 },
];

// Shared graphics setup used by native and web
pub struct CameraResources {
    pub camera_buffer: wgpu::Buffer,
    pub lighting_buffer: wgpu::Buffer,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub camera_bind_group: wgpu::BindGroup,
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

pub fn create_camera_resources(device: &wgpu::Device) -> CameraResources {
    let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("camera_buffer"),
        size: std::mem::size_of::<CameraUniform>() as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let lighting_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("lighting_buffer"),
        size: std::mem::size_of::<LightingUniform>() as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let uniform_entry = |binding, visibility| wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("camera_bind_group_layout"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::VERTEX),
            uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
        ],
    });

    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("camera_bind_group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: lighting_buffer.as_entire_binding() },
        ],
    });

    CameraResources { camera_buffer, lighting_buffer, bind_group_layout, camera_bind_group }
}

/// Which geometry a scene pipeline draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendPass {
    /// Blocks, characters and the celestial box; writes depth
    Opaque,
    /// Windows, drawn last; tests depth without writing it
    Translucent,
}

impl BlendPass {
    pub fn writes_depth(self) -> bool {
        self == BlendPass::Opaque
    }

    fn label(self) -> &'static str {
        match self {
            BlendPass::Opaque => "scene_pipeline",
            BlendPass::Translucent => "translucent_pipeline",
        }
    }
}

pub fn create_scene_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    camera_layout: &wgpu::BindGroupLayout,
    texture_layout: &wgpu::BindGroupLayout,
    pass: BlendPass,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("scene_pipeline_layout"),
        bind_group_layouts: &[camera_layout, texture_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(pass.label()),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &VERTEX_ATTRIBUTES,
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: pass.writes_depth(),
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

pub fn surface_config(format: TextureFormat, alpha_mode: CompositeAlphaMode, width: u32, height: u32) -> SurfaceConfiguration {
    SurfaceConfiguration {
        usage: TextureUsages::RENDER_ATTACHMENT,
        format,
        width: width.max(1),
        height: height.max(1),
        present_mode: PresentMode::Fifo,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    }
}

///////////////////////////////////////////////////////////////////////////////

/// GPU state for the scene pass and the egui overlay
pub struct RenderState {
    pub format: TextureFormat,
    pub alpha_mode: CompositeAlphaMode,
    pub width: u32,
    pub height: u32,

    pub pipeline: RenderPipeline,
    pub translucent_pipeline: RenderPipeline,
    pub camera: CameraResources,
    pub grass: TextureResources,
    depth_view: TextureView,

    /// Terrain and house, uploaded once
    pub static_mesh: MeshBuffer,
    /// Window faces, uploaded once
    pub translucent_mesh: MeshBuffer,
    pub clear_color: Color,

    // UI
    pub egui_renderer: egui_wgpu::Renderer,
    pub egui_primitives: Option<Vec<egui::ClippedPrimitive>>,
    pub egui_textures: Option<egui::TexturesDelta>,
    pub egui_dpr: f32,
}

impl RenderState {
    pub fn new(
        device: &Device,
        queue: &Queue,
        config: &SurfaceConfiguration,
        static_meshes: &SceneMeshes,
    ) -> Self {
        let camera = create_camera_resources(device);
        let grass = texture::create_grass_resources(device, queue);
        let pipeline = |pass| {
            create_scene_pipeline(device, config.format, &camera.bind_group_layout, &grass.bind_group_layout, pass)
        };
        let (pipeline, translucent_pipeline) = (pipeline(BlendPass::Opaque), pipeline(BlendPass::Translucent));
        let (_, depth_view) = create_depth_texture(device, config.width, config.height);
        let egui_renderer = egui_wgpu::Renderer::new(device, config.format, egui_wgpu::RendererOptions::default());

        tracing::info!(
            vertices = static_meshes.opaque.vertices.len(),
            indices = static_meshes.opaque.indices.len(),
            translucent_indices = static_meshes.translucent.indices.len(),
            "uploading static mesh"
        );

        Self {
            format: config.format,
            alpha_mode: config.alpha_mode,
            width: config.width,
            height: config.height,
            pipeline,
            translucent_pipeline,
            camera,
            grass,
            depth_view,
            static_mesh: static_meshes.opaque.upload(device),
            translucent_mesh: static_meshes.translucent.upload(device),
            clear_color: Color::BLACK,
            egui_renderer,
            egui_primitives: None,
            egui_textures: None,
            egui_dpr: 1.0,
        }
    }

    /// Reconfigure the surface and recreate the depth buffer for a new size
    pub fn resize(&mut self, device: &Device, surface: &Surface, width: u32, height: u32) {
        if width == 0 || height == 0 || (width == self.width && height == self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.reconfigure(device, surface);
        let (_, depth_view) = create_depth_texture(device, width, height);
        self.depth_view = depth_view;
    }

    fn reconfigure(&self, device: &Device, surface: &Surface) {
        surface.configure(device, &surface_config(self.format, self.alpha_mode, self.width, self.height));
    }

    /// Upload this tick's uniforms and sky color
    pub fn prepare(&mut self, queue: &Queue, frame: &FrameOutput) {
        queue.write_buffer(&self.camera.camera_buffer, 0, bytemuck::bytes_of(&frame.camera));
        queue.write_buffer(&self.camera.lighting_buffer, 0, bytemuck::bytes_of(&frame.lighting));
        let [r, g, b] = frame.sky_color;
        self.clear_color = Color { r: r as f64, g: g as f64, b: b as f64, a: 1.0 };
    }

    pub fn set_ui(&mut self, primitives: Vec<egui::ClippedPrimitive>, textures: egui::TexturesDelta, dpr: f32) {
        self.egui_primitives = Some(primitives);
        self.egui_textures = Some(textures);
        self.egui_dpr = dpr;
    }

    /// Draw the static world, this tick's dynamic mesh and the egui overlay.
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn draw_frame(&mut self, device: &Device, queue: &Queue, surface: &Surface, dynamic_mesh: &Mesh) {
        let frame = match surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                tracing::warn!("surface lost, reconfiguring");
                self.reconfigure(device, surface);
                return;
            }
            Err(e) => {
                tracing::warn!("skipping frame: {e}");
                return;
            }
        };

        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        let dynamic = (!dynamic_mesh.is_empty()).then(|| dynamic_mesh.upload(device));

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(self.clear_color),
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_pipeline(&self.pipeline);
            rp.set_bind_group(0, &self.camera.camera_bind_group, &[]);
            rp.set_bind_group(1, &self.grass.bind_group, &[]);

            for mesh in std::iter::once(&self.static_mesh).chain(dynamic.as_ref()) {
                draw_mesh(&mut rp, mesh);
            }

            // Windows last, so whatever stands behind them is already in the target
            rp.set_pipeline(&self.translucent_pipeline);
            draw_mesh(&mut rp, &self.translucent_mesh);
        }

        if let (Some(primitives), Some(textures)) = (self.egui_primitives.take(), self.egui_textures.take()) {
            self.draw_ui(device, queue, &mut encoder, &view, &primitives, &textures);
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }

    fn draw_ui(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        view: &TextureView,
        primitives: &[egui::ClippedPrimitive],
        textures: &egui::TexturesDelta,
    ) {
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.width, self.height],
            pixels_per_point: self.egui_dpr,
        };

        for (id, image_delta) in &textures.set {
            self.egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        self.egui_renderer.update_buffers(device, queue, encoder, primitives, &screen_descriptor);

        {
            let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer
                .render(&mut egui_pass.forget_lifetime(), primitives, &screen_descriptor);
        }

        for id in &textures.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn draw_mesh(rp: &mut RenderPass<'_>, mesh: &MeshBuffer) {
    if mesh.index_count == 0 {
        return;
    }
    rp.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
    rp.set_index_buffer(mesh.index_buffer.slice(..), IndexFormat::Uint32);
    rp.draw_indexed(0..mesh.index_count, 0, 0..1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<Vertex>(), 52);
        assert_eq!(std::mem::offset_of!(Vertex, normal) as u64, VERTEX_ATTRIBUTES[1].offset);
        assert_eq!(std::mem::offset_of!(Vertex, color) as u64, VERTEX_ATTRIBUTES[2].offset);
        assert_eq!(std::mem::offset_of!(Vertex, uv) as u64, VERTEX_ATTRIBUTES[3].offset);
        assert_eq!(std::mem::offset_of!(Vertex, shading) as u64, VERTEX_ATTRIBUTES[4].offset);
    }

    #[test]
    fn only_the_opaque_pass_writes_depth() {
        assert!(BlendPass::Opaque.writes_depth());
        assert!(!BlendPass::Translucent.writes_depth());
    }

    #[test]
    fn surface_config_never_zero_sized() {
        let config = surface_config(TextureFormat::Bgra8UnormSrgb, CompositeAlphaMode::Opaque, 0, 0);
        assert_eq!((config.width, config.height), (1, 1));
    }
}
