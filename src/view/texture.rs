use image::{Rgba, RgbaImage};

use crate::utils::hash2;

pub const GRASS_TEXTURE_SIZE: u32 = 256;
const SPECKLES: i32 = 1000;
const SPECKLE_SIZE: u32 = 2;
/// #4caf50, also the base grass color of the block material
const GRASS_BASE: [u8; 3] = [0x4c, 0xaf, 0x50];

/// Green base with small speckles ranging from yellowish to bluish green.
/// Speckle placement comes from a seeded hash so every session draws the
/// same texture.
pub fn grass_image(size: u32) -> RgbaImage {
    let [r, g, b] = GRASS_BASE;
    let mut img = RgbaImage::from_pixel(size, size, Rgba([r, g, b, 255]));

    for i in 0..SPECKLES {
        let x = (hash2(i, 1) * size as f32) as u32;
        let y = (hash2(i, 2) * size as f32) as u32;
        let hue = 100.0 + hash2(i, 3) * 60.0;
        let lightness = 0.2 + hash2(i, 4) * 0.3;
        let [r, g, b] = hsl_to_rgb(hue, 1.0, lightness);

        for dx in 0..SPECKLE_SIZE {
            for dy in 0..SPECKLE_SIZE {
                if x + dx < size && y + dy < size {
                    img.put_pixel(x + dx, y + dy, Rgba([r, g, b, 255]));
                }
            }
        }
    }
    img
}

/// `hue` in degrees, `saturation` and `lightness` in [0, 1]
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [u8; 3] {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = hue.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}

pub struct TextureResources {
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
}

/// Upload the grass texture and build its bind group (texture + sampler)
pub fn create_grass_resources(device: &wgpu::Device, queue: &wgpu::Queue) -> TextureResources {
    let img = grass_image(GRASS_TEXTURE_SIZE);
    let (width, height) = img.dimensions();
    let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("grass_texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        img.as_raw(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("grass_sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("grass_bind_group_layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("grass_bind_group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&view) },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&sampler) },
        ],
    });

    TextureResources { bind_group_layout, bind_group }
}
