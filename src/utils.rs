use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use bytemuck::NoUninit;

use crate::model::face_dir_to_normal;

#[repr(C)]
#[derive(Debug, Clone, Copy, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
    /// One of the `SHADE_*` modes, read by the fragment shader
    pub shading: f32,
}

/// Flat vertex color, lit by ambient and directional light
pub const SHADE_LIT: f32 = 0.0;
/// Vertex color multiplied by the grass texture, then lit
pub const SHADE_TEXTURED: f32 = 1.0;
/// Vertex color as is, for the sun and moon
pub const SHADE_EMISSIVE: f32 = 2.0;

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Corners of each unit cube face, counter-clockwise seen from outside.
/// Indexed by face direction (+X, -X, +Y, -Y, +Z, -Z).
pub const FACE_CORNERS: [[[f32; 3]; 4]; 6] = [
    [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]],
    [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]],
    [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]],
    [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
    [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]],
    [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
];

const FACE_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];

impl Mesh {
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    /// Append one face of the unit cube whose minimum corner is `origin`
    pub fn push_face(&mut self, origin: Vec3, face_dir: u8, color: [f32; 4], textured: bool) {
        let base = self.vertices.len() as u32;
        let normal = face_dir_to_normal(face_dir);
        let shading = if textured { SHADE_TEXTURED } else { SHADE_LIT };
        for (corner, uv) in FACE_CORNERS[face_dir as usize].iter().zip(FACE_UVS) {
            let pos = origin + Vec3::from_array(*corner);
            self.vertices.push(Vertex { pos: pos.to_array(), normal, color, uv, shading });
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Append a box of `size` centered on the local origin, placed by `transform`
    pub fn push_box(&mut self, transform: Mat4, size: Vec3, color: [f32; 4]) {
        self.push_box_shaded(transform, size, color, SHADE_LIT);
    }

    pub fn push_box_shaded(&mut self, transform: Mat4, size: Vec3, color: [f32; 4], shading: f32) {
        for face_dir in 0..6u8 {
            let base = self.vertices.len() as u32;
            let normal = transform
                .transform_vector3(Vec3::from_array(face_dir_to_normal(face_dir)))
                .normalize_or_zero();
            for (corner, uv) in FACE_CORNERS[face_dir as usize].iter().zip(FACE_UVS) {
                let local = (Vec3::from_array(*corner) - Vec3::splat(0.5)) * size;
                let pos = transform.transform_point3(local);
                self.vertices.push(Vertex {
                    pos: pos.to_array(),
                    normal: normal.to_array(),
                    color,
                    uv,
                    shading,
                });
            }
            self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {
        let vertices = bytemuck::cast_slice(&self.vertices);
        let indices = bytemuck::cast_slice(&self.indices);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: indices,
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

/// Seeded 2D hash in [0, 1), the classic `fract(sin(dot(p, k)) * 43758.5453)`
pub fn hash2(x: i32, z: i32) -> f32 {
    let d = x as f64 * 12.9898 + z as f64 * 78.233;
    let v = (d.sin() * 43758.5453123).fract().abs();
    v as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_stays_in_unit_range() {
        for x in -50..50 {
            for z in -50..50 {
                let h = hash2(x, z);
                assert!((0.0..1.0).contains(&h), "hash2({x}, {z}) = {h}");
            }
        }
    }

    #[test]
    fn face_winding_points_outward() {
        for face_dir in 0..6u8 {
            let mut mesh = Mesh::empty();
            mesh.push_face(Vec3::ZERO, face_dir, [1.0; 4], false);
            let p: Vec<Vec3> = mesh.vertices.iter().map(|v| Vec3::from_array(v.pos)).collect();
            let n = (p[1] - p[0]).cross(p[2] - p[0]).normalize();
            assert_eq!(n, Vec3::from_array(face_dir_to_normal(face_dir)));
        }
    }

    #[test]
    fn box_is_centered_and_scaled() {
        let mut mesh = Mesh::empty();
        mesh.push_box(Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)), Vec3::new(2.0, 4.0, 6.0), [1.0; 4]);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        let max_x = mesh.vertices.iter().map(|v| v.pos[0]).fold(f32::MIN, f32::max);
        let min_y = mesh.vertices.iter().map(|v| v.pos[1]).fold(f32::MAX, f32::min);
        assert_eq!(max_x, 6.0);
        assert_eq!(min_y, -2.0);
    }
}
