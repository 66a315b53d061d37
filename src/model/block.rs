use glam::IVec3;

use crate::utils::hash2;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Material {
    Grass = 0,
    Planks = 1,
    Wall = 2,
    Roof = 3,
    Door = 4,
    Window = 5,
}

impl Material {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Windows let light and the eye through, so neighbouring faces stay visible.
    pub fn is_opaque(self) -> bool {
        !matches!(self, Material::Window)
    }

    /// Only grass samples the procedural grass texture
    pub fn is_textured(self) -> bool {
        self == Material::Grass
    }

    pub fn color(self) -> [f32; 4] {
        match self {
            Material::Grass => [0.298, 0.686, 0.314, 1.0], // #4caf50
            Material::Planks => [0.545, 0.271, 0.075, 1.0], // #8B4513
            Material::Wall => [0.824, 0.706, 0.549, 1.0],   // #D2B48C
            Material::Roof => [0.545, 0.0, 0.0, 1.0],       // #8B0000
            Material::Door => [0.396, 0.263, 0.129, 1.0],
            Material::Window => [0.6, 0.8, 0.95, 0.45],
        }
    }
}

/// One unit cube of the static scene. The cube at `position` spans
/// `position..position + 1` on every axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    pub position: IVec3,
    pub material: Material,
    pub is_terrain: bool,
}

impl Block {
    pub fn terrain(position: IVec3) -> Self {
        Self { position, material: Material::Grass, is_terrain: true }
    }

    pub fn structure(position: IVec3, material: Material) -> Self {
        Self { position, material, is_terrain: false }
    }

    /// Final vertex color, including the cosmetic per-block grass shade.
    pub fn color(&self) -> [f32; 4] {
        let [r, g, b, a] = self.material.color();
        let shade = if self.material == Material::Grass {
            grass_shade(self.position.x, self.position.z)
        } else {
            1.0
        };
        [r * shade, g * shade, b * shade, a]
    }
}

/// Darker or brighter patches on the grass: 0.8 / 1.0 / 1.2, picked by a
/// seeded hash so the result is stable across reloads.
pub fn grass_shade(x: i32, z: i32) -> f32 {
    let r = hash2(x, z);
    if r > 0.7 {
        0.8
    } else if r > 0.4 {
        1.2
    } else {
        1.0
    }
}

// Convert face direction to normal vector
pub fn face_dir_to_normal(face_dir: u8) -> [f32; 3] {
    match face_dir {
        0 => [1.0, 0.0, 0.0],   // +X
        1 => [-1.0, 0.0, 0.0],  // -X
        2 => [0.0, 1.0, 0.0],   // +Y
        3 => [0.0, -1.0, 0.0],  // -Y
        4 => [0.0, 0.0, 1.0],   // +Z
        5 => [0.0, 0.0, -1.0],  // -Z
        _ => [0.0, 1.0, 0.0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grass_shade_is_stable() {
        for x in -5..5 {
            for z in -5..5 {
                let s = grass_shade(x, z);
                assert_eq!(s, grass_shade(x, z));
                assert!(s == 0.8 || s == 1.0 || s == 1.2);
            }
        }
    }

    #[test]
    fn only_structure_blocks_keep_base_color() {
        let wall = Block::structure(IVec3::new(3, 1, 0), Material::Wall);
        assert_eq!(wall.color(), Material::Wall.color());
        assert!(!wall.is_terrain);
        assert!(Block::terrain(IVec3::ZERO).is_terrain);
    }
}
