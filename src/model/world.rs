use std::collections::HashMap;

use glam::{IVec3, Vec3};

use super::block::{Block, Material};
use crate::utils::Mesh;

pub const HOUSE_SIZE: i32 = 9;
pub const HOUSE_HEIGHT: i32 = 6;

/// Front wall (local z = 0) opening: columns and rows left open for the door
pub const DOOR_GAP_X: [i32; 2] = [4, 5];
/// Two rows high. `y = 2` is the top row of the opening, `y = 1` the row
/// standing on the floor.
pub const DOOR_GAP_Y: [i32; 2] = [1, 2];

/// The open door leaf, standing just inside the house next to the opening
pub const DOOR_LEAF: [IVec3; 2] = [IVec3::new(6, 1, 1), IVec3::new(6, 2, 1)];

/// Local offsets of the window blocks, two per wall
pub const WINDOW_OFFSETS: [IVec3; 8] = [
    IVec3::new(2, 3, 0),
    IVec3::new(7, 3, 0),
    IVec3::new(2, 3, 8),
    IVec3::new(6, 3, 8),
    IVec3::new(0, 3, 2),
    IVec3::new(0, 3, 6),
    IVec3::new(8, 3, 2),
    IVec3::new(8, 3, 6),
];

/// Build the whole static scene: a flat `world_size` x `world_size` grass
/// plane centered on the origin with its top surface at y = 0, plus the
/// house whose minimum corner sits at `house_origin`.
pub fn generate(world_size: u32, house_origin: IVec3) -> Vec<Block> {
    let size = world_size as i32;
    let half = size / 2;

    let cells = world_size as usize * world_size as usize;
    let mut blocks = Vec::with_capacity(cells + 512);
    for x in 0..size {
        for z in 0..size {
            blocks.push(Block::terrain(IVec3::new(x - half, -1, z - half)));
        }
    }

    blocks.extend(generate_house(house_origin));
    blocks
}

fn is_door_gap(local: IVec3) -> bool {
    local.z == 0 && DOOR_GAP_X.contains(&local.x) && DOOR_GAP_Y.contains(&local.y)
}

pub fn generate_house(origin: IVec3) -> Vec<Block> {
    let mut house = Vec::new();
    let last = HOUSE_SIZE - 1;

    // Floor
    for x in 0..HOUSE_SIZE {
        for z in 0..HOUSE_SIZE {
            house.push(Block::structure(origin + IVec3::new(x, 0, z), Material::Planks));
        }
    }

    // Walls, with the door opening and windows cut out
    for y in 1..HOUSE_HEIGHT {
        for x in 0..HOUSE_SIZE {
            for z in 0..HOUSE_SIZE {
                let on_perimeter = x == 0 || x == last || z == 0 || z == last;
                if !on_perimeter {
                    continue;
                }
                let local = IVec3::new(x, y, z);
                if is_door_gap(local) {
                    continue;
                }
                let material = if WINDOW_OFFSETS.contains(&local) {
                    Material::Window
                } else {
                    Material::Wall
                };
                house.push(Block::structure(origin + local, material));
            }
        }
    }

    // Door
    for leaf in DOOR_LEAF {
        house.push(Block::structure(origin + leaf, Material::Door));
    }

    // Roof
    for x in 0..HOUSE_SIZE {
        for z in 0..HOUSE_SIZE {
            house.push(Block::structure(origin + IVec3::new(x, HOUSE_HEIGHT, z), Material::Roof));
        }
    }

    house
}

/// Static scene geometry split by blend mode. Translucent faces must be
/// drawn after everything opaque, without depth writes.
#[derive(Debug, Clone)]
pub struct SceneMeshes {
    pub opaque: Mesh,
    pub translucent: Mesh,
}

/// Mesh every visible block face. A face is culled when the neighbour on
/// that side is opaque, or when both blocks are windows.
pub fn compute_meshes(blocks: &[Block]) -> SceneMeshes {
    let occupied: HashMap<IVec3, Material> =
        blocks.iter().map(|b| (b.position, b.material)).collect();

    let mut opaque = Mesh::empty();
    let mut translucent = Mesh::empty();
    for block in blocks {
        let color = block.color();
        let mesh = if block.material.is_opaque() { &mut opaque } else { &mut translucent };
        for face_dir in 0..6u8 {
            let neighbour = occupied.get(&(block.position + face_offset(face_dir)));
            let hidden = match neighbour {
                Some(m) if m.is_opaque() => true,
                Some(m) => *m == block.material,
                None => false,
            };
            if hidden {
                continue;
            }
            mesh.push_face(
                block.position.as_vec3(),
                face_dir,
                color,
                block.material.is_textured() && face_dir == 2,
            );
        }
    }
    SceneMeshes { opaque, translucent }
}

fn face_offset(face_dir: u8) -> IVec3 {
    match face_dir {
        0 => IVec3::X,
        1 => IVec3::NEG_X,
        2 => IVec3::Y,
        3 => IVec3::NEG_Y,
        4 => IVec3::Z,
        _ => IVec3::NEG_Z,
    }
}

/// Center of the house footprint at floor level, in world space
pub fn house_center(origin: IVec3) -> Vec3 {
    origin.as_vec3() + Vec3::new(HOUSE_SIZE as f32 / 2.0, 1.0, HOUSE_SIZE as f32 / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn terrain_is_centered_grid() {
        let blocks = generate(100, IVec3::new(-4, 0, -4));
        let terrain: Vec<_> = blocks.iter().filter(|b| b.is_terrain).collect();
        assert_eq!(terrain.len(), 100 * 100);
        let min_x = terrain.iter().map(|b| b.position.x).min().unwrap();
        let max_x = terrain.iter().map(|b| b.position.x).max().unwrap();
        assert_eq!((min_x, max_x), (-50, 49));
        assert!(terrain.iter().all(|b| b.position.y == -1));
    }

    #[test]
    fn generation_is_idempotent() {
        let a: HashSet<_> = generate(16, IVec3::ZERO).into_iter().collect();
        let b: HashSet<_> = generate(16, IVec3::ZERO).into_iter().collect();
        assert_eq!(a, b);
        let colors_a: Vec<_> = generate(16, IVec3::ZERO).iter().map(|b| b.color()).collect();
        let colors_b: Vec<_> = generate(16, IVec3::ZERO).iter().map(|b| b.color()).collect();
        assert_eq!(colors_a, colors_b);
    }

    #[test]
    fn house_has_single_two_wide_door_gap() {
        let origin = IVec3::new(10, 0, -3);
        let house: HashSet<IVec3> = generate_house(origin).iter().map(|b| b.position - origin).collect();

        let mut gaps = Vec::new();
        for y in 1..HOUSE_HEIGHT {
            for x in 0..HOUSE_SIZE {
                for z in 0..HOUSE_SIZE {
                    let on_perimeter = x == 0 || x == HOUSE_SIZE - 1 || z == 0 || z == HOUSE_SIZE - 1;
                    let local = IVec3::new(x, y, z);
                    if on_perimeter && !house.contains(&local) {
                        gaps.push(local);
                    }
                }
            }
        }
        gaps.sort_by_key(|p| (p.y, p.x));
        assert_eq!(
            gaps,
            vec![
                IVec3::new(4, 1, 0),
                IVec3::new(5, 1, 0),
                IVec3::new(4, 2, 0),
                IVec3::new(5, 2, 0),
            ]
        );
    }

    #[test]
    fn house_has_eight_windows_at_offsets() {
        let origin = IVec3::new(-4, 0, -4);
        let windows: HashSet<IVec3> = generate_house(origin)
            .iter()
            .filter(|b| b.material == Material::Window)
            .map(|b| b.position - origin)
            .collect();
        assert_eq!(windows.len(), 8);
        assert_eq!(windows, WINDOW_OFFSETS.iter().copied().collect());
    }

    #[test]
    fn house_has_no_duplicate_blocks() {
        let house = generate_house(IVec3::ZERO);
        let unique: HashSet<IVec3> = house.iter().map(|b| b.position).collect();
        assert_eq!(unique.len(), house.len());
        assert!(house.iter().all(|b| !b.is_terrain));
    }

    #[test]
    fn buried_faces_are_culled() {
        // a 2x1x1 pair shares one face on each side
        let blocks = vec![
            Block::structure(IVec3::ZERO, Material::Wall),
            Block::structure(IVec3::X, Material::Wall),
        ];
        let meshes = compute_meshes(&blocks);
        assert_eq!(meshes.opaque.indices.len(), 10 * 6);
        assert!(meshes.translucent.is_empty());
    }

    #[test]
    fn faces_behind_windows_stay_visible() {
        let blocks = vec![
            Block::structure(IVec3::ZERO, Material::Wall),
            Block::structure(IVec3::X, Material::Window),
        ];
        let meshes = compute_meshes(&blocks);
        // the wall keeps its face towards the window, the window loses its face towards the wall
        assert_eq!(meshes.opaque.indices.len(), 6 * 6);
        assert_eq!(meshes.translucent.indices.len(), 5 * 6);
    }

    #[test]
    fn windows_are_meshed_apart_from_opaque_blocks() {
        let meshes = compute_meshes(&generate_house(IVec3::ZERO));
        let window_alpha = Material::Window.color()[3];
        assert!(!meshes.translucent.is_empty());
        assert!(meshes.translucent.vertices.iter().all(|v| v.color[3] == window_alpha));
        assert!(meshes.opaque.vertices.iter().all(|v| v.color[3] == 1.0));
    }
}
