use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec3};

use crate::utils::{hash2, Mesh};

pub const PATROL_SPEED: f32 = 0.5;
const BOB_FREQUENCY: f32 = 5.0;
const BOB_AMPLITUDE: f32 = 0.2;
const SWING_FREQUENCY: f32 = 10.0;
const ARM_SWING: f32 = 0.5;
const LEG_SWING: f32 = 0.3;

const FUR: [f32; 4] = [0.545, 0.271, 0.075, 1.0];
const EYE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const MOUTH: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// A patrolling character. Only the phase offset is chosen at creation;
/// everything else about its motion is a function of elapsed time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Character {
    pub start_position: Vec3,
    pub patrol_radius: f32,
    pub phase_offset: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterPose {
    pub position: Vec3,
    pub yaw: f32,
    pub left_arm: f32,
    pub right_arm: f32,
    pub left_leg: f32,
    pub right_leg: f32,
}

impl Character {
    pub fn new(start_position: Vec3, patrol_radius: f32, phase_offset: f32) -> Self {
        Self { start_position, patrol_radius, phase_offset }
    }

    /// Phase offset in [0, 2π) picked from a seeded hash of the roster index
    pub fn seeded(start_position: Vec3, patrol_radius: f32, index: usize) -> Self {
        let phase = hash2(index as i32, 7919) * TAU;
        Self::new(start_position, patrol_radius, phase)
    }

    pub fn pose(&self, elapsed: f32) -> CharacterPose {
        let t = elapsed + self.phase_offset;

        let patrol_x = (t * PATROL_SPEED).sin() * self.patrol_radius;
        let patrol_z = (t * PATROL_SPEED).cos() * self.patrol_radius;
        let bob = (t * BOB_FREQUENCY).sin() * BOB_AMPLITUDE;

        let swing = t * SWING_FREQUENCY;

        CharacterPose {
            position: self.start_position + Vec3::new(patrol_x, bob, patrol_z),
            yaw: patrol_x.atan2(patrol_z),
            left_arm: swing.sin() * ARM_SWING,
            right_arm: (swing + PI).sin() * ARM_SWING,
            left_leg: swing.sin() * LEG_SWING,
            right_leg: (swing + PI).sin() * LEG_SWING,
        }
    }
}

pub fn default_roster() -> Vec<Character> {
    [
        Vec3::new(-20.0, 1.0, -20.0),
        Vec3::new(20.0, 1.0, 20.0),
        Vec3::new(-20.0, 1.0, 20.0),
        Vec3::new(20.0, 1.0, -20.0),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, start)| Character::seeded(start, 10.0, i))
    .collect()
}

/// Index of a node inside a [`Rig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct RigNode {
    pub name: &'static str,
    pub parent: Option<NodeId>,
    pub offset: Vec3,
    pub size: Vec3,
    pub color: [f32; 4],
    /// Rotation about the node's local X axis, in radians
    pub swing: f32,
}

/// Box-figure skeleton. Nodes are stored parent-before-child so world
/// transforms resolve in a single forward pass.
#[derive(Debug, Clone)]
pub struct Rig {
    nodes: Vec<RigNode>,
    pub root: NodeId,
    pub left_arm: NodeId,
    pub right_arm: NodeId,
    pub left_leg: NodeId,
    pub right_leg: NodeId,
}

impl Rig {
    fn add(nodes: &mut Vec<RigNode>, name: &'static str, parent: Option<NodeId>, offset: Vec3, size: Vec3, color: [f32; 4]) -> NodeId {
        nodes.push(RigNode { name, parent, offset, size, color, swing: 0.0 });
        NodeId(nodes.len() - 1)
    }

    pub fn monkey() -> Self {
        let mut nodes = Vec::new();
        let root = Self::add(&mut nodes, "root", None, Vec3::ZERO, Vec3::ZERO, FUR);
        let r = Some(root);
        Self::add(&mut nodes, "body", r, Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.8, 1.0, 0.5), FUR);
        Self::add(&mut nodes, "head", r, Vec3::new(0.0, 1.3, 0.0), Vec3::splat(0.6), FUR);
        let left_arm = Self::add(&mut nodes, "left_arm", r, Vec3::new(-0.5, 0.5, 0.0), Vec3::new(0.2, 0.7, 0.2), FUR);
        let right_arm = Self::add(&mut nodes, "right_arm", r, Vec3::new(0.5, 0.5, 0.0), Vec3::new(0.2, 0.7, 0.2), FUR);
        let left_leg = Self::add(&mut nodes, "left_leg", r, Vec3::new(-0.3, -0.35, 0.0), Vec3::new(0.2, 0.7, 0.2), FUR);
        let right_leg = Self::add(&mut nodes, "right_leg", r, Vec3::new(0.3, -0.35, 0.0), Vec3::new(0.2, 0.7, 0.2), FUR);
        Self::add(&mut nodes, "left_eye", r, Vec3::new(-0.15, 1.4, 0.3), Vec3::splat(0.1), EYE);
        Self::add(&mut nodes, "right_eye", r, Vec3::new(0.15, 1.4, 0.3), Vec3::splat(0.1), EYE);
        Self::add(&mut nodes, "mouth", r, Vec3::new(0.0, 1.2, 0.3), Vec3::new(0.3, 0.05, 0.1), MOUTH);

        Self { nodes, root, left_arm, right_arm, left_leg, right_leg }
    }

    pub fn node(&self, id: NodeId) -> &RigNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut RigNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn apply(&mut self, pose: &CharacterPose) {
        self.node_mut(self.left_arm).swing = pose.left_arm;
        self.node_mut(self.right_arm).swing = pose.right_arm;
        self.node_mut(self.left_leg).swing = pose.left_leg;
        self.node_mut(self.right_leg).swing = pose.right_leg;
    }

    /// World transform of every node, in node order
    pub fn world_transforms(&self, root_transform: Mat4) -> Vec<Mat4> {
        let mut out: Vec<Mat4> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let parent = match node.parent {
                Some(p) => out[p.0],
                None => root_transform,
            };
            let local = Mat4::from_translation(node.offset) * Mat4::from_rotation_x(node.swing);
            out.push(parent * local);
        }
        out
    }

    /// Append the boxes of a posed character to `mesh`
    pub fn append_mesh(&mut self, pose: &CharacterPose, mesh: &mut Mesh) {
        self.apply(pose);
        let root = Mat4::from_translation(pose.position) * Mat4::from_rotation_y(pose.yaw);
        for (node, transform) in self.nodes.iter().zip(self.world_transforms(root)) {
            if node.size == Vec3::ZERO {
                continue;
            }
            mesh.push_box(transform, node.size, node.color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patrol_is_periodic() {
        let c = Character::new(Vec3::new(20.0, 1.0, -20.0), 10.0, 1.3);
        let period = TAU / PATROL_SPEED;
        for i in 0..20 {
            let t = i as f32 * 0.37;
            let a = c.pose(t).position;
            let b = c.pose(t + period).position;
            assert!((a.x - b.x).abs() < 1e-3 && (a.z - b.z).abs() < 1e-3, "t={t}: {a} vs {b}");
        }
    }

    #[test]
    fn pose_follows_closed_form() {
        let c = Character::new(Vec3::new(-20.0, 1.0, 20.0), 10.0, 0.0);
        let p = c.pose(0.0);
        assert!((p.position - Vec3::new(-20.0, 1.0, 30.0)).length() < 1e-5);
        assert_eq!(p.yaw, 0.0);
        assert_eq!(p.left_arm, 0.0);

        let p = c.pose(1.0);
        assert!((p.left_arm + p.right_arm).abs() < 1e-5, "arms swing in opposition");
        assert!((p.left_leg - p.left_arm * 0.6).abs() < 1e-5);
        assert!((p.position.y - (1.0 + 5f32.sin() * 0.2)).abs() < 1e-5);
    }

    #[test]
    fn seeded_phase_is_stable_and_bounded() {
        let a = default_roster();
        let b = default_roster();
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        assert!(a.iter().all(|c| (0.0..TAU).contains(&c.phase_offset)));
    }

    #[test]
    fn rig_limbs_are_addressed_by_index() {
        let mut rig = Rig::monkey();
        assert_eq!(rig.node(rig.left_arm).name, "left_arm");
        assert_eq!(rig.node(rig.right_leg).name, "right_leg");

        let pose = Character::new(Vec3::ZERO, 0.0, 0.0).pose(0.3);
        rig.apply(&pose);
        assert_eq!(rig.node(rig.left_arm).swing, pose.left_arm);
        assert_eq!(rig.node(rig.right_leg).swing, pose.right_leg);
    }

    #[test]
    fn posed_mesh_skips_root() {
        let mut rig = Rig::monkey();
        let mut mesh = Mesh::empty();
        let pose = Character::new(Vec3::ZERO, 5.0, 0.0).pose(2.0);
        rig.append_mesh(&pose, &mut mesh);
        assert_eq!(mesh.vertices.len(), (rig.len() - 1) * 24);
    }
}
