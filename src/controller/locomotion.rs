use glam::{Vec2, Vec3};

use crate::config::MovementConfig;
use crate::controller::input::InputState;
use crate::model::camera::{Camera, MAX_PITCH};

/// Moves the first-person camera from the per-tick movement intent
pub struct CameraController {
    /// World units per tick
    pub base_speed: f32,
    pub sprint_multiplier: f32,
    /// Vertical step per tick while jumping
    pub jump_step: f32,
    pub mouse_sensitivity: f32,
    pub touch_look_sensitivity: f32,
}

impl CameraController {
    pub fn new(movement: &MovementConfig) -> Self {
        Self {
            base_speed: movement.base_speed,
            sprint_multiplier: movement.sprint_multiplier,
            jump_step: movement.jump_step,
            mouse_sensitivity: movement.mouse_sensitivity,
            touch_look_sensitivity: movement.touch_look_sensitivity,
        }
    }

    /// Apply a pointer delta. Moving right turns right, moving up looks up.
    pub fn apply_look(&self, camera: &mut Camera, delta: Vec2, sensitivity: f32) {
        camera.yaw -= delta.x * sensitivity;
        camera.pitch = (camera.pitch - delta.y * sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Displacement for one tick, before it is applied
    pub fn step(&self, camera: &Camera, input: &InputState) -> Vec3 {
        let local = Vec3::new(input.move_x, 0.0, input.move_z);
        let direction = (camera.orientation() * local).normalize_or_zero();

        let speed = if input.sprinting {
            self.base_speed * self.sprint_multiplier
        } else {
            self.base_speed
        };

        let mut delta = direction * speed;
        if input.jumping {
            delta.y += self.jump_step;
        }
        delta
    }

    /// Advance the camera one tick and return the applied displacement
    pub fn tick(&self, camera: &mut Camera, input: &InputState) -> Vec3 {
        let delta = self.step(camera, input);
        camera.eye += delta;
        delta
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(&MovementConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin_camera() -> Camera {
        let mut cam = Camera::new(800, 600);
        cam.eye = Vec3::ZERO;
        cam
    }

    #[test]
    fn strafe_moves_exactly_base_speed() {
        let controller = CameraController::default();
        let mut cam = origin_camera();
        let input = InputState { move_x: 1.0, ..Default::default() };
        controller.tick(&mut cam, &input);
        assert_eq!(cam.eye, Vec3::new(controller.base_speed, 0.0, 0.0));
    }

    #[test]
    fn sprint_doubles_speed() {
        let controller = CameraController::default();
        let mut cam = origin_camera();
        let input = InputState { move_x: 1.0, sprinting: true, ..Default::default() };
        let delta = controller.tick(&mut cam, &input);
        assert!((delta.x - 2.0 * controller.base_speed).abs() < 1e-6);
    }

    #[test]
    fn no_intent_no_motion() {
        let controller = CameraController::default();
        let mut cam = origin_camera();
        cam.yaw = 1.1;
        cam.pitch = -0.4;
        assert_eq!(controller.tick(&mut cam, &InputState::default()), Vec3::ZERO);
    }

    #[test]
    fn diagonal_is_normalized() {
        let controller = CameraController::default();
        let cam = origin_camera();
        let input = InputState { move_x: 1.0, move_z: -1.0, ..Default::default() };
        let delta = controller.step(&cam, &input);
        assert!((delta.length() - controller.base_speed).abs() < 1e-6);
    }

    #[test]
    fn forward_follows_yaw() {
        let controller = CameraController::default();
        let mut cam = origin_camera();
        cam.yaw = std::f32::consts::FRAC_PI_2;
        let input = InputState { move_z: -1.0, ..Default::default() };
        let delta = controller.step(&cam, &input);
        // a quarter turn left faces -X
        assert!((delta - Vec3::new(-controller.base_speed, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn jump_is_a_flat_vertical_step() {
        let controller = CameraController::default();
        let mut cam = origin_camera();
        let input = InputState { jumping: true, ..Default::default() };
        controller.tick(&mut cam, &input);
        controller.tick(&mut cam, &input);
        assert!((cam.eye.y - 2.0 * controller.jump_step).abs() < 1e-6);
    }

    #[test]
    fn pitch_is_clamped() {
        let controller = CameraController::default();
        let mut cam = origin_camera();
        controller.apply_look(&mut cam, Vec2::new(0.0, -1.0e6), controller.mouse_sensitivity);
        assert_eq!(cam.pitch, MAX_PITCH);
        assert!(cam.pitch < std::f32::consts::FRAC_PI_2);
        controller.apply_look(&mut cam, Vec2::new(100.0, 0.0), controller.mouse_sensitivity);
        assert!((cam.yaw + 0.2).abs() < 1e-6);
    }

    #[test]
    fn looking_straight_up_or_down_keeps_view_finite() {
        let controller = CameraController::default();
        let mut cam = origin_camera();
        controller.apply_look(&mut cam, Vec2::new(0.0, -1.0e6), controller.mouse_sensitivity);
        assert!(cam.view_proj().is_finite());
        controller.apply_look(&mut cam, Vec2::new(0.0, 1.0e6), controller.touch_look_sensitivity);
        assert_eq!(cam.pitch, -MAX_PITCH);
        assert!(cam.view_proj().is_finite());
    }
}
