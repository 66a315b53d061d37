use glam::{EulerRot, Mat4, Quat, Vec3};

/// Pitch limit, slightly less than π/2 so forward never lines up with `up`
pub const MAX_PITCH: f32 = 1.5533;

/// First-person camera. Orientation is yaw about +Y then pitch about the
/// camera's X axis; the identity orientation looks down -Z with +X to the right.
pub struct Camera {
    pub eye: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            eye: Vec3::new(0.0, 50.0, 50.0),
            yaw: 0.0,
            pitch: 0.0,
            up: Vec3::Y,
            fov_y: 75f32.to_radians(),
            aspect: width as f32 / height.max(1) as f32,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }

    pub fn target(&self) -> Vec3 { self.eye + self.forward() }

    pub fn set_aspect(&mut self, width: u32, height: u32) { self.aspect = width as f32 / height.max(1) as f32; }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target(), self.up);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
        proj * view
    }

    pub fn set_look_at(&mut self, target: Vec3) {
        let dir = (target - self.eye).normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        self.yaw = (-dir.x).atan2(-dir.z);
        self.pitch = dir.y.asin().clamp(-MAX_PITCH, MAX_PITCH);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn identity_looks_down_negative_z() {
        let cam = Camera::new(800, 600);
        assert!(close(cam.forward(), Vec3::NEG_Z));
    }

    #[test]
    fn look_at_round_trips_direction() {
        let mut cam = Camera::new(800, 600);
        cam.eye = Vec3::new(0.0, 50.0, 50.0);
        cam.set_look_at(Vec3::ZERO);
        let expected = (Vec3::ZERO - cam.eye).normalize();
        assert!(close(cam.forward(), expected));

        cam.eye = Vec3::ZERO;
        cam.set_look_at(Vec3::new(10.0, 0.0, 0.0));
        assert!(close(cam.forward(), Vec3::X));
    }

    #[test]
    fn looking_at_a_point_directly_below_stays_finite() {
        let mut cam = Camera::new(800, 600);
        cam.eye = Vec3::new(0.0, 50.0, 0.0);
        cam.set_look_at(Vec3::ZERO);
        assert_eq!(cam.pitch, -MAX_PITCH);
        assert!(cam.view_proj().is_finite());
    }
}
