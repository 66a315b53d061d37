use glam::{Mat4, Vec3};

use crate::config::GameConfig;
use crate::controller::input::{DeviceClass, InputController, InputState};
use crate::controller::locomotion::CameraController;
use crate::model::day_night::CycleSample;
use crate::model::world::{self, SceneMeshes};
use crate::model::{Block, Camera, Character, DayNightCycle, Rig};
use crate::utils::{Mesh, SHADE_EMISSIVE};

/// Base strengths of the two lights, scaled by the cycle intensity
pub const AMBIENT_BASE: f32 = 0.5;
pub const DIRECTIONAL_BASE: f32 = 0.8;
/// Direction towards the key light
pub const LIGHT_POSITION: Vec3 = Vec3::new(10.0, 10.0, 10.0);
pub const CELESTIAL_SIZE: f32 = 8.0;
const MAX_FRAME_DT: f32 = 0.1;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self { view_proj: camera.view_proj().to_cols_array_2d() }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    pub sun_dir: [f32; 3],
    pub sun_intensity: f32,
    pub ambient: f32,
    pub _pad1: f32,
    pub _pad2: f32,
    pub _pad3: f32,
}

impl LightingUniform {
    pub fn from_sample(sample: &CycleSample) -> Self {
        let dir = LIGHT_POSITION.normalize();
        Self {
            sun_dir: dir.to_array(),
            sun_intensity: DIRECTIONAL_BASE * sample.light_intensity,
            ambient: AMBIENT_BASE * sample.light_intensity,
            _pad1: 0.0,
            _pad2: 0.0,
            _pad3: 0.0,
        }
    }
}

/// Monotonic session clock. Every component reads time from here, in
/// seconds since the first frame.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    origin: Option<f64>,
    last: f64,
    dt: f32,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to platform time `now` (seconds) and return the frame delta,
    /// clamped so a stalled tab does not produce a huge step.
    pub fn advance(&mut self, now: f64) -> f32 {
        if self.origin.is_none() {
            self.origin = Some(now);
            self.last = now;
            self.dt = 0.0;
            return 0.0;
        }
        let now = now.max(self.last);
        self.dt = ((now - self.last) as f32).clamp(0.0, MAX_FRAME_DT);
        self.last = now;
        self.dt
    }

    pub fn elapsed(&self) -> f64 {
        self.origin.map_or(0.0, |origin| self.last - origin)
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }
}

/// Frames-per-second averaged over one-second windows
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    pub fps: f32,
    frame_count: u32,
    timer: f32,
}

impl FpsCounter {
    pub fn record(&mut self, dt: f32) {
        self.frame_count += 1;
        self.timer += dt;
        if self.timer >= 1.0 {
            self.fps = self.frame_count as f32 / self.timer;
            self.frame_count = 0;
            self.timer = 0.0;
        }
    }
}

/// Everything the renderer and HUD need from one tick
#[derive(Debug, Clone, Copy)]
pub struct FrameOutput {
    pub camera: CameraUniform,
    pub lighting: LightingUniform,
    pub sky_color: [f32; 3],
    pub sample: CycleSample,
    pub intent: InputState,
    pub dt: f32,
}

/// Platform-independent game state, advanced once per displayed frame
pub struct Simulation {
    pub clock: SimClock,
    pub fps: FpsCounter,
    pub camera: Camera,
    pub camera_controller: CameraController,
    pub cycle: DayNightCycle,
    pub characters: Vec<Character>,
    pub blocks: Vec<Block>,
    /// Characters and the celestial body, rebuilt every tick
    pub dynamic_mesh: Mesh,
    rig: Rig,
}

impl Simulation {
    pub fn new(config: &GameConfig, width: u32, height: u32) -> Self {
        let blocks = world::generate(config.world.size, config.world.house_origin());
        tracing::info!(blocks = blocks.len(), "generated world");

        let mut camera = Camera::new(width, height);
        camera.set_look_at(Vec3::ZERO);

        Self {
            clock: SimClock::new(),
            fps: FpsCounter::default(),
            camera,
            camera_controller: CameraController::new(&config.movement),
            cycle: DayNightCycle::new(config.cycle.period_secs, config.cycle.lighting_refresh_secs),
            characters: config.roster(),
            blocks,
            dynamic_mesh: Mesh::empty(),
            rig: Rig::monkey(),
        }
    }

    /// Face-culled meshes of the static blocks; built once per session
    pub fn static_meshes(&self) -> SceneMeshes {
        world::compute_meshes(&self.blocks)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
    }

    /// Run one tick at platform time `now` (seconds, same base as the input
    /// event timestamps).
    pub fn tick(&mut self, input: &mut InputController, now: f64) -> FrameOutput {
        let dt = self.clock.advance(now);
        self.fps.record(dt);

        // Look
        input.expire(now);
        let look = input.consume_look();
        let sensitivity = match input.source.device_class() {
            DeviceClass::Keyboard => self.camera_controller.mouse_sensitivity,
            DeviceClass::Touch => self.camera_controller.touch_look_sensitivity,
        };
        self.camera_controller.apply_look(&mut self.camera, look, sensitivity);

        // Locomotion
        let intent = input.current_intent(now);
        self.camera_controller.tick(&mut self.camera, &intent);

        let elapsed = self.clock.elapsed() as f32;
        let sample = self.cycle.update(elapsed);

        self.rebuild_dynamic_mesh(elapsed, &sample);

        FrameOutput {
            camera: CameraUniform::from_camera(&self.camera),
            lighting: LightingUniform::from_sample(&sample),
            sky_color: sample.sky_color,
            sample,
            intent,
            dt,
        }
    }

    fn rebuild_dynamic_mesh(&mut self, elapsed: f32, sample: &CycleSample) {
        self.dynamic_mesh.clear();
        for character in &self.characters {
            let pose = character.pose(elapsed);
            self.rig.append_mesh(&pose, &mut self.dynamic_mesh);
        }
        self.dynamic_mesh.push_box_shaded(
            Mat4::from_translation(sample.celestial_position),
            Vec3::splat(CELESTIAL_SIZE),
            sample.celestial.color(),
            SHADE_EMISSIVE,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::input::{InputEvent, TouchLayout};

    fn setup() -> (Simulation, InputController) {
        let config = GameConfig::default();
        let sim = Simulation::new(&config, 800, 600);
        let input = InputController::new(DeviceClass::Keyboard, TouchLayout::new(800.0, 600.0), 300);
        (sim, input)
    }

    #[test]
    fn clock_starts_at_zero_and_clamps_stalls() {
        let mut clock = SimClock::new();
        assert_eq!(clock.advance(100.0), 0.0);
        assert_eq!(clock.elapsed(), 0.0);
        let dt = clock.advance(100.016);
        assert!((dt - 0.016).abs() < 1e-5);
        assert_eq!(clock.advance(105.0), MAX_FRAME_DT);
        assert!((clock.elapsed() - 5.0).abs() < 1e-9);
        // time never runs backwards
        assert_eq!(clock.advance(90.0), 0.0);
        assert!((clock.elapsed() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn fps_counter_averages_over_a_second() {
        let mut fps = FpsCounter::default();
        for _ in 0..60 {
            fps.record(1.0 / 60.0);
        }
        fps.record(1.0 / 60.0);
        assert!((fps.fps - 60.0).abs() < 2.0);
    }

    #[test]
    fn camera_starts_looking_at_origin() {
        let (sim, _) = setup();
        assert_eq!(sim.camera.eye, Vec3::new(0.0, 50.0, 50.0));
        let to_origin = (Vec3::ZERO - sim.camera.eye).normalize();
        assert!((sim.camera.forward() - to_origin).length() < 1e-5);
    }

    #[test]
    fn held_key_moves_camera_each_tick() {
        let (mut sim, mut input) = setup();
        let start = sim.camera.eye;
        input.handle_event(&InputEvent::KeyDown("KeyD".into()), 0.0);
        sim.tick(&mut input, 0.0);
        sim.tick(&mut input, 0.016);
        let moved = sim.camera.eye - start;
        assert!((moved.length() - 2.0 * sim.camera_controller.base_speed).abs() < 1e-4);

        input.handle_event(&InputEvent::KeyUp("KeyD".into()), 0.02);
        let before = sim.camera.eye;
        let out = sim.tick(&mut input, 0.032);
        assert_eq!(sim.camera.eye, before);
        assert_eq!(out.intent, InputState::default());
    }

    #[test]
    fn jump_lifts_camera_only_inside_window() {
        let (mut sim, mut input) = setup();
        input.handle_event(&InputEvent::KeyDown("Space".into()), 0.0);
        let y0 = sim.camera.eye.y;
        sim.tick(&mut input, 0.0);
        sim.tick(&mut input, 0.1);
        sim.tick(&mut input, 0.2);
        let y1 = sim.camera.eye.y;
        assert!((y1 - y0 - 3.0 * sim.camera_controller.jump_step).abs() < 1e-4);
        sim.tick(&mut input, 0.35);
        assert_eq!(sim.camera.eye.y, y1);
    }

    #[test]
    fn dynamic_mesh_holds_characters_and_celestial_body() {
        let (mut sim, mut input) = setup();
        sim.tick(&mut input, 1.0);
        let boxes_per_character = Rig::monkey().len() - 1;
        let expected = (sim.characters.len() * boxes_per_character + 1) * 24;
        assert_eq!(sim.dynamic_mesh.vertices.len(), expected);
        sim.tick(&mut input, 1.5);
        assert_eq!(sim.dynamic_mesh.vertices.len(), expected);
    }

    #[test]
    fn lighting_scales_with_cycle() {
        let (mut sim, mut input) = setup();
        let dawn = sim.tick(&mut input, 0.0);
        assert!((dawn.lighting.ambient - AMBIENT_BASE * 0.05).abs() < 1e-6);
        let noon = sim.tick(&mut input, 15.0);
        assert_eq!(noon.sample.light_intensity, 1.0);
        assert_eq!(noon.lighting.sun_intensity, DIRECTIONAL_BASE);
        assert_eq!(noon.sky_color, crate::model::day_night::DAY_SKY);
    }

    #[test]
    fn uniform_sizes_match_shader() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 32);
    }
}
