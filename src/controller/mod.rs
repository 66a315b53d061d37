// CONTROLLER: Input, locomotion, and the per-frame simulation tick
pub mod input;
pub mod locomotion;
pub mod frame_loop;

pub use input::{DeviceClass, InputController, InputEvent, InputState, KeyBindings, TouchLayout};
pub use locomotion::CameraController;
pub use frame_loop::{CameraUniform, FrameOutput, LightingUniform, SimClock, Simulation};
