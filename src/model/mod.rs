// MODEL: Scene content and the pure simulation functions
pub mod block;
pub mod world;
pub mod camera;
pub mod character;
pub mod day_night;

pub use block::{Block, Material, face_dir_to_normal};
pub use camera::Camera;
pub use character::{Character, CharacterPose, Rig};
pub use day_night::{CycleSample, DayNightCycle};
