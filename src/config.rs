use std::path::Path;

use glam::{IVec3, Vec3};
use serde::Deserialize;
use thiserror::Error;

use crate::model::character::{self, Character};

/// Environment variable naming a TOML file that overrides the defaults
pub const CONFIG_ENV: &str = "MONKECRAFT_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value: {0}")]
    Invalid(&'static str),
}

/// Largest accepted `world.size`; the terrain holds `size²` blocks
pub const MAX_WORLD_SIZE: u32 = 4096;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub size: u32,
    pub house_origin: [i32; 3],
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: 100,
            house_origin: [-4, 0, -4],
        }
    }
}

impl WorldConfig {
    pub fn house_origin(&self) -> IVec3 {
        IVec3::from_array(self.house_origin)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// World units per tick
    pub base_speed: f32,
    pub sprint_multiplier: f32,
    /// Vertical world units per tick while the jump flag is set
    pub jump_step: f32,
    pub jump_duration_ms: u32,
    pub mouse_sensitivity: f32,
    pub touch_look_sensitivity: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            base_speed: 0.1,
            sprint_multiplier: 2.0,
            jump_step: 0.1,
            jump_duration_ms: 300,
            mouse_sensitivity: 0.002,
            touch_look_sensitivity: 0.005,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    pub period_secs: f32,
    pub lighting_refresh_secs: f32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            period_secs: 30.0,
            lighting_refresh_secs: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharacterConfig {
    pub start: [f32; 3],
    #[serde(default = "default_patrol_radius")]
    pub patrol_radius: f32,
    /// Omitted phases are seeded from the roster index
    pub phase_offset: Option<f32>,
}

fn default_patrol_radius() -> f32 {
    10.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub world: WorldConfig,
    pub movement: MovementConfig,
    pub cycle: CycleConfig,
    pub characters: Vec<CharacterConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            movement: MovementConfig::default(),
            cycle: CycleConfig::default(),
            characters: character::default_roster()
                .iter()
                .map(|c| CharacterConfig {
                    start: c.start_position.to_array(),
                    patrol_radius: c.patrol_radius,
                    phase_offset: Some(c.phase_offset),
                })
                .collect(),
        }
    }
}

impl GameConfig {
    pub fn from_toml(src: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&src)
    }

    /// Load from `MONKECRAFT_CONFIG` when set, otherwise use the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                tracing::info!(%path, "loading config");
                Self::load(path)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.size == 0 {
            return Err(ConfigError::Invalid("world.size must be positive"));
        }
        if self.world.size > MAX_WORLD_SIZE {
            return Err(ConfigError::Invalid("world.size must be at most 4096"));
        }
        if !(self.cycle.period_secs > 0.0) {
            return Err(ConfigError::Invalid("cycle.period_secs must be positive"));
        }
        if self.cycle.lighting_refresh_secs < 0.0 {
            return Err(ConfigError::Invalid("cycle.lighting_refresh_secs must not be negative"));
        }
        if self.movement.sprint_multiplier < 1.0 {
            return Err(ConfigError::Invalid("movement.sprint_multiplier must be at least 1"));
        }
        Ok(())
    }

    pub fn roster(&self) -> Vec<Character> {
        self.characters
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let start = Vec3::from_array(c.start);
                match c.phase_offset {
                    Some(phase) => Character::new(start, c.patrol_radius, phase),
                    None => Character::seeded(start, c.patrol_radius, i),
                }
            })
            .collect()
    }
}
