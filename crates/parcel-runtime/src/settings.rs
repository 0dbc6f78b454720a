use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub queue: QueueSettings,
    #[serde(default)]
    pub chunk_processor: ChunkProcessor,
    #[serde(default)]
    pub world: WorldBounds,
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let src = fs::read_to_string(path)?;
        Self::from_toml_str(&src)
    }

    pub fn from_toml_str(src: &str) -> Result<Self, Box<dyn Error>> {
        let settings: Settings = toml::from_str(src)?;
        if settings.world.max_y < settings.world.min_y {
            return Err(format!(
                "world.max_y ({}) is below world.min_y ({})",
                settings.world.max_y, settings.world.min_y
            )
            .into());
        }
        if settings.queue.target_time_ms == 0 {
            return Err("queue.target_time_ms must be positive".into());
        }
        Ok(settings)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct QueueSettings {
    // Time per tick spent on chunk tasks, in ms
    #[serde(default = "default_target_time_ms")]
    pub target_time_ms: u64,
    #[serde(default = "default_initial_batch_size")]
    pub initial_batch_size: usize,
}
fn default_target_time_ms() -> u64 {
    65
}
fn default_initial_batch_size() -> usize {
    4
}
impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            target_time_ms: default_target_time_ms(),
            initial_batch_size: default_initial_batch_size(),
        }
    }
}
impl QueueSettings {
    #[inline]
    pub fn target_time(&self) -> Duration {
        Duration::from_millis(self.target_time_ms)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChunkProcessor {
    // Unload chunks once their task ran
    #[serde(default)]
    pub auto_trim: bool,
    #[serde(default = "default_max_tiles")]
    pub max_tiles: usize,
}
fn default_max_tiles() -> usize {
    4096
}
impl Default for ChunkProcessor {
    fn default() -> Self {
        Self {
            auto_trim: false,
            max_tiles: default_max_tiles(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct WorldBounds {
    #[serde(default = "default_min_y")]
    pub min_y: i32,
    #[serde(default = "default_max_y")]
    pub max_y: i32,
}
fn default_min_y() -> i32 {
    -64
}
fn default_max_y() -> i32 {
    319
}
impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min_y: default_min_y(),
            max_y: default_max_y(),
        }
    }
}
