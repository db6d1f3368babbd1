use crate::core_modules::ball::ball::BallColor;
use crate::error::GameError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Settings of the game session itself.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SessionConfig {
    /// Fixed RNG seed. When absent the seed is taken from the system clock.
    pub seed: Option<u64>,
}

impl SessionConfig {
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos() as u64)
                .unwrap_or_default()
        })
    }
}

/// Capture device and window settings used by the webcam runner.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub device_index: i32,
    /// Flip the feed horizontally so it behaves like a mirror.
    pub mirror: bool,
    pub window_title: String,
    /// Key code that ends the session (27 is Esc).
    pub exit_key: i32,
    pub poll_millis: i32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            mirror: true,
            window_title: "PROJECT".into(),
            exit_key: 27,
            poll_millis: 10,
        }
    }
}

/// One sprite image per ball color. Each must carry an alpha channel.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SpriteConfig {
    pub red: PathBuf,
    pub green: PathBuf,
    pub blue: PathBuf,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            red: "red2.png".into(),
            green: "green.png".into(),
            blue: "blue.png".into(),
        }
    }
}

impl SpriteConfig {
    pub fn path_for(&self, color: BallColor) -> &Path {
        match color {
            BallColor::Red => &self.red,
            BallColor::Green => &self.green,
            BallColor::Blue => &self.blue,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub camera: CameraConfig,
    pub sprites: SpriteConfig,
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, GameError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Loads `path` when given, falling back to defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, GameError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
