//! Game settings
//!
//! Loaded from a JSON file next to the binary. Every field has a default,
//! so a partial file (or none at all) is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_FRAME_DELTA, MAX_SUBSTEPS, SIM_DT};
use crate::error::GameError;
use crate::games::GameVariant;

/// Default settings file name
pub const SETTINGS_FILE: &str = "arcade.json";

/// Simulation timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Fixed physics step in seconds
    pub step_size: f32,
    /// Cap on catch-up steps per frame
    pub max_steps_per_frame: u32,
    /// Longer frames are clipped to this before reaching the clock
    pub max_frame_delta: f32,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            step_size: SIM_DT,
            max_steps_per_frame: MAX_SUBSTEPS,
            max_frame_delta: MAX_FRAME_DELTA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Drop every sound request
    pub muted: bool,
    /// Start the background track when a game has one
    pub music: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            muted: false,
            music: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    /// Directory textures/sounds must exist under; `None` skips the check
    pub root: Option<PathBuf>,
    /// Platformer tile map
    pub tile_map: PathBuf,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            root: None,
            tile_map: PathBuf::from("assets/platformer.txt"),
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Which game to run
    pub variant: GameVariant,
    /// RNG seed for spawn positions
    pub seed: u64,
    pub sim: SimSettings,
    pub audio: AudioSettings,
    pub assets: AssetSettings,
    /// Frames the headless demo runs before closing
    pub headless_frames: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            variant: GameVariant::Glider,
            seed: 0x5eed,
            sim: SimSettings::default(),
            audio: AudioSettings::default(),
            assets: AssetSettings::default(),
            headless_frames: 600,
        }
    }
}

impl Settings {
    /// Create settings for one variant with everything else defaulted
    pub fn for_variant(variant: GameVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str, path: &Path) -> Result<Self, GameError> {
        serde_json::from_str(json).map_err(|source| GameError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, GameError> {
        let json = std::fs::read_to_string(path).map_err(|source| GameError::AssetRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json, path)
    }

    /// Load settings, falling back to defaults when missing or unreadable
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(GameError::AssetRead { .. }) => {
                log::info!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let s = Settings::from_json(r#"{ "variant": "Pong", "sim": { "step_size": 0.01 } }"#, Path::new("x"))
            .unwrap();
        assert_eq!(s.variant, GameVariant::Pong);
        assert_eq!(s.sim.step_size, 0.01);
        assert_eq!(s.sim.max_steps_per_frame, MAX_SUBSTEPS);
        assert!(s.audio.music);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let err = Settings::from_json("{ nope", Path::new("arcade.json")).unwrap_err();
        assert!(matches!(err, GameError::Settings { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let s = Settings::load_or_default(Path::new("/nonexistent/arcade.json"));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn test_roundtrip_default() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert_eq!(Settings::from_json(&json, Path::new("x")).unwrap(), Settings::default());
    }
}
