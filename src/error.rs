//! Error taxonomy
//!
//! Only asset and configuration problems surface as errors. Out-of-bounds
//! tile queries are clamped and bad frame deltas are zeroed, so neither
//! ever reaches the caller.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("failed to read asset {path}: {source}")]
    AssetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("asset {name} not found")]
    AssetMissing { name: String },
    #[error("malformed tile map at line {line}: {reason}")]
    MalformedTileMap { line: usize, reason: String },
    #[error("failed to parse settings {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl GameError {
    /// Whether this error means no gameplay is possible
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GameError::Settings { .. })
    }
}
