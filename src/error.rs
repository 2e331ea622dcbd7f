use std::path::PathBuf;

use kornia::image::ImageError;

/// Errors that abort overlay generation.
///
/// A column that yields fewer than three rows is not an error: the missing
/// elements are simply left out of the map.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("cannot read image {}: {reason}", path.display())]
    UnreadableInput { path: PathBuf, reason: String },

    #[error("expected {required} label boxes; found {found}. Adjust thresholds.")]
    CalibrationInfeasible { found: usize, required: usize },

    #[error("kornia image error: {0}")]
    Kornia(#[from] ImageError),

    #[error("cannot load configuration {}: {reason}", path.display())]
    ConfigFile { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
