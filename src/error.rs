use serde_json::Error as SerdeJsonError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] SerdeJsonError),

    #[error("{tool} not found. Install it first or point the configuration at it")]
    ToolUnavailable { tool: String },

    #[error("{tool} failed ({status}):\n{stderr}")]
    ExtractionFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Skipping {path}: {reason}")]
    RecordSkipped { path: String, reason: String },

    #[error("File already exists: {0}, skipping")]
    DestinationCollision(PathBuf),

    #[error("Conversion of {path} failed: {reason}")]
    ConversionFailed { path: PathBuf, reason: String },

    #[error("Invalid aspect ratio {0:?}, expected W:H with positive integers")]
    InvalidAspectRatio(String),

    #[error("Directory not found: {0}")]
    NotADirectory(PathBuf),
}

impl AppError {
    pub fn skipped(path: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::RecordSkipped {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
