use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmotionError {
    // Request validation
    #[error("The input data is inconsistent with expectations: {0}")]
    InvalidInput(String),

    // Artifact access
    #[error("Failed to access {path:?}: {source}")]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Vocabulary format error: {0}")]
    VocabFormat(String),

    #[error("Model weights not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid model format: {0}")]
    ModelFormat(String),

    // Word segmentation
    #[error("Word segmentation failed: {0}")]
    Segmentation(String),

    // Network/Download
    #[error("Download failed: {0}")]
    Download(String),

    // Device
    #[error("Device error: {0}")]
    Device(String),

    // Pass-through from dependencies
    #[error(transparent)]
    Candle(#[from] candle_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EmotionError>;

impl From<hf_hub::api::sync::ApiError> for EmotionError {
    fn from(value: hf_hub::api::sync::ApiError) -> Self {
        EmotionError::Download(value.to_string())
    }
}

impl EmotionError {
    /// Wrap an io error with the path that produced it.
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EmotionError::FileAccess {
            path: path.into(),
            source,
        }
    }
}
