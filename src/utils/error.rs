//! Error handling for Tubelift

use thiserror::Error;

/// Main error type for Tubelift
#[derive(Debug, Error)]
pub enum TubeliftError {
    #[error("yt-dlp not found. Please install yt-dlp")]
    YtDlpNotFound,

    #[error("Failed to extract video info: {0}")]
    ExtractionError(String),

    #[error("No video stream available for {0}")]
    NoVideoStream(String),

    #[error("Stream failed: {0}")]
    StreamError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
