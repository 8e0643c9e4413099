//! Client orchestrator: turns pasted text into fetched videos and downloads

pub mod api;
pub mod clipboard;
pub mod progress;
pub mod session;
pub mod urls;

use thiserror::Error;

pub use api::ApiClient;
pub use progress::{DownloadProgress, DownloadState};
pub use session::{Session, StateUpdate, VideoEntry};
pub use urls::{extract_video_urls, video_id_from_url};

/// User-facing errors raised by the orchestrator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("No valid YouTube URLs found. Please enter valid YouTube video URLs.")]
    NoValidUrls,

    #[error("Failed to fetch video information. Please check your URLs and try again.")]
    AllFetchesFailed,

    #[error("Video {0} is not in the list")]
    UnknownVideo(String),

    #[error("Video {0} is already downloading")]
    AlreadyDownloading(String),

    #[error("Failed to download video")]
    DownloadFailed,
}
