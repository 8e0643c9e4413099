//! Tubelift library

pub mod backend;
pub mod client;
pub mod extractor;
pub mod utils;

// Re-export main types for easier use
pub use backend::{router, AppState};
pub use client::{ApiClient, ClientError, DownloadState, Session};
pub use extractor::{Extractor, SourceMetadata, StreamDescriptor, VideoInfo, YtDlpExtractor};
pub use utils::{AppSettings, TubeliftError};
