use crate::extractor::models::{SourceMetadata, StreamDescriptor};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Raw media bytes produced by a stream source
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Core trait for stream sources
///
/// This trait isolates the relay from the specific extraction method
/// (yt-dlp, a native client, a test fake, etc.).
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns a unique identifier for this extractor (e.g., "ytdlp")
    fn id(&self) -> &'static str;

    /// Fetches metadata and the full list of stream descriptors for a video
    async fn fetch_metadata(&self, video_id: &str) -> Result<SourceMetadata>;

    /// Opens a byte stream for one specific descriptor of a video
    async fn open_stream(&self, video_id: &str, descriptor: &StreamDescriptor)
        -> Result<ByteStream>;
}
