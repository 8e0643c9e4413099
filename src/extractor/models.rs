//! Data structures for video information

use serde::{Deserialize, Serialize};

/// Canonical watch-page URL for a video id
pub fn canonical_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// One encoded representation of a video, without its bytes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub format_id: String,
    pub height: Option<u32>,
    pub ext: String,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub has_video: bool,
    pub has_audio: bool,
    pub tbr: Option<f32>, // Total bitrate
}

impl StreamDescriptor {
    /// Build a descriptor, deriving the audio/video flags from the codec names.
    ///
    /// A missing or `"none"` codec means the stream does not carry that track.
    pub fn new(
        format_id: impl Into<String>,
        height: Option<u32>,
        ext: impl Into<String>,
        vcodec: Option<String>,
        acodec: Option<String>,
    ) -> Self {
        let has_video = codec_present(vcodec.as_deref());
        let has_audio = codec_present(acodec.as_deref());
        Self {
            format_id: format_id.into(),
            height,
            ext: ext.into(),
            vcodec,
            acodec,
            has_video,
            has_audio,
            tbr: None,
        }
    }

    /// Quality label for this descriptor, e.g. `1080p`
    pub fn quality_label(&self) -> Option<String> {
        self.height.map(|h| format!("{}p", h))
    }
}

fn codec_present(codec: Option<&str>) -> bool {
    matches!(codec, Some(c) if !c.is_empty() && c != "none")
}

/// Everything the stream source knows about one video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub duration_seconds: u64,
    /// Thumbnails ordered smallest to largest
    pub thumbnails: Vec<String>,
    pub channel: Option<String>,
    pub descriptors: Vec<StreamDescriptor>,
}

impl SourceMetadata {
    /// Largest thumbnail, if any
    pub fn best_thumbnail(&self) -> Option<&str> {
        self.thumbnails.last().map(String::as_str)
    }
}

/// Video information record served by the metadata endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    pub duration: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub qualities: Vec<String>,
}
