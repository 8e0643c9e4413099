//! Shared fixtures: an in-memory stream source and a local test server.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tubelift::backend::{self, AppState};
use tubelift::extractor::{ByteStream, Extractor, SourceMetadata, StreamDescriptor};

pub const RICK: &str = "dQw4w9WgXcQ";
pub const GANGNAM: &str = "9bZkp7q19f0";
pub const AUDIO_ONLY: &str = "aUd1o0nLy00";
pub const BROKEN_STREAM: &str = "br0kenStr3m";
/// Sends one chunk, then stalls before sending the rest
pub const SLOW_STREAM: &str = "sl0wStr3am0";
/// Sends a few chunks, then fails
pub const CUT_STREAM: &str = "cutStr3am00";

/// How long the slow stream stalls after its first chunk
pub const SLOW_STREAM_STALL: Duration = Duration::from_millis(300);

pub fn video(format_id: &str, height: Option<u32>) -> StreamDescriptor {
    StreamDescriptor::new(
        format_id,
        height,
        "mp4",
        Some("avc1".to_string()),
        Some("mp4a".to_string()),
    )
}

pub fn audio(format_id: &str) -> StreamDescriptor {
    StreamDescriptor::new(
        format_id,
        None,
        "m4a",
        Some("none".to_string()),
        Some("mp4a".to_string()),
    )
}

pub fn metadata(id: &str, title: &str, descriptors: Vec<StreamDescriptor>) -> SourceMetadata {
    SourceMetadata {
        id: id.to_string(),
        title: title.to_string(),
        description: Some(format!("About {}", title)),
        duration_seconds: 125,
        thumbnails: vec![
            format!("https://i.ytimg.com/vi/{}/default.jpg", id),
            format!("https://i.ytimg.com/vi/{}/maxresdefault.jpg", id),
        ],
        channel: Some("Test Channel".to_string()),
        descriptors,
    }
}

/// In-memory stream source; unknown ids fail like an unavailable video
#[derive(Default)]
pub struct FakeExtractor {
    videos: HashMap<String, SourceMetadata>,
    /// (video id, format id) of every stream opened
    pub opened: Mutex<Vec<(String, String)>>,
}

impl FakeExtractor {
    pub fn new() -> Self {
        let mut fake = Self::default();
        fake.insert(metadata(
            RICK,
            "Test: Video!",
            vec![
                video("18", Some(360)),
                audio("140"),
                video("137", Some(1080)),
                video("22", Some(720)),
                video("135", Some(480)),
                video("22-dup", Some(720)),
                video("sb", None),
            ],
        ));
        fake.insert(metadata(
            GANGNAM,
            "Second clip",
            vec![video("18", Some(360)), video("22", Some(720))],
        ));
        fake.insert(metadata(AUDIO_ONLY, "Podcast", vec![audio("140"), audio("251")]));
        fake.insert(metadata(BROKEN_STREAM, "Broken", vec![video("22", Some(720))]));
        fake.insert(metadata(SLOW_STREAM, "Slow clip", vec![video("22", Some(720))]));
        fake.insert(metadata(CUT_STREAM, "Cut clip", vec![video("22", Some(720))]));
        fake
    }

    pub fn insert(&mut self, meta: SourceMetadata) {
        self.videos.insert(meta.id.clone(), meta);
    }

    pub fn opened(&self) -> Vec<(String, String)> {
        self.opened.lock().unwrap().clone()
    }
}

/// Deterministic payload for a stream so tests can compare bytes
pub fn payload(video_id: &str, format_id: &str) -> Vec<u8> {
    format!("{}:{}|", video_id, format_id).repeat(512).into_bytes()
}

#[async_trait]
impl Extractor for FakeExtractor {
    fn id(&self) -> &'static str {
        "fake"
    }

    async fn fetch_metadata(&self, video_id: &str) -> Result<SourceMetadata> {
        self.videos
            .get(video_id)
            .cloned()
            .ok_or_else(|| anyhow!("secret upstream detail: {} unavailable", video_id))
    }

    async fn open_stream(
        &self,
        video_id: &str,
        descriptor: &StreamDescriptor,
    ) -> Result<ByteStream> {
        if video_id == BROKEN_STREAM {
            return Err(anyhow!("stream refused"));
        }
        self.opened
            .lock()
            .unwrap()
            .push((video_id.to_string(), descriptor.format_id.clone()));

        let data = payload(video_id, &descriptor.format_id);
        let mut chunks: Vec<Bytes> = data.chunks(1024).map(Bytes::copy_from_slice).collect();

        match video_id {
            SLOW_STREAM => {
                let rest = chunks.split_off(1);
                let stalled = futures::stream::once(tokio::time::sleep(SLOW_STREAM_STALL))
                    .flat_map(move |()| futures::stream::iter(rest.clone()));
                Ok(futures::stream::iter(chunks)
                    .chain(stalled)
                    .map(Ok::<Bytes, std::io::Error>)
                    .boxed())
            }
            CUT_STREAM => {
                chunks.truncate(2);
                let failure = futures::stream::once(async {
                    Err(std::io::Error::other("upstream connection reset"))
                });
                Ok(futures::stream::iter(chunks)
                    .map(Ok::<Bytes, std::io::Error>)
                    .chain(failure)
                    .boxed())
            }
            _ => Ok(futures::stream::iter(chunks)
                .map(Ok::<Bytes, std::io::Error>)
                .boxed()),
        }
    }
}

/// Start the API on an ephemeral port; returns the base URL
pub async fn spawn_server(extractor: Arc<FakeExtractor>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let state = AppState::new(extractor, 4);
    tokio::spawn(async move {
        let _ = backend::serve_on(listener, state).await;
    });
    format!("http://{}", addr)
}
