//! yt-dlp backed stream source
//!
//! Metadata comes from `yt-dlp --dump-json`; media bytes are piped from
//! `yt-dlp -f <format_id> -o -` so nothing touches the disk.
//! Uses a configured yt-dlp path when given, otherwise searches the
//! executable's directory, `PATH`, and common install locations.

use crate::extractor::models::{canonical_url, SourceMetadata, StreamDescriptor};
use crate::extractor::traits::{ByteStream, Extractor};
use crate::utils::error::TubeliftError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{future, stream, StreamExt};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as AsyncCommand;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

/// Subset of the yt-dlp JSON dump we rely on
#[derive(Debug, Deserialize)]
struct YtDlpVideo {
    id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    thumbnails: Vec<YtDlpThumbnail>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    formats: Vec<YtDlpFormat>,
}

#[derive(Debug, Deserialize)]
struct YtDlpThumbnail {
    url: String,
    #[serde(default)]
    preference: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    format_id: String,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    tbr: Option<f32>,
}

impl From<YtDlpVideo> for SourceMetadata {
    fn from(video: YtDlpVideo) -> Self {
        // yt-dlp lists thumbnails worst to best, but only `preference` is authoritative
        let mut thumbnails = video.thumbnails;
        thumbnails.sort_by_key(|t| t.preference.unwrap_or(i64::MIN));
        let mut thumbnails: Vec<String> = thumbnails.into_iter().map(|t| t.url).collect();
        if thumbnails.is_empty() {
            thumbnails.extend(video.thumbnail);
        }

        let descriptors = video
            .formats
            .into_iter()
            .map(|f| {
                let mut descriptor = StreamDescriptor::new(
                    f.format_id,
                    f.height,
                    f.ext.unwrap_or_default(),
                    f.vcodec,
                    f.acodec,
                );
                descriptor.tbr = f.tbr;
                descriptor
            })
            .collect();

        SourceMetadata {
            id: video.id,
            title: video.title,
            description: video.description,
            duration_seconds: video.duration.map(|d| d.max(0.0) as u64).unwrap_or(0),
            thumbnails,
            channel: video.channel.or(video.uploader),
            descriptors,
        }
    }
}

/// Parse one `--dump-json` document
fn parse_dump(json: &str) -> Result<SourceMetadata> {
    let video: YtDlpVideo = serde_json::from_str(json).map_err(TubeliftError::from)?;
    Ok(video.into())
}

/// Stream source backed by the yt-dlp binary
pub struct YtDlpExtractor {
    ytdlp_path: PathBuf,
}

impl YtDlpExtractor {
    /// Locate yt-dlp and build the extractor
    pub fn new() -> Result<Self> {
        match find_ytdlp() {
            Some(path) => {
                info!("Found yt-dlp at: {}", path.display());
                Ok(Self { ytdlp_path: path })
            }
            None => {
                error!("yt-dlp not found anywhere!");
                Err(TubeliftError::YtDlpNotFound.into())
            }
        }
    }

    /// Use an explicit yt-dlp binary
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(TubeliftError::YtDlpNotFound.into());
        }
        Ok(Self { ytdlp_path: path })
    }

    /// Get the path to yt-dlp being used
    pub fn ytdlp_path(&self) -> &Path {
        &self.ytdlp_path
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn id(&self) -> &'static str {
        "ytdlp"
    }

    async fn fetch_metadata(&self, video_id: &str) -> Result<SourceMetadata> {
        let url = canonical_url(video_id);
        debug!("Extracting video info for URL: {}", url);

        let output = AsyncCommand::new(&self.ytdlp_path)
            .arg("--dump-json")
            .arg("--no-download")
            .arg("--no-warnings")
            .arg("--no-playlist")
            .arg(&url)
            .output()
            .await
            .context("failed to run yt-dlp")?;

        if !output.status.success() {
            let error_msg = String::from_utf8_lossy(&output.stderr);
            error!("yt-dlp extraction failed: {}", error_msg.trim());
            return Err(TubeliftError::ExtractionError(error_msg.trim().to_string()).into());
        }

        let json_str = String::from_utf8(output.stdout).context("yt-dlp emitted non-UTF-8 JSON")?;
        parse_dump(&json_str)
    }

    async fn open_stream(
        &self,
        video_id: &str,
        descriptor: &StreamDescriptor,
    ) -> Result<ByteStream> {
        let url = canonical_url(video_id);
        debug!("Opening format {} of {}", descriptor.format_id, url);

        let mut child = AsyncCommand::new(&self.ytdlp_path)
            .arg("-f")
            .arg(&descriptor.format_id)
            .arg("-o")
            .arg("-")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg("--no-playlist")
            .arg(&url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("failed to spawn yt-dlp")?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TubeliftError::StreamError("yt-dlp stdout unavailable".to_string()))?;

        let stderr_lines = child.stderr.take().map(|stderr| {
            let format_id = descriptor.format_id.clone();
            tokio::spawn(async move {
                let mut collected = String::new();
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("yt-dlp [{}]: {}", format_id, line);
                    collected.push_str(&line);
                    collected.push('\n');
                }
                collected
            })
        });

        // Once stdout closes, a failed exit turns into a stream error
        let label = format!("{}/{}", video_id, descriptor.format_id);
        let exit = async move {
            let status = child.wait().await;
            let stderr = match stderr_lines {
                Some(task) => task.await.unwrap_or_default(),
                None => String::new(),
            };
            match status {
                Ok(status) if status.success() => {
                    debug!("yt-dlp stream {} finished", label);
                    None
                }
                Ok(status) => {
                    error!("yt-dlp stream {} exited with {}", label, status);
                    Some(io::Error::other(TubeliftError::StreamError(format!(
                        "yt-dlp exited with {}: {}",
                        status,
                        stderr.trim()
                    ))))
                }
                Err(e) => {
                    error!("Failed to wait for yt-dlp stream {}: {}", label, e);
                    Some(e)
                }
            }
        };
        let tail = stream::once(exit)
            .filter_map(|failure| future::ready(failure.map(Err::<Bytes, io::Error>)));

        Ok(ReaderStream::new(stdout).chain(tail).boxed())
    }
}

// ============================================================
// yt-dlp Detection Functions
// ============================================================

/// Find yt-dlp binary with priority:
/// 1. Next to the executable
/// 2. System PATH
/// 3. Common installation paths
pub fn find_ytdlp() -> Option<PathBuf> {
    if let Some(bundled) = find_bundled_ytdlp() {
        info!("Using bundled yt-dlp: {:?}", bundled);
        return Some(bundled);
    }

    if let Some(system) = find_in_path() {
        info!("Using system yt-dlp: {:?}", system);
        return Some(system);
    }

    if let Some(common) = find_in_common_paths() {
        info!("Using yt-dlp from common path: {:?}", common);
        return Some(common);
    }

    warn!("yt-dlp not found anywhere!");
    None
}

/// Find a yt-dlp shipped alongside the executable
fn find_bundled_ytdlp() -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;

    let candidate = exe_dir.join("yt-dlp");
    if candidate.is_file() && is_executable(&candidate) {
        return Some(candidate);
    }

    None
}

/// Find yt-dlp in system PATH
fn find_in_path() -> Option<PathBuf> {
    which::which("yt-dlp").ok().filter(|path| path.exists())
}

/// Find yt-dlp in common installation paths
fn find_in_common_paths() -> Option<PathBuf> {
    let mut candidates = vec![
        // macOS Homebrew (Apple Silicon)
        PathBuf::from("/opt/homebrew/bin/yt-dlp"),
        // macOS Homebrew (Intel) and manual installs
        PathBuf::from("/usr/local/bin/yt-dlp"),
        // Distribution packages
        PathBuf::from("/usr/bin/yt-dlp"),
    ];
    // pip --user
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local").join("bin").join("yt-dlp"));
    }

    candidates
        .into_iter()
        .find(|path| path.exists() && is_executable(path))
}

/// Check if a file is executable
fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::metadata(path)
            .map(|metadata| metadata.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        path.exists()
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"{
        "id": "dQw4w9WgXcQ",
        "title": "Never Gonna Give You Up",
        "description": "The official video",
        "duration": 212.0,
        "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hq.jpg",
        "thumbnails": [
            {"url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/max.jpg", "preference": 0},
            {"url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/small.jpg", "preference": -10}
        ],
        "channel": "Rick Astley",
        "uploader": "RickAstleyVEVO",
        "formats": [
            {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "height": null},
            {"format_id": "18", "ext": "mp4", "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "height": 360, "tbr": 500.5},
            {"format_id": "137", "ext": "mp4", "vcodec": "avc1.640028", "acodec": "none", "height": 1080}
        ]
    }"#;

    #[test]
    fn test_parse_dump_maps_fields() {
        let meta = parse_dump(DUMP).expect("valid dump");
        assert_eq!(meta.id, "dQw4w9WgXcQ");
        assert_eq!(meta.title, "Never Gonna Give You Up");
        assert_eq!(meta.duration_seconds, 212);
        assert_eq!(meta.channel.as_deref(), Some("Rick Astley"));
        assert_eq!(
            meta.best_thumbnail(),
            Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/max.jpg")
        );
        assert_eq!(meta.descriptors.len(), 3);
        assert!(!meta.descriptors[0].has_video);
        assert!(meta.descriptors[1].has_video && meta.descriptors[1].has_audio);
        assert_eq!(meta.descriptors[1].tbr, Some(500.5));
        assert!(meta.descriptors[2].has_video && !meta.descriptors[2].has_audio);
    }

    #[test]
    fn test_parse_dump_minimal() {
        let meta = parse_dump(
            r#"{"id": "x", "title": "t", "thumbnail": "https://thumb", "uploader": "up"}"#,
        )
        .expect("minimal dump");
        assert_eq!(meta.duration_seconds, 0);
        assert_eq!(meta.best_thumbnail(), Some("https://thumb"));
        assert_eq!(meta.channel.as_deref(), Some("up"));
        assert!(meta.descriptors.is_empty());
    }

    #[test]
    fn test_parse_dump_rejects_garbage() {
        assert!(parse_dump("not json").is_err());
    }

    #[test]
    fn test_with_path_requires_existing_binary() {
        assert!(YtDlpExtractor::with_path("/definitely/not/here/yt-dlp").is_err());
    }

    #[test]
    fn test_find_ytdlp() {
        let result = find_ytdlp();
        println!("yt-dlp found at: {:?}", result);
        // Don't assert - yt-dlp might not be installed in CI
    }

    #[test]
    fn test_is_executable() {
        let path = PathBuf::from("/bin/sh");
        if path.exists() {
            assert!(is_executable(&path));
        }
    }

    // ============================================================
    // Streaming through a stand-in yt-dlp
    // ============================================================

    #[cfg(unix)]
    fn fake_ytdlp(dir: &Path, script: &str) -> YtDlpExtractor {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        YtDlpExtractor::with_path(path).unwrap()
    }

    async fn drain(mut stream: ByteStream) -> (Vec<u8>, Vec<io::Error>) {
        let mut data = Vec::new();
        let mut errors = Vec::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => data.extend_from_slice(&bytes),
                Err(e) => errors.push(e),
            }
        }
        (data, errors)
    }

    fn descriptor() -> StreamDescriptor {
        StreamDescriptor::new("22", Some(720), "mp4", Some("avc1".to_string()), None)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_open_stream_relays_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = fake_ytdlp(dir.path(), "printf 'complete'");

        let stream = extractor.open_stream("dQw4w9WgXcQ", &descriptor()).await.unwrap();
        let (data, errors) = drain(stream).await;

        assert_eq!(data, b"complete");
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_open_stream_fails_when_ytdlp_exits_nonzero() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = fake_ytdlp(
            dir.path(),
            "printf 'partial'; echo 'ERROR: Requested format is not available' >&2; exit 1",
        );

        let stream = extractor.open_stream("dQw4w9WgXcQ", &descriptor()).await.unwrap();
        let (data, errors) = drain(stream).await;

        assert_eq!(data, b"partial");
        assert_eq!(errors.len(), 1);
        let message = errors[0].to_string();
        assert!(message.contains("Requested format is not available"), "{}", message);
    }
}
