//! Progress tracking for downloads

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Progress tracking structure
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    /// Size reported by the server, if any
    pub total_bytes: Option<u64>,
    pub downloaded_bytes: u64,
    pub speed: f64, // bytes per second
    pub eta: Option<Duration>,
}

impl DownloadProgress {
    /// Create a new progress tracker
    pub fn new(total_bytes: Option<u64>) -> Self {
        Self {
            total_bytes: total_bytes.filter(|&t| t > 0),
            downloaded_bytes: 0,
            speed: 0.0,
            eta: None,
        }
    }

    /// Update progress with new data
    pub fn update(&mut self, downloaded_bytes: u64, speed: f64) {
        self.downloaded_bytes = downloaded_bytes;
        self.speed = speed;

        self.eta = match self.total_bytes {
            Some(total) if downloaded_bytes >= total => Some(Duration::from_secs(0)),
            Some(total) if speed > 0.0 => {
                let remaining = total - downloaded_bytes;
                Some(Duration::from_secs_f64(remaining as f64 / speed))
            }
            _ => None,
        };
    }

    /// Whole percentage (0-100), or `None` when the size is unknown
    pub fn percentage(&self) -> Option<u8> {
        let total = self.total_bytes?;
        let pct = (self.downloaded_bytes as f64 * 100.0 / total as f64).round();
        Some(pct.clamp(0.0, 100.0) as u8)
    }

    /// True when no total was reported and only a byte count can be shown
    pub fn is_indeterminate(&self) -> bool {
        self.total_bytes.is_none()
    }
}

/// Measures transfer speed between progress reports
#[derive(Debug)]
pub struct SpeedMeter {
    started: Instant,
}

impl SpeedMeter {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Average bytes per second since the transfer started
    pub fn average(&self, bytes: u64) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            bytes as f64 / elapsed
        } else {
            0.0
        }
    }
}

/// Per-video download state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DownloadState {
    #[default]
    Idle,
    Downloading(DownloadProgress),
    Completed(PathBuf),
    Error(String),
}

impl DownloadState {
    pub fn is_downloading(&self) -> bool {
        matches!(self, DownloadState::Downloading(_))
    }

    /// Short label for status output
    pub fn label(&self) -> &'static str {
        match self {
            DownloadState::Idle => "idle",
            DownloadState::Downloading(_) => "downloading",
            DownloadState::Completed(_) => "completed",
            DownloadState::Error(_) => "error",
        }
    }
}
