//! Application configuration

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::utils::paths::get_downloads_dir;

/// Application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Address the relay server binds to
    pub bind_addr: SocketAddr,

    /// Explicit yt-dlp binary; discovered automatically when unset
    pub ytdlp_path: Option<PathBuf>,

    /// Maximum streams the server relays at once
    pub max_concurrent_relays: usize,

    /// Base URL the client talks to
    pub server_url: String,

    /// Maximum concurrent client downloads
    pub max_concurrent_downloads: usize,

    /// Download location
    pub download_location: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            ytdlp_path: None,
            max_concurrent_relays: 4,
            server_url: "http://127.0.0.1:3000".to_string(),
            max_concurrent_downloads: 3,
            download_location: get_downloads_dir(),
        }
    }
}

impl AppSettings {
    /// Clamp limits to sane minimums
    pub fn normalized(mut self) -> Self {
        if self.max_concurrent_relays == 0 {
            self.max_concurrent_relays = 1;
        }
        if self.max_concurrent_downloads == 0 {
            self.max_concurrent_downloads = 1;
        }
        self.server_url = self.server_url.trim_end_matches('/').to_string();
        self
    }
}
