//! HTTP client for the metadata and download relay endpoints

use crate::client::progress::{DownloadProgress, SpeedMeter};
use crate::client::urls::video_id_from_url;
use crate::extractor::VideoInfo;
use crate::utils::error::TubeliftError;
use crate::utils::format::{filename_from_disposition, output_filename};
use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Thin wrapper around `reqwest` for talking to a Tubelift server
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the server at `base_url`, e.g. `http://127.0.0.1:3000`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tubelift/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the info record for a canonical (or any accepted) video URL
    pub async fn fetch_video_info(&self, url: &str) -> Result<VideoInfo> {
        let video_id =
            video_id_from_url(url).ok_or_else(|| TubeliftError::InvalidUrl(url.to_string()))?;
        debug!("Fetching info for {}", video_id);

        let info = self
            .client
            .get(format!("{}/api/video-info", self.base_url))
            .query(&[("videoId", video_id.as_str())])
            .send()
            .await
            .map_err(TubeliftError::from)?
            .error_for_status()
            .map_err(TubeliftError::from)?
            .json::<VideoInfo>()
            .await
            .map_err(TubeliftError::from)?;

        Ok(info)
    }

    /// Download a video into `dest_dir`, reporting progress as bytes arrive.
    ///
    /// The file is named after the server's `Content-Disposition`, falling
    /// back to the title. A partially written file is removed on failure.
    pub async fn download_video(
        &self,
        video_id: &str,
        quality: Option<&str>,
        title: &str,
        dest_dir: &Path,
        progress_tx: mpsc::Sender<DownloadProgress>,
    ) -> Result<PathBuf> {
        let mut request = self
            .client
            .get(format!("{}/api/download", self.base_url))
            .query(&[("videoId", video_id)]);
        if let Some(quality) = quality {
            request = request.query(&[("quality", quality)]);
        }

        let response = request
            .send()
            .await
            .map_err(TubeliftError::from)?
            .error_for_status()
            .map_err(TubeliftError::from)?;

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .and_then(|name| {
                // Never let the server pick a directory
                Path::new(&name)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| output_filename(title));

        tokio::fs::create_dir_all(dest_dir)
            .await
            .with_context(|| format!("failed to create {}", dest_dir.display()))?;
        let output_path = dest_dir.join(filename);

        let mut progress = DownloadProgress::new(response.content_length());
        let _ = progress_tx.send(progress.clone()).await;

        let transfer = async {
            let file = File::create(&output_path)
                .await
                .with_context(|| format!("failed to create {}", output_path.display()))?;
            let mut writer = BufWriter::new(file);
            let meter = SpeedMeter::start();
            let mut downloaded: u64 = 0;
            let mut stream = response.bytes_stream();

            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(TubeliftError::from)?;
                writer.write_all(&chunk).await.map_err(TubeliftError::from)?;
                downloaded += chunk.len() as u64;
                progress.update(downloaded, meter.average(downloaded));
                let _ = progress_tx.send(progress.clone()).await;
            }

            writer.flush().await.map_err(TubeliftError::from)?;
            anyhow::Ok(downloaded)
        };

        match transfer.await {
            Ok(bytes) => {
                debug!("Wrote {} bytes to {}", bytes, output_path.display());
                Ok(output_path)
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&output_path).await {
                    warn!("Failed to remove partial file {}: {}", output_path.display(), rm);
                }
                Err(e)
            }
        }
    }
}
