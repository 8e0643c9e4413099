//! In-memory list of fetched videos and their download states

use crate::client::api::ApiClient;
use crate::client::progress::{DownloadProgress, DownloadState};
use crate::client::urls::extract_video_urls;
use crate::client::ClientError;
use crate::extractor::VideoInfo;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, Mutex, Semaphore};
use tracing::{info, warn};

/// Quality requested when a video lists no labels; the server falls back to the best stream
pub const FALLBACK_QUALITY: &str = "highest";

/// One video in the session list
#[derive(Debug, Clone)]
pub struct VideoEntry {
    pub info: VideoInfo,
    pub selected_quality: String,
    pub state: DownloadState,
}

impl VideoEntry {
    pub fn new(info: VideoInfo) -> Self {
        let selected_quality = info
            .qualities
            .first()
            .cloned()
            .unwrap_or_else(|| FALLBACK_QUALITY.to_string());
        Self {
            info,
            selected_quality,
            state: DownloadState::Idle,
        }
    }
}

/// State change notification for observers of a session
#[derive(Debug, Clone)]
pub struct StateUpdate {
    pub video_id: String,
    pub state: DownloadState,
}

/// Client-side orchestrator: pasted text in, videos and downloads out
pub struct Session {
    api: ApiClient,
    input: Mutex<String>,
    videos: Mutex<Vec<VideoEntry>>,
    download_slots: Semaphore,
    updates: Option<mpsc::Sender<StateUpdate>>,
}

impl Session {
    pub fn new(api: ApiClient, max_concurrent_downloads: usize) -> Self {
        Self {
            api,
            input: Mutex::new(String::new()),
            videos: Mutex::new(Vec::new()),
            download_slots: Semaphore::new(max_concurrent_downloads.max(1)),
            updates: None,
        }
    }

    /// Report every download state change on `tx`
    pub fn with_updates(mut self, tx: mpsc::Sender<StateUpdate>) -> Self {
        self.updates = Some(tx);
        self
    }

    pub async fn set_input(&self, text: impl Into<String>) {
        *self.input.lock().await = text.into();
    }

    pub async fn input(&self) -> String {
        self.input.lock().await.clone()
    }

    /// Snapshot of the list, newest first
    pub async fn videos(&self) -> Vec<VideoEntry> {
        self.videos.lock().await.clone()
    }

    pub async fn entry(&self, video_id: &str) -> Option<VideoEntry> {
        self.videos
            .lock()
            .await
            .iter()
            .find(|v| v.info.id == video_id)
            .cloned()
    }

    /// Fetch info for every URL in the pending input.
    ///
    /// Requests run concurrently and individual failures are skipped. New
    /// videos go to the front of the list and the input is cleared.
    pub async fn submit(&self) -> Result<Vec<VideoInfo>, ClientError> {
        let input = self.input().await;
        let urls = extract_video_urls(&input);
        if urls.is_empty() {
            return Err(ClientError::NoValidUrls);
        }

        let results = join_all(urls.iter().map(|url| self.api.fetch_video_info(url))).await;

        let mut fetched = Vec::with_capacity(results.len());
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(info) => fetched.push(info),
                Err(e) => warn!("Failed to fetch info for {}: {:#}", url, e),
            }
        }

        if fetched.is_empty() {
            return Err(ClientError::AllFetchesFailed);
        }

        {
            let mut videos = self.videos.lock().await;
            videos.splice(0..0, fetched.iter().cloned().map(VideoEntry::new));
        }
        self.input.lock().await.clear();

        info!("Added {} of {} videos", fetched.len(), urls.len());
        Ok(fetched)
    }

    /// Replace the input and submit it
    pub async fn submit_text(&self, text: impl Into<String>) -> Result<Vec<VideoInfo>, ClientError> {
        self.set_input(text).await;
        self.submit().await
    }

    /// Change the quality a video will be downloaded at
    pub async fn select_quality(&self, video_id: &str, quality: &str) -> Result<(), ClientError> {
        let mut videos = self.videos.lock().await;
        let entry = videos
            .iter_mut()
            .find(|v| v.info.id == video_id)
            .ok_or_else(|| ClientError::UnknownVideo(video_id.to_string()))?;
        if entry.state.is_downloading() {
            return Err(ClientError::AlreadyDownloading(video_id.to_string()));
        }
        entry.selected_quality = quality.to_string();
        Ok(())
    }

    /// Drop a video from the list in any state.
    ///
    /// A transfer already in flight keeps running; its results are discarded.
    pub async fn remove(&self, video_id: &str) -> bool {
        let mut videos = self.videos.lock().await;
        let before = videos.len();
        videos.retain(|v| v.info.id != video_id);
        videos.len() != before
    }

    /// Download a listed video at its selected quality into `dest_dir`.
    pub async fn download(&self, video_id: &str, dest_dir: &Path) -> Result<PathBuf, ClientError> {
        let (title, quality) = {
            let mut videos = self.videos.lock().await;
            let entry = videos
                .iter_mut()
                .find(|v| v.info.id == video_id)
                .ok_or_else(|| ClientError::UnknownVideo(video_id.to_string()))?;
            if entry.state.is_downloading() {
                return Err(ClientError::AlreadyDownloading(video_id.to_string()));
            }
            entry.state = DownloadState::Downloading(DownloadProgress::new(None));
            (entry.info.title.clone(), entry.selected_quality.clone())
        };
        self.notify(video_id, DownloadState::Downloading(DownloadProgress::new(None)))
            .await;

        let result = match self.download_slots.acquire().await {
            Ok(_slot) => self.transfer(video_id, &quality, &title, dest_dir).await,
            Err(e) => Err(anyhow::Error::from(e)),
        };

        match result {
            Ok(path) => {
                info!("Downloaded {} to {}", video_id, path.display());
                self.set_state(video_id, DownloadState::Completed(path.clone()))
                    .await;
                Ok(path)
            }
            Err(e) => {
                warn!("Download error for {}: {:#}", video_id, e);
                let err = ClientError::DownloadFailed;
                self.set_state(video_id, DownloadState::Error(err.to_string()))
                    .await;
                Err(err)
            }
        }
    }

    async fn transfer(
        &self,
        video_id: &str,
        quality: &str,
        title: &str,
        dest_dir: &Path,
    ) -> anyhow::Result<PathBuf> {
        let (progress_tx, mut progress_rx) = mpsc::channel(32);
        let transfer = self
            .api
            .download_video(video_id, Some(quality), title, dest_dir, progress_tx);
        let track = async {
            while let Some(progress) = progress_rx.recv().await {
                self.set_state(video_id, DownloadState::Downloading(progress))
                    .await;
            }
        };

        let (result, ()) = tokio::join!(transfer, track);
        result
    }

    async fn set_state(&self, video_id: &str, state: DownloadState) {
        {
            let mut videos = self.videos.lock().await;
            match videos.iter_mut().find(|v| v.info.id == video_id) {
                Some(entry) => entry.state = state.clone(),
                // Removed while in flight
                None => return,
            }
        }
        self.notify(video_id, state).await;
    }

    async fn notify(&self, video_id: &str, state: DownloadState) {
        if let Some(tx) = &self.updates {
            let _ = tx
                .send(StateUpdate {
                    video_id: video_id.to_string(),
                    state,
                })
                .await;
        }
    }
}
