//! Request handlers for the metadata and download relay endpoints

use super::error::{ApiError, ErrorFormat, DOWNLOAD_FAILED, VIDEO_INFO_FAILED};
use super::AppState;
use crate::extractor::{
    canonical_url, distinct_quality_labels, resolve_quality, SourceMetadata, VideoInfo,
};
use crate::utils::error::TubeliftError;
use crate::utils::format::{attachment_disposition, format_duration, output_filename};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{Query, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::Deserialize;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// Content type announced for every relayed file, whatever the container
pub const RELAY_CONTENT_TYPE: &str = "video/mp4";

#[derive(Debug, Deserialize)]
pub struct VideoInfoQuery {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    pub quality: Option<String>,
}

fn required_id(video_id: Option<String>) -> Option<String> {
    video_id.filter(|id| !id.trim().is_empty())
}

/// Assemble the user-facing record from what the source returned
pub fn build_video_info(video_id: &str, meta: &SourceMetadata) -> VideoInfo {
    VideoInfo {
        id: video_id.to_string(),
        url: canonical_url(video_id),
        title: meta.title.clone(),
        description: meta.description.clone().unwrap_or_default(),
        thumbnail: meta.best_thumbnail().unwrap_or_default().to_string(),
        duration: format_duration(meta.duration_seconds),
        channel: meta.channel.clone().unwrap_or_default(),
        qualities: distinct_quality_labels(&meta.descriptors),
    }
}

/// GET /api/video-info?videoId=
pub async fn video_info(
    State(state): State<AppState>,
    Query(query): Query<VideoInfoQuery>,
) -> Result<Json<VideoInfo>, ApiError> {
    let video_id = required_id(query.video_id)
        .ok_or_else(|| ApiError::missing_video_id(ErrorFormat::Json))?;

    match state.extractor.fetch_metadata(&video_id).await {
        Ok(meta) => Ok(Json(build_video_info(&video_id, &meta))),
        Err(e) => {
            error!("Error fetching video info for {}: {:#}", video_id, e);
            Err(ApiError::upstream(ErrorFormat::Json, VIDEO_INFO_FAILED))
        }
    }
}

/// GET /api/download?videoId=&quality=
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let video_id = required_id(query.video_id)
        .ok_or_else(|| ApiError::missing_video_id(ErrorFormat::Text))?;

    let request_id = Uuid::new_v4();
    let span = info_span!("relay", %request_id, %video_id);

    relay(&state, &video_id, query.quality.as_deref())
        .instrument(span)
        .await
        .map_err(|e| {
            error!(%request_id, "Error downloading video {}: {:#}", video_id, e);
            ApiError::upstream(ErrorFormat::Text, DOWNLOAD_FAILED)
        })
}

async fn relay(state: &AppState, video_id: &str, quality: Option<&str>) -> Result<Response> {
    let permit = state
        .relay_permits
        .clone()
        .acquire_owned()
        .await
        .context("relay limiter closed")?;

    let meta = state.extractor.fetch_metadata(video_id).await?;
    let descriptor = resolve_quality(&meta.descriptors, quality)
        .ok_or_else(|| TubeliftError::NoVideoStream(video_id.to_string()))?;

    info!(
        format_id = %descriptor.format_id,
        height = ?descriptor.height,
        requested = ?quality,
        "Relaying stream"
    );

    let disposition = HeaderValue::from_str(&attachment_disposition(&output_filename(&meta.title)))
        .context("title produced an invalid Content-Disposition")?;

    let stream = state.extractor.open_stream(video_id, descriptor).await?;
    // The permit is released when the body stream is dropped
    let stream = stream.map(move |chunk| {
        let _held = &permit;
        chunk
    });

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static(RELAY_CONTENT_TYPE)),
            (CONTENT_DISPOSITION, disposition),
            (CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
