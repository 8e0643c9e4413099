//! HTTP error mapping for the API endpoints
//!
//! Internal failures never leak to the caller: handlers log the cause and
//! return one of the fixed messages below.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const MISSING_VIDEO_ID: &str = "Video ID is required";
pub const VIDEO_INFO_FAILED: &str = "Failed to fetch video information";
pub const DOWNLOAD_FAILED: &str = "Failed to download video";

/// How an error body is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFormat {
    /// `{"error": "..."}`
    Json,
    /// Bare message as `text/plain`
    Text,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// An error response with a fixed, caller-safe message
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
    format: ErrorFormat,
}

impl ApiError {
    /// 400 for a request without a usable `videoId`
    pub fn missing_video_id(format: ErrorFormat) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: MISSING_VIDEO_ID,
            format,
        }
    }

    /// 500 for anything that went wrong upstream
    pub fn upstream(format: ErrorFormat, message: &'static str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
            format,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &'static str {
        self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.format {
            ErrorFormat::Json => (
                self.status,
                Json(ErrorBody {
                    error: self.message,
                }),
            )
                .into_response(),
            ErrorFormat::Text => (self.status, self.message).into_response(),
        }
    }
}
