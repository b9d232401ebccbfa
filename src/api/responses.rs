//! API response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{
    error::{AppError, SpeakerError},
    state::{app_state::TimerReport, Speaker, TimerSnapshot},
    utils::format::format_time,
};

/// API response structure for timer control endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerResponse {
    /// "ok" when the operation changed the timer, "unchanged" for a no-op
    pub status: String,
    pub action: String,
    pub applied: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
    pub remaining: i64,
    pub formatted: String,
}

impl TimerResponse {
    /// Build the response for `action` from a timer report
    pub fn from_report(action: &str, report: TimerReport) -> Self {
        let (status, message) = if report.applied {
            ("ok", format!("Timer {} applied", action))
        } else {
            (
                "unchanged",
                format!("Timer {} ignored while {}", action, report.snapshot.status),
            )
        };

        Self {
            status: status.to_string(),
            action: action.to_string(),
            applied: report.applied,
            message,
            timestamp: Utc::now(),
            formatted: format_time(report.remaining),
            remaining: report.remaining,
            timer: report.snapshot,
        }
    }
}

/// Response for speaker queue edits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub speaker: Option<Speaker>,
}

impl SpeakerResponse {
    pub fn new(message: String, speaker: Option<Speaker>) -> Self {
        Self {
            message,
            timestamp: Utc::now(),
            speaker,
        }
    }
}

/// Status response with timer and speaker information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub remaining: i64,
    pub formatted: String,
    pub current_speaker: Option<Speaker>,
    pub queue_length: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error body returned for rejected requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = match &self {
            AppError::Speaker(SpeakerError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Speaker(_) => StatusCode::BAD_REQUEST,
            AppError::Lock(_) => {
                error!("Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.to_string(),
            timestamp: Utc::now(),
        };
        (code, Json(body)).into_response()
    }
}
