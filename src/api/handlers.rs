//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    state::{AppState, SpeakerInput, SpeakerPatch, SpeakerQueue},
    sync::{Controller, DisplayView},
    utils::format::format_time,
};
use super::responses::{HealthResponse, SpeakerResponse, StatusResponse, TimerResponse};

/// Body for POST /speakers/current
#[derive(Debug, Deserialize)]
pub struct CurrentRequest {
    pub index: Option<usize>,
}

/// Body for POST /speakers/move
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub from: usize,
    pub to: usize,
}

fn timer_action(
    state: &AppState,
    action: &str,
    op: fn(&mut Controller) -> bool,
) -> Result<Json<TimerResponse>, AppError> {
    let report = state.update_timer(action, op)?;
    if report.applied {
        info!("Timer {} via API, {}s remaining", action, report.remaining);
    } else {
        debug!("Timer {} ignored while {}", action, report.snapshot.status);
    }
    Ok(Json(TimerResponse::from_report(action, report)))
}

/// Handle POST /timer/start
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, AppError> {
    timer_action(&state, "start", Controller::start)
}

/// Handle POST /timer/pause
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, AppError> {
    timer_action(&state, "pause", Controller::pause)
}

/// Handle POST /timer/resume
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, AppError> {
    timer_action(&state, "resume", Controller::resume)
}

/// Handle POST /timer/stop
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, AppError> {
    timer_action(&state, "stop", Controller::stop)
}

/// Handle POST /timer/reset
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, AppError> {
    timer_action(&state, "reset", Controller::reset)
}

/// Handle GET /speakers
pub async fn list_speakers_handler(State(state): State<Arc<AppState>>) -> Result<Json<SpeakerQueue>, AppError> {
    Ok(Json(state.get_queue()?))
}

/// Handle POST /speakers - Validate and append a speaker
pub async fn add_speaker_handler(
    State(state): State<Arc<AppState>>,
    Json(input): Json<SpeakerInput>,
) -> Result<(StatusCode, Json<SpeakerResponse>), AppError> {
    let speaker = state
        .update_queue("add-speaker", |c| c.add_speaker(input))
        .inspect_err(|e| warn!("Rejected new speaker: {}", e))?;

    Ok((
        StatusCode::CREATED,
        Json(SpeakerResponse::new(
            format!("Added {}", speaker.name),
            Some(speaker),
        )),
    ))
}

/// Handle PUT /speakers/:id
pub async fn edit_speaker_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<SpeakerPatch>,
) -> Result<Json<SpeakerResponse>, AppError> {
    let speaker = state
        .update_queue("edit-speaker", |c| c.edit_speaker(&id, patch))
        .inspect_err(|e| warn!("Rejected edit of {}: {}", id, e))?;

    Ok(Json(SpeakerResponse::new(
        format!("Updated {}", speaker.name),
        Some(speaker),
    )))
}

/// Handle DELETE /speakers/:id
pub async fn delete_speaker_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SpeakerResponse>, AppError> {
    let speaker = state.update_queue("delete-speaker", |c| c.delete_speaker(&id))?;
    Ok(Json(SpeakerResponse::new(
        format!("Removed {}", speaker.name),
        Some(speaker),
    )))
}

/// Handle POST /speakers/next - Stop the timer and load the next speaker
pub async fn next_speaker_handler(State(state): State<Arc<AppState>>) -> Result<Json<SpeakerResponse>, AppError> {
    let speaker = state.update_queue("next-speaker", |c| Ok(c.load_next_speaker()))?;
    let message = match &speaker {
        Some(s) => format!("Loaded {} ({})", s.name, format_time(s.duration)),
        None => "No speakers queued".to_string(),
    };
    Ok(Json(SpeakerResponse::new(message, speaker)))
}

/// Handle POST /speakers/current - Select a speaker by position
pub async fn set_current_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CurrentRequest>,
) -> Result<Json<SpeakerResponse>, AppError> {
    let speaker = state.update_queue("select-speaker", |c| {
        c.set_current_speaker(request.index)?;
        Ok(c.current_speaker().cloned())
    })?;
    let message = match &speaker {
        Some(s) => format!("Selected {}", s.name),
        None => "Cleared current speaker".to_string(),
    };
    Ok(Json(SpeakerResponse::new(message, speaker)))
}

/// Handle POST /speakers/move - Reorder the queue
pub async fn move_speaker_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<SpeakerQueue>, AppError> {
    let queue = state.update_queue("move-speaker", |c| {
        c.move_speaker(request.from, request.to)?;
        Ok(c.queue().clone())
    })?;
    Ok(Json(queue))
}

/// Handle GET /status - Return current timer and queue status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, AppError> {
    let status = state.get_status()?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        formatted: format_time(status.remaining),
        remaining: status.remaining,
        timer: status.snapshot,
        current_speaker: status.current_speaker,
        queue_length: status.queue_length,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /display - Latest rendered frame of the display mirror
pub async fn display_handler(State(view): State<watch::Receiver<DisplayView>>) -> Json<DisplayView> {
    Json(view.borrow().clone())
}

/// Handle GET /display/stream - Server-sent events, one per rendered change
pub async fn display_stream_handler(
    State(view): State<watch::Receiver<DisplayView>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = stream::unfold((view, true), |(mut view, first)| async move {
        if !first && view.changed().await.is_err() {
            return None;
        }
        let frame = view.borrow_and_update().clone();
        let event = Event::default()
            .event("display")
            .json_data(&frame)
            .unwrap_or_else(|e| Event::default().comment(format!("encode failed: {}", e)));
        Some((Ok(event), (view, false)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
