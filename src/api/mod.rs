//! HTTP API module
//!
//! Control endpoints drive the controller; display endpoints expose a
//! display mirror's rendered frames.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{state::AppState, sync::DisplayView};
use handlers::*;

/// Read-only display routes, usable under any router state
pub fn display_routes<S>(view: watch::Receiver<DisplayView>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/display", get(display_handler))
        .route("/display/stream", get(display_stream_handler))
        .with_state(view)
}

/// Create the control router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let display: Router<Arc<AppState>> = display_routes(state.display.clone());

    Router::new()
        .route("/timer/start", post(start_handler))
        .route("/timer/pause", post(pause_handler))
        .route("/timer/resume", post(resume_handler))
        .route("/timer/stop", post(stop_handler))
        .route("/timer/reset", post(reset_handler))
        .route("/speakers", get(list_speakers_handler).post(add_speaker_handler))
        .route("/speakers/next", post(next_speaker_handler))
        .route("/speakers/current", post(set_current_handler))
        .route("/speakers/move", post(move_speaker_handler))
        .route("/speakers/:id", put(edit_speaker_handler).delete(delete_speaker_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .merge(display)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Create the router for a standalone display process
pub fn create_display_router(view: watch::Receiver<DisplayView>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .merge(display_routes::<()>(view))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
