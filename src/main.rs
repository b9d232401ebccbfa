//! Speaker Timer - a presentation countdown kept in sync across contexts
//!
//! This is the main entry point for the speaker-timer application.

use std::sync::Arc;
use anyhow::{bail, Context};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use speaker_timer::{
    api::{create_display_router, create_router},
    config::{Config, Mode},
    state::AppState,
    sync::{Controller, DisplayContext, FileStore, MemoryStore, SnapshotStore, SyncChannel},
    tasks::{display_sync_task, timer_tick_task},
    timer::{Clock, SystemClock},
    utils::shutdown_signal,
};

fn open_store(config: &Config) -> anyhow::Result<Arc<dyn SnapshotStore>> {
    match &config.store_dir {
        Some(dir) => {
            let store = FileStore::open(dir)
                .with_context(|| format!("opening snapshot store at {}", dir.display()))?;
            Ok(Arc::new(store))
        }
        None => {
            info!("No --store-dir given, snapshots are kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Controller plus an in-process display mirror, served with the control API
fn control_app(config: &Config, store: Arc<dyn SnapshotStore>) -> Router {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let channel = SyncChannel::new(config.channel_capacity);

    let (display, view) = DisplayContext::new(
        store.as_ref(),
        Some(channel.subscribe()),
        Arc::clone(&clock),
        config.tick_period(),
    );
    tokio::spawn(display_sync_task(display));

    let controller = Controller::new(store, channel, clock);
    let state = Arc::new(AppState::new(
        controller,
        view,
        config.port,
        config.host.clone(),
        config.tick_period(),
    ));

    let tick_state = Arc::clone(&state);
    tokio::spawn(async move {
        timer_tick_task(tick_state).await;
    });

    info!("Endpoints:");
    info!("  POST /timer/{{start,pause,resume,stop,reset}}");
    info!("  GET  /speakers, POST /speakers, PUT|DELETE /speakers/:id");
    info!("  POST /speakers/{{next,current,move}}");
    info!("  GET  /status, /display, /display/stream, /health");

    create_router(state)
}

/// Standalone display following a control process through the store
fn display_app(config: &Config, store: Arc<dyn SnapshotStore>) -> Router {
    let (display, view) = DisplayContext::new(
        store.as_ref(),
        None,
        Arc::new(SystemClock),
        config.tick_period(),
    );
    tokio::spawn(async move {
        // Holds the store (and its file watcher) for the life of the task
        let _store = store;
        display_sync_task(display).await;
    });

    info!("Endpoints:");
    info!("  GET  /display, /display/stream, /health");

    create_display_router(view)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("speaker_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting speaker-timer v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: mode={:?}, host={}, port={}, tick={}ms",
        config.mode, config.host, config.port, config.tick_ms
    );

    if config.mode == Mode::Display && config.store_dir.is_none() {
        bail!("display mode needs --store-dir pointing at the control process's store");
    }

    let store = open_store(&config)?;
    let app = match config.mode {
        Mode::Control => control_app(&config, store),
        Mode::Display => display_app(&config, store),
    };

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!("Server running on http://{}", addr);

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
