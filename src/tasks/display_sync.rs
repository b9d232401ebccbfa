//! Display mirror background task

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::sync::{DisplayContext, SyncMessage, SyncReceiver};

/// Drive a display context: apply every delivery from either transport and
/// re-render on a local interval between deliveries.
pub async fn display_sync_task(mut context: DisplayContext) {
    info!("Starting display sync task for {}", context.id);

    let mut render = interval(context.render_period);
    render.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            message = next_message(&mut context.messages) => match message {
                Some(message) => {
                    context.mirror.apply_message(&message);
                    context.render();
                }
                None => {
                    debug!("Sync channel closed, {} continues on store notifications", context.id);
                    context.messages = None;
                }
            },

            change = context.changes.next() => match change {
                Some(change) => {
                    context.mirror.apply_store_change(&change);
                    context.render();
                }
                None => {
                    info!("Snapshot store closed, stopping display {}", context.id);
                    return;
                }
            },

            _ = render.tick() => context.render(),

            _ = context.view_tx.closed() => {
                info!("No viewers left, stopping display {}", context.id);
                return;
            }
        }
    }
}

async fn next_message(messages: &mut Option<SyncReceiver>) -> Option<SyncMessage> {
    match messages {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
