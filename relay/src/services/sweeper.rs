//! Idle room sweeper.
//!
//! DESIGN
//! ======
//! Rooms emptied by a leave are deleted on the spot. Rooms created over REST
//! and never joined have no leave to trigger that, so a background task
//! wakes every `sweep_interval` and removes rooms that are empty and idle
//! longer than `room_idle_grace`. Stroke TTL expiry stays lazy on ingest.

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::state::AppState;

/// Spawn the background sweeper. Returns a handle for shutdown.
pub fn spawn_sweeper(state: AppState) -> JoinHandle<()> {
    let interval = state.config.sweep_interval;
    info!(interval_secs = interval.as_secs(), grace_secs = state.config.room_idle_grace.as_secs(), "room sweeper configured");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            sweep_idle_rooms(&state, frames::now_ms()).await;
        }
    })
}

/// Remove empty rooms idle past the grace period. Returns how many went.
pub async fn sweep_idle_rooms(state: &AppState, now: i64) -> usize {
    let grace_ms = state.config.room_idle_grace_ms();
    let mut rooms = state.rooms.write().await;
    let before = rooms.len();
    rooms.retain(|room_id, room| {
        let idle = room.users.is_empty() && now.saturating_sub(room.last_active) > grace_ms;
        if idle {
            info!(%room_id, "idle room swept");
        }
        !idle
    });
    before - rooms.len()
}

#[cfg(test)]
#[path = "sweeper_test.rs"]
mod tests;
