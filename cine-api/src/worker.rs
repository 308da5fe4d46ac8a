use chrono::Utc;
use std::time::Duration;
use tracing::{error, info};

use crate::state::AppState;

/// Background sweep: expires overdue sessions and reaps pending-payment
/// bookings whose window has passed, releasing their inventory.
///
/// Deadlines are also enforced lazily on every session access; this task
/// only exists so that abandoned sessions and unpaid bookings are cleaned
/// up without anyone touching them again.
pub fn spawn_expiry_worker(state: AppState) -> tokio::task::JoinHandle<()> {
    let interval = Duration::from_secs(state.business_rules.sweep_interval_seconds);
    tokio::spawn(async move {
        info!(
            interval_seconds = interval.as_secs(),
            "Expiry worker started"
        );
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;

            let swept = state.registry.sweep_expired(Utc::now()).await;
            if swept > 0 {
                info!(swept, "Swept expired sessions");
            }

            match state.orchestrator.reap_expired_bookings().await {
                Ok(reaped) if reaped > 0 => {
                    info!(reaped, "Reaped expired pending bookings");
                }
                Ok(_) => {}
                Err(err) => error!("Booking reaper failed: {}", err),
            }
        }
    })
}
