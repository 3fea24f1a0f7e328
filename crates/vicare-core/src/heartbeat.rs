// ── Heartbeat scheduler ──
//
// Drives `Bridge::tick` on a fixed interval until cancelled. Each cycle is
// awaited before the next tick; cancellation is only observed between
// cycles.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::appliance::AttributeSource;
use crate::bridge::{Bridge, DISABLED_HEARTBEAT, TickOutcome};
use crate::host::SensorStore;

/// Spawn the heartbeat loop at the bridge's requested interval (or the
/// host default for a disabled bridge).
pub fn spawn_heartbeat<A, S>(bridge: Arc<Bridge<A, S>>, cancel: CancellationToken) -> JoinHandle<()>
where
    A: AttributeSource + 'static,
    S: SensorStore + 'static,
{
    let period = bridge.heartbeat().unwrap_or(DISABLED_HEARTBEAT);
    tokio::spawn(run_heartbeat(bridge, period, cancel))
}

pub async fn run_heartbeat<A, S>(bridge: Arc<Bridge<A, S>>, period: Duration, cancel: CancellationToken)
where
    A: AttributeSource + 'static,
    S: SensorStore,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let TickOutcome::Completed(report) = bridge.tick().await {
                    debug!(updated = report.updated(), "heartbeat");
                }
            }
        }
    }
    debug!("heartbeat stopped");
}
