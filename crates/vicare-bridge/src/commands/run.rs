//! `run`: poll on the heartbeat until Ctrl-C.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use vicare_config::Config;
use vicare_core::{JsonFileStore, spawn_heartbeat};

use super::start_bridge;
use crate::error::CliError;

pub async fn handle(cfg: &Config) -> Result<(), CliError> {
    let store = JsonFileStore::open(cfg.state_path())?;
    let (bridge, bridge_cfg) = start_bridge(cfg, store).await?;
    let bridge = Arc::new(bridge);

    // First cycle right away; the heartbeat's first tick is one interval out.
    bridge.tick().await;

    let cancel = CancellationToken::new();
    let heartbeat = spawn_heartbeat(Arc::clone(&bridge), cancel.clone());
    info!(
        interval_secs = bridge_cfg.poll_interval.as_secs(),
        state = %cfg.state_path().display(),
        "bridge running, press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down after the current cycle");
    cancel.cancel();
    if let Err(e) = heartbeat.await {
        warn!(error = %e, "heartbeat task ended abnormally");
    }
    Ok(())
}
