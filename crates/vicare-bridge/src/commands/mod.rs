pub mod channels;
pub mod config_cmd;
pub mod once;
pub mod run;
pub mod status;

use vicare_config::Config;
use vicare_core::{
    Bridge, BridgeConfig, ChannelRegistry, SensorStore, ViessmannApi, ViessmannAppliance,
};

use crate::error::CliError;

/// Build and start a bridge over `store`, turning a startup failure into
/// a CLI error.
pub(crate) async fn start_bridge<S: SensorStore>(
    cfg: &Config,
    store: S,
) -> Result<(Bridge<ViessmannAppliance, S>, BridgeConfig), CliError> {
    let bridge_cfg = vicare_config::to_bridge_config(cfg)?;
    let api = ViessmannApi::new(&bridge_cfg);
    let bridge = Bridge::start(&api, &bridge_cfg, ChannelRegistry::standard(), store).await;
    if let Some(err) = bridge.failure() {
        return Err(CliError::from(err));
    }
    Ok((bridge, bridge_cfg))
}
