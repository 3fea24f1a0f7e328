//! Bridge between a Viessmann heating appliance and a host automation
//! runtime's sensor store.
//!
//! - **[`Bridge`]**: application context built once at startup.
//!   [`Bridge::start`] initializes the [`Session`] and reconciles the
//!   [`ChannelRegistry`] with the host; [`Bridge::tick`] runs one sync
//!   cycle. A bridge whose startup failed stays disabled and every tick is
//!   a logged no-op.
//!
//! - **Sync cycle** ([`sync::run`]) reads every attribute through the
//!   [`AttributeSource`] capability first, then issues one host update per
//!   present value. A session failure during the read phase leaves the
//!   host untouched.
//!
//! - **Host side** ([`SensorStore`]): `existing_keys` / `create` /
//!   `update`, with a recording [`MemoryStore`] and a persistent
//!   [`JsonFileStore`].
//!
//! - **Appliance side** ([`ApplianceApi`], [`AttributeSource`]),
//!   implemented for Viessmann by [`ViessmannApi`] over `vicare-api`.

pub mod appliance;
pub mod bridge;
pub mod config;
pub mod error;
pub mod fetch;
pub mod heartbeat;
pub mod host;
pub mod model;
pub mod registry;
pub mod session;
pub mod sync;
pub mod viessmann;

#[cfg(test)]
mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use appliance::{ApplianceApi, AttributeSource};
pub use bridge::{Bridge, BridgeState, DISABLED_HEARTBEAT, TickOutcome};
pub use config::{BridgeConfig, Credentials, DEFAULT_POLL_INTERVAL};
pub use error::{
    ChannelError, CycleError, ErrorCategory, InitError, RegistryError, SourceError, StoreError,
};
pub use fetch::fetch;
pub use heartbeat::{run_heartbeat, spawn_heartbeat};
pub use host::{JsonFileStore, MemoryStore, SensorEntry, SensorStore, StoreCall};
pub use model::{Attribute, Channel, ChannelKey, Reading, STANDARD_CHANNELS, Value, ValueKind};
pub use registry::ChannelRegistry;
pub use session::{Session, initialize};
pub use sync::{ChannelOutcome, ChannelStatus, CycleReport};
pub use viessmann::{HeatingProfile, ViessmannApi, ViessmannAppliance};
pub use vicare_api::Endpoints;
