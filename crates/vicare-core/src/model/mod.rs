// ── Domain model ──
//
// Channels (host-side sensors), the appliance attributes that feed them,
// and the per-cycle readings that flow between the two.

mod attribute;
mod channel;
mod reading;

pub use attribute::Attribute;
pub use channel::{Channel, ChannelKey, STANDARD_CHANNELS, ValueKind};
pub use reading::{Reading, Value};
