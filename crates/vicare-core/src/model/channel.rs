// ── Channel identity and the standard channel table ──

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::Attribute;

// ── ChannelKey ──────────────────────────────────────────────────────

/// Stable host-side identifier of a channel.
///
/// Keys are declared explicitly, never derived from table position: a key
/// once handed to the host must keep meaning the same sensor forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelKey(u8);

impl ChannelKey {
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl From<u8> for ChannelKey {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── ValueKind ───────────────────────────────────────────────────────

/// How a channel's value is encoded for the host.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum ValueKind {
    Numeric,
    Text,
    BooleanAsText,
}

impl ValueKind {
    /// The host's sensor type name used when the channel is created.
    pub const fn host_type_name(self) -> &'static str {
        match self {
            Self::Numeric => "Temperature",
            Self::Text | Self::BooleanAsText => "Text",
        }
    }
}

// ── Channel ─────────────────────────────────────────────────────────

/// One host sensor and the attribute that feeds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub key: ChannelKey,
    pub name: &'static str,
    pub attribute: Attribute,
}

impl Channel {
    pub const fn new(key: u8, name: &'static str, attribute: Attribute) -> Self {
        Self {
            key: ChannelKey::new(key),
            name,
            attribute,
        }
    }

    pub const fn kind(&self) -> ValueKind {
        self.attribute.kind()
    }
}

/// The channel table registered with the host, in display order.
pub const STANDARD_CHANNELS: [Channel; 9] = [
    Channel::new(1, "ExternalTemperature", Attribute::OutsideTemperature),
    Channel::new(2, "InternalTemperature", Attribute::RoomTemperature),
    Channel::new(3, "HotWaterTemperature", Attribute::HotWaterStorageTemperature),
    Channel::new(4, "HotWaterSetTemperature", Attribute::HotWaterSetpoint),
    Channel::new(5, "HeaterTemperature", Attribute::SupplyTemperature),
    Channel::new(6, "HeaterSetTemperature", Attribute::DesiredTemperature),
    Channel::new(7, "BoilerTemperature", Attribute::BoilerTemperature),
    Channel::new(8, "Burner", Attribute::BurnerActive),
    Channel::new(9, "HeaterProgram", Attribute::ActiveProgram),
];
