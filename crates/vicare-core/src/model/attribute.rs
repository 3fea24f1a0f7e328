use strum::{Display, EnumIter};

use super::ValueKind;

/// A logical appliance reading, independent of how a given appliance model
/// exposes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Attribute {
    OutsideTemperature,
    /// Room temperature of heating circuit 0.
    RoomTemperature,
    HotWaterStorageTemperature,
    /// Configured domestic hot water temperature.
    HotWaterSetpoint,
    /// Supply (flow) temperature of heating circuit 0.
    SupplyTemperature,
    /// Target temperature of the currently active program.
    DesiredTemperature,
    BoilerTemperature,
    /// Burner on boilers, compressor on heat pumps.
    BurnerActive,
    ActiveProgram,
}

impl Attribute {
    pub const fn kind(self) -> ValueKind {
        match self {
            Self::BurnerActive => ValueKind::BooleanAsText,
            Self::ActiveProgram => ValueKind::Text,
            Self::OutsideTemperature
            | Self::RoomTemperature
            | Self::HotWaterStorageTemperature
            | Self::HotWaterSetpoint
            | Self::SupplyTemperature
            | Self::DesiredTemperature
            | Self::BoilerTemperature => ValueKind::Numeric,
        }
    }
}
