// ── Attribute fetcher ──
//
// Turns one typed capability call into a `Reading`. Attribute-level
// trouble is downgraded to `Absent` here so nothing above has to care why a
// value is missing; only a broken session escapes.

use tracing::debug;

use crate::appliance::AttributeSource;
use crate::error::{CycleError, SourceError};
use crate::model::{Attribute, Reading, Value};

/// Read one attribute.
///
/// Unknown values are `Absent`, never a default: a burner whose state the
/// API cannot tell is not reported as off.
pub async fn fetch<A>(source: &A, attribute: Attribute) -> Result<Reading, CycleError>
where
    A: AttributeSource + ?Sized,
{
    let result = match attribute {
        Attribute::OutsideTemperature => number(source.outside_temperature().await),
        Attribute::RoomTemperature => number(source.room_temperature().await),
        Attribute::HotWaterStorageTemperature => {
            number(source.hot_water_storage_temperature().await)
        }
        Attribute::HotWaterSetpoint => number(source.hot_water_setpoint().await),
        Attribute::SupplyTemperature => number(source.supply_temperature().await),
        Attribute::DesiredTemperature => number(source.desired_temperature().await),
        Attribute::BoilerTemperature => number(source.boiler_temperature().await),
        Attribute::BurnerActive => source.burner_active().await.map(|v| v.map(Value::Flag)),
        Attribute::ActiveProgram => source.active_program().await.map(|v| v.map(Value::Text)),
    };

    match result {
        Ok(Some(value)) => Ok(Reading::Present(value)),
        Ok(None) => {
            debug!(%attribute, "no value reported");
            Ok(Reading::Absent)
        }
        Err(SourceError::Unavailable { reason }) => {
            debug!(%attribute, %reason, "attribute unavailable");
            Ok(Reading::Absent)
        }
        Err(SourceError::Session { reason }) => Err(CycleError::SessionLost { reason }),
    }
}

fn number(result: Result<Option<f64>, SourceError>) -> Result<Option<Value>, SourceError> {
    result.map(|v| v.map(Value::Number))
}
