// ── Wire types for the IoT API ──
//
// Only the fields the bridge reads are modelled. Feature properties stay
// loosely typed because their shape varies per feature and per firmware.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `{ "data": ... }` envelope wrapping every API response.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

/// An installation (one building) with its gateways.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    pub id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub gateways: Vec<Gateway>,
}

/// A connectivity gateway (Vitoconnect, TCU, ...) and the devices behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gateway {
    pub serial: String,
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// A device behind a gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub model_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Device {
    pub fn is_online(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("online"))
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Heating appliances, as opposed to the gateway's own device entry.
    pub fn is_heating(&self) -> bool {
        self.device_type.as_deref() == Some("heating")
    }
}

/// One named feature of a device, e.g. `heating.sensors.temperature.outside`.
///
/// Properties are keyed by name, each an object with `type` and `value`
/// (and sometimes `unit`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub feature: String,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl Feature {
    fn property_value(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)?.get("value")
    }

    pub fn number(&self, property: &str) -> Option<f64> {
        self.property_value(property)?.as_f64()
    }

    pub fn boolean(&self, property: &str) -> Option<bool> {
        self.property_value(property)?.as_bool()
    }

    pub fn string(&self, property: &str) -> Option<&str> {
        self.property_value(property)?.as_str()
    }

    /// Sensor features carry a `status` property; anything other than
    /// `connected` means the reading is stale or missing.
    pub fn is_sensor_connected(&self) -> bool {
        self.string("status").is_none_or(|s| s == "connected")
    }
}
