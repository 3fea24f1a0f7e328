// ── Appliance capabilities ──
//
// The bridge talks to the appliance only through these two traits. The
// Viessmann adapter implements them over `vicare-api`; tests implement
// them with scripted values.

use async_trait::async_trait;

use crate::config::Credentials;
use crate::error::SourceError;

/// Typed read access to one appliance.
///
/// Every read returns `Ok(None)` when the appliance answered but had no
/// value (sensor disconnected, program without a setpoint, unknown state),
/// `Err(SourceError::Unavailable)` when the attribute is not readable on
/// this model, and `Err(SourceError::Session)` when the session itself is
/// broken.
#[async_trait]
pub trait AttributeSource: Send + Sync {
    /// Model identifier as reported at discovery.
    fn model(&self) -> &str;

    /// Connectivity reported at discovery.
    fn is_online(&self) -> bool;

    async fn outside_temperature(&self) -> Result<Option<f64>, SourceError>;
    async fn room_temperature(&self) -> Result<Option<f64>, SourceError>;
    async fn hot_water_storage_temperature(&self) -> Result<Option<f64>, SourceError>;
    async fn hot_water_setpoint(&self) -> Result<Option<f64>, SourceError>;
    async fn supply_temperature(&self) -> Result<Option<f64>, SourceError>;
    async fn desired_temperature(&self) -> Result<Option<f64>, SourceError>;
    async fn boiler_temperature(&self) -> Result<Option<f64>, SourceError>;
    async fn burner_active(&self) -> Result<Option<bool>, SourceError>;
    async fn active_program(&self) -> Result<Option<String>, SourceError>;
}

/// Account-level access: authentication and appliance discovery.
#[async_trait]
pub trait ApplianceApi: Send + Sync {
    type Appliance: AttributeSource + 'static;

    async fn authenticate(&self, credentials: &Credentials) -> Result<(), SourceError>;

    /// Heating appliances on the account, in discovery order.
    async fn list_appliances(&self) -> Result<Vec<Self::Appliance>, SourceError>;
}
