// ── Viessmann adapter ──
//
// Implements the appliance capabilities over `vicare-api`. Each attribute
// maps to one feature read; which feature backs the burner and boiler
// attributes depends on the heating profile picked at discovery.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use strum::Display;
use tracing::debug;
use vicare_api::{Device, DeviceRef, Endpoints, Feature, TransportConfig, ViessmannClient};

use crate::appliance::{ApplianceApi, AttributeSource};
use crate::config::{BridgeConfig, Credentials};
use crate::error::SourceError;

// ── Feature names ────────────────────────────────────────────────────

const OUTSIDE: &str = "heating.sensors.temperature.outside";
const ROOM: &str = "heating.circuits.0.sensors.temperature.room";
const DHW_STORAGE: &str = "heating.dhw.sensors.temperature.hotWaterStorage";
const DHW_MAIN: &str = "heating.dhw.temperature.main";
const SUPPLY: &str = "heating.circuits.0.sensors.temperature.supply";
const BOILER: &str = "heating.boiler.sensors.temperature.main";
const BURNER: &str = "heating.burners.0";
const COMPRESSOR: &str = "heating.compressors.0";
const ACTIVE_PROGRAM: &str = "heating.circuits.0.operating.programs.active";
const PROGRAM_PREFIX: &str = "heating.circuits.0.operating.programs.";

/// Programs that carry no temperature setpoint.
const IDLE_PROGRAMS: [&str; 2] = ["standby", "off"];

// ── HeatingProfile ───────────────────────────────────────────────────

/// Appliance family, chosen from device roles at discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum HeatingProfile {
    Boiler,
    HeatPump,
    Generic,
}

impl HeatingProfile {
    pub fn detect(device: &Device) -> Self {
        if device.has_role("type:heatpump") {
            Self::HeatPump
        } else if device.has_role("type:boiler") {
            Self::Boiler
        } else {
            Self::Generic
        }
    }

    fn burner_feature(self) -> &'static str {
        match self {
            Self::HeatPump => COMPRESSOR,
            Self::Boiler | Self::Generic => BURNER,
        }
    }

    fn boiler_feature(self) -> Option<&'static str> {
        match self {
            Self::HeatPump => None,
            Self::Boiler | Self::Generic => Some(BOILER),
        }
    }
}

// ── ViessmannApi ─────────────────────────────────────────────────────

/// Account-level access. The HTTP client is built on first
/// authentication, with the client id from the credentials.
pub struct ViessmannApi {
    token_path: PathBuf,
    endpoints: Endpoints,
    transport: TransportConfig,
    client: OnceLock<Arc<ViessmannClient>>,
}

impl ViessmannApi {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            token_path: config.token_path.clone(),
            endpoints: config.endpoints.clone(),
            transport: TransportConfig::default().with_timeout(config.timeout),
            client: OnceLock::new(),
        }
    }

    fn client_for(&self, credentials: &Credentials) -> Result<&Arc<ViessmannClient>, SourceError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = ViessmannClient::new(
            credentials.client_id.as_str(),
            self.token_path.clone(),
            self.endpoints.clone(),
            &self.transport,
        )?;
        Ok(self.client.get_or_init(|| Arc::new(client)))
    }
}

#[async_trait]
impl ApplianceApi for ViessmannApi {
    type Appliance = ViessmannAppliance;

    async fn authenticate(&self, credentials: &Credentials) -> Result<(), SourceError> {
        let client = self.client_for(credentials)?;
        client
            .authenticate(&credentials.username, &credentials.password)
            .await?;
        Ok(())
    }

    async fn list_appliances(&self) -> Result<Vec<ViessmannAppliance>, SourceError> {
        let client = self
            .client
            .get()
            .ok_or_else(|| SourceError::session("not authenticated"))?;
        let appliances = client
            .list_devices()
            .await?
            .into_iter()
            .filter(|d| d.device.is_heating())
            .map(|d| ViessmannAppliance::new(Arc::clone(client), d))
            .collect();
        Ok(appliances)
    }
}

// ── ViessmannAppliance ───────────────────────────────────────────────

pub struct ViessmannAppliance {
    client: Arc<ViessmannClient>,
    device: DeviceRef,
    profile: HeatingProfile,
}

impl ViessmannAppliance {
    pub fn new(client: Arc<ViessmannClient>, device: DeviceRef) -> Self {
        let profile = HeatingProfile::detect(&device.device);
        debug!(model = %device.device.model_id, %profile, "discovered heating appliance");
        Self {
            client,
            device,
            profile,
        }
    }

    pub fn profile(&self) -> HeatingProfile {
        self.profile
    }

    pub fn device(&self) -> &DeviceRef {
        &self.device
    }

    /// An enabled feature, or `None` when the API reports it disabled.
    async fn feature(&self, name: &str) -> Result<Option<Feature>, SourceError> {
        let feature = self.client.feature(&self.device, name).await?;
        Ok(feature.is_enabled.then_some(feature))
    }

    /// A temperature sensor's `value`, or `None` when it is not connected.
    async fn sensor(&self, name: &str) -> Result<Option<f64>, SourceError> {
        Ok(self
            .feature(name)
            .await?
            .filter(Feature::is_sensor_connected)
            .and_then(|f| f.number("value")))
    }
}

#[async_trait]
impl AttributeSource for ViessmannAppliance {
    fn model(&self) -> &str {
        &self.device.device.model_id
    }

    fn is_online(&self) -> bool {
        self.device.device.is_online()
    }

    async fn outside_temperature(&self) -> Result<Option<f64>, SourceError> {
        self.sensor(OUTSIDE).await
    }

    async fn room_temperature(&self) -> Result<Option<f64>, SourceError> {
        self.sensor(ROOM).await
    }

    async fn hot_water_storage_temperature(&self) -> Result<Option<f64>, SourceError> {
        self.sensor(DHW_STORAGE).await
    }

    async fn hot_water_setpoint(&self) -> Result<Option<f64>, SourceError> {
        Ok(self.feature(DHW_MAIN).await?.and_then(|f| f.number("value")))
    }

    async fn supply_temperature(&self) -> Result<Option<f64>, SourceError> {
        self.sensor(SUPPLY).await
    }

    async fn desired_temperature(&self) -> Result<Option<f64>, SourceError> {
        let Some(program) = self.active_program().await? else {
            return Ok(None);
        };
        if IDLE_PROGRAMS.contains(&program.as_str()) {
            return Ok(None);
        }
        let name = format!("{PROGRAM_PREFIX}{program}");
        Ok(self.feature(&name).await?.and_then(|f| f.number("temperature")))
    }

    async fn boiler_temperature(&self) -> Result<Option<f64>, SourceError> {
        match self.profile.boiler_feature() {
            Some(name) => self.sensor(name).await,
            None => Err(SourceError::unavailable(format!(
                "boiler temperature is not reported by {} appliances",
                self.profile
            ))),
        }
    }

    async fn burner_active(&self) -> Result<Option<bool>, SourceError> {
        Ok(self
            .feature(self.profile.burner_feature())
            .await?
            .and_then(|f| f.boolean("active")))
    }

    async fn active_program(&self) -> Result<Option<String>, SourceError> {
        Ok(self
            .feature(ACTIVE_PROGRAM)
            .await?
            .and_then(|f| f.string("value").map(str::to_owned)))
    }
}
