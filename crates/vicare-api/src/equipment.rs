// Equipment and feature endpoints
//
// Installation discovery and single-feature reads. Installations nest
// gateways which nest devices; callers mostly want the flattened list of
// devices together with the ids needed to address their features.

use tracing::debug;

use crate::client::ViessmannClient;
use crate::error::Error;
use crate::models::{DataEnvelope, Device, Feature, Installation};

/// A device plus the installation and gateway it hangs off.
#[derive(Debug, Clone)]
pub struct DeviceRef {
    pub installation_id: i64,
    pub gateway_serial: String,
    pub device: Device,
}

impl DeviceRef {
    fn feature_path(&self, feature: &str) -> String {
        format!(
            "features/installations/{}/gateways/{}/devices/{}/features/{feature}",
            self.installation_id, self.gateway_serial, self.device.id
        )
    }
}

impl ViessmannClient {
    /// List installations with their gateways and devices.
    ///
    /// `GET equipment/installations?includeGateways=true`
    pub async fn list_installations(&self) -> Result<Vec<Installation>, Error> {
        let mut url = self.api_url("equipment/installations")?;
        url.query_pairs_mut().append_pair("includeGateways", "true");
        debug!("listing installations");
        let envelope: DataEnvelope<Vec<Installation>> = self.get(url).await?;
        Ok(envelope.data)
    }

    /// All devices across all installations, in API order.
    pub async fn list_devices(&self) -> Result<Vec<DeviceRef>, Error> {
        let installations = self.list_installations().await?;
        let devices = installations
            .into_iter()
            .flat_map(|inst| {
                let installation_id = inst.id;
                inst.gateways.into_iter().flat_map(move |gw| {
                    let serial = gw.serial;
                    gw.devices.into_iter().map(move |device| DeviceRef {
                        installation_id,
                        gateway_serial: serial.clone(),
                        device,
                    })
                })
            })
            .collect();
        Ok(devices)
    }

    /// Read a single feature of a device.
    ///
    /// `GET features/installations/{i}/gateways/{g}/devices/{d}/features/{name}`
    ///
    /// A 404 (or an error body typed `FEATURE_NOT_FOUND`) becomes
    /// [`Error::FeatureNotFound`]: the device model does not expose it.
    pub async fn feature(&self, device: &DeviceRef, name: &str) -> Result<Feature, Error> {
        let url = self.api_url(&device.feature_path(name))?;
        match self.get::<DataEnvelope<Feature>>(url).await {
            Ok(envelope) => Ok(envelope.data),
            Err(Error::NotFound { .. }) => Err(Error::FeatureNotFound {
                feature: name.to_owned(),
            }),
            Err(e) if e.api_error_type() == Some("FEATURE_NOT_FOUND") => {
                Err(Error::FeatureNotFound {
                    feature: name.to_owned(),
                })
            }
            Err(e) => Err(e),
        }
    }
}
