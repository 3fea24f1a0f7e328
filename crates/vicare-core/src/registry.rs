// ── Channel registry ──
//
// The declared channel table and its one-time reconciliation with the
// host. Existing channels are never modified or deleted; the existence
// check against the host is the only de-duplication.

use std::collections::{BTreeSet, HashSet};

use tracing::info;

use crate::error::{RegistryError, StoreError};
use crate::host::SensorStore;
use crate::model::{Channel, ChannelKey, STANDARD_CHANNELS};

#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    channels: Vec<Channel>,
}

impl ChannelRegistry {
    /// Registry over an explicit table. Duplicate keys are rejected.
    pub fn new(channels: Vec<Channel>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(channels.len());
        for channel in &channels {
            if !seen.insert(channel.key) {
                return Err(RegistryError::DuplicateKey { key: channel.key });
            }
        }
        Ok(Self { channels })
    }

    /// The nine channels the bridge publishes.
    pub fn standard() -> Self {
        Self {
            channels: STANDARD_CHANNELS.to_vec(),
        }
    }

    /// Declared channels, in display order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn get(&self, key: ChannelKey) -> Option<&Channel> {
        self.channels.iter().find(|c| c.key == key)
    }

    /// Create every declared channel missing from `existing`.
    ///
    /// Returns the keys created, in declaration order. The first store
    /// failure stops reconciliation.
    pub fn reconcile<S>(
        &self,
        existing: &BTreeSet<ChannelKey>,
        store: &S,
    ) -> Result<Vec<ChannelKey>, StoreError>
    where
        S: SensorStore + ?Sized,
    {
        let mut created = Vec::new();
        for channel in self.channels.iter().filter(|c| !existing.contains(&c.key)) {
            store.create(channel.name, channel.key, channel.kind())?;
            info!(key = %channel.key, name = channel.name, "created sensor channel");
            created.push(channel.key);
        }
        Ok(created)
    }
}
