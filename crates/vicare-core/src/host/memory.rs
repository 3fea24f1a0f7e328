// In-memory sensor store. Records every call, which makes it the store of
// choice for tests and dry runs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use super::{SensorEntry, SensorStore};
use crate::error::StoreError;
use crate::model::{Channel, ChannelKey, ValueKind};

/// One call made against a [`MemoryStore`], in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum StoreCall {
    Create {
        key: ChannelKey,
        name: String,
        kind: ValueKind,
    },
    Update {
        key: ChannelKey,
        numeric: i32,
        value: String,
    },
}

#[derive(Default)]
struct State {
    sensors: BTreeMap<ChannelKey, SensorEntry>,
    calls: Vec<StoreCall>,
    rejecting: BTreeSet<ChannelKey>,
    rejecting_creates: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `channels`, as if registered by an
    /// earlier run. Nothing is recorded for them.
    pub fn with_channels<'a>(channels: impl IntoIterator<Item = &'a Channel>) -> Self {
        let sensors = channels
            .into_iter()
            .map(|c| (c.key, SensorEntry::new(c.name, c.key, c.kind())))
            .collect();
        Self {
            state: Mutex::new(State {
                sensors,
                ..State::default()
            }),
        }
    }

    /// Make every future update of `key` fail, as a host would for a sensor
    /// it refuses to write.
    pub fn reject_updates(&self, key: ChannelKey) -> Result<(), StoreError> {
        self.lock()?.rejecting.insert(key);
        Ok(())
    }

    /// Make every future create fail.
    pub fn reject_creates(&self) -> Result<(), StoreError> {
        self.lock()?.rejecting_creates = true;
        Ok(())
    }

    pub fn calls(&self) -> Result<Vec<StoreCall>, StoreError> {
        Ok(self.lock()?.calls.clone())
    }

    pub fn update_calls(&self) -> Result<Vec<StoreCall>, StoreError> {
        Ok(self
            .lock()?
            .calls
            .iter()
            .filter(|c| matches!(c, StoreCall::Update { .. }))
            .cloned()
            .collect())
    }

    pub fn sensor(&self, key: ChannelKey) -> Result<Option<SensorEntry>, StoreError> {
        Ok(self.lock()?.sensors.get(&key).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl SensorStore for MemoryStore {
    fn existing_keys(&self) -> Result<BTreeSet<ChannelKey>, StoreError> {
        Ok(self.lock()?.sensors.keys().copied().collect())
    }

    fn create(&self, name: &str, key: ChannelKey, kind: ValueKind) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.calls.push(StoreCall::Create {
            key,
            name: name.to_owned(),
            kind,
        });
        if state.rejecting_creates {
            return Err(StoreError::Rejected {
                key,
                reason: "sensor creation disabled".into(),
            });
        }
        if state.sensors.contains_key(&key) {
            return Err(StoreError::AlreadyExists { key });
        }
        state.sensors.insert(key, SensorEntry::new(name, key, kind));
        Ok(())
    }

    fn update(&self, key: ChannelKey, numeric: i32, value: &str) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.calls.push(StoreCall::Update {
            key,
            numeric,
            value: value.to_owned(),
        });
        if state.rejecting.contains(&key) {
            return Err(StoreError::Rejected {
                key,
                reason: "sensor is read-only".into(),
            });
        }
        let entry = state
            .sensors
            .get_mut(&key)
            .ok_or(StoreError::UnknownChannel { key })?;
        entry.apply(numeric, value);
        Ok(())
    }
}
