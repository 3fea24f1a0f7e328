// ── Host sensor stores ──
//
// The host automation runtime owns the sensors. The bridge only asks which
// channels exist, creates missing ones, and pushes formatted values.

mod file;
mod memory;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{ChannelKey, ValueKind};

pub use file::JsonFileStore;
pub use memory::{MemoryStore, StoreCall};

/// Host-side sensor storage.
pub trait SensorStore: Send + Sync {
    fn existing_keys(&self) -> Result<BTreeSet<ChannelKey>, StoreError>;

    fn create(&self, name: &str, key: ChannelKey, kind: ValueKind) -> Result<(), StoreError>;

    /// Store a value. `numeric` is the host's integer slot; the bridge
    /// always passes 0 and carries the reading in `value`.
    fn update(&self, key: ChannelKey, numeric: i32, value: &str) -> Result<(), StoreError>;
}

impl<T: SensorStore + ?Sized> SensorStore for Arc<T> {
    fn existing_keys(&self) -> Result<BTreeSet<ChannelKey>, StoreError> {
        (**self).existing_keys()
    }

    fn create(&self, name: &str, key: ChannelKey, kind: ValueKind) -> Result<(), StoreError> {
        (**self).create(name, key, kind)
    }

    fn update(&self, key: ChannelKey, numeric: i32, value: &str) -> Result<(), StoreError> {
        (**self).update(key, numeric, value)
    }
}

/// A sensor as the host keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorEntry {
    pub key: ChannelKey,
    pub name: String,
    pub kind: ValueKind,
    pub type_name: String,
    #[serde(default)]
    pub numeric: i32,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SensorEntry {
    pub fn new(name: &str, key: ChannelKey, kind: ValueKind) -> Self {
        Self {
            key,
            name: name.to_owned(),
            kind,
            type_name: kind.host_type_name().to_owned(),
            numeric: 0,
            value: None,
            updated_at: None,
        }
    }

    pub(crate) fn apply(&mut self, numeric: i32, value: &str) {
        self.numeric = numeric;
        self.value = Some(value.to_owned());
        self.updated_at = Some(Utc::now());
    }
}
