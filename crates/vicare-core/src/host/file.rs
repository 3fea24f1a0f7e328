// JSON-file sensor store for running the bridge standalone. The whole file
// is rewritten through a temp file and rename on every change, so a crash
// never leaves a half-written state behind.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SensorEntry, SensorStore};
use crate::error::StoreError;
use crate::model::{ChannelKey, ValueKind};

#[derive(Deserialize)]
struct StateFile {
    #[serde(default)]
    sensors: Vec<SensorEntry>,
}

#[derive(Serialize)]
struct StateFileRef<'a> {
    sensors: Vec<&'a SensorEntry>,
}

pub struct JsonFileStore {
    path: PathBuf,
    sensors: Mutex<BTreeMap<ChannelKey, SensorEntry>>,
}

impl JsonFileStore {
    /// Open the state file, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let sensors = match fs::read_to_string(&path) {
            Ok(raw) => {
                let file: StateFile =
                    serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    })?;
                file.sensors.into_iter().map(|s| (s.key, s)).collect()
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(io_error(&path, e)),
        };
        debug!(path = %path.display(), "opened sensor state file");
        Ok(Self {
            path,
            sensors: Mutex::new(sensors),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of every sensor, in key order.
    pub fn sensors(&self) -> Result<Vec<SensorEntry>, StoreError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<ChannelKey, SensorEntry>>, StoreError> {
        self.sensors.lock().map_err(|_| StoreError::Poisoned)
    }

    fn persist(&self, sensors: &BTreeMap<ChannelKey, SensorEntry>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let file = StateFileRef {
            sensors: sensors.values().collect(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| StoreError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| io_error(&self.path, e))
    }
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl SensorStore for JsonFileStore {
    fn existing_keys(&self) -> Result<BTreeSet<ChannelKey>, StoreError> {
        Ok(self.lock()?.keys().copied().collect())
    }

    fn create(&self, name: &str, key: ChannelKey, kind: ValueKind) -> Result<(), StoreError> {
        let mut sensors = self.lock()?;
        if sensors.contains_key(&key) {
            return Err(StoreError::AlreadyExists { key });
        }
        let mut staged = sensors.clone();
        staged.insert(key, SensorEntry::new(name, key, kind));
        self.persist(&staged)?;
        *sensors = staged;
        Ok(())
    }

    fn update(&self, key: ChannelKey, numeric: i32, value: &str) -> Result<(), StoreError> {
        let mut sensors = self.lock()?;
        let mut staged = sensors.clone();
        staged
            .get_mut(&key)
            .ok_or(StoreError::UnknownChannel { key })?
            .apply(numeric, value);
        self.persist(&staged)?;
        *sensors = staged;
        Ok(())
    }
}
