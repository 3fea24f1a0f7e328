// ── Sync cycle ──
//
// One tick: read every attribute, then push every present value. Reads
// are sequential and all complete before the first update, so a session
// failure part-way through leaves the host untouched.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::appliance::AttributeSource;
use crate::error::{ChannelError, CycleError};
use crate::fetch::fetch;
use crate::host::SensorStore;
use crate::model::{Channel, ChannelKey, Reading, Value};

/// Integer slot passed with every update; values travel as strings.
pub const NUMERIC_FLAG: i32 = 0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelStatus {
    Updated { value: String },
    Skipped,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelOutcome {
    pub key: ChannelKey,
    pub name: &'static str,
    #[serde(flatten)]
    pub status: ChannelStatus,
}

/// What one completed cycle did, channel by channel.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub outcomes: Vec<ChannelOutcome>,
    pub completed_at: DateTime<Utc>,
}

impl CycleReport {
    pub fn outcome(&self, key: ChannelKey) -> Option<&ChannelOutcome> {
        self.outcomes.iter().find(|o| o.key == key)
    }

    pub fn updated(&self) -> usize {
        self.count(|s| matches!(s, ChannelStatus::Updated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ChannelStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ChannelStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&ChannelStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Run one cycle over `channels`.
pub async fn run<A, S>(
    source: &A,
    store: &S,
    channels: &[Channel],
) -> Result<CycleReport, CycleError>
where
    A: AttributeSource + ?Sized,
    S: SensorStore + ?Sized,
{
    let mut readings = Vec::with_capacity(channels.len());
    for channel in channels {
        readings.push(fetch(source, channel.attribute).await?);
    }

    let outcomes = channels
        .iter()
        .zip(readings)
        .map(|(channel, reading)| ChannelOutcome {
            key: channel.key,
            name: channel.name,
            status: apply(store, channel, reading),
        })
        .collect();

    Ok(CycleReport {
        outcomes,
        completed_at: Utc::now(),
    })
}

fn apply<S: SensorStore + ?Sized>(store: &S, channel: &Channel, reading: Reading) -> ChannelStatus {
    let Reading::Present(value) = reading else {
        return ChannelStatus::Skipped;
    };
    match push(store, channel, &value) {
        Ok(encoded) => {
            debug!(key = %channel.key, name = channel.name, value = %encoded, "channel updated");
            ChannelStatus::Updated { value: encoded }
        }
        Err(e) => {
            warn!(key = %channel.key, name = channel.name, error = %e, "channel update failed");
            ChannelStatus::Failed {
                reason: e.to_string(),
            }
        }
    }
}

fn push<S: SensorStore + ?Sized>(
    store: &S,
    channel: &Channel,
    value: &Value,
) -> Result<String, ChannelError> {
    let encoded = value.encode(channel.kind())?;
    store.update(channel.key, NUMERIC_FLAG, &encoded)?;
    Ok(encoded)
}
