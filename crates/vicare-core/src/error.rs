// ── Core error types ──
//
// The bridge distinguishes four failure categories. Only `Config` and
// `Init` are terminal for the process; attribute and cycle failures are
// scoped to one tick. The `From<vicare_api::Error>` impl decides which side
// of that line a transport-level failure falls on.

use strum::{Display, IntoStaticStr};
use thiserror::Error;

use crate::model::{ChannelKey, ValueKind};

/// Category tag carried by every bridge error, so callers and tests can
/// assert on the kind of failure rather than its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    /// A required credential is missing.
    Config,
    /// The API was reachable but authentication, discovery or channel
    /// registration failed.
    Init,
    /// One attribute could not be read this cycle.
    AttributeUnavailable,
    /// The session failed mid-cycle.
    Cycle,
}

// ── Appliance side ───────────────────────────────────────────────────

/// Failure reported by an appliance capability.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The attribute cannot be read right now (unsupported by this model,
    /// sensor disconnected, feature missing). Never fatal.
    #[error("attribute unavailable: {reason}")]
    Unavailable { reason: String },

    /// The session itself is unusable (connectivity, auth, unexpected
    /// response shape).
    #[error("session failure: {reason}")]
    Session { reason: String },
}

impl SourceError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn session(reason: impl Into<String>) -> Self {
        Self::Session {
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unavailable { .. } => ErrorCategory::AttributeUnavailable,
            Self::Session { .. } => ErrorCategory::Cycle,
        }
    }
}

impl From<vicare_api::Error> for SourceError {
    fn from(err: vicare_api::Error) -> Self {
        if err.is_not_found() {
            Self::Unavailable {
                reason: err.to_string(),
            }
        } else {
            Self::Session {
                reason: err.to_string(),
            }
        }
    }
}

// ── Startup ──────────────────────────────────────────────────────────

/// Why the bridge could not be enabled. Terminal until restart.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("missing required credential: {field}")]
    MissingCredential { field: &'static str },

    #[error("failed to initialize ViCare session: {reason}")]
    ConnectFailed { reason: String },

    #[error("no heating appliance found on this account")]
    NoAppliance,

    #[error("failed to register sensor channels: {0}")]
    Registry(#[from] StoreError),
}

impl InitError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingCredential { .. } => ErrorCategory::Config,
            Self::ConnectFailed { .. } | Self::NoAppliance | Self::Registry(_) => {
                ErrorCategory::Init
            }
        }
    }
}

// ── Cycle ────────────────────────────────────────────────────────────

/// A tick that was abandoned before any channel was touched.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("error fetching data from ViCare API: {reason}")]
    SessionLost { reason: String },
}

impl CycleError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Cycle
    }
}

/// Failure of a single channel within an otherwise healthy cycle.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("cannot encode {value} as {kind}")]
    Format { kind: ValueKind, value: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ── Host side ────────────────────────────────────────────────────────

/// Failure reported by a sensor store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("channel {key} is not registered")]
    UnknownChannel { key: ChannelKey },

    #[error("channel {key} already exists")]
    AlreadyExists { key: ChannelKey },

    #[error("host rejected update for channel {key}: {reason}")]
    Rejected { key: ChannelKey, reason: String },

    #[error("state file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is not valid: {message}")]
    Corrupt { path: String, message: String },

    #[error("sensor store lock poisoned")]
    Poisoned,
}

/// Invalid channel table.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("channel key {key} is declared more than once")]
    DuplicateKey { key: ChannelKey },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_attribute_level() {
        let err = SourceError::from(vicare_api::Error::FeatureNotFound {
            feature: "heating.compressors.0".into(),
        });
        assert_eq!(err.category(), ErrorCategory::AttributeUnavailable);
    }

    #[test]
    fn everything_else_is_session_level() {
        let auth = SourceError::from(vicare_api::Error::Authentication {
            message: "nope".into(),
        });
        let shape = SourceError::from(vicare_api::Error::Deserialization {
            message: "expected object".into(),
            body: "[]".into(),
        });
        let limited = SourceError::from(vicare_api::Error::RateLimited {
            retry_after_secs: 60,
        });
        for err in [auth, shape, limited] {
            assert_eq!(err.category(), ErrorCategory::Cycle, "{err}");
        }
    }

    #[test]
    fn init_categories() {
        let missing = InitError::MissingCredential { field: "username" };
        let connect = InitError::ConnectFailed {
            reason: "timeout".into(),
        };
        assert_eq!(missing.category(), ErrorCategory::Config);
        assert_eq!(connect.category(), ErrorCategory::Init);
        assert_eq!(InitError::NoAppliance.category(), ErrorCategory::Init);
        assert_eq!(ErrorCategory::AttributeUnavailable.to_string(), "attribute_unavailable");
    }
}
