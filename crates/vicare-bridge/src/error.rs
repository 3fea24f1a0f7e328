//! CLI error types with miette diagnostics.
//!
//! Maps bridge startup, cycle, store and config failures into user-facing
//! errors with actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use vicare_config::ConfigError;
use vicare_core::{CycleError, InitError, StoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Startup ──────────────────────────────────────────────────────

    #[error("Missing required setting '{field}'")]
    #[diagnostic(
        code(vicare::missing_credential),
        help(
            "Set '{field}' in the config file or the {env} environment variable.\n\
             Config path: vicare-bridge config path"
        )
    )]
    MissingCredential { field: String, env: String },

    #[error("Could not initialize the ViCare session: {reason}")]
    #[diagnostic(
        code(vicare::init_failed),
        help(
            "Check username, password and client id, and that api.viessmann.com is reachable.\n\
             Store the password with: vicare-bridge config set-password"
        )
    )]
    InitFailed { reason: String },

    #[error("No heating appliance found on this ViCare account")]
    #[diagnostic(
        code(vicare::no_appliance),
        help("The account must have at least one device of type 'heating'.")
    )]
    NoAppliance,

    #[error("Could not register sensor channels: {reason}")]
    #[diagnostic(code(vicare::registry))]
    Registry { reason: String },

    // ── Cycle ────────────────────────────────────────────────────────

    #[error("Update cycle aborted: {reason}")]
    #[diagnostic(
        code(vicare::cycle_aborted),
        help("No sensors were changed. The next cycle retries from scratch.")
    )]
    CycleAborted { reason: String },

    // ── Store ────────────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(vicare::state_file),
        help("Check the state_path setting and file permissions.")
    )]
    Store(#[from] StoreError),

    // ── Configuration ────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vicare::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(vicare::config), help("Config path: {path}"))]
    Config { message: String, path: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingCredential { .. } => exit_code::AUTH,
            Self::InitFailed { .. } | Self::CycleAborted { .. } => exit_code::CONNECTION,
            Self::NoAppliance => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Registry { .. } | Self::Store(_) | Self::Config { .. } | Self::Io(_) => {
                exit_code::GENERAL
            }
        }
    }
}

// ── Core → CliError mapping ──────────────────────────────────────────

impl From<&InitError> for CliError {
    fn from(err: &InitError) -> Self {
        match err {
            InitError::MissingCredential { field } => CliError::MissingCredential {
                field: (*field).to_owned(),
                env: format!("VICARE_{}", field.to_uppercase()),
            },
            InitError::ConnectFailed { reason } => CliError::InitFailed {
                reason: reason.clone(),
            },
            InitError::NoAppliance => CliError::NoAppliance,
            InitError::Registry(e) => CliError::Registry {
                reason: e.to_string(),
            },
        }
    }
}

impl From<CycleError> for CliError {
    fn from(err: CycleError) -> Self {
        match err {
            CycleError::SessionLost { reason } => CliError::CycleAborted { reason },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config {
                message: other.to_string(),
                path: vicare_config::config_path().display().to_string(),
            },
        }
    }
}
