//! Configuration for the ViCare bridge.
//!
//! A flat TOML file, `VICARE_`-prefixed environment overrides, password
//! resolution (env + keyring + plaintext), and translation to
//! `vicare_core::BridgeConfig`. Missing credentials are passed through as
//! empty strings: the bridge reports them, not the loader.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use vicare_core::{BridgeConfig, Credentials, Endpoints};

/// Keyring service name; the account is the ViCare username.
pub const KEYRING_SERVICE: &str = "vicare-bridge";

/// Environment variable consulted first for the password.
pub const PASSWORD_ENV: &str = "VICARE_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// ViCare account (email address).
    #[serde(default)]
    pub username: String,

    /// Plaintext password. Prefer the keyring or `VICARE_PASSWORD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// OAuth client id registered in the Viessmann developer portal.
    #[serde(default)]
    pub client_id: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default)]
    pub debug_logging: bool,

    /// OAuth token cache. Defaults to `token.save` in the data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_path: Option<PathBuf>,

    /// Sensor state file. Defaults to `state.json` in the data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Write logs to this file instead of stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: None,
            client_id: String::new(),
            poll_interval_secs: default_poll_interval(),
            debug_logging: false,
            token_path: None,
            state_path: None,
            timeout_secs: default_timeout(),
            log_file: None,
            api_url: None,
            iam_url: None,
        }
    }
}

fn default_poll_interval() -> u64 {
    60
}
fn default_timeout() -> u64 {
    30
}

impl Config {
    pub fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| data_dir().join("token.save"))
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(|| data_dir().join("state.json"))
    }

    /// Copy safe to print: the plaintext password is masked.
    pub fn redacted(&self) -> Self {
        Self {
            password: self.password.as_ref().map(|_| "********".into()),
            ..self.clone()
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "vicare", "vicare-bridge")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || fallback_dir(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for the token cache and sensor state.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || fallback_dir(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn fallback_dir(base: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(base);
    p.push("vicare-bridge");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load config from `path` (or the default location) plus environment.
///
/// A missing file is not an error; defaults and environment still apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("VICARE_").ignore(&["password"]));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the password: `VICARE_PASSWORD`, then the keyring entry for
/// the configured username, then plaintext in the file.
pub fn resolve_password(cfg: &Config) -> Option<SecretString> {
    // 1. Env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Some(SecretString::from(pw));
    }

    // 2. Keyring
    let username = cfg.username.trim();
    if !username.is_empty() {
        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, username) {
            if let Ok(pw) = entry.get_password() {
                return Some(SecretString::from(pw));
            }
        }
    }

    // 3. Plaintext in config
    cfg.password.clone().map(SecretString::from)
}

/// Store `password` in the OS keyring under `username`.
pub fn store_password(username: &str, password: &SecretString) -> Result<(), ConfigError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ConfigError::Validation {
            field: "username".into(),
            reason: "must be set before storing a password".into(),
        });
    }
    let entry = keyring::Entry::new(KEYRING_SERVICE, username)?;
    entry.set_password(password.expose_secret())?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build the core `BridgeConfig`.
///
/// Only the URL overrides and the poll interval are validated here.
/// Blank credentials are passed through.
pub fn to_bridge_config(cfg: &Config) -> Result<BridgeConfig, ConfigError> {
    let password = resolve_password(cfg).unwrap_or_else(|| SecretString::from(String::new()));
    let credentials = Credentials::new(cfg.username.clone(), password, cfg.client_id.clone());

    if cfg.poll_interval_secs == 0 {
        return Err(ConfigError::Validation {
            field: "poll_interval_secs".into(),
            reason: "must be at least 1".into(),
        });
    }

    let defaults = Endpoints::default();
    let endpoints = Endpoints {
        iam: parse_base("iam_url", cfg.iam_url.as_deref())?.unwrap_or(defaults.iam),
        api: parse_base("api_url", cfg.api_url.as_deref())?.unwrap_or(defaults.api),
    };

    let mut bridge = BridgeConfig::new(credentials);
    bridge.token_path = cfg.token_path();
    bridge.poll_interval = Duration::from_secs(cfg.poll_interval_secs);
    bridge.debug_logging = cfg.debug_logging;
    bridge.timeout = Duration::from_secs(cfg.timeout_secs);
    bridge.endpoints = endpoints;
    Ok(bridge)
}

/// Parse a base URL override, ensuring a trailing slash so relative joins
/// keep the path.
fn parse_base(field: &str, raw: Option<&str>) -> Result<Option<Url>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let with_slash = if raw.ends_with('/') {
        raw.to_owned()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash)
        .map(Some)
        .map_err(|e| ConfigError::Validation {
            field: field.into(),
            reason: format!("invalid URL '{raw}': {e}"),
        })
}
