// ── Runtime bridge configuration ──
//
// These types describe what the bridge connects with and how often it
// polls. They never touch disk: the binary builds a `BridgeConfig` from its
// config layers and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use vicare_api::Endpoints;

use crate::error::InitError;

/// Default heartbeat interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Account credentials plus the OAuth client id registered with Viessmann.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub client_id: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: SecretString,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password,
            client_id: client_id.into(),
        }
    }

    /// Trimmed copy, or `MissingCredential` naming the first empty field.
    ///
    /// This is the only validation applied; nothing checks that the values
    /// look like an email address or a client id.
    pub fn validated(&self) -> Result<Self, InitError> {
        let username = required("username", &self.username)?;
        let password = required("password", self.password.expose_secret())?;
        let client_id = required("client_id", &self.client_id)?;
        Ok(Self {
            username: username.to_owned(),
            password: SecretString::from(password.to_owned()),
            client_id: client_id.to_owned(),
        })
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, InitError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(InitError::MissingCredential { field })
    } else {
        Ok(trimmed)
    }
}

/// Everything needed to start a bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub credentials: Credentials,
    /// Where the OAuth token cache lives.
    pub token_path: PathBuf,
    pub poll_interval: Duration,
    pub debug_logging: bool,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    pub endpoints: Endpoints,
}

impl BridgeConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            token_path: PathBuf::from("token.save"),
            poll_interval: DEFAULT_POLL_INTERVAL,
            debug_logging: false,
            timeout: Duration::from_secs(30),
            endpoints: Endpoints::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn creds(user: &str, pass: &str, client: &str) -> Credentials {
        Credentials::new(user, SecretString::from(pass.to_owned()), client)
    }

    #[test]
    fn validated_trims_every_field() {
        let c = creds("  user@example.com ", " secret\n", "\tclient ")
            .validated()
            .unwrap();
        assert_eq!(c.username, "user@example.com");
        assert_eq!(c.password.expose_secret(), "secret");
        assert_eq!(c.client_id, "client");
    }

    #[test]
    fn blank_fields_are_missing() {
        let cases = [
            (creds("", "p", "c"), "username"),
            (creds("u", "   ", "c"), "password"),
            (creds("u", "p", ""), "client_id"),
        ];
        for (c, expected) in cases {
            match c.validated() {
                Err(InitError::MissingCredential { field }) => assert_eq!(field, expected),
                other => panic!("expected MissingCredential({expected}), got {other:?}"),
            }
        }
    }

    #[test]
    fn defaults() {
        let cfg = BridgeConfig::new(creds("u", "p", "c"));
        assert_eq!(cfg.poll_interval, Duration::from_secs(60));
        assert!(!cfg.debug_logging);
    }
}
