// Shared transport configuration for building reqwest::Client instances.
//
// The OAuth endpoints and the feature API share timeout and user-agent
// settings through this module. Redirects are never followed: the
// authorize step reads the authorization code out of the redirect itself.

use std::time::Duration;

use reqwest::redirect::Policy;

const USER_AGENT: &str = concat!("vicare-bridge/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()
            .map_err(crate::error::Error::Transport)
    }

    /// Config with a different request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
