use thiserror::Error;

/// Top-level error type for the `vicare-api` crate.
///
/// Covers every failure mode of the client: OAuth login and refresh,
/// HTTP transport, structured API errors, and the token cache file.
/// `vicare-core` classifies these into attribute-level and session-level
/// failures.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, unknown client id, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The refresh token was rejected; a full login is required.
    #[error("Token refresh rejected: {message}")]
    RefreshRejected { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Rate limited by the API. Includes retry-after in seconds when sent.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── API ─────────────────────────────────────────────────────────
    /// Structured error body returned by the API.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        message: String,
        error_type: Option<String>,
        status: u16,
    },

    /// The requested feature does not exist on this device.
    #[error("Feature not found: {feature}")]
    FeatureNotFound { feature: String },

    /// A non-feature resource returned 404.
    #[error("Resource not found: {path}")]
    NotFound { path: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Token cache ─────────────────────────────────────────────────
    /// Reading or writing the token cache file failed.
    #[error("Token cache error at {path}: {source}")]
    TokenCache {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns `true` if this error indicates auth has expired
    /// and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::RefreshRejected { .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::FeatureNotFound { .. } | Self::NotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Extract the API error type, if available.
    pub fn api_error_type(&self) -> Option<&str> {
        match self {
            Self::Api { error_type, .. } => error_type.as_deref(),
            _ => None,
        }
    }
}

/// First 200 characters of a response body, for error messages.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
