// Viessmann API HTTP client
//
// Wraps `reqwest::Client` with bearer-token management, the `{ data }`
// response envelope, and status-code mapping. Endpoint groups (equipment,
// features) live in separate files as inherent methods so this module
// stays focused on transport and token mechanics.

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{Endpoints, TokenOwner, TokenSet, TokenStore};
use crate::error::{Error, preview};
use crate::transport::TransportConfig;

/// Error body shape used by the IoT API for 4xx/5xx answers.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    error_type: Option<String>,
    message: Option<String>,
}

/// Login material kept for re-authentication once the refresh token dies.
struct LoginMaterial {
    username: String,
    password: SecretString,
}

/// Authenticated client for the Viessmann IoT API.
///
/// Holds at most one token set. Every request goes through
/// [`access_token`](Self::access_token), which renews the token when it is
/// about to expire and persists the result to the token cache.
pub struct ViessmannClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    client_id: String,
    store: TokenStore,
    login: Mutex<Option<LoginMaterial>>,
    token: Mutex<Option<TokenSet>>,
}

impl ViessmannClient {
    /// Create a client. Performs no network I/O.
    pub fn new(
        client_id: impl Into<String>,
        token_path: impl Into<PathBuf>,
        endpoints: Endpoints,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            endpoints,
            client_id: client_id.into(),
            store: TokenStore::new(token_path),
            login: Mutex::new(None),
            token: Mutex::new(None),
        })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Establish a usable token.
    ///
    /// Reuses the cached token when it is still valid, renews it when only
    /// the access token has expired, and falls back to a full login
    /// otherwise. Only a token cached for this username and client id is
    /// considered. The credentials are retained for later re-login.
    pub async fn authenticate(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        *self.login.lock().await = Some(LoginMaterial {
            username: username.to_owned(),
            password: password.clone(),
        });

        let owner = self.owner(username);
        let cached = self.store.load(&owner).await?;
        let token = match cached {
            Some(token) if !token.is_expired() => {
                debug!("using cached access token");
                token
            }
            Some(token) => self.renew(token.refresh_token.as_ref()).await?,
            None => {
                let token = self.login(username, password).await?;
                self.store.save(&token, &owner).await?;
                token
            }
        };

        *self.token.lock().await = Some(token);
        info!("authenticated with Viessmann API");
        Ok(())
    }

    /// Return a valid access token, renewing it if needed.
    pub(crate) async fn access_token(&self) -> Result<SecretString, Error> {
        let mut guard = self.token.lock().await;
        match guard.as_ref() {
            Some(token) if !token.is_expired() => return Ok(token.access_token.clone()),
            Some(_) => {}
            None => {
                return Err(Error::Authentication {
                    message: "not authenticated".into(),
                });
            }
        }

        let refresh = guard.as_ref().and_then(|t| t.refresh_token.clone());
        let token = self.renew(refresh.as_ref()).await?;
        let access = token.access_token.clone();
        *guard = Some(token);
        Ok(access)
    }

    fn owner(&self, username: &str) -> TokenOwner {
        TokenOwner {
            client_id: self.client_id.clone(),
            username: username.to_owned(),
        }
    }

    /// Refresh, falling back to a full login, and persist the outcome.
    ///
    /// A transient refresh failure (IAM 5xx, timeout) is returned as is: the
    /// refresh token may still be good, so the password is not re-sent.
    async fn renew(&self, refresh: Option<&SecretString>) -> Result<TokenSet, Error> {
        let login = self.login.lock().await;
        let material = login.as_ref().ok_or_else(|| Error::Authentication {
            message: "token expired and no credentials available".into(),
        })?;

        let refreshed = match refresh {
            Some(rt) => match self.refresh(rt).await {
                Ok(token) => Some(token),
                Err(e) if e.is_auth_expired() => {
                    warn!(error = %e, "refresh token rejected, logging in again");
                    None
                }
                Err(e) => {
                    if e.is_transient() {
                        warn!(error = %e, "token refresh failed, keeping the refresh token");
                    }
                    return Err(e);
                }
            },
            None => None,
        };

        let token = match refreshed {
            Some(token) => token,
            None => self.login(&material.username, &material.password).await?,
        };

        self.store.save(&token, &self.owner(&material.username)).await?;
        Ok(token)
    }

    /// Mark the held token as unusable so the next request renews it.
    async fn invalidate_token(&self) {
        if let Some(token) = self.token.lock().await.as_mut() {
            token.invalidate();
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Build a URL underneath the API base.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        self.endpoints.api_url(path)
    }

    /// Send an authenticated GET and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let token = self.access_token().await?;
        let resp = self
            .http
            .get(url.clone())
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
            return Err(Error::Authentication {
                message: "access token rejected".into(),
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                path: url.path().to_owned(),
            });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            return Err(Error::RateLimited { retry_after_secs });
        }

        let body = resp.text().await?;

        if !status.is_success() {
            let parsed = serde_json::from_str::<ApiErrorBody>(&body).ok();
            let (error_type, message) = parsed
                .map(|b| (b.error_type, b.message))
                .unwrap_or_default();
            return Err(Error::Api {
                message: message.unwrap_or_else(|| preview(&body)),
                error_type,
                status: status.as_u16(),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}
