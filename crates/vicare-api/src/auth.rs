// OAuth2 authentication against the Viessmann IAM service
//
// Authorization-code flow with PKCE (S256). The authorize endpoint accepts
// HTTP basic credentials and answers with a redirect to the app callback;
// the authorization code is read out of that `Location` header and
// exchanged for an access/refresh token pair. Tokens are cached on disk
// so restarts do not force a fresh login.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use url::Url;

use crate::client::ViessmannClient;
use crate::error::{Error, preview};

const REDIRECT_URI: &str = "vicare://oauth-callback/everest";
const SCOPE: &str = "IoT User offline_access";
const PKCE_VERIFIER_LEN: usize = 64;

/// Tokens are treated as expired this long before the server says so.
const EXPIRY_SKEW_SECS: i64 = 60;

// ── Endpoints ────────────────────────────────────────────────────────

/// Base URLs for the identity service and the IoT API.
///
/// Both must end in `/` so relative paths join underneath them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub iam: Url,
    pub api: Url,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            iam: Url::parse("https://iam.viessmann.com/idp/v3/").expect("static IAM URL"),
            api: Url::parse("https://api.viessmann.com/iot/v1/").expect("static API URL"),
        }
    }
}

impl Endpoints {
    fn authorize_url(&self, client_id: &str, challenge: &str) -> Result<Url, Error> {
        let mut url = self.iam.join("authorize")?;
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", REDIRECT_URI)
            .append_pair("scope", SCOPE)
            .append_pair("response_type", "code")
            .append_pair("code_challenge_method", "S256")
            .append_pair("code_challenge", challenge);
        Ok(url)
    }

    fn token_url(&self) -> Result<Url, Error> {
        Ok(self.iam.join("token")?)
    }

    /// Join a path underneath the API base URL.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.api.join(path.trim_start_matches('/'))?)
    }
}

// ── PKCE ─────────────────────────────────────────────────────────────

pub(crate) struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub(crate) fn generate() -> Self {
        let verifier: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(PKCE_VERIFIER_LEN)
            .map(char::from)
            .collect();
        Self::from_verifier(verifier)
    }

    pub(crate) fn from_verifier(verifier: String) -> Self {
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }
}

// ── Tokens ───────────────────────────────────────────────────────────

/// An access token plus the refresh token that renews it.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Whether the access token should no longer be used at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + TimeDelta::seconds(EXPIRY_SKEW_SECS) >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Force the next request to renew the token.
    pub(crate) fn invalidate(&mut self) {
        self.expires_at = DateTime::<Utc>::MIN_UTC;
    }

    fn from_response(resp: TokenResponse, previous_refresh: Option<SecretString>) -> Self {
        let lifetime = i64::try_from(resp.expires_in)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or_else(|| TimeDelta::hours(1));
        Self {
            access_token: SecretString::from(resp.access_token),
            // Refresh grants may omit the refresh token; keep the old one then.
            refresh_token: resp.refresh_token.map(SecretString::from).or(previous_refresh),
            expires_at: Utc::now() + lifetime,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Account a cached token was issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenOwner {
    pub client_id: String,
    pub username: String,
}

/// On-disk shape of the token cache.
#[derive(Serialize, Deserialize)]
struct StoredToken {
    #[serde(default)]
    owner: Option<TokenOwner>,
    access_token: String,
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
}

/// JSON token cache at a fixed path.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the token cached for `owner`.
    ///
    /// A missing or unreadable cache yields `None`, and so does a token
    /// issued to another account or client id.
    pub async fn load(&self, owner: &TokenOwner) -> Result<Option<TokenSet>, Error> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.cache_error(source)),
        };

        match serde_json::from_str::<StoredToken>(&raw) {
            Ok(stored) if stored.owner.as_ref() != Some(owner) => {
                info!(path = %self.path.display(), "ignoring token cached for another account");
                Ok(None)
            }
            Ok(stored) => Ok(Some(TokenSet {
                access_token: SecretString::from(stored.access_token),
                refresh_token: stored.refresh_token.map(SecretString::from),
                expires_at: stored.expires_at,
            })),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt token cache");
                Ok(None)
            }
        }
    }

    /// Persist the token for `owner`, replacing any previous cache atomically.
    pub async fn save(&self, token: &TokenSet, owner: &TokenOwner) -> Result<(), Error> {
        let stored = StoredToken {
            owner: Some(owner.clone()),
            access_token: token.access_token.expose_secret().to_owned(),
            refresh_token: token
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_owned()),
            expires_at: token.expires_at,
        };
        let body = serde_json::to_vec_pretty(&stored).map_err(|e| Error::Deserialization {
            message: format!("failed to encode token cache: {e}"),
            body: String::new(),
        })?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.cache_error(e))?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| self.cache_error(e))?;
        restrict_permissions(&tmp).await;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.cache_error(e))?;
        debug!(path = %self.path.display(), "token cache updated");
        Ok(())
    }

    fn cache_error(&self, source: std::io::Error) -> Error {
        Error::TokenCache {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) =
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
    {
        warn!(path = %path.display(), error = %e, "could not restrict token cache permissions");
    }
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) {}

/// Pull the `code` query parameter out of the authorize redirect.
fn extract_code(location: &str) -> Result<String, Error> {
    let url = Url::parse(location)?;
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .ok_or_else(|| Error::Authentication {
            message: "authorize redirect did not carry a code".into(),
        })
}

// ── Login / refresh ──────────────────────────────────────────────────

impl ViessmannClient {
    /// Run the full PKCE login and return a fresh token set.
    pub(crate) async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<TokenSet, Error> {
        let pkce = Pkce::generate();
        let url = self
            .endpoints()
            .authorize_url(self.client_id(), &pkce.challenge)?;

        debug!("requesting authorization code");

        let resp = self
            .http()
            .post(url)
            .basic_auth(username, Some(password.expose_secret()))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_redirection() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!(
                    "login failed (HTTP {status}): {}",
                    preview(&body)
                ),
            });
        }

        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::Authentication {
                message: "authorize response had no redirect location".into(),
            })?;
        let code = extract_code(location)?;

        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id()),
            ("redirect_uri", REDIRECT_URI),
            ("code_verifier", pkce.verifier.as_str()),
            ("code", code.as_str()),
        ];
        let resp = self
            .http()
            .post(self.endpoints().token_url()?)
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!(
                    "token exchange failed (HTTP {status}): {}",
                    preview(&body)
                ),
            });
        }

        let token: TokenResponse = parse_token_body(resp).await?;
        debug!("login successful");
        Ok(TokenSet::from_response(token, None))
    }

    /// Renew an access token with its refresh token.
    pub(crate) async fn refresh(&self, refresh_token: &SecretString) -> Result<TokenSet, Error> {
        debug!("refreshing access token");

        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id()),
            ("refresh_token", refresh_token.expose_secret()),
        ];
        let resp = self
            .http()
            .post(self.endpoints().token_url()?)
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        if status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                message: format!("token endpoint unavailable: {}", preview(&body)),
                error_type: None,
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::RefreshRejected {
                message: format!("HTTP {status}: {}", preview(&body)),
            });
        }

        let token: TokenResponse = parse_token_body(resp).await?;
        Ok(TokenSet::from_response(token, Some(refresh_token.clone())))
    }
}

async fn parse_token_body(resp: reqwest::Response) -> Result<TokenResponse, Error> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("invalid token response: {e}"),
        body,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn pkce_challenge_matches_rfc7636_example() {
        let pkce = Pkce::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".into());
        assert_eq!(pkce.challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn generated_verifier_has_expected_length() {
        let pkce = Pkce::generate();
        assert_eq!(pkce.verifier.len(), PKCE_VERIFIER_LEN);
        assert!(pkce.verifier.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn authorize_url_carries_pkce_parameters() {
        let url = Endpoints::default().authorize_url("abc", "xyz").unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(url.as_str().starts_with("https://iam.viessmann.com/idp/v3/authorize?"));
        assert!(pairs.contains(&("client_id".into(), "abc".into())));
        assert!(pairs.contains(&("code_challenge".into(), "xyz".into())));
        assert!(pairs.contains(&("code_challenge_method".into(), "S256".into())));
    }

    #[test]
    fn extract_code_from_callback() {
        let code = extract_code("vicare://oauth-callback/everest?code=s3cr3t&state=1").unwrap();
        assert_eq!(code, "s3cr3t");
        assert!(extract_code("vicare://oauth-callback/everest?error=denied").is_err());
    }

    #[test]
    fn token_expiry_includes_skew() {
        let now = Utc::now();
        let token = TokenSet {
            access_token: SecretString::from("a".to_string()),
            refresh_token: None,
            expires_at: now + TimeDelta::seconds(30),
        };
        assert!(token.is_expired_at(now));
        assert!(!token.is_expired_at(now - TimeDelta::seconds(120)));
    }

    fn owner(username: &str) -> TokenOwner {
        TokenOwner {
            client_id: "client-123".into(),
            username: username.into(),
        }
    }

    #[tokio::test]
    async fn token_store_round_trip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("token.save"));
        let me = owner("user@example.com");
        assert!(store.load(&me).await.unwrap().is_none());

        let token = TokenSet {
            access_token: SecretString::from("access".to_string()),
            refresh_token: Some(SecretString::from("refresh".to_string())),
            expires_at: Utc::now() + TimeDelta::hours(1),
        };
        store.save(&token, &me).await.unwrap();

        let loaded = store.load(&me).await.unwrap().unwrap();
        assert_eq!(loaded.access_token.expose_secret(), "access");
        assert_eq!(
            loaded.refresh_token.as_ref().map(|t| t.expose_secret()),
            Some("refresh")
        );
    }

    #[tokio::test]
    async fn corrupt_token_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.save");
        std::fs::write(&path, "not json").unwrap();
        let store = TokenStore::new(path);
        assert!(store.load(&owner("user@example.com")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn token_store_is_scoped_to_its_owner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.save");
        let store = TokenStore::new(&path);
        let token = TokenSet {
            access_token: SecretString::from("access".to_string()),
            refresh_token: None,
            expires_at: Utc::now() + TimeDelta::hours(1),
        };
        store.save(&token, &owner("alice@example.com")).await.unwrap();

        assert!(store.load(&owner("bob@example.com")).await.unwrap().is_none());
        assert!(store.load(&owner("alice@example.com")).await.unwrap().is_some());

        // Caches written before owners were recorded are never reused.
        std::fs::write(
            &path,
            r#"{"access_token":"a","refresh_token":null,"expires_at":"2999-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(store.load(&owner("alice@example.com")).await.unwrap().is_none());
    }
}
