// ── Session manager ──
//
// Validates credentials, authenticates, and binds the first heating
// appliance on the account. A session is created once per process and is
// read-only afterwards.

use tracing::{info, warn};

use crate::appliance::{ApplianceApi, AttributeSource};
use crate::config::Credentials;
use crate::error::{InitError, SourceError};

/// The authenticated handle to one appliance.
pub struct Session<A> {
    appliance: A,
}

impl<A: AttributeSource> Session<A> {
    pub fn appliance(&self) -> &A {
        &self.appliance
    }

    pub fn model(&self) -> &str {
        self.appliance.model()
    }

    pub fn is_online(&self) -> bool {
        self.appliance.is_online()
    }
}

/// Establish the session.
///
/// Blank credentials fail with `MissingCredential` before `api` is called
/// at all. An offline appliance is logged but is not an error.
pub async fn initialize<Api>(
    api: &Api,
    credentials: &Credentials,
) -> Result<Session<Api::Appliance>, InitError>
where
    Api: ApplianceApi + ?Sized,
{
    let credentials = credentials.validated()?;

    api.authenticate(&credentials).await.map_err(connect_failed)?;
    let appliance = api
        .list_appliances()
        .await
        .map_err(connect_failed)?
        .into_iter()
        .next()
        .ok_or(InitError::NoAppliance)?;

    let model = appliance.model();
    if appliance.is_online() {
        info!(model, status = "Online", "ViCare session established");
    } else {
        warn!(model, status = "Offline", "ViCare session established, appliance offline");
    }

    Ok(Session { appliance })
}

fn connect_failed(err: SourceError) -> InitError {
    let reason = match err {
        SourceError::Unavailable { reason } | SourceError::Session { reason } => reason,
    };
    InitError::ConnectFailed { reason }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::test_support::{
        LogCapture, ScriptedApi, ScriptedSource, credentials, valid_credentials,
    };

    #[tokio::test]
    async fn binds_first_appliance() {
        let api = ScriptedApi::with_appliance(ScriptedSource::new().offline());
        let session = initialize(&api, &valid_credentials()).await.unwrap();
        assert_eq!(session.model(), "E3_Vitodens_100_0421");
        assert!(!session.is_online());
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn online_appliance_is_logged_with_model() {
        let (logs, _guard) = LogCapture::install();
        let api = ScriptedApi::with_appliance(ScriptedSource::new());
        initialize(&api, &valid_credentials()).await.unwrap();

        assert_eq!(logs.count("INFO", "ViCare session established"), 1);
        let line = logs.lines().into_iter().find(|l| l.contains("established")).unwrap();
        assert!(line.contains("model=\"E3_Vitodens_100_0421\""), "{line}");
        assert!(line.contains("status=\"Online\""), "{line}");
        assert_eq!(logs.count("WARN", ""), 0);
    }

    #[tokio::test]
    async fn offline_appliance_is_logged_as_warning() {
        let (logs, _guard) = LogCapture::install();
        let api = ScriptedApi::with_appliance(ScriptedSource::new().offline());
        initialize(&api, &valid_credentials()).await.unwrap();

        assert_eq!(logs.count("WARN", "appliance offline"), 1);
        let line = logs.lines().into_iter().find(|l| l.contains("offline")).unwrap();
        assert!(line.contains("model=\"E3_Vitodens_100_0421\""), "{line}");
        assert!(line.contains("status=\"Offline\""), "{line}");
        assert_eq!(logs.count("INFO", "established"), 0);
    }

    #[tokio::test]
    async fn blank_credentials_fail_before_any_call() {
        let api = ScriptedApi::with_appliance(ScriptedSource::new());
        let err = initialize(&api, &credentials("user", " ", "client"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, InitError::MissingCredential { field: "password" }));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn auth_failure_is_connect_failed() {
        let api = ScriptedApi::rejecting("invalid_grant");
        let err = initialize(&api, &valid_credentials()).await.err().unwrap();
        assert!(matches!(err, InitError::ConnectFailed { ref reason } if reason.contains("invalid_grant")));
    }

    #[tokio::test]
    async fn empty_account_has_no_appliance() {
        let api = ScriptedApi::empty();
        let err = initialize(&api, &valid_credentials()).await.err().unwrap();
        assert!(matches!(err, InitError::NoAppliance));
    }
}
