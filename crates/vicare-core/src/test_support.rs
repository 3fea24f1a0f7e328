// Scripted appliance doubles shared by the unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::SecretString;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::appliance::{ApplianceApi, AttributeSource};
use crate::config::Credentials;
use crate::error::SourceError;
use crate::model::{Attribute, Value};

#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Value(Value),
    Null,
    Unavailable,
    SessionLost,
}

/// An appliance whose every attribute answer is scripted up front.
/// Unscripted attributes answer `Ok(None)`.
pub(crate) struct ScriptedSource {
    model: String,
    online: bool,
    answers: HashMap<Attribute, Scripted>,
    reads: Mutex<Vec<Attribute>>,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self {
            model: "E3_Vitodens_100_0421".into(),
            online: true,
            answers: HashMap::new(),
            reads: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn offline(mut self) -> Self {
        self.online = false;
        self
    }

    pub(crate) fn with(mut self, attribute: Attribute, answer: Scripted) -> Self {
        self.answers.insert(attribute, answer);
        self
    }

    pub(crate) fn number(self, attribute: Attribute, n: f64) -> Self {
        self.with(attribute, Scripted::Value(Value::Number(n)))
    }

    pub(crate) fn text(self, attribute: Attribute, s: &str) -> Self {
        self.with(attribute, Scripted::Value(Value::Text(s.into())))
    }

    pub(crate) fn flag(self, attribute: Attribute, on: bool) -> Self {
        self.with(attribute, Scripted::Value(Value::Flag(on)))
    }

    pub(crate) fn reads(&self) -> Vec<Attribute> {
        self.reads.lock().unwrap().clone()
    }

    fn answer(&self, attribute: Attribute) -> Result<Option<Value>, SourceError> {
        self.reads.lock().unwrap().push(attribute);
        match self.answers.get(&attribute).cloned().unwrap_or(Scripted::Null) {
            Scripted::Value(v) => Ok(Some(v)),
            Scripted::Null => Ok(None),
            Scripted::Unavailable => Err(SourceError::unavailable(format!("{attribute} unsupported"))),
            Scripted::SessionLost => Err(SourceError::session("connection reset")),
        }
    }

    fn number_of(&self, attribute: Attribute) -> Result<Option<f64>, SourceError> {
        self.answer(attribute).map(|v| match v {
            Some(Value::Number(n)) => Some(n),
            _ => None,
        })
    }
}

#[async_trait]
impl AttributeSource for ScriptedSource {
    fn model(&self) -> &str {
        &self.model
    }

    fn is_online(&self) -> bool {
        self.online
    }

    async fn outside_temperature(&self) -> Result<Option<f64>, SourceError> {
        self.number_of(Attribute::OutsideTemperature)
    }

    async fn room_temperature(&self) -> Result<Option<f64>, SourceError> {
        self.number_of(Attribute::RoomTemperature)
    }

    async fn hot_water_storage_temperature(&self) -> Result<Option<f64>, SourceError> {
        self.number_of(Attribute::HotWaterStorageTemperature)
    }

    async fn hot_water_setpoint(&self) -> Result<Option<f64>, SourceError> {
        self.number_of(Attribute::HotWaterSetpoint)
    }

    async fn supply_temperature(&self) -> Result<Option<f64>, SourceError> {
        self.number_of(Attribute::SupplyTemperature)
    }

    async fn desired_temperature(&self) -> Result<Option<f64>, SourceError> {
        self.number_of(Attribute::DesiredTemperature)
    }

    async fn boiler_temperature(&self) -> Result<Option<f64>, SourceError> {
        self.number_of(Attribute::BoilerTemperature)
    }

    async fn burner_active(&self) -> Result<Option<bool>, SourceError> {
        self.answer(Attribute::BurnerActive).map(|v| match v {
            Some(Value::Flag(on)) => Some(on),
            _ => None,
        })
    }

    async fn active_program(&self) -> Result<Option<String>, SourceError> {
        self.answer(Attribute::ActiveProgram).map(|v| match v {
            Some(Value::Text(s)) => Some(s),
            _ => None,
        })
    }
}

/// Account double. Counts every call so tests can assert that nothing
/// reached the "network".
pub(crate) struct ScriptedApi {
    auth_failure: Option<String>,
    appliances: Mutex<Vec<ScriptedSource>>,
    calls: AtomicUsize,
}

impl ScriptedApi {
    pub(crate) fn with_appliance(source: ScriptedSource) -> Self {
        Self {
            auth_failure: None,
            appliances: Mutex::new(vec![source]),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            auth_failure: None,
            appliances: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn rejecting(reason: &str) -> Self {
        Self {
            auth_failure: Some(reason.into()),
            appliances: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApplianceApi for ScriptedApi {
    type Appliance = ScriptedSource;

    async fn authenticate(&self, _credentials: &Credentials) -> Result<(), SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.auth_failure {
            Some(reason) => Err(SourceError::session(reason.clone())),
            None => Ok(()),
        }
    }

    async fn list_appliances(&self) -> Result<Vec<ScriptedSource>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(std::mem::take(&mut *self.appliances.lock().unwrap()))
    }
}

pub(crate) fn credentials(username: &str, password: &str, client_id: &str) -> Credentials {
    Credentials::new(username, SecretString::from(password.to_owned()), client_id)
}

pub(crate) fn valid_credentials() -> Credentials {
    credentials("user@example.com", "hunter2", "client-123")
}

// ── Log capture ─────────────────────────────────────────────────────

/// Plain-text log sink installed as the thread's default subscriber.
///
/// `#[tokio::test]` runs on a current-thread runtime, so the guard covers
/// every await in the test body.
#[derive(Clone, Default)]
pub(crate) struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub(crate) fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .finish();
        (capture, tracing::subscriber::set_default(subscriber))
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// Events at `level` whose line contains `needle`.
    pub(crate) fn count(&self, level: &str, needle: &str) -> usize {
        self.lines()
            .iter()
            .filter(|l| l.trim_start().starts_with(level) && l.contains(needle))
            .count()
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter(Arc::clone(&self.0))
    }
}

pub(crate) struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
