// ── Bridge context ──
//
// Startup (session + channel reconciliation) and the guarded per-tick
// entry point. A bridge that failed to start stays disabled for the life
// of the process; every tick on it is a logged no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::appliance::{ApplianceApi, AttributeSource};
use crate::config::BridgeConfig;
use crate::error::{CycleError, InitError};
use crate::host::SensorStore;
use crate::registry::ChannelRegistry;
use crate::session::{self, Session};
use crate::sync::{self, CycleReport};

/// Heartbeat a host falls back to when the bridge never asked for one.
pub const DISABLED_HEARTBEAT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Disabled,
    Enabled,
}

/// What a single tick did.
#[derive(Debug)]
pub enum TickOutcome {
    Completed(CycleReport),
    /// The read phase hit a session failure; nothing was updated.
    Aborted(CycleError),
    /// Startup failed; nothing was attempted.
    Disabled,
    /// A previous cycle was still running.
    Skipped,
}

pub struct Bridge<A, S> {
    session: Option<Session<A>>,
    failure: Option<InitError>,
    store: S,
    registry: ChannelRegistry,
    poll_interval: Duration,
    in_flight: AtomicBool,
}

impl<A, S> Bridge<A, S>
where
    A: AttributeSource + 'static,
    S: SensorStore,
{
    /// Initialize the session and reconcile channels with the host.
    ///
    /// Never fails: a startup error leaves the bridge disabled and is kept
    /// for [`Bridge::failure`].
    pub async fn start<Api>(
        api: &Api,
        config: &BridgeConfig,
        registry: ChannelRegistry,
        store: S,
    ) -> Self
    where
        Api: ApplianceApi<Appliance = A> + ?Sized,
    {
        let (session, failure) = match Self::startup(api, config, &registry, &store).await {
            Ok(session) => {
                info!(
                    interval_secs = config.poll_interval.as_secs(),
                    "bridge enabled"
                );
                (Some(session), None)
            }
            Err(e) => {
                error!(category = %e.category(), error = %e, "bridge disabled");
                (None, Some(e))
            }
        };

        Self {
            session,
            failure,
            store,
            registry,
            poll_interval: config.poll_interval,
            in_flight: AtomicBool::new(false),
        }
    }

    async fn startup<Api>(
        api: &Api,
        config: &BridgeConfig,
        registry: &ChannelRegistry,
        store: &S,
    ) -> Result<Session<A>, InitError>
    where
        Api: ApplianceApi<Appliance = A> + ?Sized,
    {
        let session = session::initialize(api, &config.credentials).await?;
        let existing = store.existing_keys()?;
        let created = registry.reconcile(&existing, store)?;
        if !created.is_empty() {
            info!(count = created.len(), "registered missing channels");
        }
        Ok(session)
    }

    pub fn state(&self) -> BridgeState {
        if self.session.is_some() {
            BridgeState::Enabled
        } else {
            BridgeState::Disabled
        }
    }

    pub fn failure(&self) -> Option<&InitError> {
        self.failure.as_ref()
    }

    pub fn session(&self) -> Option<&Session<A>> {
        self.session.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Hand the store back once the bridge is done with it.
    pub fn into_store(self) -> S {
        self.store
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// The interval the host should tick at, once enabled.
    pub fn heartbeat(&self) -> Option<Duration> {
        self.session.as_ref().map(|_| self.poll_interval)
    }

    /// Run one cycle if the bridge is enabled and idle.
    pub async fn tick(&self) -> TickOutcome {
        let Some(session) = &self.session else {
            match &self.failure {
                Some(e) => warn!(error = %e, "ViCare session not initialized, skipping update"),
                None => warn!("ViCare session not initialized, skipping update"),
            }
            return TickOutcome::Disabled;
        };

        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            debug!("previous cycle still running, skipping tick");
            return TickOutcome::Skipped;
        };

        match sync::run(session.appliance(), &self.store, self.registry.channels()).await {
            Ok(report) => {
                debug!(
                    updated = report.updated(),
                    skipped = report.skipped(),
                    failed = report.failed(),
                    "cycle complete"
                );
                TickOutcome::Completed(report)
            }
            Err(e) => {
                warn!(category = %e.category(), error = %e, "cycle aborted, no channels updated");
                TickOutcome::Aborted(e)
            }
        }
    }
}

/// Single in-flight cycle flag, released on drop.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
