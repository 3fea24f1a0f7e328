//! `once`: start the bridge, run one cycle, print what happened.

use std::collections::BTreeSet;

use serde::Serialize;
use tabled::Tabled;

use vicare_config::Config;
use vicare_core::{
    ChannelKey, ChannelOutcome, ChannelRegistry, ChannelStatus, CycleReport, JsonFileStore,
    MemoryStore, SensorStore, StoreCall, TickOutcome,
};

use super::start_bridge;
use crate::cli::{GlobalOpts, OnceArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Key")]
    key: u8,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Value / Reason")]
    detail: String,
}

impl From<&ChannelOutcome> for OutcomeRow {
    fn from(o: &ChannelOutcome) -> Self {
        let (status, detail) = match &o.status {
            ChannelStatus::Updated { value } => ("updated", value.clone()),
            ChannelStatus::Skipped => ("skipped", "-".to_owned()),
            ChannelStatus::Failed { reason } => ("failed", reason.clone()),
        };
        Self {
            key: o.key.get(),
            name: o.name.to_owned(),
            status: status.to_owned(),
            detail,
        }
    }
}

#[derive(Tabled)]
struct CallRow {
    #[tabled(rename = "Call")]
    call: &'static str,
    #[tabled(rename = "Key")]
    key: u8,
    #[tabled(rename = "Arguments")]
    args: String,
}

impl From<&StoreCall> for CallRow {
    fn from(c: &StoreCall) -> Self {
        match c {
            StoreCall::Create { key, name, kind } => Self {
                call: "create",
                key: key.get(),
                args: format!("{name} ({})", kind.host_type_name()),
            },
            StoreCall::Update {
                key,
                numeric,
                value,
            } => Self {
                call: "update",
                key: key.get(),
                args: format!("{numeric}, {value:?}"),
            },
        }
    }
}

#[derive(Serialize)]
struct DryRun<'a> {
    report: &'a CycleReport,
    calls: Vec<StoreCall>,
}

pub async fn handle(args: &OnceArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    if args.dry_run {
        dry_run(cfg, global).await
    } else {
        let store = JsonFileStore::open(cfg.state_path())?;
        let report = cycle(cfg, store).await?.0;
        print_report(&report, global);
        Ok(())
    }
}

/// Mirror the state file's registered channels in memory so the recorded
/// calls are exactly what a real run would issue.
async fn dry_run(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let existing: BTreeSet<ChannelKey> = JsonFileStore::open(cfg.state_path())?.existing_keys()?;
    let registry = ChannelRegistry::standard();
    let store = MemoryStore::with_channels(existing.iter().filter_map(|&key| registry.get(key)));
    let (report, store) = cycle(cfg, store).await?;
    let calls = store.calls()?;

    if matches!(global.output, OutputFormat::Table) {
        print_report(&report, global);
        let rows: Vec<CallRow> = calls.iter().map(CallRow::from).collect();
        output::print_output(&output::render_table(&rows), global.quiet);
    } else {
        let out = output::render_single(
            &global.output,
            &DryRun {
                report: &report,
                calls,
            },
            |_| String::new(),
        );
        output::print_output(&out, global.quiet);
    }
    Ok(())
}

async fn cycle<S: SensorStore>(cfg: &Config, store: S) -> Result<(CycleReport, S), CliError> {
    let (bridge, _) = start_bridge(cfg, store).await?;
    match bridge.tick().await {
        TickOutcome::Completed(report) => Ok((report, bridge.into_store())),
        TickOutcome::Aborted(e) => Err(e.into()),
        TickOutcome::Disabled | TickOutcome::Skipped => Err(CliError::CycleAborted {
            reason: "bridge is not running".into(),
        }),
    }
}

fn print_report(report: &CycleReport, global: &GlobalOpts) {
    let out = output::render_single(&global.output, report, |r| {
        let rows: Vec<OutcomeRow> = r.outcomes.iter().map(OutcomeRow::from).collect();
        format!(
            "{}\n{} updated, {} skipped, {} failed at {}",
            output::render_table(&rows),
            r.updated(),
            r.skipped(),
            r.failed(),
            r.completed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    });
    output::print_output(&out, global.quiet);
}
