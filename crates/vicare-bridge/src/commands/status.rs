//! `status`: sensors recorded in the state file. No network access.

use tabled::Tabled;

use vicare_config::Config;
use vicare_core::{JsonFileStore, SensorEntry};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "Key")]
    key: u8,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    type_name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&SensorEntry> for SensorRow {
    fn from(s: &SensorEntry) -> Self {
        Self {
            key: s.key.get(),
            name: s.name.clone(),
            type_name: s.type_name.clone(),
            value: output::or_dash(s.value.as_deref()),
            updated: s.updated_at.map_or_else(
                || "-".into(),
                |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ),
        }
    }
}

pub fn handle(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let path = cfg.state_path();
    let store = JsonFileStore::open(&path)?;
    let sensors = store.sensors()?;

    if sensors.is_empty() && matches!(global.output, OutputFormat::Table) {
        if !global.quiet {
            eprintln!("No sensors registered yet in {}", path.display());
        }
        return Ok(());
    }

    let out = output::render_list(&global.output, &sensors, |s| SensorRow::from(s));
    output::print_output(&out, global.quiet);
    Ok(())
}
