mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use vicare_config::Config;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let cfg = vicare_config::load_config(cli.global.config.as_deref())?;
    let _log_guard = init_tracing(&cli.global, &cfg)?;

    tracing::debug!(command = ?cli.command, "dispatching command");
    match cli.command {
        Command::Run => commands::run::handle(&cfg).await,
        Command::Once(args) => commands::once::handle(&args, &cfg, &cli.global).await,
        Command::Status => commands::status::handle(&cfg, &cli.global),
        Command::Channels => {
            commands::channels::handle(&cli.global);
            Ok(())
        }
        Command::Config(args) => commands::config_cmd::handle(args, &cfg, &cli.global),
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins; otherwise `-q`/`-v` pick the level for our crates and
/// `debug_logging` raises it to at least `debug`. With `log_file` set,
/// output goes through a non-blocking file writer whose guard must outlive
/// the program.
fn init_tracing(global: &GlobalOpts, cfg: &Config) -> Result<Option<WorkerGuard>, CliError> {
    const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

    let mut rank = if global.quiet {
        0
    } else {
        (usize::from(global.verbose) + 1).min(LEVELS.len() - 1)
    };
    if cfg.debug_logging {
        rank = rank.max(3);
    }
    let level = LEVELS[rank];
    let directive = format!("warn,vicare_api={level},vicare_core={level},vicare_bridge={level}");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let Some(path) = &cfg.log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file_name = path.file_name().ok_or_else(|| CliError::Validation {
        field: "log_file".into(),
        reason: format!("'{}' is not a file path", path.display()),
    })?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    std::fs::create_dir_all(dir)?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}
