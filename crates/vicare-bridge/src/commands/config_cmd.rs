//! Config subcommand handlers.

use secrecy::SecretString;

use vicare_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let redacted = cfg.redacted();
            let out = match global.output {
                OutputFormat::Table => toml::to_string_pretty(&redacted).map_err(|e| {
                    CliError::Config {
                        message: e.to_string(),
                        path: config_file(global),
                    }
                })?,
                _ => output::render_single(&global.output, &redacted, |_| String::new()),
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config_file(global), global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword { username } => {
            let username = username.unwrap_or_else(|| cfg.username.clone());
            if username.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "username".into(),
                    reason: "pass --username or set it in the config file".into(),
                });
            }

            let password = rpassword::prompt_password("Password: ").map_err(|e| {
                CliError::Validation {
                    field: "password".into(),
                    reason: format!("prompt failed: {e}"),
                }
            })?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "cannot be empty".into(),
                });
            }

            vicare_config::store_password(&username, &SecretString::from(password))?;
            if !global.quiet {
                eprintln!("Password for {username} stored in the system keyring");
            }
            Ok(())
        }
    }
}

fn config_file(global: &GlobalOpts) -> String {
    global
        .config
        .clone()
        .unwrap_or_else(vicare_config::config_path)
        .display()
        .to_string()
}
