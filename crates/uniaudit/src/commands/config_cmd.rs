//! Config subcommand handlers.

use std::path::PathBuf;

use uniaudit_config::{Config, load_config_from, save_config_to};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

fn target_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(uniaudit_config::config_path)
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = target_path(global);
    match args.command {
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    ),
                });
            }
            save_config_to(&Config::default(), &path)?;
            if !global.quiet {
                eprintln!("Wrote default configuration to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = load_config_from(Some(&path))?;
            let rendered = match global.output {
                Some(format) => output::render_single(
                    format,
                    &cfg,
                    |c| toml::to_string_pretty(c).unwrap_or_default(),
                    |c| toml::to_string_pretty(c).unwrap_or_default(),
                ),
                None => toml::to_string_pretty(&cfg).map_err(uniaudit_config::ConfigError::from)?,
            };
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
    }
}
