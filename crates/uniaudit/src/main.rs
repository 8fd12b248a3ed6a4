mod cli;
mod commands;
mod error;
mod output;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use uniaudit_config::Config;

use crate::cli::{Cli, ColorMode, Command, OutputFormat};
use crate::error::CliError;

/// Output settings after merging flags over config-file defaults.
#[derive(Debug, Clone, Copy)]
pub struct Presentation {
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands handle a missing or broken file themselves
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "uniaudit", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let cfg = uniaudit_config::load_config_from(cli.global.config.as_deref())?;
            let presentation = presentation(&cli.global, &cfg)?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &cfg, presentation)
        }
    }
}

/// Flags win over the config file's `[defaults]`.
fn presentation(global: &cli::GlobalOpts, cfg: &Config) -> Result<Presentation, CliError> {
    let format = match global.output {
        Some(format) => format,
        None => OutputFormat::from_str(&cfg.defaults.output, true).map_err(|_| {
            CliError::Validation {
                field: "defaults.output".into(),
                reason: format!("unknown output format '{}'", cfg.defaults.output),
            }
        })?,
    };
    let color = match global.color {
        Some(mode) => mode,
        None => ColorMode::from_str(&cfg.defaults.color, true).map_err(|_| {
            CliError::Validation {
                field: "defaults.color".into(),
                reason: format!("unknown color mode '{}'", cfg.defaults.color),
            }
        })?,
    };
    Ok(Presentation {
        format,
        color: output::should_color(color),
        quiet: global.quiet,
    })
}
