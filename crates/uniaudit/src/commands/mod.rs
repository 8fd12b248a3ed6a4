//! Command dispatch.

pub mod audit;
pub mod config_cmd;
pub mod networks;
pub mod rules;
pub mod trace;
mod util;

use uniaudit_config::Config;

use crate::Presentation;
use crate::cli::Command;
use crate::error::CliError;

/// Route a site command to its handler.
pub fn dispatch(cmd: Command, cfg: &Config, out: Presentation) -> Result<(), CliError> {
    match cmd {
        Command::Audit(args) => audit::handle(&args, cfg, out),
        Command::Networks(args) => networks::handle(&args, out),
        Command::Rules(args) => rules::handle(&args, out),
        Command::Trace(args) => trace::handle(&args, out),
        Command::Config(_) | Command::Completions(_) => unreachable!("handled in main"),
    }
}
