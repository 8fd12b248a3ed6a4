//! Clap derive structures for the `uniaudit` CLI.
//!
//! Defines the command tree, global flags, and shared argument groups.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// uniaudit -- security audit for UniFi firewall policies and VLANs
#[derive(Debug, Parser)]
#[command(
    name = "uniaudit",
    version,
    about = "Audit UniFi firewall rules and VLAN segmentation",
    long_about = "Audits an exported UniFi site configuration for firewall and \n\
        segmentation problems: missing inter-VLAN isolation, permissive or \n\
        shadowed rules, management access gaps, and exposed port forwards.\n\n\
        Works entirely offline on JSON exported from the controller.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "UNIAUDIT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "UNIAUDIT_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the security audit and report findings
    #[command(alias = "a")]
    Audit(AuditArgs),

    /// List networks with their inferred purpose
    #[command(alias = "net", alias = "n")]
    Networks(SiteArgs),

    /// List the parsed firewall rules in evaluation order
    #[command(alias = "fw")]
    Rules(SiteArgs),

    /// Show which rule decides traffic between two networks
    Trace(TraceArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Site inputs ──────────────────────────────────────────────────────

/// Exported controller documents. Only the devices payload is required;
/// networks and zones fall back to the copies embedded in it.
#[derive(Debug, Args)]
pub struct SiteArgs {
    /// Devices payload (stat/device), with embedded rules and network table
    #[arg(long, short = 'd', value_name = "FILE")]
    pub devices: PathBuf,

    /// Network list (rest/networkconf)
    #[arg(long, value_name = "FILE")]
    pub networks: Option<PathBuf>,

    /// Firewall groups (rest/firewallgroup)
    #[arg(long, value_name = "FILE")]
    pub groups: Option<PathBuf>,

    /// Firewall zones
    #[arg(long, value_name = "FILE")]
    pub zones: Option<PathBuf>,

    /// Port forwards (rest/portforward)
    #[arg(long, value_name = "FILE")]
    pub port_forwards: Option<PathBuf>,

    /// Gateway settings (get/setting)
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

// ── Audit ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuditArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Hide findings below this severity (informational, recommended, critical)
    #[arg(long, value_name = "SEVERITY")]
    pub min_severity: Option<String>,

    /// Skip a check by id (repeatable), e.g. --skip shadowing
    #[arg(long, value_name = "CHECK")]
    pub skip: Vec<String>,

    /// Exit with code 10 when any finding is at or above this severity
    #[arg(long, value_name = "SEVERITY")]
    pub fail_on: Option<String>,
}

// ── Trace ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TraceArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Source network (id or name)
    #[arg(long)]
    pub from: String,

    /// Destination network (id or name)
    #[arg(long)]
    pub to: String,

    /// Only consider rules matching this protocol (tcp, udp, icmp, ...)
    #[arg(long)]
    pub protocol: Option<String>,

    /// Only consider rules matching this destination port
    #[arg(long)]
    pub port: Option<String>,

    /// Evaluate a freshly initiated connection (ignores respond-only allows)
    #[arg(long)]
    pub new: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
