//! Shared helpers for command handlers.

use std::path::Path;

use serde_json::Value;

use uniaudit_core::parse::parse_document;
use uniaudit_core::{AuditContext, NetworkInfo, SiteExport};

use crate::cli::SiteArgs;
use crate::error::CliError;

/// Read and decode one exported document.
fn read_document(path: &Path) -> Result<Value, CliError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            CliError::FileNotFound {
                path: display.clone(),
            }
        } else {
            CliError::ReadFailed {
                path: display.clone(),
                source,
            }
        }
    })?;
    Ok(parse_document(&raw, &display)?)
}

fn read_optional(path: Option<&Path>) -> Result<Option<Value>, CliError> {
    path.map(read_document).transpose()
}

/// Load every document named on the command line into an audit context.
pub fn load_site(args: &SiteArgs) -> Result<AuditContext, CliError> {
    let devices = read_document(&args.devices)?;
    let networks = read_optional(args.networks.as_deref())?;
    let groups = read_optional(args.groups.as_deref())?;
    let zones = read_optional(args.zones.as_deref())?;
    let port_forwards = read_optional(args.port_forwards.as_deref())?;
    let settings = read_optional(args.settings.as_deref())?;

    let ctx = AuditContext::from_export(&SiteExport {
        devices: &devices,
        networks: networks.as_ref(),
        groups: groups.as_ref(),
        zones: zones.as_ref(),
        port_forwards: port_forwards.as_ref(),
        settings: settings.as_ref(),
    });
    tracing::debug!(
        rules = ctx.rules.len(),
        networks = ctx.networks.len(),
        devices = ctx.devices.len(),
        "loaded site export"
    );
    Ok(ctx)
}

/// Resolve a network by id or name.
pub fn resolve_network<'a>(
    ctx: &'a AuditContext,
    identifier: &str,
) -> Result<&'a NetworkInfo, CliError> {
    ctx.find_network(identifier)
        .ok_or_else(|| CliError::NetworkNotFound {
            identifier: identifier.into(),
        })
}

pub fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.into()
}
