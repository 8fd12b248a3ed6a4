//! `uniaudit rules`: the parsed rule model in evaluation order.

use tabled::Tabled;

use uniaudit_core::FirewallRule;

use crate::Presentation;
use crate::cli::SiteArgs;
use crate::error::CliError;
use crate::output;

use super::util::{self, yes_no};

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "Index")]
    index: i64,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "On")]
    enabled: String,
    #[tabled(rename = "Proto")]
    protocol: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "System")]
    predefined: String,
    #[tabled(rename = "Hit")]
    hit: String,
}

impl From<&FirewallRule> for RuleRow {
    fn from(r: &FirewallRule) -> Self {
        Self {
            index: r.index,
            id: r.id.clone(),
            name: r.name.clone(),
            action: r.action.to_string(),
            enabled: yes_no(r.enabled),
            protocol: r.protocol_summary(),
            source: r.source.summary(),
            destination: r.destination.summary(),
            predefined: yes_no(r.predefined),
            hit: yes_no(r.has_been_hit()),
        }
    }
}

pub fn handle(args: &SiteArgs, out: Presentation) -> Result<(), CliError> {
    let mut ctx = util::load_site(args)?;
    ctx.rules.sort_by_key(|r| r.index);
    let rendered = output::render_list(out.format, &ctx.rules, |r| RuleRow::from(r), |r| r.id.clone());
    output::print_output(&rendered, out.quiet);
    Ok(())
}
