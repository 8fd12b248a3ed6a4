//! `uniaudit networks`: networks with their inferred purpose.

use tabled::Tabled;

use uniaudit_core::NetworkInfo;

use crate::Presentation;
use crate::cli::SiteArgs;
use crate::error::CliError;
use crate::output;

use super::util::{self, yes_no};

#[derive(Tabled)]
struct NetworkRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "VLAN")]
    vlan: u16,
    #[tabled(rename = "Purpose")]
    purpose: String,
    #[tabled(rename = "Subnet")]
    subnet: String,
    #[tabled(rename = "Isolated")]
    isolated: String,
    #[tabled(rename = "Internet")]
    internet: String,
    #[tabled(rename = "DHCP")]
    dhcp: String,
}

impl From<&NetworkInfo> for NetworkRow {
    fn from(n: &NetworkInfo) -> Self {
        Self {
            id: n.id.clone(),
            name: n.name.clone(),
            vlan: n.vlan_id,
            purpose: n.purpose.to_string(),
            subnet: n.subnet.map(|s| s.to_string()).unwrap_or_default(),
            isolated: yes_no(n.network_isolation_enabled),
            internet: yes_no(n.internet_access_enabled),
            dhcp: yes_no(n.dhcp_enabled),
        }
    }
}

pub fn handle(args: &SiteArgs, out: Presentation) -> Result<(), CliError> {
    let ctx = util::load_site(args)?;
    let rendered = output::render_list(
        out.format,
        &ctx.networks,
        |n| NetworkRow::from(n),
        |n| n.name.clone(),
    );
    output::print_output(&rendered, out.quiet);
    Ok(())
}
