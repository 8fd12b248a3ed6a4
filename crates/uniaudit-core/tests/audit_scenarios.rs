#![allow(clippy::unwrap_used)]
// End-to-end audit scenarios driven through the JSON parsers.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use uniaudit_core::{
    AuditContext, AuditReport, AuditSettings, CheckKind, IssueType, NetworkPurpose, Protocol,
    Severity, SiteExport, TrafficFilter, run_audit, run_check,
};

// ── Fixtures ────────────────────────────────────────────────────────

fn management_network() -> Value {
    json!({
        "_id": "net-mgmt",
        "name": "Management",
        "purpose": "corporate",
        "vlan": 99,
        "ip_subnet": "10.0.99.1/24",
        "dhcpd_enabled": false,
        "network_isolation_enabled": true,
        "internet_access_enabled": false
    })
}

fn home_network() -> Value {
    json!({
        "_id": "net-home",
        "name": "Home",
        "purpose": "corporate",
        "vlan": 10,
        "ip_subnet": "192.168.10.1/24",
        "dhcpd_enabled": true
    })
}

fn iot_network() -> Value {
    json!({
        "_id": "net-iot",
        "name": "IoT Devices",
        "purpose": "corporate",
        "vlan": 40,
        "ip_subnet": "192.168.40.1/24",
        "dhcpd_enabled": true
    })
}

/// A devices payload with a single gateway carrying the given networks and
/// zone-based policies.
fn gateway(networks: Vec<Value>, policies: Vec<Value>) -> Value {
    json!({
        "data": [{
            "_id": "dev-udm",
            "mac": "AA:BB:CC:00:00:01",
            "type": "udm",
            "model": "UDMPRO",
            "name": "Dream Machine",
            "ip": "10.0.99.1",
            "network_table": networks,
            "firewall_policies": policies
        }]
    })
}

fn allow_from_mgmt(id: &str, index: i64, destination: Value) -> Value {
    json!({
        "_id": id,
        "name": id,
        "action": "ALLOW",
        "enabled": true,
        "index": index,
        "protocol": "all",
        "source": { "matching_target": "NETWORK", "network_ids": ["net-mgmt"] },
        "destination": destination
    })
}

fn legacy_drop(id: &str, src: &str, dst: &str, enabled: bool) -> Value {
    json!({
        "_id": id,
        "name": format!("Drop {src} to {dst}"),
        "action": "drop",
        "enabled": enabled,
        "rule_index": 2000,
        "ruleset": "LAN_IN",
        "src_networkconf_id": src,
        "dst_networkconf_id": dst
    })
}

fn context(devices: &Value) -> AuditContext {
    AuditContext::from_export(&SiteExport::new(devices))
}

fn codes(issues: &[uniaudit_core::Issue]) -> Vec<IssueType> {
    issues.iter().map(|i| i.issue_type).collect()
}

// ── Management access floor ─────────────────────────────────────────

#[test]
fn locked_down_management_network_needs_three_carve_outs() {
    let devices = gateway(vec![management_network()], Vec::new());
    let ctx = context(&devices);
    assert_eq!(ctx.networks[0].purpose, NetworkPurpose::Management);

    let issues = run_audit(&ctx, &AuditSettings::default());
    assert_eq!(
        codes(&issues),
        vec![
            IssueType::MgmtMissingUnifiAccess,
            IssueType::MgmtMissingAfcAccess,
            IssueType::MgmtMissingNtpAccess,
        ]
    );
    for issue in &issues {
        assert_eq!(issue.severity, Severity::Informational);
        assert_eq!(issue.score_impact, 0);
        assert_eq!(issue.current_network.as_deref(), Some("Management"));
    }
    assert_eq!(AuditReport::from_issues(issues).score, 100);
}

#[test]
fn carve_out_rules_satisfy_the_floor() {
    let mut ntp = allow_from_mgmt(
        "allow-ntp",
        10002,
        json!({ "matching_target": "ANY", "port": "123" }),
    );
    ntp["protocol"] = json!("udp");
    let policies = vec![
        allow_from_mgmt(
            "allow-unifi",
            10000,
            json!({ "matching_target": "WEB", "web_domains": ["ui.com"] }),
        ),
        allow_from_mgmt(
            "allow-afc",
            10001,
            json!({ "matching_target": "WEB", "web_domains": ["afc.ui.com"] }),
        ),
        ntp,
    ];
    let devices = gateway(vec![management_network()], policies);
    let ctx = context(&devices);
    assert_eq!(ctx.rules.len(), 3);

    let issues = run_audit(&ctx, &AuditSettings::default());
    assert!(issues.is_empty(), "unexpected findings: {:?}", codes(&issues));
}

#[test]
fn cellular_device_adds_carrier_requirement() {
    let mut devices = gateway(vec![management_network()], Vec::new());
    devices["data"].as_array_mut().unwrap().push(json!({
        "_id": "dev-5g",
        "mac": "aa:bb:cc:00:00:05",
        "type": "umbb",
        "model": "U5GMAX",
        "name": "5G Backup",
        "ip": "10.0.99.20"
    }));
    let ctx = context(&devices);
    assert!(ctx.has_cellular_device());

    let issues = run_check(CheckKind::ManagementAccess, &ctx);
    assert_eq!(issues.len(), 4);
    assert_eq!(issues[3].issue_type, IssueType::MgmtMissing5gAccess);
}

// ── Inter-VLAN isolation ────────────────────────────────────────────

#[test]
fn block_rule_closes_the_pair_and_disabling_it_reopens_it() {
    let networks = json!([home_network(), iot_network()]);
    let audit = |rules: Vec<Value>| {
        let devices = json!([{ "_id": "site", "firewall_rules": rules }]);
        let ctx = AuditContext::from_export(&SiteExport {
            networks: Some(&networks),
            ..SiteExport::new(&devices)
        });
        run_check(CheckKind::InterVlanIsolation, &ctx)
    };

    let open = audit(Vec::new());
    assert_eq!(codes(&open), vec![IssueType::MissingIsolation]);
    assert_eq!(open[0].severity, Severity::Recommended);
    assert_eq!(open[0].description, "Home <-> IoT");

    assert!(audit(vec![legacy_drop("b1", "net-iot", "net-home", true)]).is_empty());
    assert!(audit(vec![legacy_drop("b1", "net-home", "net-iot", true)]).is_empty());
    assert_eq!(
        codes(&audit(vec![legacy_drop("b1", "net-iot", "net-home", false)])),
        vec![IssueType::MissingIsolation]
    );
}

#[test]
fn private_range_block_covers_every_pair() {
    let networks = json!([home_network(), iot_network(), management_network()]);
    let devices = json!([{
        "_id": "site",
        "firewall_rules": [{
            "_id": "rfc1918",
            "name": "Drop inter-VLAN",
            "action": "drop",
            "rule_index": 2000,
            "src_address": "192.168.0.0/16",
            "dst_address": "192.168.0.0/16"
        }, {
            "_id": "mgmt",
            "name": "Drop to management",
            "action": "reject",
            "rule_index": 2001,
            "src_address": "192.168.0.0/16",
            "dst_address": "10.0.0.0/8"
        }]
    }]);
    let ctx = AuditContext::from_export(&SiteExport {
        networks: Some(&networks),
        ..SiteExport::new(&devices)
    });
    assert!(run_check(CheckKind::InterVlanIsolation, &ctx).is_empty());
}

#[test]
fn explicit_allow_between_networks_is_a_bypass() {
    let networks = json!([home_network(), iot_network()]);
    let devices = json!([{
        "_id": "site",
        "firewall_rules": [{
            "_id": "allow-iot",
            "name": "IoT to Home",
            "action": "accept",
            "rule_index": 1000,
            "src_networkconf_id": "net-iot",
            "dst_networkconf_id": "net-home"
        }]
    }]);
    let ctx = AuditContext::from_export(&SiteExport {
        networks: Some(&networks),
        ..SiteExport::new(&devices)
    });
    let issues = run_check(CheckKind::InterVlanIsolation, &ctx);
    assert_eq!(codes(&issues), vec![IssueType::IsolationBypassed]);
    assert_eq!(issues[0].severity, Severity::Critical);
    assert_eq!(issues[0].rule_id.as_deref(), Some("allow-iot"));
}

// ── Rule hygiene ────────────────────────────────────────────────────

#[test]
fn permissive_rule_narrowed_by_port_becomes_broad() {
    let rule = |port: Option<&str>| {
        let mut row = json!({
            "_id": "any-any",
            "name": "Allow everything",
            "action": "ALLOW",
            "index": 10000,
            "protocol": "all",
            "source": { "matching_target": "ANY" },
            "destination": { "matching_target": "ANY" }
        });
        if let Some(port) = port {
            row["destination"]["port"] = json!(port);
        }
        gateway(vec![home_network()], vec![row])
    };

    let wide = run_check(CheckKind::Permissive, &context(&rule(None)));
    assert_eq!(codes(&wide), vec![IssueType::PermissiveRule]);
    assert_eq!(wide[0].severity, Severity::Critical);
    assert_eq!(wide[0].score_impact, 15);

    let narrowed = run_check(CheckKind::Permissive, &context(&rule(Some("443"))));
    assert_eq!(codes(&narrowed), vec![IssueType::BroadRule]);
}

#[test]
fn settings_filter_and_score() {
    let policies = vec![json!({
        "_id": "any-any",
        "name": "Allow everything",
        "action": "ALLOW",
        "index": 10000,
        "source": { "matching_target": "ANY" },
        "destination": { "matching_target": "ANY" }
    })];
    let devices = gateway(vec![home_network(), iot_network()], policies);
    let ctx = context(&devices);

    let everything = run_audit(&ctx, &AuditSettings::default());
    let all_codes = codes(&everything);
    assert!(all_codes.contains(&IssueType::PermissiveRule));
    assert!(all_codes.contains(&IssueType::IotNetworkNotIsolated));

    let critical_only = AuditSettings {
        min_severity: Some(Severity::Critical),
        ..AuditSettings::default()
    };
    assert!(
        run_audit(&ctx, &critical_only)
            .iter()
            .all(|i| i.severity == Severity::Critical)
    );

    let skip_permissive = AuditSettings {
        disabled_checks: [CheckKind::Permissive].into_iter().collect(),
        ..AuditSettings::default()
    };
    assert!(
        !codes(&run_audit(&ctx, &skip_permissive)).contains(&IssueType::PermissiveRule)
    );

    let report = AuditReport::from_issues(everything);
    let deducted: u32 = report.issues.iter().map(|i| i.score_impact).sum();
    assert_eq!(report.score, 100u32.saturating_sub(deducted));
}

// ── Tracing ─────────────────────────────────────────────────────────

#[test]
fn trace_narrows_by_port_and_protocol() {
    let networks = json!([home_network(), iot_network()]);
    let devices = json!([{
        "_id": "site",
        "firewall_rules": [{
            "_id": "allow-mqtt",
            "name": "Home to MQTT",
            "action": "accept",
            "protocol": "tcp",
            "rule_index": 1000,
            "src_networkconf_id": "net-home",
            "dst_networkconf_id": "net-iot",
            "dst_port": "1883"
        }, legacy_drop("drop-all", "net-home", "net-iot", true)]
    }]);
    let ctx = AuditContext::from_export(&SiteExport {
        networks: Some(&networks),
        ..SiteExport::new(&devices)
    });
    let home = ctx.find_network("home").unwrap();
    let iot = ctx.find_network("net-iot").unwrap();

    let mqtt = TrafficFilter {
        protocol: Some(Protocol::Tcp),
        port: Some("1883".to_owned()),
    };
    let result = ctx.trace_traffic(home, iot, &mqtt, true);
    assert!(result.is_allowed);
    assert_eq!(result.effective_rule.unwrap().id, "allow-mqtt");
    assert_eq!(result.eclipsed_block_rule.unwrap().id, "drop-all");

    let ssh = TrafficFilter {
        protocol: Some(Protocol::Tcp),
        port: Some("22".to_owned()),
    };
    let result = ctx.trace_traffic(home, iot, &ssh, true);
    assert!(result.is_blocked);
    assert_eq!(result.effective_rule.unwrap().id, "drop-all");
}
