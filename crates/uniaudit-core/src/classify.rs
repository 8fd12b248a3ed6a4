//! Heuristic network purpose classification.
//!
//! Names are matched against an ordered list of keyword families; the
//! first family that matches decides the purpose. Configuration flags
//! (VLAN id, isolation, internet access) only fill in when the name says
//! nothing, or correct a trusted-sounding name on a locked-down VLAN.

use crate::model::NetworkPurpose;

/// Keywords for one purpose. `substrings` match anywhere in the
/// lower-cased name; `words` only match between boundaries, so "work"
/// does not fire on "coworking" and "media" does not fire on "multimedia".
struct KeywordFamily {
    purpose: NetworkPurpose,
    substrings: &'static [&'static str],
    words: &'static [&'static str],
}

impl KeywordFamily {
    fn matches(&self, lower_name: &str) -> bool {
        self.substrings.iter().any(|k| lower_name.contains(k))
            || self.words.iter().any(|w| contains_word(lower_name, w))
    }
}

/// Families in precedence order.
const FAMILIES: &[KeywordFamily] = &[
    KeywordFamily {
        purpose: NetworkPurpose::IoT,
        substrings: &[
            "iot", "smart", "automation", "zigbee", "zwave", "z-wave", "homekit", "alexa",
        ],
        words: &[
            "media", "tv", "hue", "nest", "sensor", "sensors", "appliance", "appliances", "things",
        ],
    },
    KeywordFamily {
        purpose: NetworkPurpose::Security,
        substrings: &["camera", "security", "surveillance", "cctv", "protect"],
        words: &["cam", "cams", "nvr", "doorbell", "alarm"],
    },
    KeywordFamily {
        purpose: NetworkPurpose::Management,
        substrings: &["management", "mgmt", "infrastructure"],
        words: &["mgt", "infra", "admin", "oob", "ipmi", "idrac"],
    },
    KeywordFamily {
        purpose: NetworkPurpose::Guest,
        substrings: &["guest", "visitor", "hotspot"],
        words: &["public", "byod"],
    },
    KeywordFamily {
        purpose: NetworkPurpose::Corporate,
        substrings: &["corporate", "office", "business", "enterprise"],
        words: &["work", "corp", "staff", "employee", "employees"],
    },
    KeywordFamily {
        purpose: NetworkPurpose::Home,
        substrings: &["home", "family", "house", "residential", "personal"],
        words: &["main", "primary", "trusted", "private"],
    },
    KeywordFamily {
        purpose: NetworkPurpose::Server,
        substrings: &["server", "datacenter", "storage"],
        words: &["dmz", "nas", "lab", "srv", "hosting", "services"],
    },
];

/// Boundary-aware containment: each occurrence of `word` must be preceded
/// and followed by the start/end of the string or a non-letter character
/// (digits count as boundaries, so "iot2" still reads as "iot").
fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(start, _)| {
        let end = start + word.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphabetic) && !after.is_some_and(char::is_alphabetic)
    })
}

/// Purpose suggested by the name alone.
pub fn classify_by_name(name: &str) -> Option<NetworkPurpose> {
    let lower = name.to_lowercase();
    FAMILIES
        .iter()
        .find(|family| family.matches(&lower))
        .map(|family| family.purpose)
}

/// Inputs beyond the name. Unknown flags stay `None` and never trigger
/// a reclassification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkSignals<'a> {
    /// Controller purpose string (`guest`, `corporate`, `vlan-only`, ...).
    pub purpose: Option<&'a str>,
    pub vlan_id: Option<u16>,
    pub dhcp_enabled: Option<bool>,
    pub network_isolation_enabled: Option<bool>,
    pub internet_access_enabled: Option<bool>,
}

/// Infer a network's purpose.
pub fn classify_network(name: &str, signals: NetworkSignals<'_>) -> NetworkPurpose {
    if signals
        .purpose
        .is_some_and(|p| p.eq_ignore_ascii_case("guest"))
    {
        return NetworkPurpose::Guest;
    }

    let native = signals.vlan_id == Some(1);
    let locked_down = signals.network_isolation_enabled == Some(true)
        && signals.internet_access_enabled == Some(false);

    let purpose = match classify_by_name(name) {
        // A trusted-sounding name on an isolated, offline VLAN is really a
        // camera or management segment that was named loosely.
        Some(p @ (NetworkPurpose::Home | NetworkPurpose::Corporate)) => {
            if !locked_down {
                p
            } else if native {
                NetworkPurpose::Management
            } else {
                NetworkPurpose::Security
            }
        }
        Some(p) => p,
        None if native => NetworkPurpose::Management,
        None => match (
            signals.network_isolation_enabled,
            signals.internet_access_enabled,
        ) {
            (Some(true), Some(false)) => NetworkPurpose::Security,
            (Some(true), Some(true)) => NetworkPurpose::IoT,
            _ => NetworkPurpose::Unknown,
        },
    };

    tracing::trace!(name, ?purpose, "classified network");
    purpose
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_only(name: &str) -> NetworkPurpose {
        classify_network(name, NetworkSignals::default())
    }

    fn on_vlan(name: &str, vlan: u16) -> NetworkPurpose {
        classify_network(
            name,
            NetworkSignals {
                vlan_id: Some(vlan),
                ..NetworkSignals::default()
            },
        )
    }

    fn flagged(name: &str, vlan: u16, isolated: bool, internet: bool) -> NetworkPurpose {
        classify_network(
            name,
            NetworkSignals {
                vlan_id: Some(vlan),
                network_isolation_enabled: Some(isolated),
                internet_access_enabled: Some(internet),
                ..NetworkSignals::default()
            },
        )
    }

    #[test]
    fn word_boundaries_prevent_false_positives() {
        assert_ne!(name_only("rework"), NetworkPurpose::Corporate);
        assert_ne!(name_only("Coworking"), NetworkPurpose::Corporate);
        assert_ne!(name_only("multimedia"), NetworkPurpose::IoT);
        assert_eq!(name_only("Work Devices"), NetworkPurpose::Corporate);
        assert_eq!(name_only("Media"), NetworkPurpose::IoT);
        assert_eq!(name_only("work-laptops"), NetworkPurpose::Corporate);
    }

    #[test]
    fn digits_act_as_boundaries() {
        assert_eq!(name_only("cam2"), NetworkPurpose::Security);
        assert_eq!(name_only("VLAN40-TV"), NetworkPurpose::IoT);
    }

    #[test]
    fn family_precedence() {
        // IoT outranks Home, Security outranks Guest.
        assert_eq!(name_only("Smart Home"), NetworkPurpose::IoT);
        assert_eq!(name_only("Guest Cameras"), NetworkPurpose::Security);
        assert_eq!(name_only("Home Office"), NetworkPurpose::Corporate);
        assert_eq!(name_only("Homelab"), NetworkPurpose::Home);
        assert_eq!(name_only("Servers"), NetworkPurpose::Server);
        assert_eq!(name_only("Network Management"), NetworkPurpose::Management);
    }

    #[test]
    fn explicit_guest_purpose_wins() {
        let purpose = classify_network(
            "Cameras",
            NetworkSignals {
                purpose: Some("guest"),
                ..NetworkSignals::default()
            },
        );
        assert_eq!(purpose, NetworkPurpose::Guest);
    }

    #[test]
    fn native_vlan_defaults_to_management() {
        assert_eq!(on_vlan("Default", 1), NetworkPurpose::Management);
        assert_eq!(on_vlan("LAN", 1), NetworkPurpose::Management);
        assert_eq!(on_vlan("Default", 10), NetworkPurpose::Unknown);
    }

    #[test]
    fn native_vlan_keeps_ordinary_home_and_guest_names() {
        assert_eq!(flagged("Home Network", 1, false, true), NetworkPurpose::Home);
        assert_eq!(on_vlan("Home Network", 1), NetworkPurpose::Home);
        assert_eq!(flagged("Guest WiFi", 1, true, false), NetworkPurpose::Guest);
    }

    #[test]
    fn native_vlan_override_beats_locked_down_home() {
        assert_eq!(flagged("Home Network", 1, true, false), NetworkPurpose::Management);
    }

    #[test]
    fn locked_down_home_or_corporate_becomes_security() {
        assert_eq!(flagged("Home Network", 20, true, false), NetworkPurpose::Security);
        assert_eq!(flagged("Office", 20, true, false), NetworkPurpose::Security);
        assert_eq!(flagged("Home Network", 20, true, true), NetworkPurpose::Home);
        assert_eq!(flagged("Home Network", 20, false, false), NetworkPurpose::Home);
    }

    #[test]
    fn pattern_matches_are_not_overridden_by_flags() {
        assert_eq!(flagged("IoT", 30, false, true), NetworkPurpose::IoT);
        assert_eq!(flagged("Cameras", 30, false, true), NetworkPurpose::Security);
        assert_eq!(flagged("Mgmt", 30, false, true), NetworkPurpose::Management);
        assert_eq!(flagged("Guest", 30, true, false), NetworkPurpose::Guest);
    }

    #[test]
    fn unnamed_networks_fall_back_to_flags() {
        assert_eq!(flagged("VLAN 50", 50, true, false), NetworkPurpose::Security);
        assert_eq!(flagged("VLAN 50", 50, true, true), NetworkPurpose::IoT);
        assert_eq!(flagged("VLAN 50", 50, false, true), NetworkPurpose::Unknown);
        assert_eq!(on_vlan("VLAN 50", 50), NetworkPurpose::Unknown);
    }
}
