//! First-match-wins rule evaluation.
//!
//! Given an ordered rule set and a predicate saying whether a rule applies
//! to some traffic, [`evaluate`] finds the rule that decides that traffic
//! and the first opposite-action rule it renders unreachable.

use crate::model::{ConnectionStateType, FirewallRule, RuleAction};

/// Outcome of one evaluation query.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationResult<'a> {
    /// The lowest-index enabled rule matching the traffic.
    pub effective_rule: Option<&'a FirewallRule>,
    pub is_allowed: bool,
    /// The effective rule blocks, and applies to new connections.
    pub is_blocked: bool,
    /// First block rule after an allowing effective rule.
    pub eclipsed_block_rule: Option<&'a FirewallRule>,
    /// First allow rule after a blocking effective rule.
    pub eclipsed_allow_rule: Option<&'a FirewallRule>,
}

impl EvaluationResult<'_> {
    pub fn block_rule_eclipsed(&self) -> bool {
        self.eclipsed_block_rule.is_some()
    }

    pub fn allow_rule_eclipsed(&self) -> bool {
        self.eclipsed_allow_rule.is_some()
    }
}

/// Determine the effective rule for the traffic described by `predicate`.
///
/// With `for_new_connections`, respond-only allow rules are removed from
/// the candidates: they only ever match established or related flows, so
/// they cannot decide whether a fresh connection gets through.
///
/// Rules with an unrecognized action never match. Candidates are ordered
/// by `index`; equal indexes keep input order.
pub fn evaluate<'a, I, P>(rules: I, predicate: P, for_new_connections: bool) -> EvaluationResult<'a>
where
    I: IntoIterator<Item = &'a FirewallRule>,
    P: Fn(&FirewallRule) -> bool,
{
    let mut candidates: Vec<&FirewallRule> = rules
        .into_iter()
        .filter(|r| r.enabled && r.action != RuleAction::Unknown && predicate(r))
        .filter(|r| {
            !(for_new_connections
                && r.action == RuleAction::Allow
                && r.connection_state_type == ConnectionStateType::RespondOnly)
        })
        .collect();
    candidates.sort_by_key(|r| r.index);

    let Some((&effective, rest)) = candidates.split_first() else {
        return EvaluationResult::default();
    };

    let eclipsed = effective
        .action
        .opposite()
        .and_then(|wanted| rest.iter().copied().find(|r| r.action == wanted));

    let is_allowed = effective.is_allow();
    EvaluationResult {
        effective_rule: Some(effective),
        is_allowed,
        is_blocked: effective.blocks_new_connections(),
        eclipsed_block_rule: if is_allowed { eclipsed } else { None },
        eclipsed_allow_rule: if effective.is_block() { eclipsed } else { None },
    }
}

pub fn is_traffic_blocked<'a, I, P>(rules: I, predicate: P, for_new_connections: bool) -> bool
where
    I: IntoIterator<Item = &'a FirewallRule>,
    P: Fn(&FirewallRule) -> bool,
{
    evaluate(rules, predicate, for_new_connections).is_blocked
}

pub fn is_traffic_allowed<'a, I, P>(rules: I, predicate: P, for_new_connections: bool) -> bool
where
    I: IntoIterator<Item = &'a FirewallRule>,
    P: Fn(&FirewallRule) -> bool,
{
    evaluate(rules, predicate, for_new_connections).is_allowed
}

/// The effective rule, if it is a block rule.
pub fn effective_block_rule<'a, I, P>(
    rules: I,
    predicate: P,
    for_new_connections: bool,
) -> Option<&'a FirewallRule>
where
    I: IntoIterator<Item = &'a FirewallRule>,
    P: Fn(&FirewallRule) -> bool,
{
    evaluate(rules, predicate, for_new_connections)
        .effective_rule
        .filter(|r| r.is_block())
}

/// The effective rule, if it is an allow rule.
pub fn effective_allow_rule<'a, I, P>(
    rules: I,
    predicate: P,
    for_new_connections: bool,
) -> Option<&'a FirewallRule>
where
    I: IntoIterator<Item = &'a FirewallRule>,
    P: Fn(&FirewallRule) -> bool,
{
    evaluate(rules, predicate, for_new_connections)
        .effective_rule
        .filter(|r| r.is_allow())
}
