//! Human- and agent-readable change descriptions.
//!
//! [`build_message`] is a pure function: the same [`MessageParts`] always render
//! to the same bytes, which makes the output suitable for golden tests.

use crate::Action;

/// Separator between message segments.
pub const SEGMENT_SEPARATOR: &str = " | ";

/// Prefix added to actionable records in preview mode.
pub const PREVIEW_PREFIX: &str = "[PREVIEW] ";

/// Everything needed to describe one change.
#[derive(Debug, Clone, Copy)]
pub struct MessageParts<'a> {
    pub action: Action,
    pub reason: Option<&'a str>,
    pub campaign_name: &'a str,
    pub current_budget: f64,
    pub proposed_budget: f64,
    pub budget_change: f64,
    pub budget_change_pct: f64,
    pub is_shared: bool,
    /// Names of every campaign on the budget, including this one.
    pub shared_campaigns: &'a [String],
}

/// Renders a pipe-joined summary of one change.
pub fn build_message(parts: &MessageParts<'_>) -> String {
    let mut segments: Vec<String> = Vec::with_capacity(3);
    let name = parts.campaign_name;

    match parts.action {
        Action::Increase => {
            segments.push(format!("INCREASE: {name}"));
            segments.push(format!(
                "Budget: ${:.2} → ${:.2} (+${:.2}, +{:.1}%)",
                parts.current_budget,
                parts.proposed_budget,
                parts.budget_change.abs(),
                parts.budget_change_pct.abs()
            ));
        }
        Action::Decrease => {
            segments.push(format!("DECREASE: {name}"));
            segments.push(format!(
                "Budget: ${:.2} → ${:.2} (-${:.2}, -{:.1}%)",
                parts.current_budget,
                parts.proposed_budget,
                parts.budget_change.abs(),
                parts.budget_change_pct.abs()
            ));
        }
        Action::Skipped => {
            segments.push(format!("SKIPPED: {name}"));
            if let Some(reason) = parts.reason {
                segments.push(format!("Reason: {reason}"));
            }
        }
        Action::SharedRef => {
            segments.push(format!("SHARED BUDGET (no duplicate update): {name}"));
            segments.push(format!(
                "Budget: ${:.2} → ${:.2}",
                parts.current_budget, parts.proposed_budget
            ));
        }
        Action::NoChange => {
            segments.push(format!("NO CHANGE: {name}"));
            segments.push(format!("Budget remains at ${:.2}", parts.current_budget));
        }
    }

    if parts.is_shared {
        let others: Vec<&str> = parts
            .shared_campaigns
            .iter()
            .map(String::as_str)
            .filter(|other| *other != name)
            .collect();
        if !others.is_empty() {
            segments.push(format!("⚠️ Shared budget with: {}", others.join(", ")));
        }
    }

    segments.join(SEGMENT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_MEMBERS: &[String] = &[];

    fn parts(action: Action) -> MessageParts<'static> {
        MessageParts {
            action,
            reason: None,
            campaign_name: "Brand",
            current_budget: 100.0,
            proposed_budget: 150.0,
            budget_change: 50.0,
            budget_change_pct: 50.0,
            is_shared: false,
            shared_campaigns: NO_MEMBERS,
        }
    }

    #[test]
    fn increase_golden() {
        assert_eq!(
            build_message(&parts(Action::Increase)),
            "INCREASE: Brand | Budget: $100.00 → $150.00 (+$50.00, +50.0%)"
        );
    }

    #[test]
    fn decrease_golden_uses_absolute_values() {
        let msg = build_message(&MessageParts {
            proposed_budget: 75.5,
            budget_change: -24.5,
            budget_change_pct: -24.5,
            ..parts(Action::Decrease)
        });
        assert_eq!(msg, "DECREASE: Brand | Budget: $100.00 → $75.50 (-$24.50, -24.5%)");
    }

    #[test]
    fn skipped_with_and_without_reason() {
        assert_eq!(build_message(&parts(Action::Skipped)), "SKIPPED: Brand");
        let msg = build_message(&MessageParts {
            reason: Some("Could not fetch current budget from the Ads API"),
            ..parts(Action::Skipped)
        });
        assert_eq!(
            msg,
            "SKIPPED: Brand | Reason: Could not fetch current budget from the Ads API"
        );
    }

    #[test]
    fn no_change_golden() {
        assert_eq!(
            build_message(&parts(Action::NoChange)),
            "NO CHANGE: Brand | Budget remains at $100.00"
        );
    }

    #[test]
    fn shared_ref_lists_other_members_only() {
        let members = vec!["Brand".to_string(), "Generic".to_string(), "Competitor".to_string()];
        let msg = build_message(&MessageParts {
            is_shared: true,
            shared_campaigns: &members,
            ..parts(Action::SharedRef)
        });
        assert_eq!(
            msg,
            "SHARED BUDGET (no duplicate update): Brand | Budget: $100.00 → $150.00 | ⚠️ Shared budget with: Generic, Competitor"
        );
    }

    #[test]
    fn shared_with_only_same_named_members_adds_nothing() {
        let members = vec!["Brand".to_string(), "Brand".to_string()];
        let msg = build_message(&MessageParts {
            is_shared: true,
            shared_campaigns: &members,
            ..parts(Action::Increase)
        });
        assert!(!msg.contains("Shared budget with"));
    }
}
