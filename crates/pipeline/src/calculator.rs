//! Change calculation: input rows + fetched budgets + policy → change records.
//!
//! ## Shared budgets
//!
//! Several campaigns may draw from one budget resource. The calculator counts
//! each budget resource once when allocating, broadcasts the resulting amount
//! to every member row, and designates the first member in input order as the
//! *primary* record. Only the primary can become INCREASE or DECREASE; every
//! later member becomes [`Action::SharedRef`] and is never mutated on its own.
//!
//! "First" is strictly input order. Re-ordering the input can change which
//! campaign is the primary; callers must not reorder rows to parallelise.

use std::collections::{HashMap, HashSet};

use crate::distribution::{allocate, BudgetDemand};
use crate::message::{build_message, MessageParts};
use crate::records::UNKNOWN_CAMPAIGN_NAME;
use crate::{
    round_cents, Action, BudgetError, BudgetPolicy, BudgetResourceName, BudgetSnapshot,
    CampaignRow, ChangeRecord, Direction, ResourceKind, Status, Timestamp,
};

/// Reason attached to rows whose budget could not be fetched.
pub const BUDGET_NOT_FOUND_REASON: &str = "Could not fetch current budget from the Ads API";

/// A campaign row with its fetched budget resolved.
struct ResolvedRow<'a> {
    row: &'a CampaignRow,
    campaign_name: String,
    current_budget: f64,
}

/// Rows grouped by budget resource, in order of first appearance.
struct BudgetGroups<'a> {
    /// Member row indices per group.
    members: Vec<Vec<usize>>,
    /// Group index per budget resource.
    index: HashMap<&'a BudgetResourceName, usize>,
}

impl<'a> BudgetGroups<'a> {
    fn build(rows: &'a [CampaignRow]) -> Self {
        let mut members: Vec<Vec<usize>> = Vec::new();
        let mut index: HashMap<&BudgetResourceName, usize> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            let group = *index.entry(&row.budget_resource_name).or_insert_with(|| {
                members.push(Vec::new());
                members.len() - 1
            });
            members[group].push(i);
        }
        Self { members, index }
    }

    fn group_of(&self, budget: &BudgetResourceName) -> usize {
        self.index[budget]
    }
}

/// Computes one [`ChangeRecord`] per input row, in input order.
///
/// # Errors
///
/// Returns [`BudgetError::WrongColumn`] for the first campaign value that does
/// not look like a campaign resource name. No records are produced in that case.
pub fn calculate_changes(
    rows: &[CampaignRow],
    snapshots: &HashMap<BudgetResourceName, BudgetSnapshot>,
    policy: &BudgetPolicy,
    timestamp: Timestamp,
) -> Result<Vec<ChangeRecord>, BudgetError> {
    let resolved = resolve_rows(rows, snapshots)?;
    let groups = BudgetGroups::build(rows);

    let demands: Vec<BudgetDemand> = groups
        .members
        .iter()
        .map(|members| {
            let first = &resolved[members[0]];
            BudgetDemand::new(first.current_budget, first.row.kpi_value.unwrap_or(0.0))
        })
        .collect();
    let allocations = allocate(&demands, &policy.cap);

    tracing::debug!(
        rows = rows.len(),
        unique_budgets = groups.members.len(),
        shared_budgets = groups.members.iter().filter(|m| m.len() > 1).count(),
        "Allocated budget changes"
    );

    let mut claimed: HashSet<&BudgetResourceName> = HashSet::new();
    let mut changes = Vec::with_capacity(rows.len());

    for entry in &resolved {
        let budget = &entry.row.budget_resource_name;
        let group = groups.group_of(budget);
        let members = &groups.members[group];
        let is_shared = members.len() > 1;
        let shared_names: Vec<String> = if is_shared {
            members
                .iter()
                .map(|&i| resolved[i].campaign_name.clone())
                .collect()
        } else {
            Vec::new()
        };
        let is_primary = claimed.insert(budget);

        let record = build_record(RecordInput {
            entry,
            allocation: allocations[group],
            direction: policy.direction,
            is_primary,
            shared_names,
            timestamp,
        });
        changes.push(record);
    }

    Ok(changes)
}

fn resolve_rows<'a>(
    rows: &'a [CampaignRow],
    snapshots: &HashMap<BudgetResourceName, BudgetSnapshot>,
) -> Result<Vec<ResolvedRow<'a>>, BudgetError> {
    rows.iter()
        .map(|row| {
            if !row.campaign_resource_name.is_well_formed() {
                return Err(BudgetError::wrong_column(
                    ResourceKind::Campaign,
                    row.campaign_resource_name.as_str(),
                ));
            }
            let snapshot = snapshots.get(&row.budget_resource_name);
            Ok(ResolvedRow {
                row,
                campaign_name: snapshot
                    .map(|s| s.campaign_name.clone())
                    .unwrap_or_else(|| UNKNOWN_CAMPAIGN_NAME.to_string()),
                current_budget: snapshot.map(|s| s.amount).unwrap_or(0.0),
            })
        })
        .collect()
}

struct RecordInput<'a, 'r> {
    entry: &'a ResolvedRow<'r>,
    allocation: f64,
    direction: Direction,
    is_primary: bool,
    shared_names: Vec<String>,
    timestamp: Timestamp,
}

fn build_record(input: RecordInput<'_, '_>) -> ChangeRecord {
    let RecordInput {
        entry,
        allocation,
        direction,
        is_primary,
        shared_names,
        timestamp,
    } = input;
    let current = entry.current_budget;
    let is_shared = !shared_names.is_empty();

    let mut record = ChangeRecord {
        campaign_resource_name: entry.row.campaign_resource_name.clone(),
        budget_resource_name: entry.row.budget_resource_name.clone(),
        campaign_name: entry.campaign_name.clone(),
        current_budget: current,
        proposed_budget: current,
        budget_change: 0.0,
        budget_change_pct: 0.0,
        action: Action::NoChange,
        status: Status::Pending,
        message: String::new(),
        is_shared_budget: is_shared,
        shared_with_campaigns: shared_names,
        timestamp,
    };

    let mut reason = None;

    // A budget that could not be fetched is skipped on every row, shared or not.
    if current == 0.0 {
        record.action = Action::Skipped;
        reason = Some(BUDGET_NOT_FOUND_REASON);
    } else if !is_primary {
        record.action = Action::SharedRef;
        record.status = Status::Shared;
        record.proposed_budget = round_cents(apply_direction(current, allocation, direction));
    } else if allocation > 0.0 {
        let proposed = round_cents(apply_direction(current, allocation, direction));
        // Floors at zero for decreases, so the delta can be smaller than the allocation.
        let actual = round_cents((proposed - current).abs());
        if actual > 0.0 {
            let pct = percent_of(actual, current);
            let (action, sign) = match direction {
                Direction::Increase => (Action::Increase, 1.0),
                Direction::Decrease => (Action::Decrease, -1.0),
            };
            record.action = action;
            record.proposed_budget = proposed;
            record.budget_change = sign * actual;
            record.budget_change_pct = sign * pct;
        }
    }

    let shared_count = record.shared_with_campaigns.len();
    let shared_reason = format!(
        "Budget shared with {shared_count} campaigns - update applied via first campaign"
    );
    if record.action == Action::SharedRef {
        reason = Some(shared_reason.as_str());
    }

    record.message = build_message(&MessageParts {
        action: record.action,
        reason,
        campaign_name: &record.campaign_name,
        current_budget: current,
        proposed_budget: record.proposed_budget,
        budget_change: record.budget_change,
        budget_change_pct: record.budget_change_pct,
        is_shared,
        shared_campaigns: &record.shared_with_campaigns,
    });
    record
}

fn apply_direction(current: f64, change: f64, direction: Direction) -> f64 {
    match direction {
        Direction::Increase => current + change,
        Direction::Decrease => (current - change).max(0.0),
    }
}

fn percent_of(change: f64, current: f64) -> f64 {
    if current > 0.0 {
        change / current * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CapPolicy, DistributionStrategy, ExecutionMode, Micros, Step};
    use proptest::prelude::*;

    fn snapshot(budget: &str, campaign_name: &str, amount: f64) -> BudgetSnapshot {
        BudgetSnapshot {
            resource_name: BudgetResourceName::new(budget),
            amount_micros: Micros::from_amount(amount),
            amount,
            budget_name: format!("{campaign_name} budget"),
            campaign_name: campaign_name.to_string(),
            campaign_resource_name: crate::CampaignResourceName::new("customers/1/campaigns/0"),
        }
    }

    fn snapshots(entries: &[(&str, &str, f64)]) -> HashMap<BudgetResourceName, BudgetSnapshot> {
        entries
            .iter()
            .map(|(b, n, a)| (BudgetResourceName::new(*b), snapshot(b, n, *a)))
            .collect()
    }

    fn policy(direction: Direction, cap: CapPolicy) -> BudgetPolicy {
        BudgetPolicy {
            direction,
            cap,
            execution_mode: ExecutionMode::Preview,
        }
    }

    fn absolute(step: f64, max: f64) -> CapPolicy {
        CapPolicy::PerCampaign {
            step: Step::Absolute(step),
            max_change_per_campaign: max,
        }
    }

    fn now() -> Timestamp {
        Timestamp::now()
    }

    #[test]
    fn independent_budgets_increase_by_absolute_step() {
        let rows = vec![
            CampaignRow::new("customers/1/campaigns/1", "customers/1/campaignBudgets/1", None),
            CampaignRow::new("customers/1/campaigns/2", "customers/1/campaignBudgets/2", None),
            CampaignRow::new("customers/1/campaigns/3", "customers/1/campaignBudgets/3", None),
        ];
        let snaps = snapshots(&[
            ("customers/1/campaignBudgets/1", "A", 100.0),
            ("customers/1/campaignBudgets/2", "B", 200.0),
            ("customers/1/campaignBudgets/3", "C", 300.0),
        ]);
        let changes = calculate_changes(
            &rows,
            &snaps,
            &policy(Direction::Increase, absolute(50.0, 1000.0)),
            now(),
        )
        .unwrap();

        let proposed: Vec<f64> = changes.iter().map(|c| c.proposed_budget).collect();
        assert_eq!(proposed, vec![150.0, 250.0, 350.0]);
        assert!(changes.iter().all(|c| c.action == Action::Increase));
        assert!(changes.iter().all(|c| c.status == Status::Pending));
        assert!(changes.iter().all(|c| c.budget_change == 50.0));
        assert_eq!(changes[0].budget_change_pct, 50.0);
        assert_eq!(
            changes[0].message,
            "INCREASE: A | Budget: $100.00 → $150.00 (+$50.00, +50.0%)"
        );
    }

    #[test]
    fn shared_budget_counts_once_in_total_mode() {
        let rows = vec![
            CampaignRow::new("customers/1/campaigns/1", "customers/1/campaignBudgets/9", None),
            CampaignRow::new("customers/1/campaigns/2", "customers/1/campaignBudgets/9", None),
        ];
        let snaps = snapshots(&[("customers/1/campaignBudgets/9", "Shared", 100.0)]);
        let cap = CapPolicy::TotalBudget {
            total: 50.0,
            strategy: DistributionStrategy::Equal,
        };
        let changes =
            calculate_changes(&rows, &snaps, &policy(Direction::Increase, cap), now()).unwrap();

        assert_eq!(changes[0].action, Action::Increase);
        assert_eq!(changes[0].proposed_budget, 150.0);
        assert_eq!(changes[0].budget_change, 50.0);
        assert!(changes[0].is_shared_budget);

        assert_eq!(changes[1].action, Action::SharedRef);
        assert_eq!(changes[1].status, Status::Shared);
        assert_eq!(changes[1].budget_change, 0.0);
        assert_eq!(changes[1].budget_change_pct, 0.0);
        assert_eq!(changes[1].proposed_budget, 150.0);
        assert_eq!(changes[1].shared_with_campaigns, vec!["Shared", "Shared"]);
        assert!(changes[1]
            .message
            .starts_with("SHARED BUDGET (no duplicate update): Shared"));
    }

    #[test]
    fn missing_budget_is_skipped_with_unknown_name() {
        let rows = vec![CampaignRow::new(
            "customers/1/campaigns/1",
            "customers/1/campaignBudgets/404",
            None,
        )];
        let changes = calculate_changes(
            &rows,
            &HashMap::new(),
            &policy(Direction::Increase, absolute(10.0, 100.0)),
            now(),
        )
        .unwrap();
        assert_eq!(changes[0].action, Action::Skipped);
        assert_eq!(changes[0].campaign_name, "Unknown");
        assert_eq!(changes[0].current_budget, 0.0);
        assert_eq!(
            changes[0].message,
            format!("SKIPPED: Unknown | Reason: {BUDGET_NOT_FOUND_REASON}")
        );
    }

    #[test]
    fn every_row_on_a_missing_shared_budget_is_skipped() {
        let rows = vec![
            CampaignRow::new("customers/1/campaigns/1", "customers/1/campaignBudgets/404", None),
            CampaignRow::new("customers/1/campaigns/2", "customers/1/campaignBudgets/404", None),
        ];
        let changes = calculate_changes(
            &rows,
            &HashMap::new(),
            &policy(Direction::Increase, absolute(10.0, 100.0)),
            now(),
        )
        .unwrap();
        assert!(changes.iter().all(|c| c.action == Action::Skipped));
        assert!(changes.iter().all(|c| c.status == Status::Pending));
        assert!(changes.iter().all(|c| c.is_shared_budget));
        assert!(changes[1].message.starts_with("SKIPPED: Unknown | Reason: "));
    }

    #[test]
    fn decrease_is_floored_at_zero() {
        let rows = vec![CampaignRow::new(
            "customers/1/campaigns/1",
            "customers/1/campaignBudgets/1",
            None,
        )];
        let snaps = snapshots(&[("customers/1/campaignBudgets/1", "Small", 30.0)]);
        let changes = calculate_changes(
            &rows,
            &snaps,
            &policy(Direction::Decrease, absolute(50.0, 100.0)),
            now(),
        )
        .unwrap();
        assert_eq!(changes[0].action, Action::Decrease);
        assert_eq!(changes[0].proposed_budget, 0.0);
        assert_eq!(changes[0].budget_change, -30.0);
        assert_eq!(changes[0].budget_change_pct, -100.0);
    }

    #[test]
    fn proposed_and_delta_are_rounded_to_cents() {
        let rows = vec![CampaignRow::new(
            "customers/1/campaigns/1",
            "customers/1/campaignBudgets/1",
            None,
        )];
        let snaps = snapshots(&[("customers/1/campaignBudgets/1", "Odd", 33.33)]);
        let cap = CapPolicy::PerCampaign {
            step: Step::Percentage(33.3333),
            max_change_per_campaign: 100.0,
        };
        let changes =
            calculate_changes(&rows, &snaps, &policy(Direction::Increase, cap), now()).unwrap();
        assert_eq!(changes[0].proposed_budget, 44.44);
        assert_eq!(changes[0].budget_change, 11.11);
    }

    #[test]
    fn sub_cent_change_is_no_change() {
        let rows = vec![CampaignRow::new(
            "customers/1/campaigns/1",
            "customers/1/campaignBudgets/1",
            None,
        )];
        let snaps = snapshots(&[("customers/1/campaignBudgets/1", "Tiny", 0.1)]);
        let cap = CapPolicy::PerCampaign {
            step: Step::Percentage(1.0),
            max_change_per_campaign: 100.0,
        };
        let changes =
            calculate_changes(&rows, &snaps, &policy(Direction::Increase, cap), now()).unwrap();
        assert_eq!(changes[0].action, Action::NoChange);
        assert_eq!(changes[0].budget_change, 0.0);
        assert_eq!(changes[0].proposed_budget, 0.1);
        assert_eq!(changes[0].message, "NO CHANGE: Tiny | Budget remains at $0.10");
    }

    #[test]
    fn malformed_campaign_value_fails_fast() {
        let rows = vec![
            CampaignRow::new("customers/1/campaigns/1", "customers/1/campaignBudgets/1", None),
            CampaignRow::new("Brand Campaign", "customers/1/campaignBudgets/2", None),
            CampaignRow::new("also bad", "customers/1/campaignBudgets/3", None),
        ];
        let err = calculate_changes(
            &rows,
            &HashMap::new(),
            &policy(Direction::Increase, absolute(10.0, 100.0)),
            now(),
        )
        .unwrap_err();
        match err {
            BudgetError::WrongColumn { kind, value } => {
                assert_eq!(kind, ResourceKind::Campaign);
                assert_eq!(value, "Brand Campaign");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn primary_is_first_in_input_order() {
        let rows = vec![
            CampaignRow::new("customers/1/campaigns/2", "customers/1/campaignBudgets/9", None),
            CampaignRow::new("customers/1/campaigns/1", "customers/1/campaignBudgets/9", None),
        ];
        let snaps = snapshots(&[("customers/1/campaignBudgets/9", "Shared", 100.0)]);
        let changes = calculate_changes(
            &rows,
            &snaps,
            &policy(Direction::Increase, absolute(5.0, 100.0)),
            now(),
        )
        .unwrap();
        assert_eq!(changes[0].campaign_resource_name.as_str(), "customers/1/campaigns/2");
        assert_eq!(changes[0].action, Action::Increase);
        assert_eq!(changes[1].action, Action::SharedRef);
    }

    fn arb_rows() -> impl Strategy<Value = (Vec<CampaignRow>, HashMap<BudgetResourceName, BudgetSnapshot>)> {
        (
            prop::collection::vec((0u8..5, prop::option::of(0.0f64..100.0)), 1..30),
            prop::collection::vec(prop_oneof![Just(0.0), 1.0f64..5_000.0], 5),
        )
            .prop_map(|(refs, amounts)| {
                let rows = refs
                    .iter()
                    .enumerate()
                    .map(|(i, (b, kpi))| {
                        CampaignRow::new(
                            format!("customers/1/campaigns/{i}"),
                            format!("customers/1/campaignBudgets/{b}"),
                            *kpi,
                        )
                    })
                    .collect();
                let snaps = amounts
                    .iter()
                    .enumerate()
                    .filter(|(_, a)| **a > 0.0)
                    .map(|(b, a)| {
                        let name = format!("customers/1/campaignBudgets/{b}");
                        (BudgetResourceName::new(name.clone()), snapshot(&name, &format!("C{b}"), *a))
                    })
                    .collect();
                (rows, snaps)
            })
    }

    fn arb_cap() -> impl Strategy<Value = CapPolicy> {
        prop_oneof![
            (0.01f64..1_000.0, 0.01f64..1_000.0).prop_map(|(s, m)| CapPolicy::PerCampaign {
                step: Step::Absolute(s),
                max_change_per_campaign: m,
            }),
            (0.01f64..500.0, 0.01f64..1_000.0).prop_map(|(s, m)| CapPolicy::PerCampaign {
                step: Step::Percentage(s),
                max_change_per_campaign: m,
            }),
            (0.01f64..10_000.0, prop_oneof![
                Just(DistributionStrategy::Equal),
                Just(DistributionStrategy::ProportionalSpend),
                Just(DistributionStrategy::ProportionalKpi),
            ])
                .prop_map(|(total, strategy)| CapPolicy::TotalBudget { total, strategy }),
        ]
    }

    fn arb_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![Just(Direction::Increase), Just(Direction::Decrease)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Each fetched budget has exactly one non-SHARED_REF record: the first.
        /// Rows on a budget that was not fetched are all skipped.
        #[test]
        fn prop_exactly_one_primary_per_budget(
            (rows, snaps) in arb_rows(),
            cap in arb_cap(),
            direction in arb_direction(),
        ) {
            let changes = calculate_changes(&rows, &snaps, &policy(direction, cap), Timestamp::now()).unwrap();
            prop_assert_eq!(changes.len(), rows.len());

            let mut seen: HashSet<BudgetResourceName> = HashSet::new();
            for change in &changes {
                let first = seen.insert(change.budget_resource_name.clone());
                if change.current_budget == 0.0 {
                    prop_assert_eq!(change.action, Action::Skipped);
                } else if first {
                    prop_assert!(change.action != Action::SharedRef);
                } else {
                    prop_assert_eq!(change.action, Action::SharedRef);
                    prop_assert_eq!(change.status, Status::Shared);
                }
            }
        }

        /// Sign of budget_change matches the action and proposals stay non-negative.
        #[test]
        fn prop_sign_and_floor_invariants(
            (rows, snaps) in arb_rows(),
            cap in arb_cap(),
            direction in arb_direction(),
        ) {
            let changes = calculate_changes(&rows, &snaps, &policy(direction, cap), Timestamp::now()).unwrap();
            for change in &changes {
                prop_assert!(change.proposed_budget >= 0.0);
                match change.action {
                    Action::Increase => prop_assert!(change.budget_change > 0.0),
                    Action::Decrease => prop_assert!(change.budget_change < 0.0),
                    _ => prop_assert_eq!(change.budget_change, 0.0),
                }
            }
        }

        /// Total-budget allocations across primaries add up to the requested total.
        #[test]
        fn prop_total_budget_is_fully_distributed(
            (rows, snaps) in arb_rows(),
            total in 1.0f64..10_000.0,
        ) {
            let cap = CapPolicy::TotalBudget { total, strategy: DistributionStrategy::ProportionalSpend };
            let changes = calculate_changes(&rows, &snaps, &policy(Direction::Increase, cap), Timestamp::now()).unwrap();
            let primaries: Vec<&ChangeRecord> = changes
                .iter()
                .filter(|c| c.action != Action::SharedRef && c.current_budget > 0.0)
                .collect();
            if !primaries.is_empty() {
                let sum: f64 = primaries.iter().map(|c| c.budget_change).sum();
                // Rounding to cents moves each primary by at most one cent.
                prop_assert!((sum - total).abs() <= 0.01 * primaries.len() as f64 + 1e-6);
            }
        }
    }
}
