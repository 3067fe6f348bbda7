//! Category strategies turning a projected snapshot series into candidate advice.
//!
//! Every strategy is a pure function of its [`StrategyContext`]: the same
//! snapshots and parameters always yield the same list in the same order,
//! which is what lets the advice engine memoize them behind a cache.

mod debt;
mod expense;
mod income;
mod investment;
mod offset;
mod person;

use serde::{Deserialize, Serialize};

use super::error::AdviceResult;
use super::scoring::{checked_score, ensure_finite, mean};
use super::types::{AdviceItem, HouseholdParams, Milestone, ProjectedImpact, Snapshot};

pub use debt::debt_advice;
pub use expense::expense_advice;
pub use income::income_advice;
pub use investment::{allocation_advice, investment_contribution_advice};
pub use offset::offset_advice;
pub use person::person_specific_advice;

/// Snapshots averaged for the trailing cash-flow figure.
const CASH_FLOW_WINDOW: usize = 12;

#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    pub snapshots: &'a [Snapshot],
    pub params: &'a HouseholdParams,
    pub milestones: &'a [Milestone],
}

impl<'a> StrategyContext<'a> {
    pub fn new(snapshots: &'a [Snapshot], params: &'a HouseholdParams) -> Self {
        Self {
            snapshots,
            params,
            milestones: &[],
        }
    }

    pub fn with_milestones(mut self, milestones: &'a [Milestone]) -> Self {
        self.milestones = milestones;
        self
    }

    pub fn first(&self) -> Option<&'a Snapshot> {
        self.snapshots.first()
    }

    pub fn last(&self) -> Option<&'a Snapshot> {
        self.snapshots.last()
    }

    /// Average cash flow over the last twelve periods of the series.
    pub fn trailing_cash_flow(&self) -> f64 {
        let start = self.snapshots.len().saturating_sub(CASH_FLOW_WINDOW);
        mean(self.snapshots[start..].iter().map(|s| s.cash_flow)).unwrap_or(0.0)
    }
}

pub type Strategy = dyn Fn(&StrategyContext<'_>) -> AdviceResult<Vec<AdviceItem>> + Send + Sync;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Debt,
    Offset,
    InvestmentContribution,
    Allocation,
    Expense,
    Income,
    PersonSpecific,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::Debt,
        StrategyKind::Offset,
        StrategyKind::InvestmentContribution,
        StrategyKind::Allocation,
        StrategyKind::Expense,
        StrategyKind::Income,
        StrategyKind::PersonSpecific,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StrategyKind::Debt => "debt",
            StrategyKind::Offset => "offset",
            StrategyKind::InvestmentContribution => "investment",
            StrategyKind::Allocation => "allocation",
            StrategyKind::Expense => "expense",
            StrategyKind::Income => "income",
            StrategyKind::PersonSpecific => "person",
        }
    }

    pub fn strategy(self) -> fn(&StrategyContext<'_>) -> AdviceResult<Vec<AdviceItem>> {
        match self {
            StrategyKind::Debt => debt_advice,
            StrategyKind::Offset => offset_advice,
            StrategyKind::InvestmentContribution => investment_contribution_advice,
            StrategyKind::Allocation => allocation_advice,
            StrategyKind::Expense => expense_advice,
            StrategyKind::Income => income_advice,
            StrategyKind::PersonSpecific => person_specific_advice,
        }
    }
}

/// Rejects non-finite impact figures and clamps both scores into [0, 100].
pub(crate) fn finalize(mut item: AdviceItem) -> AdviceResult<AdviceItem> {
    item.feasibility_score = checked_score(
        item.feasibility_score,
        &format!("{}.feasibilityScore", item.id),
    )?;
    item.effectiveness_score = checked_score(
        item.effectiveness_score,
        &format!("{}.effectivenessScore", item.id),
    )?;
    let ProjectedImpact {
        timeline_savings_years,
        cost_savings,
        additional_assets,
    } = &item.projected_impact;
    for (name, value) in [
        ("timelineSavingsYears", timeline_savings_years),
        ("costSavings", cost_savings),
        ("additionalAssets", additional_assets),
    ] {
        if let Some(value) = value {
            ensure_finite(*value, &format!("{}.{name}", item.id))?;
        }
    }
    Ok(item)
}


#[cfg(test)]
mod tests {
    use super::fixtures::{household, monthly_series};
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    #[test]
    fn trailing_cash_flow_uses_last_twelve_periods() {
        let mut series = monthly_series(24, 400_000.0, 1_000.0);
        for snapshot in series.iter_mut().skip(12) {
            snapshot.cash_flow = 3_000.0;
        }
        let params = household();
        let ctx = StrategyContext::new(&series, &params);
        assert!((ctx.trailing_cash_flow() - 3_000.0).abs() < 1e-9);
    }

    #[test]
    fn finalize_rejects_non_finite_impact() {
        let item = AdviceItem {
            id: "x".to_string(),
            category: crate::core::types::AdviceCategory::Debt,
            priority: crate::core::types::Priority::Low,
            title: String::new(),
            description: String::new(),
            actions: Vec::new(),
            projected_impact: ProjectedImpact {
                cost_savings: Some(f64::NAN),
                ..ProjectedImpact::default()
            },
            feasibility_score: 50.0,
            effectiveness_score: 50.0,
            person_id: None,
            person_specific_changes: None,
        };
        assert!(finalize(item).is_err());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_strategies_are_deterministic_and_scores_bounded(
            periods in 1u32..60,
            loan in 0u32..800_000,
            cash_flow in -2_000i32..8_000,
            salary in 0u32..300_000,
            offset in proptest::bool::ANY
        ) {
            let series = monthly_series(periods, loan as f64, cash_flow as f64);
            let mut params = household();
            params.annual_salary = salary as f64;
            params.offset_enabled = offset;
            params.loans[0].balance = loan as f64;
            params.expenses.dining = 600.0;
            params.expenses.groceries = 900.0;
            let ctx = StrategyContext::new(&series, &params);

            for kind in StrategyKind::ALL {
                let first = (kind.strategy())(&ctx);
                let second = (kind.strategy())(&ctx);
                prop_assert_eq!(&first, &second);
                for item in first.unwrap_or_default() {
                    prop_assert!((0.0..=100.0).contains(&item.effectiveness_score));
                    prop_assert!((0.0..=100.0).contains(&item.feasibility_score));
                }
            }
        }
    }
}
