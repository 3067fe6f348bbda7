use super::{StrategyContext, finalize};
use crate::core::error::AdviceResult;
use crate::core::scoring::{format_currency, format_percent};
use crate::core::types::{AdviceCategory, AdviceItem, MilestoneType, Priority, ProjectedImpact};

const EVALUATION_INDEX: usize = 12;
const IDLE_CASH_THRESHOLD: f64 = 10_000.0;
const MAX_YEARS: f64 = 10.0;
const DAYS_PER_YEAR: f64 = 365.25;

pub fn offset_advice(ctx: &StrategyContext<'_>) -> AdviceResult<Vec<AdviceItem>> {
    if !ctx.params.offset_enabled || ctx.snapshots.is_empty() {
        return Ok(Vec::new());
    }
    let index = EVALUATION_INDEX.min(ctx.snapshots.len() - 1);
    let checkpoint = &ctx.snapshots[index];
    let loan_count = ctx.params.loans.len();

    let max_rate = ctx
        .params
        .loans
        .iter()
        .filter(|loan| checkpoint.balance_of(loan, loan_count) > 0.0)
        .map(|loan| loan.interest_rate)
        .fold(None, |acc: Option<f64>, rate| {
            Some(acc.map_or(rate, |best| best.max(rate)))
        });
    let Some(max_rate) = max_rate else {
        return Ok(Vec::new());
    };

    let idle_cash = checkpoint.cash;
    if idle_cash <= IDLE_CASH_THRESHOLD {
        return Ok(Vec::new());
    }

    let annual_saving = idle_cash * max_rate;
    let years = years_until_loans_cleared(ctx, index).min(MAX_YEARS);
    let total_saving = annual_saving * years;
    if total_saving <= 0.0 {
        return Ok(Vec::new());
    }
    let effectiveness = (total_saving / 1_000.0 * 15.0).min(90.0);
    let cash = format_currency(idle_cash);

    let item = AdviceItem {
        id: "offset-idle-cash".to_string(),
        category: AdviceCategory::Debt,
        priority: Priority::High,
        title: "Move idle cash into your offset account".to_string(),
        description: format!(
            "Parking {cash} in an offset account avoids interest at {} and saves about {} a year.",
            format_percent(max_rate),
            format_currency(annual_saving)
        ),
        actions: vec![
            format!("Transfer {cash} of idle savings into the offset account"),
            "Keep an emergency buffer accessible in the same account".to_string(),
            "Route salary deposits through the offset account".to_string(),
        ],
        projected_impact: ProjectedImpact {
            timeline_savings_years: None,
            cost_savings: Some(total_saving),
            additional_assets: None,
        },
        feasibility_score: 95.0,
        effectiveness_score: effectiveness,
        person_id: None,
        person_specific_changes: None,
    };
    Ok(vec![finalize(item)?])
}

/// Years from the checkpoint until no loan balance remains, preferring the
/// projected payoff milestones when they were supplied.
fn years_until_loans_cleared(ctx: &StrategyContext<'_>, index: usize) -> f64 {
    let checkpoint_date = ctx.snapshots[index].date;

    let last_payoff = ctx
        .milestones
        .iter()
        .filter(|m| m.milestone_type == MilestoneType::LoanPayoff)
        .map(|m| m.date)
        .max();
    if let Some(date) = last_payoff {
        return ((date - checkpoint_date).num_days() as f64 / DAYS_PER_YEAR).max(0.0);
    }

    ctx.snapshots[index..]
        .iter()
        .find(|s| s.loan_balance <= 0.0)
        .map(|s| (s.date - checkpoint_date).num_days() as f64 / DAYS_PER_YEAR)
        .unwrap_or(MAX_YEARS)
}
