use super::{StrategyContext, finalize};
use crate::core::error::AdviceResult;
use crate::core::scoring::{annuity_future_value, format_currency, format_percent, priority_for};
use crate::core::types::{AdviceCategory, AdviceItem, ExpenseCategory, ProjectedImpact};

const BASE_TIERS: [f64; 2] = [0.05, 0.10];
const TIER_FEASIBILITY: [f64; 3] = [90.0, 70.0, 50.0];

pub fn expense_advice(ctx: &StrategyContext<'_>) -> AdviceResult<Vec<AdviceItem>> {
    if ctx.snapshots.is_empty() {
        return Ok(Vec::new());
    }
    let months = f64::from(ctx.params.years_to_retirement().saturating_mul(12));
    let monthly_rate = ctx.params.investment_return / 12.0;

    let mut advice = Vec::new();
    for category in ExpenseCategory::ALL {
        let monthly = ctx.params.expenses.monthly_amount(category);
        if monthly <= 0.0 {
            continue;
        }
        let tiers = [BASE_TIERS[0], BASE_TIERS[1], category.max_reduction()];
        let mut previous = 0.0;
        for (tier, reduction) in tiers.into_iter().enumerate() {
            if reduction <= previous {
                continue;
            }
            previous = reduction;

            let monthly_saving = monthly * reduction;
            let invested = annuity_future_value(monthly_saving, monthly_rate, months);
            let feasibility = TIER_FEASIBILITY[tier];
            let effectiveness = (invested / 10_000.0 * 8.0).min(90.0);
            let label = category.label();
            let pct = format_percent(reduction);

            advice.push(finalize(AdviceItem {
                id: format!("expense-{label}-{}", (reduction * 100.0).round() as u32),
                category: AdviceCategory::Expense,
                priority: priority_for(effectiveness, feasibility),
                title: format!("Reduce {label} spending by {pct}"),
                description: format!(
                    "Cutting {label} by {pct} frees {} a month, worth about {} by retirement when invested.",
                    format_currency(monthly_saving),
                    format_currency(invested)
                ),
                actions: vec![
                    format!("Set a monthly {label} budget of {}", format_currency(monthly - monthly_saving)),
                    format!("Track {label} spending weekly for the next three months"),
                    format!("Invest the {} saved each month", format_currency(monthly_saving)),
                ],
                projected_impact: ProjectedImpact {
                    timeline_savings_years: None,
                    cost_savings: Some(monthly_saving * 12.0),
                    additional_assets: Some(invested),
                },
                feasibility_score: feasibility,
                effectiveness_score: effectiveness,
                person_id: None,
                person_specific_changes: None,
            })?);
        }
    }
    Ok(advice)
}
