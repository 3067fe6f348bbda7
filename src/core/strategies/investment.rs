use super::{StrategyContext, finalize};
use crate::core::error::AdviceResult;
use crate::core::scoring::{
    annuity_future_value, cash_flow_feasibility, format_currency, format_percent, priority_for,
};
use crate::core::types::{AdviceCategory, AdviceItem, ProjectedImpact};

const CONTRIBUTION_CANDIDATES: [f64; 3] = [200.0, 500.0, 1_000.0];

const ALLOCATION_MIN_YEARS: u32 = 10;
const ALLOCATION_RETURN_CEILING: f64 = 0.07;
const ALLOCATION_UPLIFT: f64 = 0.015;
const ALLOCATION_TARGET_CAP: f64 = 0.08;
const ALLOCATION_HORIZON_CAP: u32 = 10;
const ALLOCATION_FEASIBILITY: f64 = 60.0;

pub fn investment_contribution_advice(ctx: &StrategyContext<'_>) -> AdviceResult<Vec<AdviceItem>> {
    let years = ctx.params.years_to_retirement();
    if years == 0 || ctx.snapshots.is_empty() {
        return Ok(Vec::new());
    }
    let months = f64::from(years.saturating_mul(12));
    let monthly_rate = ctx.params.investment_return / 12.0;
    let average_cash_flow = ctx.trailing_cash_flow();

    let mut advice = Vec::with_capacity(CONTRIBUTION_CANDIDATES.len());
    for increase in CONTRIBUTION_CANDIDATES {
        let future_value = annuity_future_value(increase, monthly_rate, months);
        let feasibility = cash_flow_feasibility(increase, average_cash_flow);
        let effectiveness = (future_value / 10_000.0 * 10.0).min(95.0);
        let amount = format_currency(increase);

        advice.push(finalize(AdviceItem {
            id: format!("investment-contribution-{}", increase as u64),
            category: AdviceCategory::Investment,
            priority: priority_for(effectiveness, feasibility),
            title: format!("Increase monthly investment contribution by {amount}"),
            description: format!(
                "Investing an extra {amount} a month at {} grows to about {} over {years} years.",
                format_percent(ctx.params.investment_return),
                format_currency(future_value)
            ),
            actions: vec![
                format!("Automate an additional {amount} transfer to investments each payday"),
                "Choose low-cost diversified funds for the extra contribution".to_string(),
            ],
            projected_impact: ProjectedImpact {
                timeline_savings_years: None,
                cost_savings: None,
                additional_assets: Some(future_value),
            },
            feasibility_score: feasibility,
            effectiveness_score: effectiveness,
            person_id: None,
            person_specific_changes: None,
        })?);
    }
    Ok(advice)
}

pub fn allocation_advice(ctx: &StrategyContext<'_>) -> AdviceResult<Vec<AdviceItem>> {
    let years = ctx.params.years_to_retirement();
    let current_return = ctx.params.investment_return;
    if years <= ALLOCATION_MIN_YEARS || current_return >= ALLOCATION_RETURN_CEILING {
        return Ok(Vec::new());
    }
    let Some(first) = ctx.first() else {
        return Ok(Vec::new());
    };

    let improved_return = (current_return + ALLOCATION_UPLIFT).min(ALLOCATION_TARGET_CAP);
    let horizon = f64::from(years.min(ALLOCATION_HORIZON_CAP));
    let balance = first.investments;
    let current_outcome = balance * (1.0 + current_return).powf(horizon);
    let improved_outcome = balance * (1.0 + improved_return).powf(horizon);
    let gain = improved_outcome - current_outcome;
    if gain <= 0.0 {
        return Ok(Vec::new());
    }
    let effectiveness = (gain / 10_000.0 * 10.0).min(85.0);

    let item = AdviceItem {
        id: "investment-allocation-growth".to_string(),
        category: AdviceCategory::Investment,
        priority: priority_for(effectiveness, ALLOCATION_FEASIBILITY),
        title: "Review asset allocation for long-term growth".to_string(),
        description: format!(
            "With {years} years until retirement, moving from {} to {} expected return adds about {} over {} years.",
            format_percent(current_return),
            format_percent(improved_return),
            format_currency(gain),
            horizon as u32
        ),
        actions: vec![
            "Compare the current portfolio mix against a growth-oriented allocation".to_string(),
            "Rebalance gradually to manage market-timing risk".to_string(),
            "Confirm the new risk level suits your tolerance".to_string(),
        ],
        projected_impact: ProjectedImpact {
            timeline_savings_years: None,
            cost_savings: None,
            additional_assets: Some(gain),
        },
        feasibility_score: ALLOCATION_FEASIBILITY,
        effectiveness_score: effectiveness,
        person_id: None,
        person_specific_changes: None,
    };
    Ok(vec![finalize(item)?])
}
