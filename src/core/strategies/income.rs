use super::{StrategyContext, finalize};
use crate::core::error::AdviceResult;
use crate::core::scoring::{annuity_future_value, format_currency, format_percent, priority_for};
use crate::core::types::{AdviceCategory, AdviceItem, ProjectedImpact};

const RAISE_TIERS: [(f64, f64); 3] = [(0.05, 80.0), (0.10, 65.0), (0.20, 50.0)];

pub fn income_advice(ctx: &StrategyContext<'_>) -> AdviceResult<Vec<AdviceItem>> {
    let salary = ctx.params.household_income();
    if salary <= 0.0 || ctx.snapshots.is_empty() {
        return Ok(Vec::new());
    }
    let months = f64::from(ctx.params.years_to_retirement().saturating_mul(12));
    let monthly_rate = ctx.params.investment_return / 12.0;
    let keep_rate = (1.0 - ctx.params.tax_rate).clamp(0.0, 1.0);

    let mut advice = Vec::with_capacity(RAISE_TIERS.len());
    for (raise, feasibility) in RAISE_TIERS {
        let net_annual = salary * raise * keep_rate;
        let invested = annuity_future_value(net_annual / 12.0, monthly_rate, months);
        let effectiveness = (invested / 10_000.0 * 8.0).min(90.0);
        let pct = format_percent(raise);

        advice.push(finalize(AdviceItem {
            id: format!("income-raise-{}", (raise * 100.0).round() as u32),
            category: AdviceCategory::Income,
            priority: priority_for(effectiveness, feasibility),
            title: format!("Grow household income by {pct}"),
            description: format!(
                "A {pct} raise adds {} a year after tax, worth about {} by retirement when invested.",
                format_currency(net_annual),
                format_currency(invested)
            ),
            actions: vec![
                "Benchmark current pay against market rates".to_string(),
                format!("Prepare a case for a {pct} increase or a higher-paying role"),
                "Direct the after-tax increase straight into investments".to_string(),
            ],
            projected_impact: ProjectedImpact {
                timeline_savings_years: None,
                cost_savings: None,
                additional_assets: Some(invested),
            },
            feasibility_score: feasibility,
            effectiveness_score: effectiveness,
            person_id: None,
            person_specific_changes: None,
        })?);
    }
    Ok(advice)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{household, monthly_series};
    use super::*;

    #[test]
    fn raise_tiers_are_net_of_tax() {
        let series = monthly_series(12, 0.0, 2_000.0);
        let mut params = household();
        params.investment_return = 0.0;
        params.current_age = 64;
        let ctx = StrategyContext::new(&series, &params);

        let advice = income_advice(&ctx).expect("income advice");
        assert_eq!(advice.len(), 3);
        // 5% of 120,000 after 30% tax, one year uninvested growth.
        let assets = advice[0].projected_impact.additional_assets.expect("assets");
        assert!((assets - 4_200.0).abs() < 1e-6);
        let feasibility: Vec<f64> = advice.iter().map(|a| a.feasibility_score).collect();
        assert_eq!(feasibility, vec![80.0, 65.0, 50.0]);
    }

    #[test]
    fn no_salary_means_no_income_advice() {
        let series = monthly_series(12, 0.0, 2_000.0);
        let mut params = household();
        params.annual_salary = 0.0;
        let ctx = StrategyContext::new(&series, &params);
        assert!(income_advice(&ctx).expect("income advice").is_empty());
    }
}
