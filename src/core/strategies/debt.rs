use super::{StrategyContext, finalize};
use crate::core::error::AdviceResult;
use crate::core::scoring::{
    amortization_months, cash_flow_feasibility, format_currency, priority_for,
};
use crate::core::types::{AdviceCategory, AdviceItem, Loan, ProjectedImpact};

pub(crate) const EXTRA_PAYMENT_CANDIDATES: [f64; 4] = [100.0, 250.0, 500.0, 1_000.0];
const MIN_YEARS_SAVED: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PayoffComparison {
    pub years_saved: f64,
    pub repayments_saved: f64,
}

/// Payoff horizon with and without `extra` on top of the scheduled payment.
pub(crate) fn compare_payoff(balance: f64, loan: &Loan, extra: f64) -> Option<PayoffComparison> {
    let monthly_rate = loan.interest_rate / 12.0;
    let base_months = amortization_months(balance, monthly_rate, loan.monthly_payment)?;
    let boosted_payment = loan.monthly_payment + extra;
    let boosted_months = amortization_months(balance, monthly_rate, boosted_payment)?;

    let months_saved = (base_months - boosted_months).max(0.0);
    Some(PayoffComparison {
        years_saved: months_saved / 12.0,
        repayments_saved: months_saved * loan.monthly_payment,
    })
}

pub fn debt_advice(ctx: &StrategyContext<'_>) -> AdviceResult<Vec<AdviceItem>> {
    let Some(first) = ctx.first() else {
        return Ok(Vec::new());
    };
    let loan_count = ctx.params.loans.len();
    let average_cash_flow = ctx.trailing_cash_flow();

    let mut advice = Vec::new();
    for loan in &ctx.params.loans {
        let balance = first.balance_of(loan, loan_count);
        if balance <= 0.0 {
            continue;
        }
        for extra in EXTRA_PAYMENT_CANDIDATES {
            let Some(payoff) = compare_payoff(balance, loan, extra) else {
                continue;
            };
            if payoff.years_saved <= MIN_YEARS_SAVED {
                continue;
            }
            advice.push(finalize(extra_payment_item(
                loan,
                extra,
                payoff,
                average_cash_flow,
            ))?);
        }
    }
    Ok(advice)
}

fn extra_payment_item(
    loan: &Loan,
    extra: f64,
    payoff: PayoffComparison,
    average_cash_flow: f64,
) -> AdviceItem {
    let feasibility = cash_flow_feasibility(extra, average_cash_flow);
    let effectiveness = (payoff.years_saved / 5.0 * 100.0).min(95.0);
    let amount = format_currency(extra);

    AdviceItem {
        id: format!("debt-{}-extra-{}", loan.id, extra as u64),
        category: AdviceCategory::Debt,
        priority: priority_for(effectiveness, feasibility),
        title: format!("Increase {} payment by {amount}/month", loan.name),
        description: format!(
            "Paying an extra {amount} each month clears {} {:.1} years sooner and saves about {} in repayments.",
            loan.name,
            payoff.years_saved,
            format_currency(payoff.repayments_saved)
        ),
        actions: vec![
            format!("Set up an additional {amount} monthly repayment on {}", loan.name),
            "Confirm the lender applies extra repayments to principal".to_string(),
            "Review the repayment each year as income changes".to_string(),
        ],
        projected_impact: ProjectedImpact {
            timeline_savings_years: Some(payoff.years_saved),
            cost_savings: Some(payoff.repayments_saved),
            additional_assets: None,
        },
        feasibility_score: feasibility,
        effectiveness_score: effectiveness,
        person_id: None,
        person_specific_changes: None,
    }
}
