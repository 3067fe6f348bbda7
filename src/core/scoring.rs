use super::error::{AdviceError, AdviceResult};
use super::types::Priority;

const RATE_EPS: f64 = 1e-12;

/// Months needed to repay `balance` at `monthly_rate` with a fixed `payment`.
///
/// Uses `ln(1 + B*r/P) / ln(1 + r)`, or `B/P` when the rate is zero. Returns
/// `None` for a non-positive payment or a non-finite result.
pub fn amortization_months(balance: f64, monthly_rate: f64, payment: f64) -> Option<f64> {
    if balance <= 0.0 {
        return Some(0.0);
    }
    if payment <= 0.0 {
        return None;
    }
    if monthly_rate.abs() <= RATE_EPS {
        return Some(balance / payment);
    }

    let months = (1.0 + balance * monthly_rate / payment).ln() / (1.0 + monthly_rate).ln();
    months.is_finite().then_some(months)
}

/// Future value of an ordinary annuity of `n` payments of `payment`.
pub fn annuity_future_value(payment: f64, rate: f64, periods: f64) -> f64 {
    if rate.abs() <= RATE_EPS {
        return payment * periods;
    }
    payment * ((1.0 + rate).powf(periods) - 1.0) / rate
}

/// Feasibility of committing `amount` per period out of the average cash flow.
pub fn cash_flow_feasibility(amount: f64, average_cash_flow: f64) -> f64 {
    if average_cash_flow <= 0.0 {
        return 20.0;
    }
    let ratio = amount / average_cash_flow;
    if ratio <= 0.10 {
        95.0
    } else if ratio <= 0.20 {
        85.0
    } else if ratio <= 0.30 {
        70.0
    } else if ratio <= 0.50 {
        50.0
    } else {
        25.0
    }
}

pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

pub fn overall_score(effectiveness: f64, feasibility: f64) -> f64 {
    0.7 * effectiveness + 0.3 * feasibility
}

pub fn priority_for(effectiveness: f64, feasibility: f64) -> Priority {
    let combined = overall_score(effectiveness, feasibility);
    if combined >= 70.0 {
        Priority::High
    } else if combined >= 45.0 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

pub fn ensure_finite(value: f64, field: &str) -> AdviceResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AdviceError::non_finite(field))
    }
}

/// Clamped, finite score or a critical error naming the offending field.
pub fn checked_score(score: f64, field: &str) -> AdviceResult<f64> {
    ensure_finite(score, field).map(clamp_score)
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut total = 0.0;
    let mut count = 0usize;
    for value in values {
        total += value;
        count += 1;
    }
    (count > 0).then(|| total / count as f64)
}

pub fn format_currency(amount: f64) -> String {
    let rounded = amount.abs().round() as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0.0 && rounded > 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub fn format_percent(rate: f64) -> String {
    let pct = rate * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{}%", pct.round() as i64)
    } else {
        format!("{pct:.1}%")
    }
}
