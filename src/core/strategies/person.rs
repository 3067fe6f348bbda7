use super::{StrategyContext, finalize};
use crate::core::error::AdviceResult;
use crate::core::scoring::{annuity_future_value, format_currency, format_percent, priority_for};
use crate::core::types::{
    AdviceCategory, AdviceItem, EntityChange, Person, PersonPatch, PersonSpecificChanges,
    ProjectedImpact, SuperAccount, SuperAccountPatch,
};

const RATE_STEPS: [(f64, f64); 3] = [(0.01, 85.0), (0.02, 75.0), (0.03, 65.0)];
const MAX_CONTRIBUTION_RATE: f64 = 0.15;
const BENEFIT_YEARS: f64 = 10.0;
const MIN_SUPER_BENEFIT: f64 = 5_000.0;
const MAX_INCOME_SHARE: f64 = 0.05;

const DELAY_STEPS: [(u32, f64); 3] = [(1, 70.0), (2, 55.0), (3, 40.0)];
const MAX_RETIREMENT_AGE: u32 = 70;
const MIN_DELAY_BENEFIT: f64 = 50_000.0;

/// Super contribution and retirement timing advice for each household member.
/// Only multi-person households get person-targeted advice.
pub fn person_specific_advice(ctx: &StrategyContext<'_>) -> AdviceResult<Vec<AdviceItem>> {
    if !ctx.params.is_multi_person() || ctx.snapshots.is_empty() {
        return Ok(Vec::new());
    }
    let mut advice = Vec::new();
    for person in &ctx.params.people {
        for account in &person.super_accounts {
            for item in contribution_rate_advice(person, account) {
                advice.push(finalize(item)?);
            }
        }
        for item in delayed_retirement_advice(person) {
            advice.push(finalize(item)?);
        }
    }
    Ok(advice)
}

/// Steps of at most 3% always pass; the bound matters only if the steps grow.
fn within_income_share(extra_annual: f64, income: f64) -> bool {
    extra_annual < income * MAX_INCOME_SHARE
}

fn contribution_rate_advice(person: &Person, account: &SuperAccount) -> Vec<AdviceItem> {
    let income = person.annual_income();
    if income <= 0.0 {
        return Vec::new();
    }

    let mut advice = Vec::new();
    let mut previous_rate = account.contribution_rate;
    for (step, feasibility) in RATE_STEPS {
        let proposed = (account.contribution_rate + step).min(MAX_CONTRIBUTION_RATE);
        if proposed <= previous_rate {
            continue;
        }
        previous_rate = proposed;

        let extra_annual = income * (proposed - account.contribution_rate);
        let benefit = annuity_future_value(extra_annual, account.return_rate, BENEFIT_YEARS);
        if benefit <= MIN_SUPER_BENEFIT || !within_income_share(extra_annual, income) {
            continue;
        }
        let effectiveness = (benefit / 1_000.0 * 2.0).min(95.0);

        let mut changes = PersonSpecificChanges::for_person(&person.id);
        changes.super_accounts.push(EntityChange::Update {
            id: account.id.clone(),
            patch: SuperAccountPatch {
                contribution_rate: Some(proposed),
                ..SuperAccountPatch::default()
            },
        });

        let rate = format_percent(proposed);
        advice.push(AdviceItem {
            id: format!(
                "person-{}-super-{}-rate-{}",
                person.id,
                account.id,
                (proposed * 1_000.0).round() as u32
            ),
            category: AdviceCategory::Investment,
            priority: priority_for(effectiveness, feasibility),
            title: format!(
                "Increase super contribution for {} to {rate} ({})",
                person.name, account.name
            ),
            description: format!(
                "Raising {}'s contribution rate from {} to {rate} adds {} a year and about {} over ten years.",
                person.name,
                format_percent(account.contribution_rate),
                format_currency(extra_annual),
                format_currency(benefit)
            ),
            actions: vec![
                format!("Ask {}'s employer to set salary sacrifice at {rate}", person.name),
                "Check the concessional contribution cap before increasing".to_string(),
            ],
            projected_impact: ProjectedImpact {
                timeline_savings_years: None,
                cost_savings: None,
                additional_assets: Some(benefit),
            },
            feasibility_score: feasibility,
            effectiveness_score: effectiveness,
            person_id: Some(person.id.clone()),
            person_specific_changes: Some(changes),
        });
    }
    advice
}

fn delayed_retirement_advice(person: &Person) -> Vec<AdviceItem> {
    let income = person.annual_income();
    let mut advice = Vec::new();
    for (delay, feasibility) in DELAY_STEPS {
        let new_age = person.retirement_age.saturating_add(delay);
        if new_age > MAX_RETIREMENT_AGE {
            break;
        }
        let years = f64::from(delay);
        let super_growth: f64 = person
            .super_accounts
            .iter()
            .map(|a| a.balance * ((1.0 + a.return_rate).powf(years) - 1.0))
            .sum();
        let benefit = income * years + super_growth;
        if benefit <= MIN_DELAY_BENEFIT {
            continue;
        }
        let effectiveness = (benefit / 10_000.0 * 5.0).min(90.0);

        let mut changes = PersonSpecificChanges::for_person(&person.id);
        changes.person = Some(PersonPatch {
            retirement_age: Some(new_age),
            ..PersonPatch::default()
        });

        let plural = if delay == 1 { "year" } else { "years" };
        advice.push(AdviceItem {
            id: format!("person-{}-delay-retirement-{delay}", person.id),
            category: AdviceCategory::Income,
            priority: priority_for(effectiveness, feasibility),
            title: format!("Delay retirement for {} by {delay} {plural}", person.name),
            description: format!(
                "Working until {new_age} adds {} of income and lets {}'s super grow by {}.",
                format_currency(income * years),
                person.name,
                format_currency(super_growth)
            ),
            actions: vec![
                format!("Plan for {} to retire at {new_age} instead of {}", person.name, person.retirement_age),
                "Consider part-time work to ease the transition".to_string(),
            ],
            projected_impact: ProjectedImpact {
                timeline_savings_years: None,
                cost_savings: None,
                additional_assets: Some(benefit),
            },
            feasibility_score: feasibility,
            effectiveness_score: effectiveness,
            person_id: Some(person.id.clone()),
            person_specific_changes: Some(changes),
        });
    }
    advice
}
