//! One advice generation call: assessment, feasibility, cached category
//! strategies, target validation, filtering, ranking and partitioning.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::cache::{CacheSettings, CacheStats, CachedStrategy};
use super::error::{AdviceError, AdviceResult, ErrorKind, GenerationError};
use super::ranking::{partition_advice, rank_advice, truncate_ranked};
use super::scoring::ensure_finite;
use super::strategies::{StrategyContext, StrategyKind};
use super::targeting::validate_person_target;
use super::telemetry::{TelemetrySink, TracingTelemetry, outcome_of};
use super::types::{
    AdviceItem, HouseholdParams, Milestone, OverallAssessment, ProjectionSummary,
    RetirementAdvice, RetirementFeasibility, Snapshot,
};

const ON_TRACK_MARGIN_YEARS: f64 = 2.0;
const NEEDS_IMPROVEMENT_MARGIN_YEARS: f64 = 10.0;
const CAN_RETIRE_MARGIN_YEARS: f64 = 1.0;
const NET_WORTH_DECLINE_LIMIT: f64 = 0.10;
const SAFE_WITHDRAWAL_RATE: f64 = 0.04;
const DAYS_PER_YEAR: f64 = 365.25;
const MAX_AGE: u32 = 150;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdviceConfig {
    pub min_effectiveness: f64,
    pub max_recommendations: usize,
    pub enabled_strategies: Vec<StrategyKind>,
    /// Per-strategy cache overrides; missing kinds use their defaults.
    pub cache: BTreeMap<StrategyKind, CacheSettings>,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            min_effectiveness: 20.0,
            max_recommendations: 10,
            enabled_strategies: StrategyKind::ALL.to_vec(),
            cache: BTreeMap::new(),
        }
    }
}

impl AdviceConfig {
    pub fn validate(&self) -> AdviceResult<()> {
        let invalid = |reason: String| AdviceError::InvalidConfiguration { reason };
        if !self.min_effectiveness.is_finite() || !(0.0..=100.0).contains(&self.min_effectiveness) {
            return Err(invalid(format!(
                "minEffectiveness must be within 0..=100, got {}",
                self.min_effectiveness
            )));
        }
        if self.max_recommendations == 0 {
            return Err(invalid("maxRecommendations must be positive".to_string()));
        }
        for (kind, settings) in &self.cache {
            if settings.capacity == 0 {
                return Err(invalid(format!("cache capacity for {} must be positive", kind.label())));
            }
        }
        Ok(())
    }

    pub fn cache_settings(&self, kind: StrategyKind) -> CacheSettings {
        self.cache
            .get(&kind)
            .copied()
            .unwrap_or_else(|| CacheSettings::for_strategy(kind))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub advice: RetirementAdvice,
    pub errors: Vec<GenerationError>,
    pub warnings: Vec<GenerationError>,
}

/// Owns one cache per enabled strategy. Not shareable between threads
/// without external locking.
pub struct AdviceEngine {
    config: AdviceConfig,
    strategies: Vec<CachedStrategy>,
    telemetry: Box<dyn TelemetrySink>,
}

impl AdviceEngine {
    pub fn new(config: AdviceConfig) -> AdviceResult<Self> {
        config.validate()?;
        let mut enabled = config.enabled_strategies.clone();
        enabled.sort();
        enabled.dedup();
        let strategies = enabled
            .into_iter()
            .map(|kind| CachedStrategy::new(kind, config.cache_settings(kind)))
            .collect();
        Ok(Self {
            config,
            strategies,
            telemetry: Box::new(TracingTelemetry),
        })
    }

    pub fn with_telemetry(mut self, telemetry: impl TelemetrySink + 'static) -> Self {
        self.telemetry = Box::new(telemetry);
        self
    }

    /// Replaces the cached strategy of the same kind, or adds it.
    pub fn with_strategy(mut self, strategy: CachedStrategy) -> Self {
        match self.strategies.iter_mut().find(|s| s.kind() == strategy.kind()) {
            Some(existing) => *existing = strategy,
            None => self.strategies.push(strategy),
        }
        self
    }

    pub fn config(&self) -> &AdviceConfig {
        &self.config
    }

    pub fn clear_caches(&mut self) {
        for strategy in &mut self.strategies {
            strategy.clear();
        }
    }

    pub fn cache_stats(&self) -> BTreeMap<StrategyKind, CacheStats> {
        self.strategies
            .iter()
            .map(|s| (s.kind(), s.stats()))
            .collect()
    }

    /// Never fails: a fatal problem yields a critical error alongside the
    /// minimal critical advice.
    pub fn generate(
        &mut self,
        snapshots: &[Snapshot],
        summary: &ProjectionSummary,
        params: &HouseholdParams,
        milestones: Option<&[Milestone]>,
    ) -> GenerationResult {
        let token = self.telemetry.start_operation("advice.generate");
        let mut warnings = Vec::new();
        let result = self.try_generate(
            snapshots,
            summary,
            params,
            milestones.unwrap_or_default(),
            &mut warnings,
        );
        self.telemetry.end_operation(token, outcome_of(&result));

        match result {
            Ok(advice) => {
                tracing::info!(
                    recommendations = advice.recommendations.len(),
                    quick_wins = advice.quick_wins.len(),
                    warnings = warnings.len(),
                    assessment = advice.overall_assessment.label(),
                    "advice generated"
                );
                GenerationResult {
                    advice,
                    errors: Vec::new(),
                    warnings,
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "advice generation failed");
                GenerationResult {
                    advice: RetirementAdvice::critical_fallback(),
                    errors: vec![GenerationError::from(&err)],
                    warnings,
                }
            }
        }
    }

    fn try_generate(
        &mut self,
        snapshots: &[Snapshot],
        summary: &ProjectionSummary,
        params: &HouseholdParams,
        milestones: &[Milestone],
        warnings: &mut Vec<GenerationError>,
    ) -> AdviceResult<RetirementAdvice> {
        check_inputs(snapshots, params)?;
        let first = snapshots.first().ok_or(AdviceError::EmptySnapshotSeries)?;
        let achieved_age = summary
            .retirement_date
            .map(|date| f64::from(params.current_age) + (date - first.date).num_days() as f64 / DAYS_PER_YEAR);

        let overall_assessment = assess(snapshots, summary, params, achieved_age);
        let retirement_feasibility = feasibility(snapshots, params, achieved_age)?;
        tracing::debug!(
            assessment = overall_assessment.label(),
            can_retire = retirement_feasibility.can_retire_at_target,
            "projection assessed"
        );

        let ctx = StrategyContext::new(snapshots, params).with_milestones(milestones);
        let mut candidates = Vec::new();
        for strategy in &mut self.strategies {
            let token = self.telemetry.start_operation(strategy.kind().label());
            let advice = strategy.fetch_or_compute(&ctx);
            self.telemetry.end_operation(token, outcome_of(&advice));
            candidates.extend(advice?);
        }

        for item in &candidates {
            warnings.extend(target_warnings(item, params));
        }

        let min_effectiveness = self.config.min_effectiveness;
        candidates.retain(|item| item.effectiveness_score >= min_effectiveness);
        let recommendations = truncate_ranked(rank_advice(candidates), self.config.max_recommendations);
        let (quick_wins, long_term_strategies) = partition_advice(&recommendations);

        Ok(RetirementAdvice {
            overall_assessment,
            retirement_feasibility,
            recommendations,
            quick_wins,
            long_term_strategies,
        })
    }
}

fn check_inputs(snapshots: &[Snapshot], params: &HouseholdParams) -> AdviceResult<()> {
    if snapshots.is_empty() {
        return Err(AdviceError::EmptySnapshotSeries);
    }
    for (index, snapshot) in snapshots.iter().enumerate() {
        for (field, value) in snapshot.numeric_fields() {
            ensure_finite(value, &format!("snapshots[{index}].{field}"))?;
        }
    }

    check_age("currentAge", params.current_age)?;
    check_age("retirementAge", params.retirement_age)?;
    for person in &params.people {
        check_age(&format!("people.{}.currentAge", person.id), person.current_age)?;
        check_age(&format!("people.{}.retirementAge", person.id), person.retirement_age)?;
    }

    for (field, value) in [
        ("annualSalary", params.annual_salary),
        ("taxRate", params.tax_rate),
        ("desiredAnnualIncome", params.desired_annual_income),
        ("investmentReturn", params.investment_return),
        ("monthlyInvestmentContribution", params.monthly_investment_contribution),
    ] {
        ensure_finite(value, field)?;
    }
    for loan in &params.loans {
        for (field, value) in [
            ("balance", loan.balance),
            ("interestRate", loan.interest_rate),
            ("monthlyPayment", loan.monthly_payment),
        ] {
            ensure_finite(value, &format!("loans.{}.{field}", loan.id))?;
        }
    }
    for category in super::types::ExpenseCategory::ALL {
        ensure_finite(
            params.expenses.monthly_amount(category),
            &format!("expenses.{}", category.label()),
        )?;
    }
    for person in &params.people {
        for source in &person.income_sources {
            ensure_finite(source.annual_amount, &format!("people.{}.{}", person.id, source.id))?;
        }
        for account in &person.super_accounts {
            for (field, value) in [
                ("balance", account.balance),
                ("contributionRate", account.contribution_rate),
                ("returnRate", account.return_rate),
            ] {
                ensure_finite(value, &format!("people.{}.{}.{field}", person.id, account.id))?;
            }
        }
    }
    Ok(())
}

fn check_age(field: &str, age: u32) -> AdviceResult<()> {
    if age > MAX_AGE {
        return Err(AdviceError::AgeOutOfRange {
            field: field.to_string(),
            age,
            max: MAX_AGE,
        });
    }
    Ok(())
}

/// The rules run in a fixed order and later rules may override earlier
/// ones, including an on-track verdict.
fn assess(
    snapshots: &[Snapshot],
    summary: &ProjectionSummary,
    params: &HouseholdParams,
    achieved_age: Option<f64>,
) -> OverallAssessment {
    let target = f64::from(params.retirement_age);
    let mut assessment = match achieved_age {
        Some(age) if age <= target + ON_TRACK_MARGIN_YEARS => OverallAssessment::OnTrack,
        Some(age) if age <= target + NEEDS_IMPROVEMENT_MARGIN_YEARS => {
            OverallAssessment::NeedsImprovement
        }
        _ => OverallAssessment::NeedsImprovement,
    };
    if !summary.is_sustainable || net_worth_declines(snapshots) {
        assessment = OverallAssessment::Critical;
    }
    assessment
}

fn net_worth_declines(snapshots: &[Snapshot]) -> bool {
    let (Some(mid), Some(last)) = (snapshots.get(snapshots.len() / 2), snapshots.last()) else {
        return false;
    };
    let scale = mid.net_worth.abs();
    scale > 0.0 && (mid.net_worth - last.net_worth) / scale >= NET_WORTH_DECLINE_LIMIT
}

fn feasibility(
    snapshots: &[Snapshot],
    params: &HouseholdParams,
    achieved_age: Option<f64>,
) -> AdviceResult<RetirementFeasibility> {
    let last = snapshots.last().ok_or(AdviceError::EmptySnapshotSeries)?;
    let target = f64::from(params.retirement_age);
    let required = ensure_finite(
        params.desired_annual_income / SAFE_WITHDRAWAL_RATE,
        "requiredRetirementAssets",
    )?;
    let available = last.investments + last.superannuation;

    let (shortfall_amount, surplus_amount) = if available >= required {
        (None, Some(available - required))
    } else {
        (Some(required - available), None)
    };
    Ok(RetirementFeasibility {
        can_retire_at_target: achieved_age.is_some_and(|age| age <= target + CAN_RETIRE_MARGIN_YEARS),
        actual_retirement_age: achieved_age,
        shortfall_amount,
        surplus_amount,
    })
}

fn target_warnings(item: &AdviceItem, params: &HouseholdParams) -> Vec<GenerationError> {
    if item.person_id.is_none() && item.person_specific_changes.is_none() {
        return Vec::new();
    }
    let validation = validate_person_target(item, params);
    if validation.is_valid {
        return Vec::new();
    }
    let person_id = item
        .person_id
        .as_deref()
        .or(item.person_specific_changes.as_ref().map(|c| c.person_id.as_str()))
        .unwrap_or_default();
    validation
        .errors
        .into_iter()
        .map(|error| {
            tracing::warn!(advice_id = %item.id, person_id, %error, "advice targets an invalid person");
            GenerationError::warning(ErrorKind::InvalidPersonTarget, error.to_string())
                .with_context("adviceId", item.id.as_str())
                .with_context("personId", person_id)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use chrono::Months;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    use super::*;
    use crate::core::cache::boxed_strategy;
    use crate::core::error::{ContextValue, Severity};
    use crate::core::ranking::tests::scored_item;
    use crate::core::strategies::fixtures::{couple, household, monthly_series, start_date};
    use crate::core::telemetry::OperationLog;
    use crate::core::types::{Priority, ProjectionSummary};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn retiring_after(years: u32) -> ProjectionSummary {
        ProjectionSummary {
            retirement_date: Some(start_date() + Months::new(12 * years)),
            is_sustainable: true,
        }
    }

    fn engine() -> AdviceEngine {
        AdviceEngine::new(AdviceConfig::default()).expect("default config is valid")
    }

    #[test]
    fn generates_ranked_partitioned_advice() {
        let series = monthly_series(24, 400_000.0, 2_000.0);
        let result = engine().generate(&series, &retiring_after(30), &household(), None);

        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
        let advice = &result.advice;
        assert_eq!(advice.overall_assessment, OverallAssessment::OnTrack);
        assert_eq!(advice.recommendations.len(), 10);
        for (position, item) in advice.recommendations.iter().enumerate() {
            assert_eq!(item.rank, position + 1);
            assert!(item.advice.effectiveness_score >= 20.0);
        }
        // 200 a month for 30 years saturates effectiveness and is an easy fit
        // for a 2,000 monthly surplus.
        let top = &advice.recommendations[0];
        assert_eq!(top.advice.id, "investment-contribution-200");
        assert_approx(top.overall_score, 95.0);
        assert!(advice.quick_wins.contains(top));
        // +250 on the mortgage saves about half a year, under the effectiveness floor.
        assert!(advice
            .recommendations
            .iter()
            .all(|r| r.advice.id != "debt-home-extra-250"));
    }

    #[test]
    fn feasibility_reports_shortfall_against_final_assets() {
        let series = monthly_series(24, 400_000.0, 2_000.0);
        let params = household();
        let result = engine().generate(&series, &retiring_after(30), &params, None);

        let feasibility = &result.advice.retirement_feasibility;
        assert!(feasibility.can_retire_at_target);
        let age = feasibility.actual_retirement_age.expect("achieved age");
        assert!((age - 65.0).abs() < 0.01);
        // 70,000 / 0.04 against 73,000 investments and 138,400 super.
        assert_approx(feasibility.shortfall_amount.expect("shortfall"), 1_538_600.0);
        assert!(feasibility.surplus_amount.is_none());
    }

    #[test]
    fn assessment_rules_apply_in_order() {
        let series = monthly_series(24, 400_000.0, 2_000.0);
        let params = household();
        let mut engine = engine();

        let late = engine.generate(&series, &retiring_after(36), &params, None);
        assert_eq!(late.advice.overall_assessment, OverallAssessment::NeedsImprovement);
        assert!(!late.advice.retirement_feasibility.can_retire_at_target);

        let never = engine.generate(&series, &ProjectionSummary { retirement_date: None, is_sustainable: true }, &params, None);
        assert_eq!(never.advice.overall_assessment, OverallAssessment::NeedsImprovement);
        assert!(never.advice.retirement_feasibility.actual_retirement_age.is_none());

        let mut unsustainable = retiring_after(30);
        unsustainable.is_sustainable = false;
        let overridden = engine.generate(&series, &unsustainable, &params, None);
        assert_eq!(overridden.advice.overall_assessment, OverallAssessment::Critical);
        assert!(overridden.errors.is_empty());
    }

    #[test]
    fn declining_net_worth_is_critical() {
        let mut engine = engine();
        let params = household();

        // Mortgage household: net worth is negative at the midpoint.
        let mut indebted = monthly_series(24, 400_000.0, 2_000.0);
        let mid = indebted[12].net_worth;
        assert!(mid < 0.0);
        if let Some(last) = indebted.last_mut() {
            last.net_worth = mid - mid.abs() * 0.15;
        }
        let result = engine.generate(&indebted, &retiring_after(30), &params, None);
        assert_eq!(result.advice.overall_assessment, OverallAssessment::Critical);

        let mut debt_free = monthly_series(24, 0.0, 2_000.0);
        let mid = debt_free[12].net_worth;
        assert!(mid > 0.0);
        if let Some(last) = debt_free.last_mut() {
            last.net_worth = mid * 0.85;
        }
        let result = engine.generate(&debt_free, &retiring_after(30), &params, None);
        assert_eq!(result.advice.overall_assessment, OverallAssessment::Critical);

        if let Some(last) = debt_free.last_mut() {
            last.net_worth = mid * 0.95;
        }
        let result = engine.generate(&debt_free, &retiring_after(30), &params, None);
        assert_eq!(result.advice.overall_assessment, OverallAssessment::OnTrack);
    }

    #[test]
    fn zero_midpoint_net_worth_never_counts_as_a_decline() {
        let mut series = monthly_series(24, 400_000.0, 2_000.0);
        series[12].net_worth = 0.0;
        if let Some(last) = series.last_mut() {
            last.net_worth = -50_000.0;
        }
        let result = engine().generate(&series, &retiring_after(30), &household(), None);
        assert_eq!(result.advice.overall_assessment, OverallAssessment::OnTrack);
    }

    #[test]
    fn empty_series_returns_critical_fallback() {
        let result = engine().generate(&[], &retiring_after(30), &household(), None);
        assert_eq!(result.advice, RetirementAdvice::critical_fallback());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ErrorKind::EmptySnapshotSeries);
        assert_eq!(result.errors[0].severity, Severity::Critical);
    }

    #[test]
    fn non_finite_input_returns_critical_fallback() {
        let mut series = monthly_series(24, 400_000.0, 2_000.0);
        series[3].cash = f64::NAN;
        let result = engine().generate(&series, &retiring_after(30), &household(), None);
        assert_eq!(result.advice, RetirementAdvice::critical_fallback());
        assert_eq!(result.errors[0].code, ErrorKind::NonFiniteValue);
        assert_eq!(
            result.errors[0].context.get("field"),
            Some(&ContextValue::from("snapshots[3].cash"))
        );

        let mut params = household();
        params.investment_return = f64::INFINITY;
        let series = monthly_series(24, 400_000.0, 2_000.0);
        let result = engine().generate(&series, &retiring_after(30), &params, None);
        assert_eq!(result.errors[0].code, ErrorKind::NonFiniteValue);
    }

    #[test]
    fn non_finite_entity_balance_names_its_map() {
        let mut series = monthly_series(24, 400_000.0, 2_000.0);
        series[3].loan_balances.insert("home".to_string(), 390_000.0);
        series[3].offset_balances.insert("home".to_string(), f64::NAN);
        let result = engine().generate(&series, &retiring_after(30), &household(), None);
        assert_eq!(result.advice, RetirementAdvice::critical_fallback());
        assert_eq!(
            result.errors[0].context.get("field"),
            Some(&ContextValue::from("snapshots[3].offsetBalances.home"))
        );
    }

    #[test]
    fn implausible_ages_return_critical_fallback() {
        let series = monthly_series(24, 400_000.0, 2_000.0);
        let mut params = household();
        params.retirement_age = u32::MAX;
        let result = engine().generate(&series, &retiring_after(30), &params, None);
        assert_eq!(result.advice, RetirementAdvice::critical_fallback());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ErrorKind::AgeOutOfRange);
        assert_eq!(
            result.errors[0].context.get("field"),
            Some(&ContextValue::from("retirementAge"))
        );

        let mut pair = couple();
        pair.people[1].retirement_age = u32::MAX;
        let result = engine().generate(&series, &retiring_after(30), &pair, None);
        assert_eq!(result.advice, RetirementAdvice::critical_fallback());
        assert_eq!(
            result.errors[0].context.get("field"),
            Some(&ContextValue::from("people.sam.retirementAge"))
        );
    }

    #[test]
    fn failing_strategy_short_circuits_generation() {
        let failing = boxed_strategy(|_| {
            Err(AdviceError::StrategyFailure {
                strategy: "income",
                reason: "boom".to_string(),
            })
        });
        let mut engine = engine().with_strategy(CachedStrategy::with_strategy(
            StrategyKind::Income,
            CacheSettings::for_strategy(StrategyKind::Income),
            failing,
        ));
        let series = monthly_series(24, 400_000.0, 2_000.0);
        let result = engine.generate(&series, &retiring_after(30), &household(), None);
        assert_eq!(result.advice.overall_assessment, OverallAssessment::Critical);
        assert!(result.advice.recommendations.is_empty());
        assert_eq!(result.errors[0].code, ErrorKind::StrategyFailure);
    }

    #[test]
    fn truncates_to_the_highest_scoring_items() {
        let config = AdviceConfig {
            enabled_strategies: vec![StrategyKind::Expense],
            ..AdviceConfig::default()
        };
        let fifteen = boxed_strategy(|_| {
            Ok((0..15)
                .map(|i| scored_item(&format!("item-{i}"), 25.0 + 5.0 * i as f64, 60.0, Priority::Medium))
                .collect())
        });
        let mut engine = AdviceEngine::new(config)
            .expect("valid config")
            .with_strategy(CachedStrategy::with_strategy(
                StrategyKind::Expense,
                CacheSettings::for_strategy(StrategyKind::Expense),
                fifteen,
            ));

        let series = monthly_series(24, 400_000.0, 2_000.0);
        let result = engine.generate(&series, &retiring_after(30), &household(), None);
        let ids: Vec<String> = result
            .advice
            .recommendations
            .iter()
            .map(|r| r.advice.id.clone())
            .collect();
        let expected: Vec<String> = (5..15).rev().map(|i| format!("item-{i}")).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn low_effectiveness_items_are_dropped() {
        let config = AdviceConfig {
            enabled_strategies: vec![StrategyKind::Expense],
            min_effectiveness: 50.0,
            ..AdviceConfig::default()
        };
        let mixed = boxed_strategy(|_| {
            Ok(vec![
                scored_item("weak", 49.9, 90.0, Priority::Low),
                scored_item("strong", 50.0, 90.0, Priority::Medium),
            ])
        });
        let mut engine = AdviceEngine::new(config)
            .expect("valid config")
            .with_strategy(CachedStrategy::with_strategy(
                StrategyKind::Expense,
                CacheSettings::for_strategy(StrategyKind::Expense),
                mixed,
            ));
        let series = monthly_series(12, 0.0, 2_000.0);
        let result = engine.generate(&series, &retiring_after(30), &household(), None);
        assert_eq!(result.advice.recommendations.len(), 1);
        assert_eq!(result.advice.recommendations[0].advice.id, "strong");
    }

    #[test]
    fn invalid_person_targets_are_kept_with_a_warning() {
        let config = AdviceConfig {
            enabled_strategies: vec![StrategyKind::PersonSpecific],
            ..AdviceConfig::default()
        };
        let ghost = boxed_strategy(|_| {
            let mut item = scored_item("ghost-advice", 60.0, 60.0, Priority::Medium);
            item.person_id = Some("ghost".to_string());
            Ok(vec![item])
        });
        let mut engine = AdviceEngine::new(config)
            .expect("valid config")
            .with_strategy(CachedStrategy::with_strategy(
                StrategyKind::PersonSpecific,
                CacheSettings::for_strategy(StrategyKind::PersonSpecific),
                ghost,
            ));

        let series = monthly_series(12, 0.0, 2_000.0);
        let result = engine.generate(&series, &retiring_after(30), &couple(), None);
        assert!(result.errors.is_empty());
        assert_eq!(result.advice.recommendations.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        let warning = &result.warnings[0];
        assert_eq!(warning.code, ErrorKind::InvalidPersonTarget);
        assert_eq!(warning.severity, Severity::Warning);
        assert_eq!(warning.context.get("personId"), Some(&ContextValue::from("ghost")));
        assert_eq!(warning.context.get("adviceId"), Some(&ContextValue::from("ghost-advice")));
    }

    #[test]
    fn couples_get_valid_person_advice() {
        let series = monthly_series(24, 0.0, 2_000.0);
        let result = engine().generate(&series, &retiring_after(30), &couple(), None);
        assert!(result.warnings.is_empty());
        assert!(result
            .advice
            .recommendations
            .iter()
            .any(|r| r.advice.person_id.is_some()));
    }

    #[test]
    fn repeated_generation_hits_the_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let counting = boxed_strategy(move |ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            crate::core::strategies::debt_advice(ctx)
        });
        let mut engine = engine().with_strategy(CachedStrategy::with_strategy(
            StrategyKind::Debt,
            CacheSettings::for_strategy(StrategyKind::Debt),
            counting,
        ));

        let series = monthly_series(24, 400_000.0, 2_000.0);
        let params = household();
        let first = engine.generate(&series, &retiring_after(30), &params, None);
        let second = engine.generate(&series, &retiring_after(30), &params, None);
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.cache_stats()[&StrategyKind::Debt].hits, 1);

        engine.clear_caches();
        engine.generate(&series, &retiring_after(30), &params, None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn disabled_strategies_are_not_run() {
        let config = AdviceConfig {
            enabled_strategies: vec![StrategyKind::Debt],
            ..AdviceConfig::default()
        };
        let mut engine = AdviceEngine::new(config).expect("valid config");
        assert_eq!(engine.config().enabled_strategies, vec![StrategyKind::Debt]);
        let series = monthly_series(24, 400_000.0, 2_000.0);
        let result = engine.generate(&series, &retiring_after(30), &household(), None);
        assert!(result
            .advice
            .recommendations
            .iter()
            .all(|r| r.advice.id.starts_with("debt-")));
        assert_eq!(engine.cache_stats().len(), 1);
    }

    #[test]
    fn telemetry_records_each_operation() {
        let log = Arc::new(Mutex::new(OperationLog::default()));
        let mut engine = engine().with_telemetry(Arc::clone(&log));
        let series = monthly_series(24, 400_000.0, 2_000.0);
        engine.generate(&series, &retiring_after(30), &household(), None);
        engine.generate(&[], &retiring_after(30), &household(), None);

        let log = log.lock().expect("log lock");
        assert_eq!(log.count("advice.generate"), 2);
        assert_eq!(log.count("debt"), 1);
        assert_eq!(log.count("person"), 1);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let zero = AdviceConfig {
            max_recommendations: 0,
            ..AdviceConfig::default()
        };
        assert!(matches!(
            AdviceEngine::new(zero),
            Err(AdviceError::InvalidConfiguration { .. })
        ));

        let out_of_range = AdviceConfig {
            min_effectiveness: 120.0,
            ..AdviceConfig::default()
        };
        assert!(out_of_range.validate().is_err());

        let mut empty_cache = AdviceConfig::default();
        empty_cache.cache.insert(StrategyKind::Debt, CacheSettings::new(0, 60));
        assert!(empty_cache.validate().is_err());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: AdviceConfig = serde_json::from_str(
            r#"{"maxRecommendations": 5, "cache": {"expense": {"capacity": 7, "ttlSecs": 30}}}"#,
        )
        .expect("config json");
        assert_eq!(config.max_recommendations, 5);
        assert_approx(config.min_effectiveness, 20.0);
        assert_eq!(config.enabled_strategies.len(), StrategyKind::ALL.len());
        assert_eq!(config.cache_settings(StrategyKind::Expense), CacheSettings::new(7, 30));
        assert_eq!(config.cache_settings(StrategyKind::Debt), CacheSettings::new(50, 300));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_generated_advice_respects_ranking_invariants(
            periods in 1u32..48,
            loan in 0u32..600_000,
            cash_flow in -1_000i32..6_000,
            dining in 0u32..2_000,
            years in 20u32..45,
            sustainable in proptest::bool::ANY
        ) {
            let series = monthly_series(periods, loan as f64, cash_flow as f64);
            let mut params = couple();
            params.loans[0].balance = loan as f64;
            params.expenses.dining = dining as f64;
            params.offset_enabled = true;
            let summary = ProjectionSummary {
                retirement_date: Some(start_date() + Months::new(12 * years)),
                is_sustainable: sustainable,
            };
            let result = engine().generate(&series, &summary, &params, None);
            prop_assert!(result.errors.is_empty());

            let advice = &result.advice;
            prop_assert!(advice.recommendations.len() <= 10);
            for (position, item) in advice.recommendations.iter().enumerate() {
                prop_assert_eq!(item.rank, position + 1);
                let expected = 0.7 * item.advice.effectiveness_score + 0.3 * item.advice.feasibility_score;
                prop_assert!((item.overall_score - expected).abs() < EPS);
                prop_assert!((0.0..=100.0).contains(&item.advice.effectiveness_score));
                prop_assert!((0.0..=100.0).contains(&item.advice.feasibility_score));
            }
            for pair in advice.recommendations.windows(2) {
                prop_assert!(pair[0].overall_score >= pair[1].overall_score);
            }
            for quick in &advice.quick_wins {
                prop_assert!(quick.advice.feasibility_score >= 80.0 && quick.advice.priority == Priority::High);
                prop_assert!(advice.recommendations.contains(quick));
            }
            for long in &advice.long_term_strategies {
                prop_assert!(long.advice.feasibility_score < 80.0 || long.advice.effectiveness_score >= 70.0);
                prop_assert!(advice.recommendations.contains(long));
            }
            if !sustainable {
                prop_assert_eq!(advice.overall_assessment, OverallAssessment::Critical);
            }
        }
    }
}
