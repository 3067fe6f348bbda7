//! Differences between two scenarios: paired milestones, changed advice and
//! a short list of sentences explaining the headline variations.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::comparison::ScenarioOutput;
use super::matcher::{AdviceMatcher, milestones_match};
use super::scoring::{format_currency, mean};
use super::types::{AdviceCategory, AdviceItem, Milestone, MilestoneType, RankedAdvice};

const SCORE_THRESHOLD: f64 = 5.0;
const TIMELINE_THRESHOLD_YEARS: f64 = 0.5;
const COST_THRESHOLD: f64 = 1_000.0;
const ASSETS_THRESHOLD: f64 = 5_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestonePair {
    pub a: Milestone,
    pub b: Milestone,
    /// Days from B's date to A's; negative when A happens first.
    pub timing_difference_days: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_difference: Option<f64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneEffect {
    Accelerates,
    Delays,
    Mixed,
    NoChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneTypeSummary {
    pub milestone_type: MilestoneType,
    pub count: usize,
    pub average_timing_difference_days: f64,
    pub effect: MilestoneEffect,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneComparison {
    pub common: Vec<MilestonePair>,
    pub unique_to_a: Vec<Milestone>,
    pub unique_to_b: Vec<Milestone>,
    pub summaries: Vec<MilestoneTypeSummary>,
}

pub fn compare_milestones(a: &[Milestone], b: &[Milestone]) -> MilestoneComparison {
    let (pairs, unique_to_a, unique_to_b) = pair_up(a, b, |x, y| milestones_match(x, y), |_, _| false);
    let common: Vec<MilestonePair> = pairs
        .into_iter()
        .map(|(a, b)| MilestonePair {
            timing_difference_days: (a.date - b.date).num_days(),
            impact_difference: a.financial_impact.zip(b.financial_impact).map(|(x, y)| x - y),
            a: a.clone(),
            b: b.clone(),
        })
        .collect();
    let summaries = summarize(&common);
    MilestoneComparison {
        common,
        unique_to_a: unique_to_a.into_iter().cloned().collect(),
        unique_to_b: unique_to_b.into_iter().cloned().collect(),
        summaries,
    }
}

fn summarize(common: &[MilestonePair]) -> Vec<MilestoneTypeSummary> {
    let mut by_type: BTreeMap<MilestoneType, Vec<i64>> = BTreeMap::new();
    for pair in common {
        by_type
            .entry(pair.a.milestone_type)
            .or_default()
            .push(pair.timing_difference_days);
    }
    by_type
        .into_iter()
        .map(|(milestone_type, days)| MilestoneTypeSummary {
            milestone_type,
            count: days.len(),
            average_timing_difference_days: mean(days.iter().map(|d| *d as f64)).unwrap_or(0.0),
            effect: effect_of(&days),
        })
        .collect()
}

fn effect_of(days: &[i64]) -> MilestoneEffect {
    let earlier = days.iter().any(|d| *d < 0);
    let later = days.iter().any(|d| *d > 0);
    match (earlier, later) {
        (false, false) => MilestoneEffect::NoChange,
        (true, false) => MilestoneEffect::Accelerates,
        (false, true) => MilestoneEffect::Delays,
        (true, true) => MilestoneEffect::Mixed,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceChange {
    pub a: AdviceItem,
    pub b: AdviceItem,
    pub explanations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAdviceComparison {
    pub unique_to_a: Vec<AdviceItem>,
    pub unique_to_b: Vec<AdviceItem>,
    pub changed: Vec<AdviceChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceComparison {
    pub categories: BTreeMap<AdviceCategory, CategoryAdviceComparison>,
}

impl AdviceComparison {
    pub fn changed_count(&self) -> usize {
        self.categories.values().map(|c| c.changed.len()).sum()
    }

    pub fn unique_count(&self) -> usize {
        self.categories
            .values()
            .map(|c| c.unique_to_a.len() + c.unique_to_b.len())
            .sum()
    }
}

/// Pairs advice within each category; matched pairs with no material
/// difference are left out of the result entirely.
pub fn compare_advice(a: &[RankedAdvice], b: &[RankedAdvice], matcher: &dyn AdviceMatcher) -> AdviceComparison {
    let mut categories = BTreeMap::new();
    let present: BTreeSet<AdviceCategory> = a.iter().chain(b).map(|r| r.advice.category).collect();
    for category in present {
        let side_a: Vec<&AdviceItem> = a.iter().map(|r| &r.advice).filter(|i| i.category == category).collect();
        let side_b: Vec<&AdviceItem> = b.iter().map(|r| &r.advice).filter(|i| i.category == category).collect();

        let (pairs, unique_to_a, unique_to_b) = pair_up(
            &side_a,
            &side_b,
            |x, y| matcher.matches(x, y),
            |x, y| x.id == y.id,
        );
        let changed = pairs
            .into_iter()
            .filter_map(|(x, y)| {
                let explanations = explain_change(x, y);
                (!explanations.is_empty()).then(|| AdviceChange {
                    a: (*x).clone(),
                    b: (*y).clone(),
                    explanations,
                })
            })
            .collect();

        categories.insert(
            category,
            CategoryAdviceComparison {
                unique_to_a: unique_to_a.into_iter().map(|i| (*i).clone()).collect(),
                unique_to_b: unique_to_b.into_iter().map(|i| (*i).clone()).collect(),
                changed,
            },
        );
    }
    AdviceComparison { categories }
}

fn explain_change(a: &AdviceItem, b: &AdviceItem) -> Vec<String> {
    let mut explanations = Vec::new();
    if a.priority != b.priority {
        explanations.push(format!(
            "Priority changes from {} to {}",
            a.priority.label(),
            b.priority.label()
        ));
    }
    if (a.effectiveness_score - b.effectiveness_score).abs() > SCORE_THRESHOLD {
        explanations.push(format!(
            "Effectiveness score changes from {:.0} to {:.0}",
            a.effectiveness_score, b.effectiveness_score
        ));
    }
    if (a.feasibility_score - b.feasibility_score).abs() > SCORE_THRESHOLD {
        explanations.push(format!(
            "Feasibility score changes from {:.0} to {:.0}",
            a.feasibility_score, b.feasibility_score
        ));
    }

    let (impact_a, impact_b) = (&a.projected_impact, &b.projected_impact);
    if let Some((x, y)) = differing(impact_a.timeline_savings_years, impact_b.timeline_savings_years, TIMELINE_THRESHOLD_YEARS) {
        explanations.push(format!("Time saved changes from {x:.1} to {y:.1} years"));
    }
    if let Some((x, y)) = differing(impact_a.cost_savings, impact_b.cost_savings, COST_THRESHOLD) {
        explanations.push(format!(
            "Cost savings change from {} to {}",
            format_currency(x),
            format_currency(y)
        ));
    }
    if let Some((x, y)) = differing(impact_a.additional_assets, impact_b.additional_assets, ASSETS_THRESHOLD) {
        explanations.push(format!(
            "Additional assets change from {} to {}",
            format_currency(x),
            format_currency(y)
        ));
    }
    explanations
}

/// Both values, with a missing side read as zero, when they differ by more
/// than `threshold`.
fn differing(a: Option<f64>, b: Option<f64>, threshold: f64) -> Option<(f64, f64)> {
    if a.is_none() && b.is_none() {
        return None;
    }
    let (x, y) = (a.unwrap_or(0.0), b.unwrap_or(0.0));
    ((x - y).abs() > threshold).then_some((x, y))
}

/// Greedy pairing in A's order. Among B's unused candidates that match,
/// one satisfying `prefer` wins, otherwise the first.
fn pair_up<'a, T>(
    a: &'a [T],
    b: &'a [T],
    matches: impl Fn(&T, &T) -> bool,
    prefer: impl Fn(&T, &T) -> bool,
) -> (Vec<(&'a T, &'a T)>, Vec<&'a T>, Vec<&'a T>) {
    let mut used = vec![false; b.len()];
    let mut pairs = Vec::new();
    let mut unique_to_a = Vec::new();

    for x in a {
        let candidates: Vec<usize> = (0..b.len())
            .filter(|&j| !used[j] && matches(x, &b[j]))
            .collect();
        let chosen = candidates
            .iter()
            .copied()
            .find(|&j| prefer(x, &b[j]))
            .or_else(|| candidates.first().copied());
        match chosen {
            Some(j) => {
                used[j] = true;
                pairs.push((x, &b[j]));
            }
            None => unique_to_a.push(x),
        }
    }
    let unique_to_b = b
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(y, _)| y)
        .collect();
    (pairs, unique_to_a, unique_to_b)
}

/// Headline differences between two scenarios, always in the same order:
/// assessment, feasibility, final net worth, retirement date, sustainability.
pub fn generate_variation_explanation(a: &ScenarioOutput, b: &ScenarioOutput) -> Vec<String> {
    let mut sentences = Vec::new();

    let (assessment_a, assessment_b) = (a.advice.overall_assessment, b.advice.overall_assessment);
    if assessment_a != assessment_b {
        sentences.push(format!(
            "Overall assessment changes from {} in {} to {} in {}",
            assessment_a.label(),
            a.label,
            assessment_b.label(),
            b.label
        ));
    }

    let can_a = a.advice.retirement_feasibility.can_retire_at_target;
    let can_b = b.advice.retirement_feasibility.can_retire_at_target;
    if can_a != can_b {
        let (yes, no) = if can_b { (b, a) } else { (a, b) };
        sentences.push(format!(
            "Retiring at the target age is feasible in {} but not in {}",
            yes.label, no.label
        ));
    }

    if let (Some(last_a), Some(last_b)) = (a.snapshots.last(), b.snapshots.last()) {
        let delta = last_b.net_worth - last_a.net_worth;
        if delta > 0.0 {
            sentences.push(format!(
                "{} ends with {} more net worth than {}",
                b.label,
                format_currency(delta),
                a.label
            ));
        } else if delta < 0.0 {
            sentences.push(format!(
                "{} ends with {} less net worth than {}",
                b.label,
                format_currency(-delta),
                a.label
            ));
        }
    }

    match (a.summary.retirement_date, b.summary.retirement_date) {
        (Some(date_a), Some(date_b)) => {
            let days = (date_b - date_a).num_days();
            if days < 0 {
                sentences.push(format!(
                    "{} reaches retirement {} days earlier than {}",
                    b.label, -days, a.label
                ));
            } else if days > 0 {
                sentences.push(format!(
                    "{} reaches retirement {days} days later than {}",
                    b.label, a.label
                ));
            }
        }
        (None, Some(_)) => sentences.push(format!(
            "{} reaches retirement but {} does not",
            b.label, a.label
        )),
        (Some(_), None) => sentences.push(format!(
            "{} reaches retirement but {} does not",
            a.label, b.label
        )),
        (None, None) => {}
    }

    if a.summary.is_sustainable != b.summary.is_sustainable {
        let (yes, no) = if b.summary.is_sustainable { (b, a) } else { (a, b) };
        sentences.push(format!(
            "{} is sustainable through retirement while {} is not",
            yes.label, no.label
        ));
    }
    sentences
}
