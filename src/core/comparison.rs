use serde::{Deserialize, Serialize};

use super::differ::{
    AdviceComparison, MilestoneComparison, compare_advice, compare_milestones,
    generate_variation_explanation,
};
use super::matcher::{AdviceMatcher, KeyPhraseMatcher};
use super::types::{Milestone, ProjectionSummary, RetirementAdvice, Snapshot};

/// Everything one scenario produced, as handed over by its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioOutput {
    pub label: String,
    pub snapshots: Vec<Snapshot>,
    pub summary: ProjectionSummary,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    pub advice: RetirementAdvice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioComparison {
    pub scenario_a: ScenarioOutput,
    pub scenario_b: ScenarioOutput,
    pub milestone_comparison: MilestoneComparison,
    pub advice_comparison: AdviceComparison,
    pub explanations: Vec<String>,
}

pub fn compare_scenarios(a: ScenarioOutput, b: ScenarioOutput) -> ScenarioComparison {
    compare_scenarios_with(a, b, &KeyPhraseMatcher)
}

pub fn compare_scenarios_with(
    a: ScenarioOutput,
    b: ScenarioOutput,
    matcher: &dyn AdviceMatcher,
) -> ScenarioComparison {
    let milestone_comparison = compare_milestones(&a.milestones, &b.milestones);
    let advice_comparison = compare_advice(&a.advice.recommendations, &b.advice.recommendations, matcher);
    let explanations = generate_variation_explanation(&a, &b);
    tracing::debug!(
        scenario_a = %a.label,
        scenario_b = %b.label,
        common_milestones = milestone_comparison.common.len(),
        changed_advice = advice_comparison.changed_count(),
        explanations = explanations.len(),
        "scenarios compared"
    );
    ScenarioComparison {
        scenario_a: a,
        scenario_b: b,
        milestone_comparison,
        advice_comparison,
        explanations,
    }
}
