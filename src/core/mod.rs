mod advisor;
mod cache;
mod comparison;
mod differ;
mod error;
mod matcher;
mod ranking;
mod scoring;
mod strategies;
mod targeting;
mod telemetry;
mod types;

pub use advisor::{AdviceConfig, AdviceEngine, GenerationResult};
pub use cache::{
    BoundedCache, CacheEntry, CacheSettings, CacheStats, CachedStrategy, Clock, SystemClock,
    boxed_strategy, fingerprint,
};
pub use comparison::{ScenarioComparison, ScenarioOutput, compare_scenarios, compare_scenarios_with};
pub use differ::{
    AdviceChange, AdviceComparison, CategoryAdviceComparison, MilestoneComparison,
    MilestoneEffect, MilestonePair, MilestoneTypeSummary, compare_advice, compare_milestones,
    generate_variation_explanation,
};
pub use error::{
    AdviceError, AdviceResult, ContextValue, ErrorKind, GenerationError, MAX_CONTEXT_ENTRIES,
    Severity,
};
pub use matcher::{AdviceMatcher, KeyPhraseMatcher, key_phrases, milestones_match};
pub use ranking::{is_long_term, is_quick_win, partition_advice, rank_advice, truncate_ranked};
pub use scoring::{amortization_months, annuity_future_value, cash_flow_feasibility, overall_score};
pub use strategies::{
    Strategy, StrategyContext, StrategyKind, allocation_advice, debt_advice, expense_advice,
    income_advice, investment_contribution_advice, offset_advice, person_specific_advice,
};
pub use targeting::{TargetingError, ValidationResult, apply_person_target, validate_person_target};
pub use telemetry::{
    OperationLog, OperationOutcome, OperationRecord, OperationToken, TelemetrySink,
    TracingTelemetry,
};
pub use types::{
    AdviceCategory, AdviceItem, EntityChange, ExpenseBudget, ExpenseCategory, HouseholdParams,
    IncomeSource, IncomeSourcePatch, Loan, Milestone, MilestoneType, OverallAssessment, Person,
    PersonPatch, PersonSpecificChanges, Priority, ProjectedImpact, ProjectionSummary,
    RankedAdvice, RetirementAdvice, RetirementFeasibility, Snapshot, SuperAccount,
    SuperAccountPatch, ParameterTransition,
};
