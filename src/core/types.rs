use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceCategory {
    Debt,
    Investment,
    Expense,
    Income,
}

impl AdviceCategory {
    pub fn label(self) -> &'static str {
        match self {
            AdviceCategory::Debt => "debt",
            AdviceCategory::Investment => "investment",
            AdviceCategory::Expense => "expense",
            AdviceCategory::Income => "income",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallAssessment {
    OnTrack,
    NeedsImprovement,
    Critical,
}

impl OverallAssessment {
    pub fn label(self) -> &'static str {
        match self {
            OverallAssessment::OnTrack => "on track",
            OverallAssessment::NeedsImprovement => "needs improvement",
            OverallAssessment::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectedImpact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline_savings_years: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_savings: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_assets: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceItem {
    pub id: String,
    pub category: AdviceCategory,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub actions: Vec<String>,
    pub projected_impact: ProjectedImpact,
    pub feasibility_score: f64,
    pub effectiveness_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_specific_changes: Option<PersonSpecificChanges>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedAdvice {
    #[serde(flatten)]
    pub advice: AdviceItem,
    pub overall_score: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementFeasibility {
    pub can_retire_at_target: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_retirement_age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortfall_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surplus_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementAdvice {
    pub overall_assessment: OverallAssessment,
    pub retirement_feasibility: RetirementFeasibility,
    pub recommendations: Vec<RankedAdvice>,
    pub quick_wins: Vec<RankedAdvice>,
    pub long_term_strategies: Vec<RankedAdvice>,
}

impl RetirementAdvice {
    /// Smallest valid result, returned when generation cannot complete.
    pub fn critical_fallback() -> Self {
        Self {
            overall_assessment: OverallAssessment::Critical,
            retirement_feasibility: RetirementFeasibility::default(),
            recommendations: Vec::new(),
            quick_wins: Vec::new(),
            long_term_strategies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSource {
    pub id: String,
    pub name: String,
    pub annual_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperAccount {
    pub id: String,
    pub name: String,
    pub balance: f64,
    /// Employer + voluntary contribution as a fraction of income.
    pub contribution_rate: f64,
    pub return_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    pub current_age: u32,
    pub retirement_age: u32,
    #[serde(default)]
    pub income_sources: Vec<IncomeSource>,
    #[serde(default)]
    pub super_accounts: Vec<SuperAccount>,
}

impl Person {
    pub fn annual_income(&self) -> f64 {
        self.income_sources.iter().map(|s| s.annual_amount).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: String,
    pub name: String,
    pub balance: f64,
    /// Annual rate as a fraction, e.g. 0.06.
    pub interest_rate: f64,
    pub monthly_payment: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Groceries,
    Dining,
    Entertainment,
    Transport,
    Utilities,
    Subscriptions,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 6] = [
        ExpenseCategory::Groceries,
        ExpenseCategory::Dining,
        ExpenseCategory::Entertainment,
        ExpenseCategory::Transport,
        ExpenseCategory::Utilities,
        ExpenseCategory::Subscriptions,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ExpenseCategory::Groceries => "groceries",
            ExpenseCategory::Dining => "dining",
            ExpenseCategory::Entertainment => "entertainment",
            ExpenseCategory::Transport => "transport",
            ExpenseCategory::Utilities => "utilities",
            ExpenseCategory::Subscriptions => "subscriptions",
        }
    }

    /// Largest reduction considered realistic for the category.
    pub fn max_reduction(self) -> f64 {
        match self {
            ExpenseCategory::Groceries => 0.15,
            ExpenseCategory::Dining => 0.50,
            ExpenseCategory::Entertainment => 0.40,
            ExpenseCategory::Transport => 0.20,
            ExpenseCategory::Utilities => 0.15,
            ExpenseCategory::Subscriptions => 0.60,
        }
    }
}

/// Monthly spend per discretionary category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpenseBudget {
    pub groceries: f64,
    pub dining: f64,
    pub entertainment: f64,
    pub transport: f64,
    pub utilities: f64,
    pub subscriptions: f64,
}

impl ExpenseBudget {
    pub fn monthly_amount(&self, category: ExpenseCategory) -> f64 {
        match category {
            ExpenseCategory::Groceries => self.groceries,
            ExpenseCategory::Dining => self.dining,
            ExpenseCategory::Entertainment => self.entertainment,
            ExpenseCategory::Transport => self.transport,
            ExpenseCategory::Utilities => self.utilities,
            ExpenseCategory::Subscriptions => self.subscriptions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterTransition {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HouseholdParams {
    pub current_age: u32,
    pub retirement_age: u32,
    pub annual_salary: f64,
    pub tax_rate: f64,
    pub desired_annual_income: f64,
    pub investment_return: f64,
    pub monthly_investment_contribution: f64,
    pub offset_enabled: bool,
    pub loans: Vec<Loan>,
    pub expenses: ExpenseBudget,
    pub people: Vec<Person>,
    pub transitions: Vec<ParameterTransition>,
}

impl Default for HouseholdParams {
    fn default() -> Self {
        Self {
            current_age: 35,
            retirement_age: 65,
            annual_salary: 0.0,
            tax_rate: 0.3,
            desired_annual_income: 60_000.0,
            investment_return: 0.06,
            monthly_investment_contribution: 0.0,
            offset_enabled: false,
            loans: Vec::new(),
            expenses: ExpenseBudget::default(),
            people: Vec::new(),
            transitions: Vec::new(),
        }
    }
}

impl HouseholdParams {
    pub fn years_to_retirement(&self) -> u32 {
        self.retirement_age.saturating_sub(self.current_age)
    }

    /// Explicit salary, falling back to the sum of every person's income.
    pub fn household_income(&self) -> f64 {
        if self.annual_salary > 0.0 {
            self.annual_salary
        } else {
            self.people.iter().map(Person::annual_income).sum()
        }
    }

    pub fn is_multi_person(&self) -> bool {
        self.people.len() > 1
    }

    pub fn person(&self, person_id: &str) -> Option<&Person> {
        self.people.iter().find(|p| p.id == person_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub date: NaiveDate,
    pub cash: f64,
    pub investments: f64,
    pub superannuation: f64,
    #[serde(default)]
    pub loan_balance: f64,
    #[serde(default)]
    pub offset_balance: f64,
    pub net_worth: f64,
    #[serde(default)]
    pub cash_flow: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub loan_balances: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub offset_balances: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub super_balances: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub investment_balances: BTreeMap<String, f64>,
}

impl Snapshot {
    /// Balance of a single loan, using the per-entity breakdown when the
    /// projection supplied one.
    pub fn balance_of(&self, loan: &Loan, loan_count: usize) -> f64 {
        match self.loan_balances.get(&loan.id) {
            Some(balance) => *balance,
            None if loan_count == 1 => self.loan_balance,
            None => loan.balance,
        }
    }

    /// Every numeric field, labelled, for finiteness checks.
    /// Every numeric field, with per-entity entries labelled `map.id`.
    pub fn numeric_fields(&self) -> impl Iterator<Item = (String, f64)> + '_ {
        let entity_maps = [
            ("loanBalances", &self.loan_balances),
            ("offsetBalances", &self.offset_balances),
            ("superBalances", &self.super_balances),
            ("investmentBalances", &self.investment_balances),
        ];
        [
            ("cash", self.cash),
            ("investments", self.investments),
            ("superannuation", self.superannuation),
            ("loanBalance", self.loan_balance),
            ("offsetBalance", self.offset_balance),
            ("netWorth", self.net_worth),
            ("cashFlow", self.cash_flow),
        ]
        .into_iter()
        .map(|(field, value)| (field.to_string(), value))
        .chain(entity_maps.into_iter().flat_map(|(map, entries)| {
            entries
                .iter()
                .map(move |(id, value)| (format!("{map}.{id}"), *value))
        }))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub retirement_date: Option<NaiveDate>,
    pub is_sustainable: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneType {
    LoanPayoff,
    OffsetCompletion,
    ParameterTransition,
    RetirementEligibility,
    NetWorthTarget,
    Custom,
}

impl MilestoneType {
    pub fn label(self) -> &'static str {
        match self {
            MilestoneType::LoanPayoff => "loan payoff",
            MilestoneType::OffsetCompletion => "offset completion",
            MilestoneType::ParameterTransition => "parameter transition",
            MilestoneType::RetirementEligibility => "retirement eligibility",
            MilestoneType::NetWorthTarget => "net worth target",
            MilestoneType::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub milestone_type: MilestoneType,
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_impact: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retirement_age: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncomeSourcePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SuperAccountPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contribution_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum EntityChange<E, P> {
    Add { entity: E },
    Update { id: String, patch: P },
    Remove { id: String },
}

/// Mutation descriptor attached to advice that targets one household member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSpecificChanges {
    pub person_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<PersonPatch>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub income_sources: Vec<EntityChange<IncomeSource, IncomeSourcePatch>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub super_accounts: Vec<EntityChange<SuperAccount, SuperAccountPatch>>,
}

impl PersonSpecificChanges {
    pub fn for_person(person_id: &str) -> Self {
        Self {
            person_id: person_id.to_string(),
            person: None,
            income_sources: Vec::new(),
            super_accounts: Vec::new(),
        }
    }
}
