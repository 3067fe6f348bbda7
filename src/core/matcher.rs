//! Identity across two independently computed scenarios.

use super::types::{AdviceItem, Milestone, MilestoneType};

/// Same type and same natural key. Only one retirement-eligibility
/// milestone exists per scenario, so those always pair up.
pub fn milestones_match(a: &Milestone, b: &Milestone) -> bool {
    if a.milestone_type != b.milestone_type {
        return false;
    }
    match a.milestone_type {
        MilestoneType::LoanPayoff | MilestoneType::OffsetCompletion => {
            a.loan_id.is_some() && a.loan_id == b.loan_id
        }
        MilestoneType::ParameterTransition => {
            a.transition_id.is_some() && a.transition_id == b.transition_id
        }
        MilestoneType::RetirementEligibility => true,
        MilestoneType::NetWorthTarget | MilestoneType::Custom => false,
    }
}

pub trait AdviceMatcher {
    fn matches(&self, a: &AdviceItem, b: &AdviceItem) -> bool;
}

struct PhraseRule {
    phrase: &'static str,
    all_of: &'static [&'static str],
}

const PHRASE_RULES: &[PhraseRule] = &[
    PhraseRule {
        phrase: "extra-payment",
        all_of: &["increase", "payment"],
    },
    PhraseRule {
        phrase: "offset",
        all_of: &["offset"],
    },
    PhraseRule {
        phrase: "investment-contribution",
        all_of: &["investment", "contribution"],
    },
    PhraseRule {
        phrase: "super-contribution",
        all_of: &["super", "contribution"],
    },
    PhraseRule {
        phrase: "allocation",
        all_of: &["allocation"],
    },
    PhraseRule {
        phrase: "delay-retirement",
        all_of: &["delay", "retirement"],
    },
    PhraseRule {
        phrase: "income-growth",
        all_of: &["income"],
    },
    PhraseRule {
        phrase: "groceries",
        all_of: &["groceries"],
    },
    PhraseRule {
        phrase: "dining",
        all_of: &["dining"],
    },
    PhraseRule {
        phrase: "entertainment",
        all_of: &["entertainment"],
    },
    PhraseRule {
        phrase: "transport",
        all_of: &["transport"],
    },
    PhraseRule {
        phrase: "utilities",
        all_of: &["utilities"],
    },
    PhraseRule {
        phrase: "subscriptions",
        all_of: &["subscriptions"],
    },
];

/// Key phrases found in a title, in vocabulary order.
pub fn key_phrases(title: &str) -> Vec<&'static str> {
    let title = title.to_lowercase();
    PHRASE_RULES
        .iter()
        .filter(|rule| rule.all_of.iter().all(|word| title.contains(word)))
        .map(|rule| rule.phrase)
        .collect()
}

/// Same category and at least one shared key phrase in the title. Coarse:
/// differently worded advice for the same change will not match.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyPhraseMatcher;

impl AdviceMatcher for KeyPhraseMatcher {
    fn matches(&self, a: &AdviceItem, b: &AdviceItem) -> bool {
        if a.category != b.category {
            return false;
        }
        let phrases = key_phrases(&a.title);
        key_phrases(&b.title).iter().any(|p| phrases.contains(p))
    }
}
