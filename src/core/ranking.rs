use std::cmp::Ordering;

use super::scoring::overall_score;
use super::types::{AdviceItem, Priority, RankedAdvice};

pub const QUICK_WIN_MIN_FEASIBILITY: f64 = 80.0;
pub const LONG_TERM_MIN_EFFECTIVENESS: f64 = 70.0;

/// Scores and orders advice by descending overall score. The sort is stable,
/// so equal scores keep their incoming order; ranks are 1-based positions.
pub fn rank_advice(items: Vec<AdviceItem>) -> Vec<RankedAdvice> {
    let mut scored: Vec<RankedAdvice> = items
        .into_iter()
        .map(|advice| RankedAdvice {
            overall_score: overall_score(advice.effectiveness_score, advice.feasibility_score),
            advice,
            rank: 0,
        })
        .collect();
    scored.sort_by(|a, b| {
        b.overall_score
            .partial_cmp(&a.overall_score)
            .unwrap_or(Ordering::Equal)
    });
    assign_ranks(&mut scored);
    scored
}

fn assign_ranks(ranked: &mut [RankedAdvice]) {
    for (index, item) in ranked.iter_mut().enumerate() {
        item.rank = index + 1;
    }
}

/// Keeps the `max` highest-ranked items.
pub fn truncate_ranked(mut ranked: Vec<RankedAdvice>, max: usize) -> Vec<RankedAdvice> {
    ranked.truncate(max);
    ranked
}

pub fn is_quick_win(item: &RankedAdvice) -> bool {
    item.advice.feasibility_score >= QUICK_WIN_MIN_FEASIBILITY
        && item.advice.priority == Priority::High
}

pub fn is_long_term(item: &RankedAdvice) -> bool {
    item.advice.feasibility_score < QUICK_WIN_MIN_FEASIBILITY
        || item.advice.effectiveness_score >= LONG_TERM_MIN_EFFECTIVENESS
}

/// Quick wins and long-term strategies; an item may appear in both.
pub fn partition_advice(ranked: &[RankedAdvice]) -> (Vec<RankedAdvice>, Vec<RankedAdvice>) {
    let quick_wins = ranked.iter().filter(|i| is_quick_win(i)).cloned().collect();
    let long_term = ranked.iter().filter(|i| is_long_term(i)).cloned().collect();
    (quick_wins, long_term)
}
