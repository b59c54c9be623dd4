use std::ops::RangeInclusive;

use crate::models::{EvaluationType, Report};

pub const MAX_SCORE: u8 = 4;

/// Scores an editor may pick for a criterion. Stored zeros on general and special
/// reports mean "not scored yet" and are still counted by [`percentage_of`].
pub fn selectable_scores(evaluation_type: EvaluationType) -> RangeInclusive<u8> {
    match evaluation_type {
        EvaluationType::ClassSession => 0..=MAX_SCORE,
        EvaluationType::General | EvaluationType::Special => 1..=MAX_SCORE,
    }
}

/// `100 * sum / (count * max_per_item)`, or 0 when there is nothing to score.
///
/// Scores above `max_per_item` are clamped so the result always stays in `[0, 100]`.
pub fn percentage_of(scores: &[u8], max_per_item: u8) -> f64 {
    if scores.is_empty() || max_per_item == 0 {
        return 0.0;
    }

    let total: u64 = scores
        .iter()
        .map(|score| u64::from((*score).min(max_per_item)))
        .sum();
    let max_possible = scores.len() as u64 * u64::from(max_per_item);
    total as f64 / max_possible as f64 * 100.0
}

pub fn report_percentage(report: &Report) -> f64 {
    percentage_of(&report.scores(), MAX_SCORE)
}
