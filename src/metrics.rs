use crate::models::{EvaluationRecord, Metrics};
use std::collections::BTreeSet;

/// Compute agreement metrics over the valid predictions in `records`
pub fn compute(records: &[EvaluationRecord]) -> Metrics {
    let pairs = valid_pairs(records);
    let total_samples = records.len();
    let valid_responses = pairs.len();

    Metrics {
        accuracy: accuracy(&pairs),
        off_by_one_accuracy: off_by_one_accuracy(&pairs),
        cohen_kappa: cohen_kappa(&pairs),
        json_validity_rate: validity_rate(valid_responses, total_samples),
        valid_responses,
        total_samples,
        confusion_matrix: confusion_matrix(&pairs),
    }
}

/// `(actual, predicted)` for every record with a valid prediction
fn valid_pairs(records: &[EvaluationRecord]) -> Vec<(u8, u8)> {
    records
        .iter()
        .filter(|r| r.prediction.valid)
        .filter_map(|r| r.prediction.predicted_stars.map(|p| (r.actual_stars, p)))
        .collect()
}

fn share(pairs: &[(u8, u8)], hit: impl Fn(u8, u8) -> bool) -> f64 {
    if pairs.is_empty() {
        return 0.0;
    }
    let hits = pairs.iter().filter(|&&(a, p)| hit(a, p)).count();
    hits as f64 / pairs.len() as f64
}

pub fn accuracy(pairs: &[(u8, u8)]) -> f64 {
    share(pairs, |a, p| a == p)
}

pub fn off_by_one_accuracy(pairs: &[(u8, u8)]) -> f64 {
    share(pairs, |a, p| a.abs_diff(p) <= 1)
}

/// Unweighted Cohen's kappa over the labels observed in either rater.
///
/// Returns `None` for an empty input or when chance agreement is total.
pub fn cohen_kappa(pairs: &[(u8, u8)]) -> Option<f64> {
    if pairs.is_empty() {
        return None;
    }

    let labels: BTreeSet<u8> = pairs.iter().flat_map(|&(a, p)| [a, p]).collect();
    let n = pairs.len() as f64;

    let observed = accuracy(pairs);
    let expected: f64 = labels
        .iter()
        .map(|&label| {
            let actual = pairs.iter().filter(|&&(a, _)| a == label).count() as f64;
            let predicted = pairs.iter().filter(|&&(_, p)| p == label).count() as f64;
            (actual / n) * (predicted / n)
        })
        .sum();

    if (1.0 - expected).abs() < f64::EPSILON {
        return None;
    }

    Some((observed - expected) / (1.0 - expected))
}

fn validity_rate(valid: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    valid as f64 / total as f64 * 100.0
}

/// Counts indexed `[actual - 1][predicted - 1]`; out-of-range labels are ignored
pub fn confusion_matrix(pairs: &[(u8, u8)]) -> [[usize; 5]; 5] {
    let mut matrix = [[0usize; 5]; 5];
    for &(actual, predicted) in pairs {
        if (1..=5).contains(&actual) && (1..=5).contains(&predicted) {
            matrix[usize::from(actual - 1)][usize::from(predicted - 1)] += 1;
        }
    }
    matrix
}
