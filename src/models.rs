use crate::prompts::Approach;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Ratings a prediction may carry
pub const STAR_RANGE: RangeInclusive<u8> = 1..=5;

pub const PARSE_FAILURE: &str = "Failed to parse response";

/// A review with its ground-truth rating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub text: String,
    pub stars: u8,
}

/// Structured rating recovered from a model reply.
///
/// `valid` is true exactly when `predicted_stars` is `Some` and within 1..=5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_stars: Option<u8>,
    pub explanation: String,
    pub valid: bool,
}

impl Prediction {
    /// A rated prediction; a rating outside 1..=5 yields the parse failure instead
    pub fn valid(stars: u8, explanation: impl Into<String>) -> Self {
        if !STAR_RANGE.contains(&stars) {
            return Self::invalid(PARSE_FAILURE);
        }
        Self {
            predicted_stars: Some(stars),
            explanation: explanation.into(),
            valid: true,
        }
    }

    pub fn invalid(explanation: impl Into<String>) -> Self {
        Self {
            predicted_stars: None,
            explanation: explanation.into(),
            valid: false,
        }
    }
}

/// Prediction for one sampled review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Position of the review in the sample
    pub review_index: usize,
    pub actual_stars: u8,
    pub prediction: Prediction,
}

impl EvaluationRecord {
    pub fn is_correct(&self) -> bool {
        self.prediction.predicted_stars == Some(self.actual_stars)
    }

    pub fn is_off_by_one(&self) -> bool {
        self.prediction
            .predicted_stars
            .is_some_and(|p| p.abs_diff(self.actual_stars) <= 1)
    }
}

/// Agreement metrics over the valid predictions of one approach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Exact-match accuracy (0.0 to 1.0)
    pub accuracy: f64,
    /// Share of predictions within one star (0.0 to 1.0)
    pub off_by_one_accuracy: f64,
    /// Unweighted Cohen's kappa, `None` when undefined
    pub cohen_kappa: Option<f64>,
    /// Percentage of replies that parsed and validated (0.0 to 100.0)
    pub json_validity_rate: f64,
    pub valid_responses: usize,
    pub total_samples: usize,
    /// Rows are actual stars 1..=5, columns predicted stars 1..=5
    pub confusion_matrix: [[usize; 5]; 5],
}

/// Complete result of running one approach over the sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproachResults {
    pub approach: Approach,
    pub metrics: Metrics,
    /// Mean wall-clock seconds per review, delay included
    pub avg_time_per_request: f64,
    /// First few failure messages
    pub errors: Vec<String>,
    pub records: Vec<EvaluationRecord>,
}

/// One row of the per-review detail table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub approach: String,
    pub review_index: usize,
    pub actual_stars: u8,
    pub predicted_stars: Option<u8>,
    pub correct: bool,
    pub off_by_one: bool,
}

impl DetailRow {
    pub fn new(approach: Approach, record: &EvaluationRecord) -> Self {
        Self {
            approach: approach.display_name().to_string(),
            review_index: record.review_index,
            actual_stars: record.actual_stars,
            predicted_stars: record.prediction.predicted_stars,
            correct: record.is_correct(),
            off_by_one: record.is_off_by_one(),
        }
    }
}
