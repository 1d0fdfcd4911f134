use crate::client::CompletionBackend;
use crate::interpreter;
use crate::metrics;
use crate::models::{ApproachResults, EvaluationRecord, Prediction, Review};
use crate::prompts::Approach;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// How often progress is reported while going through the sample
const PROGRESS_INTERVAL: usize = 20;

/// How many failure messages are kept per approach
const MAX_RECORDED_ERRORS: usize = 5;

/// Runs prompting approaches over a sample, one review at a time
pub struct Evaluator<B> {
    backend: B,
    /// Fixed pause taken before every request
    request_delay: Duration,
}

impl<B: CompletionBackend> Evaluator<B> {
    pub fn new(backend: B, request_delay: Duration) -> Self {
        Self {
            backend,
            request_delay,
        }
    }

    /// Sleep for the full delay, however long the previous call took
    async fn pause_before_request(&self) {
        if !self.request_delay.is_zero() {
            sleep(self.request_delay).await;
        }
    }

    /// Predict the rating of one review under the given approach
    pub async fn predict_rating(&mut self, approach: Approach, review: &str) -> Prediction {
        self.pause_before_request().await;

        let prompt = approach.render(review);
        match self.backend.complete(&prompt).await {
            Ok(reply) => interpreter::interpret(&reply),
            Err(err) => {
                debug!(error = %format!("{err:#}"), "inference call failed");
                Prediction::invalid(format!("API Error: {err:#}"))
            }
        }
    }

    /// Run one approach over every review in `sample`
    pub async fn evaluate_approach(&mut self, approach: Approach, sample: &[Review]) -> ApproachResults {
        info!(approach = %approach, reviews = sample.len(), "evaluating approach");

        let start = Instant::now();
        let mut records = Vec::with_capacity(sample.len());
        let mut errors = Vec::new();

        for (idx, review) in sample.iter().enumerate() {
            let prediction = self.predict_rating(approach, &review.text).await;

            if !prediction.valid {
                warn!(approach = %approach, row = idx, explanation = %prediction.explanation, "no valid prediction");
                errors.push(format!("Row {}: {}", idx, prediction.explanation));
            }

            records.push(EvaluationRecord {
                review_index: idx,
                actual_stars: review.stars,
                prediction,
            });

            if (idx + 1) % PROGRESS_INTERVAL == 0 {
                info!(approach = %approach, "Processed {}/{} reviews", idx + 1, sample.len());
            }
        }

        let elapsed = start.elapsed();
        let metrics = metrics::compute(&records);
        let avg_time_per_request = if sample.is_empty() {
            0.0
        } else {
            elapsed.as_secs_f64() / sample.len() as f64
        };

        info!(
            approach = %approach,
            accuracy = metrics.accuracy,
            off_by_one = metrics.off_by_one_accuracy,
            kappa = ?metrics.cohen_kappa,
            json_validity = metrics.json_validity_rate,
            "approach finished"
        );

        errors.truncate(MAX_RECORDED_ERRORS);

        ApproachResults {
            approach,
            metrics,
            avg_time_per_request,
            errors,
            records,
        }
    }
}
