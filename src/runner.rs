use crate::client::CompletionBackend;
use crate::config::Config;
use crate::dataset;
use crate::evaluation::Evaluator;
use crate::models::{ApproachResults, DetailRow, Review};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Main runner that orchestrates the benchmark
pub struct Runner<B> {
    config: Config,
    evaluator: Evaluator<B>,
}

impl<B: CompletionBackend> Runner<B> {
    /// Create a new runner with the given configuration and inference backend
    pub fn new(config: Config, backend: B) -> Self {
        let evaluator = Evaluator::new(backend, config.api.request_delay());
        Self { config, evaluator }
    }

    /// Load the sample, run every configured approach and write the reports
    pub async fn run(&mut self) -> Result<Vec<ApproachResults>> {
        let sample = dataset::load_sample(&self.config.dataset, self.config.dataset.sample_size)?;
        let results = self.run_approaches(&sample).await;
        self.store_results_if_configured(&results)?;
        Ok(results)
    }

    /// Run each approach over the same sample, in configured order
    pub async fn run_approaches(&mut self, sample: &[Review]) -> Vec<ApproachResults> {
        let approaches = self.config.approaches.clone();
        let total = approaches.len();
        let mut all_results = Vec::with_capacity(total);

        for (index, approach) in approaches.into_iter().enumerate() {
            info!("Running approach {}/{}: {}", index + 1, total, approach);
            let results = self.evaluator.evaluate_approach(approach, sample).await;
            all_results.push(results);
        }

        all_results
    }

    /// Write the detail CSV and results JSON when their paths are configured
    fn store_results_if_configured(&self, results: &[ApproachResults]) -> Result<()> {
        if let Some(path) = &self.config.output.detail_csv {
            write_detail_csv(results, path)?;
            info!(path = %path.display(), "detailed results saved");
        }

        if let Some(path) = &self.config.output.results_json {
            write_results_json(results, path)?;
            info!(path = %path.display(), "results JSON saved");
        }

        Ok(())
    }
}

/// Write one row per (approach, review) pair
pub fn write_detail_csv(results: &[ApproachResults], path: &Path) -> Result<()> {
    ensure_directory_exists(path)?;

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create detail CSV: {}", path.display()))?;

    for result in results {
        for record in &result.records {
            writer
                .serialize(DetailRow::new(result.approach, record))
                .with_context(|| format!("Failed to write detail CSV: {}", path.display()))?;
        }
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write detail CSV: {}", path.display()))
}

/// Write all approach results as pretty JSON
pub fn write_results_json(results: &[ApproachResults], path: &Path) -> Result<()> {
    let json_content =
        serde_json::to_string_pretty(results).context("Failed to serialize results to JSON")?;
    ensure_directory_exists(path)?;
    std::fs::write(path, json_content)
        .with_context(|| format!("Failed to write results to: {}", path.display()))
}

/// Ensure the directory for an output file exists
fn ensure_directory_exists(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}
