use crate::models::ApproachResults;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Print benchmark results in the specified format
pub fn print_results(results: &[ApproachResults], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Plain => print!("{}", render_plain(results)),
        OutputFormat::Json => println!("{}", render_json(results)?),
    }
    Ok(())
}

/// Render the comparison table, best confusion matrix and sample errors
pub fn render_plain(results: &[ApproachResults]) -> String {
    let mut out = String::new();

    if results.is_empty() {
        out.push_str("No approaches were evaluated.\n");
        return out;
    }

    out.push_str(&render_comparison_table(results));
    out.push('\n');

    if let Some(best) = best_approach(results) {
        out.push_str(&render_confusion_matrix(best));
        out.push('\n');
    }

    out.push_str(&render_errors(results));
    out
}

/// Approach with the highest exact accuracy; the earliest one wins ties
pub fn best_approach(results: &[ApproachResults]) -> Option<&ApproachResults> {
    results.iter().reduce(|best, candidate| {
        if candidate.metrics.accuracy > best.metrics.accuracy {
            candidate
        } else {
            best
        }
    })
}

fn render_comparison_table(results: &[ApproachResults]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "=".repeat(80)));
    out.push_str("COMPARISON TABLE\n");
    out.push_str(&format!("{}\n", "=".repeat(80)));
    out.push_str(&format!(
        "{:<26} {:>9} {:>13} {:>14} {:>14} {:>13}\n",
        "Approach", "Accuracy", "Off-by-1 Acc", "Cohen's Kappa", "JSON Validity", "Avg Time (s)"
    ));
    out.push_str(&format!("{}\n", "-".repeat(94)));

    for result in results {
        let metrics = &result.metrics;
        out.push_str(&format!(
            "{:<26} {:>9} {:>13} {:>14} {:>14} {:>13.2}\n",
            result.approach.display_name(),
            format_percent(metrics.accuracy),
            format_percent(metrics.off_by_one_accuracy),
            format_kappa(metrics.cohen_kappa),
            format!("{:.1}%", metrics.json_validity_rate),
            result.avg_time_per_request,
        ));
    }

    out
}

fn render_confusion_matrix(result: &ApproachResults) -> String {
    let mut out = format!("Confusion Matrix - {}\n", result.approach.display_name());
    out.push_str("(rows: actual stars, columns: predicted stars)\n");

    let header: String = (1..=5).map(|predicted| format!("{:>6}", predicted)).collect();
    out.push_str(&format!("{:>8}{}\n", "", header));

    for (actual, row) in result.metrics.confusion_matrix.iter().enumerate() {
        let counts: String = row.iter().map(|count| format!("{:>6}", count)).collect();
        out.push_str(&format!("{:>8}{}\n", actual + 1, counts));
    }

    out
}

fn render_errors(results: &[ApproachResults]) -> String {
    let mut out = String::new();
    for result in results.iter().filter(|r| !r.errors.is_empty()) {
        out.push_str(&format!("Errors - {}:\n", result.approach.display_name()));
        for error in &result.errors {
            out.push_str(&format!("  • {}\n", error));
        }
    }
    out
}

fn format_percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

fn format_kappa(kappa: Option<f64>) -> String {
    match kappa {
        Some(value) => format!("{:.3}", value),
        None => "n/a".to_string(),
    }
}

/// Render every approach's results as pretty-printed JSON
pub fn render_json(results: &[ApproachResults]) -> Result<String> {
    serde_json::to_string_pretty(results).context("Failed to serialize results to JSON")
}
