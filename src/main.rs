use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod client;
mod config;
mod dataset;
mod evaluation;
mod interpreter;
mod metrics;
mod models;
mod output;
mod prompts;
mod runner;

use crate::client::InferenceClient;
use crate::config::Config;
use crate::output::OutputFormat;
use crate::prompts::Approach;
use crate::runner::Runner;

/// Star-rating prompt benchmark - compare prompt formulations for 1-5 star prediction
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML run file
    run_file: PathBuf,

    /// Output format: plain or json
    #[arg(short, long, default_value = "plain")]
    output: OutputFormat,

    /// Verbose output - log every request
    #[arg(short, long)]
    verbose: bool,

    /// Override the number of reviews sampled
    #[arg(long)]
    limit: Option<usize>,

    /// Run only these approaches (repeatable)
    #[arg(long = "approach", value_enum)]
    approaches: Vec<Approach>,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = Config::from_file(&args.run_file)?;
    if let Some(limit) = args.limit {
        config.dataset.sample_size = limit;
    }
    if !args.approaches.is_empty() {
        config.approaches = args.approaches;
    }

    let client = InferenceClient::from_config(&config.api)?;
    let mut runner = Runner::new(config, client);

    let results = runner.run().await?;

    output::print_results(&results, args.output)?;

    Ok(())
}
