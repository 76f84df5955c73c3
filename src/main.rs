//! Lost in the Middle CLI
//!
//! Runs position-sensitivity experiments against an OpenAI-compatible model server.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lost_in_middle::{
    config::{Config, parse_positions},
    context::PlacementRequest,
    experiment::{Dataset, Experiment, ExperimentResults, ExperimentSettings, create_sample_dataset},
    llm::{DryRunRunner, LlmClient, LlmRunner, ModelRunner, PromptStyle},
    persistence::{default_results_path, load_results, results_exist, results_size, save_results},
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Lost in the Middle - accuracy by position of the relevant document
#[derive(Parser)]
#[command(name = "lost-in-middle")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the experiment for one model
    Run {
        /// Dataset directory containing qa_pairs.json and distractors.json
        #[arg(short, long, conflicts_with = "sample", required_unless_present = "sample")]
        data: Option<PathBuf>,

        /// Use the built-in sample dataset
        #[arg(long)]
        sample: bool,

        /// Model name (overrides LLM_MODEL)
        #[arg(short, long)]
        model: Option<String>,

        /// Name to record results under (defaults to the model)
        #[arg(long)]
        name: Option<String>,

        /// Skip inference and record a placeholder reply
        #[arg(long)]
        dry_run: bool,

        /// Maximum questions per position
        #[arg(short, long)]
        limit: Option<usize>,

        /// Comma-separated 1-indexed gold positions, e.g. "1,50,100"
        #[arg(short, long)]
        positions: Option<String>,

        /// Documents per context
        #[arg(short = 'n', long)]
        total_docs: Option<usize>,

        /// Prompt style: standard or refresher
        #[arg(short, long)]
        style: Option<PromptStyle>,

        /// Output path for results (.json or .bin)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print every trial
        #[arg(short, long)]
        verbose: bool,
    },

    /// Load and validate a dataset
    Validate {
        /// Dataset directory
        data: PathBuf,
    },

    /// Print the prompt for one question at one position
    Preview {
        /// QA record id
        id: String,

        /// 1-indexed gold position
        #[arg(short, long, default_value_t = 1)]
        position: usize,

        /// Dataset directory (defaults to the built-in sample)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Documents per context
        #[arg(short = 'n', long)]
        total_docs: Option<usize>,

        /// Prompt style: standard or refresher
        #[arg(short, long)]
        style: Option<PromptStyle>,
    },

    /// Print the summary of a saved results file
    Show {
        /// Path to the results file
        results: PathBuf,

        /// Output as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Test LLM connection
    Test,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            sample,
            model,
            name,
            dry_run,
            limit,
            positions,
            total_docs,
            style,
            output,
            verbose,
        } => {
            let mut config = Config::load().context("Failed to load configuration")?;
            if let Some(model) = model {
                config.llm.model = model;
            }
            if let Some(positions) = positions {
                config.experiment.positions =
                    parse_positions(&positions).context("Invalid --positions")?;
            }
            if let Some(total_docs) = total_docs {
                config.experiment.total_docs = total_docs;
            }
            if let Some(style) = style {
                config.experiment.prompt_style = style;
            }

            let dataset = load_dataset(data.as_deref(), sample)?;
            let options = RunOptions {
                name,
                dry_run,
                limit,
                output,
                verbose,
            };
            cmd_run(config, dataset, options).await
        }
        Commands::Validate { data } => cmd_validate(data),
        Commands::Preview {
            id,
            position,
            data,
            total_docs,
            style,
        } => cmd_preview(id, position, data, total_docs, style),
        Commands::Show { results, json } => cmd_show(results, json),
        Commands::Test => cmd_test().await,
    }
}

struct RunOptions {
    name: Option<String>,
    dry_run: bool,
    limit: Option<usize>,
    output: Option<PathBuf>,
    verbose: bool,
}

fn load_dataset(data: Option<&Path>, sample: bool) -> Result<Dataset> {
    match data {
        Some(dir) if !sample => Dataset::load_dir(dir)
            .with_context(|| format!("Failed to load dataset from '{}'", dir.display())),
        _ => Ok(create_sample_dataset()),
    }
}

async fn cmd_run(config: Config, dataset: Dataset, options: RunOptions) -> Result<()> {
    config
        .validate_experiment()
        .context("Invalid experiment configuration")?;

    let mut settings = ExperimentSettings::from_config(&config);
    settings.limit = options.limit;
    settings.verbose = options.verbose;

    println!(
        "Dataset: {} ({} QA pairs, {} distractors)",
        dataset.name,
        dataset.len(),
        dataset.distractors.len()
    );
    println!(
        "Positions: {:?} of {} documents, style: {}",
        settings.positions, settings.total_docs, settings.prompt_style
    );

    let experiment = Experiment::new(settings);

    let results = if options.dry_run {
        println!("Mode: dry run (no inference)");
        let name = options.name.unwrap_or_else(|| config.llm.model.clone());
        let runner = DryRunRunner::new(name);
        run_with(&experiment, &runner, &dataset).await?
    } else {
        config.validate().context("Invalid configuration")?;
        println!("Using model: {}", config.llm.model);
        let mut runner = LlmRunner::from_config(config.llm.clone());
        if let Some(name) = options.name {
            runner = runner.with_name(name);
        }
        run_with(&experiment, &runner, &dataset).await?
    };

    results.print_summary();

    let output = options
        .output
        .unwrap_or_else(|| default_results_path(&results.model_name));
    save_results(&results, &output).context("Failed to save results")?;

    let size = results_size(&output)?;
    println!("Results saved to: {}", output.display());
    println!("  File size: {:.1} KB", size as f64 / 1024.0);

    Ok(())
}

async fn run_with<R: ModelRunner>(
    experiment: &Experiment,
    runner: &R,
    dataset: &Dataset,
) -> Result<ExperimentResults> {
    experiment
        .run(runner, dataset)
        .await
        .context("Experiment failed")
}

fn cmd_validate(data: PathBuf) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let dataset = Dataset::load_dir(&data)
        .with_context(|| format!("Failed to load dataset from '{}'", data.display()))?;

    dataset
        .validate(&config.experiment.positions, config.experiment.total_docs)
        .context("Dataset validation failed")?;

    let with_hard = dataset
        .records
        .iter()
        .filter(|r| !r.hard_distractors.is_empty())
        .count();

    println!("Dataset Information");
    println!("{}", "─".repeat(40));
    println!("  Name:          {}", dataset.name);
    println!("  QA pairs:      {}", dataset.len());
    println!("  With hard:     {}", with_hard);
    println!("  Distractors:   {}", dataset.distractors.len());
    println!("  Positions:     {:?}", config.experiment.positions);
    println!("  Total docs:    {}", config.experiment.total_docs);
    println!("Dataset is valid.");

    Ok(())
}

fn cmd_preview(
    id: String,
    position: usize,
    data: Option<PathBuf>,
    total_docs: Option<usize>,
    style: Option<PromptStyle>,
) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let dataset = load_dataset(data.as_deref(), data.is_none())?;
    let total_docs = total_docs.unwrap_or(config.experiment.total_docs);
    let style = style.unwrap_or(config.experiment.prompt_style);

    let Some(qa) = dataset.get(&id) else {
        anyhow::bail!("No QA record with id '{}' in dataset '{}'", id, dataset.name);
    };

    let request = PlacementRequest::derived(qa, position, total_docs);
    let context = request
        .build(&dataset.distractors)
        .context("Failed to build context")?;

    println!("{}", style.render(&context.render(), &qa.question));
    println!("{}", "─".repeat(60));
    println!(
        "Gold at {}/{} (seed {}), expected answer: {}",
        context.gold_position(),
        context.len(),
        request.seed,
        qa.answer
    );
    if context.resampled() > 0 {
        println!("  {} distractors were sampled with replacement", context.resampled());
    }

    Ok(())
}

fn cmd_show(results_path: PathBuf, json: bool) -> Result<()> {
    if !results_exist(&results_path) {
        anyhow::bail!(
            "Results not found at '{}'. Run 'run' command first.",
            results_path.display()
        );
    }

    let results = load_results(&results_path).context("Failed to load results")?;

    if json {
        let json_str =
            serde_json::to_string_pretty(&results).context("Failed to serialize results")?;
        println!("{}", json_str);
    } else {
        println!("Results from {}", results.timestamp);
        results.print_summary();
    }

    Ok(())
}

async fn cmd_test() -> Result<()> {
    println!("Testing LLM connection...\n");

    let config = Config::load().context("Failed to load configuration")?;

    println!("Configuration:");
    println!("  API Base:  {}", config.llm.api_base);
    println!("  Model:     {}", config.llm.model);
    if config.llm.api_key.is_empty() {
        println!("  API Key:   (none)");
    } else {
        let shown: String = config.llm.api_key.chars().take(8).collect();
        println!("  API Key:   {}...", shown);
    }
    println!();

    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Ok(());
    }

    let client = LlmClient::new(config.llm);

    println!("Sending test request...");
    match client.test_connection().await {
        Ok(()) => {
            println!("Connection successful!");
        }
        Err(e) => {
            println!("Connection failed: {}", e);
        }
    }

    Ok(())
}
