use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use duel_app::training::TrainingMode;
use duel_train::config::{ResolvedOutputs, TrainingRunConfig};
use duel_train::logging::init_logging;
use duel_train::runner::{TrainingRun, load_label};

/// Training harness for the closest-to-21 duel agent.
#[derive(Debug, Parser)]
#[command(
    name = "duel-train",
    author,
    version,
    about = "Deterministic Q-learning training runs for the duel agent"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "configs/train.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the training mode (vs_heuristic or self_play).
    #[arg(long, value_name = "MODE")]
    mode: Option<TrainingMode>,

    /// Override the number of training episodes.
    #[arg(long, value_name = "EPISODES")]
    episodes: Option<u64>,

    /// Override the RNG seed for shuffles and exploration.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the number of greedy evaluation episodes after training.
    #[arg(long, value_name = "EPISODES")]
    evaluate: Option<u64>,

    /// Override the path the trained table is saved to.
    #[arg(long, value_name = "FILE")]
    save: Option<String>,

    /// Override the path a starting table is loaded from.
    #[arg(long, value_name = "FILE")]
    load: Option<String>,

    /// Exit after validating the configuration (no training is run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = TrainingRunConfig::from_path(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(mode) = cli.mode {
        config.training.mode = mode;
    }

    if let Some(episodes) = cli.episodes {
        config.training.episodes = episodes;
    }

    if let Some(seed) = cli.seed {
        config.training.seed = Some(seed);
    }

    if let Some(evaluate) = cli.evaluate {
        config.training.evaluation_episodes = evaluate;
    }

    if let Some(save) = cli.save {
        config.store.save = save;
    }

    if let Some(load) = cli.load {
        config.store.load = Some(load);
    }

    config
        .validate()
        .context("validating configuration after command-line overrides")?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let mode = config.training.mode;
    let episodes = config.training.episodes;

    println!(
        "Loaded configuration '{run_id}': {} for {episodes} episode{}",
        mode.as_str(),
        if episodes == 1 { "" } else { "s" }
    );

    if cli.validate_only {
        println!("Validation-only mode: training skipped.");
        return Ok(());
    }

    let logging_guard = init_logging(&config.logging, &outputs)?;
    let run = TrainingRun::new(config, outputs);
    let summary = run.run()?;

    let tally = summary.training.tally;
    println!(
        "Training complete for '{run_id}': agent 1 {} / agent 2 {} / draw {} (skipped {})",
        tally.agent1_win, tally.agent2_win, tally.draw, tally.skipped
    );
    println!(
        "Epsilon {:.5}, {} table entries, warm start: {}",
        summary.final_epsilon,
        summary.table_size,
        load_label(summary.load_status)
    );
    if let Some(evaluation) = summary.evaluation.as_ref() {
        println!(
            "Evaluation vs heuristic: {} / {} / {} over {} episodes",
            evaluation.tally.agent1_win,
            evaluation.tally.agent2_win,
            evaluation.tally.draw,
            evaluation.episodes
        );
    }
    println!("Policy saved: {}", summary.saved_to.display());
    println!("Summary table: {}", run.outputs().summary_md.display());
    if let Some(telemetry_path) = logging_guard.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
