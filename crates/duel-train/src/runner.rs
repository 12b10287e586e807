use anyhow::{Context, Result};
use duel_app::controller::DuelController;
use duel_app::rl::{QAgent, shared};
use duel_app::store::{JsonFileStore, LoadStatus};
use duel_app::training::Trainer;
use tracing::{Level, event};

use crate::config::{ResolvedOutputs, TrainingRunConfig};
use crate::report::{PhaseSummary, RunSummary};

/// One configured training run: optional warm start, training, optional
/// evaluation, persistence and summary files.
pub struct TrainingRun {
    config: TrainingRunConfig,
    outputs: ResolvedOutputs,
}

impl TrainingRun {
    pub fn new(config: TrainingRunConfig, outputs: ResolvedOutputs) -> Self {
        Self { config, outputs }
    }

    pub fn outputs(&self) -> &ResolvedOutputs {
        &self.outputs
    }

    pub fn run(&self) -> Result<RunSummary> {
        let training = &self.config.training;
        let mut agent = QAgent::new(self.config.agent);

        let load_status = self.outputs.load.as_ref().map(|path| {
            let status = agent.load(&JsonFileStore::new(path));
            if !status.is_loaded() {
                event!(
                    target: "duel_train::run",
                    Level::WARN,
                    path = %path.display(),
                    status = ?status,
                    "warm start unavailable, training from an empty table"
                );
            }
            status
        });

        let mut controller = DuelController::new_with_seed(shared(agent), training.seed)
            .with_trainer(Trainer::new(self.config.trainer_config()))
            .with_store(JsonFileStore::new(&self.outputs.save));

        let report = controller
            .run_training(training.mode, training.episodes)
            .with_context(|| format!("saving policy to {}", self.outputs.save.display()))?;

        let evaluation = (training.evaluation_episodes > 0)
            .then(|| controller.evaluate(training.evaluation_episodes));

        let summary = RunSummary {
            run_id: self.config.run_id.clone(),
            seed: training.seed,
            load_status,
            training: PhaseSummary::from_report(&report),
            evaluation: evaluation.as_ref().map(PhaseSummary::from_report),
            final_epsilon: report.final_epsilon,
            table_size: report.table_size,
            saved_to: self.outputs.save.clone(),
        };

        summary
            .write_json(&self.outputs.summary_json)
            .context("writing run summary")?;
        summary
            .write_markdown(&self.outputs.summary_md)
            .context("writing run summary")?;

        Ok(summary)
    }
}

/// Human-readable one-liner for a restore result.
pub fn load_label(status: Option<LoadStatus>) -> &'static str {
    match status {
        None => "none",
        Some(LoadStatus::Loaded { .. }) => "loaded",
        Some(LoadStatus::Missing) => "missing",
        Some(LoadStatus::Corrupt) => "corrupt",
    }
}
