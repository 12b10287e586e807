use duel_app::rl::{AgentParams, RewardConfig};
use duel_app::training::{DEFAULT_PROGRESS_INTERVAL, TrainerConfig, TrainingMode};
use duel_bot::bot::HeuristicParams;
use duel_core::model::round::MAX_TURN_PAIRS;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root training-run configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TrainingRunConfig {
    pub run_id: String,
    pub training: TrainingSection,
    #[serde(default)]
    pub agent: AgentParams,
    /// Overrides the mode's default rewards when present.
    #[serde(default)]
    pub rewards: Option<RewardConfig>,
    #[serde(default)]
    pub heuristic: HeuristicConfig,
    pub store: StoreConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TrainingRunConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: TrainingRunConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.training.validate()?;
        self.agent
            .validate()
            .map_err(|err| ValidationError::InvalidField {
                field: "agent".to_string(),
                message: err.to_string(),
            })?;
        self.heuristic.validate()?;
        self.store.validate(&self.run_id)?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        Ok(())
    }

    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            rewards: self.rewards,
            heuristic: self.heuristic.params(),
            progress_interval: self.training.progress_interval,
            turn_cap: self.training.turn_cap,
        }
    }

    /// Resolve `{run_id}` placeholders into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            load: self
                .store
                .load
                .as_deref()
                .map(|load| resolve_template(&self.run_id, load)),
            save: resolve_template(&self.run_id, &self.store.save),
            summary_json: resolve_template(&self.run_id, &self.outputs.summary_json),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TrainingSection {
    pub mode: TrainingMode,
    pub episodes: u64,
    pub seed: Option<u64>,
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
    #[serde(default = "default_turn_cap")]
    pub turn_cap: u32,
    /// Greedy episodes against the heuristic after training; 0 skips it.
    #[serde(default)]
    pub evaluation_episodes: u64,
}

impl TrainingSection {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.episodes == 0 {
            return Err(ValidationError::InvalidField {
                field: "training.episodes".to_string(),
                message: "number of episodes must be greater than zero".to_string(),
            });
        }

        if self.turn_cap == 0 {
            return Err(ValidationError::InvalidField {
                field: "training.turn_cap".to_string(),
                message: "turn cap must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

fn default_progress_interval() -> u64 {
    DEFAULT_PROGRESS_INTERVAL
}

fn default_turn_cap() -> u32 {
    MAX_TURN_PAIRS
}

/// Heuristic opponent thresholds; unset fields keep their defaults.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeuristicConfig {
    pub always_hit_below: u8,
    pub first_turn_upcard_max: u8,
    pub first_turn_expected_limit: f64,
    pub base_tolerance: f64,
    pub strong_opponent_total: u8,
    pub strong_opponent_reduction: f64,
    pub strong_opponent_floor: f64,
    pub weak_hand_total: u8,
    pub weak_hand_reduction: f64,
    pub max_bust_probability: f64,
    pub chase_max_bust_probability: f64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        let params = HeuristicParams::default();
        Self {
            always_hit_below: params.always_hit_below,
            first_turn_upcard_max: params.first_turn_upcard_max,
            first_turn_expected_limit: params.first_turn_expected_limit,
            base_tolerance: params.base_tolerance,
            strong_opponent_total: params.strong_opponent_total,
            strong_opponent_reduction: params.strong_opponent_reduction,
            strong_opponent_floor: params.strong_opponent_floor,
            weak_hand_total: params.weak_hand_total,
            weak_hand_reduction: params.weak_hand_reduction,
            max_bust_probability: params.max_bust_probability,
            chase_max_bust_probability: params.chase_max_bust_probability,
        }
    }
}

impl HeuristicConfig {
    pub fn params(&self) -> HeuristicParams {
        HeuristicParams {
            always_hit_below: self.always_hit_below,
            first_turn_upcard_max: self.first_turn_upcard_max,
            first_turn_expected_limit: self.first_turn_expected_limit,
            base_tolerance: self.base_tolerance,
            strong_opponent_total: self.strong_opponent_total,
            strong_opponent_reduction: self.strong_opponent_reduction,
            strong_opponent_floor: self.strong_opponent_floor,
            weak_hand_total: self.weak_hand_total,
            weak_hand_reduction: self.weak_hand_reduction,
            max_bust_probability: self.max_bust_probability,
            chase_max_bust_probability: self.chase_max_bust_probability,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        for (label, value) in [
            ("heuristic.max_bust_probability", self.max_bust_probability),
            (
                "heuristic.chase_max_bust_probability",
                self.chase_max_bust_probability,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: format!("probability {value} must lie in [0, 1]"),
                });
            }
        }
        Ok(())
    }
}

/// Where the value table is read from and written to.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default)]
    pub load: Option<String>,
    pub save: String,
}

impl StoreConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        validate_path("store.save", &self.save, run_id)?;
        if let Some(load) = self.load.as_deref() {
            validate_path("store.load", load, run_id)?;
        }
        Ok(())
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub summary_json: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        validate_path("outputs.summary_json", &self.summary_json, run_id)?;
        validate_path("outputs.summary_md", &self.summary_md, run_id)
    }
}

fn validate_path(label: &str, value: &str, run_id: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: label.to_string(),
            message: "path must not be empty".to_string(),
        });
    }

    let resolved = resolve_template(run_id, value);
    if resolved.components().count() == 0 {
        return Err(ValidationError::InvalidField {
            field: label.to_string(),
            message: "resolved path is invalid".to_string(),
        });
    }
    Ok(())
}

/// Logging configuration defaults to human-readable stderr output.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    PathBuf::from(template.replace("{run_id}", run_id))
}

/// Fully resolved file locations for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub load: Option<PathBuf>,
    pub save: PathBuf,
    pub summary_json: PathBuf,
    pub summary_md: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_app::rl::TerminalRewardMode;

    const BASIC_YAML: &str = r#"
run_id: "selfplay_smoke"
training:
  mode: self_play
  episodes: 2000
  seed: 123
agent:
  epsilon: 0.5
rewards:
  terminal: margin
  shaping: true
heuristic:
  base_tolerance: 16.5
store:
  load: "policies/q_table.json"
  save: "out/{run_id}/q_table.json"
outputs:
  summary_json: "out/{run_id}/summary.json"
  summary_md: "out/{run_id}/summary.md"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg: TrainingRunConfig = serde_yaml::from_str(BASIC_YAML).expect("parse yaml");
        cfg.validate().expect("validate");

        assert_eq!(cfg.training.mode, TrainingMode::SelfPlay);
        assert_eq!(cfg.training.progress_interval, DEFAULT_PROGRESS_INTERVAL);
        assert_eq!(cfg.training.turn_cap, MAX_TURN_PAIRS);
        assert_eq!(cfg.agent.epsilon, 0.5);
        assert_eq!(cfg.agent.alpha, AgentParams::default().alpha);
        assert_eq!(cfg.logging.level(), Some(Level::DEBUG));

        let trainer = cfg.trainer_config();
        assert_eq!(
            trainer.rewards_for(TrainingMode::SelfPlay).terminal,
            TerminalRewardMode::Margin
        );
        assert_eq!(trainer.heuristic.base_tolerance, 16.5);
        assert_eq!(trainer.heuristic.always_hit_below, 12);

        let outputs = cfg.resolved_outputs();
        assert_eq!(outputs.save, PathBuf::from("out/selfplay_smoke/q_table.json"));
        assert_eq!(outputs.load, Some(PathBuf::from("policies/q_table.json")));
        assert_eq!(
            outputs.summary_md,
            PathBuf::from("out/selfplay_smoke/summary.md")
        );
    }

    #[test]
    fn rewards_default_per_mode_when_absent() {
        let yaml = BASIC_YAML.replace("rewards:\n  terminal: margin\n  shaping: true\n", "");
        let mut cfg: TrainingRunConfig = serde_yaml::from_str(&yaml).expect("parse yaml");
        cfg.validate().expect("validate");
        assert_eq!(cfg.rewards, None);
        assert_eq!(
            cfg.trainer_config().rewards_for(TrainingMode::SelfPlay),
            RewardConfig::self_play()
        );
    }

    #[test]
    fn rejects_zero_episodes() {
        let yaml = BASIC_YAML.replace("episodes: 2000", "episodes: 0");
        let mut cfg: TrainingRunConfig = serde_yaml::from_str(&yaml).expect("parse yaml");
        let err = cfg.validate().expect_err("zero episodes must fail");
        assert!(err.to_string().contains("training.episodes"));
    }

    #[test]
    fn rejects_invalid_agent_params() {
        let yaml = BASIC_YAML.replace("epsilon: 0.5", "epsilon: 1.5");
        let mut cfg: TrainingRunConfig = serde_yaml::from_str(&yaml).expect("parse yaml");
        let err = cfg.validate().expect_err("epsilon above one must fail");
        assert!(err.to_string().starts_with("agent:"));
    }

    #[test]
    fn rejects_bad_run_id() {
        let yaml = BASIC_YAML.replace("selfplay_smoke", "bad id!");
        let mut cfg: TrainingRunConfig = serde_yaml::from_str(&yaml).expect("parse yaml");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = TrainingRunConfig::from_path("does/not/exist.yaml").expect_err("missing");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
