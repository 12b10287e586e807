use std::fs;
use std::path::{Path, PathBuf};

use duel_app::store::LoadStatus;
use duel_app::training::{Tally, TrainingMode, TrainingReport};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

const CONFIDENCE: f64 = 0.95;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{context} {path:?}: {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode summary: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Two-sided Wilson score interval for `successes` out of `trials`.
pub fn wilson_interval(successes: u64, trials: u64, confidence: f64) -> Option<(f64, f64)> {
    if trials == 0 || confidence <= 0.0 || confidence >= 1.0 {
        return None;
    }
    let normal = Normal::new(0.0, 1.0).ok()?;
    let z = normal.inverse_cdf(1.0 - (1.0 - confidence) / 2.0);

    let n = trials as f64;
    let p = successes as f64 / n;
    let z2 = z * z;
    let denominator = 1.0 + z2 / n;
    let centre = (p + z2 / (2.0 * n)) / denominator;
    let half_width = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denominator;
    Some(((centre - half_width).max(0.0), (centre + half_width).min(1.0)))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PhaseSummary {
    pub mode: TrainingMode,
    pub episodes: u64,
    pub tally: Tally,
    pub agent1_win_rate: Option<f64>,
    pub agent1_win_rate_ci95: Option<(f64, f64)>,
    pub elapsed_ms: u64,
}

impl PhaseSummary {
    pub fn from_report(report: &TrainingReport) -> Self {
        let tally = report.tally;
        Self {
            mode: report.mode,
            episodes: report.episodes_requested,
            tally,
            agent1_win_rate: tally.agent1_win_rate(),
            agent1_win_rate_ci95: wilson_interval(tally.agent1_win, tally.played(), CONFIDENCE),
            elapsed_ms: report.elapsed.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunSummary {
    pub run_id: String,
    pub seed: Option<u64>,
    pub load_status: Option<LoadStatus>,
    pub training: PhaseSummary,
    pub evaluation: Option<PhaseSummary>,
    pub final_epsilon: f64,
    pub table_size: usize,
    pub saved_to: PathBuf,
}

impl RunSummary {
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        ensure_parent(path)?;
        fs::write(path, json).map_err(|source| ReportError::Io {
            context: "writing summary JSON",
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        let mut out = String::new();
        out.push_str(&format!("# Training Summary: {}\n\n", self.run_id));
        if let Some(seed) = self.seed {
            out.push_str(&format!("Seed: {seed}\n\n"));
        }
        if let Some(status) = self.load_status {
            out.push_str(&format!("Initial table: {}\n\n", describe_load(status)));
        }
        out.push_str("| phase | mode | episodes | agent 1 wins | agent 2 wins | draws | skipped | agent 1 win rate (95% CI) | elapsed ms |\n");
        out.push_str("|---|---|---:|---:|---:|---:|---:|---|---:|\n");
        out.push_str(&phase_row("training", &self.training));
        if let Some(evaluation) = self.evaluation.as_ref() {
            out.push_str(&phase_row("evaluation", evaluation));
        }
        out.push_str(&format!(
            "\nFinal epsilon: {:.5}\n\nTable entries: {}\n\nSaved to: `{}`\n",
            self.final_epsilon,
            self.table_size,
            self.saved_to.display()
        ));

        ensure_parent(path)?;
        fs::write(path, out).map_err(|source| ReportError::Io {
            context: "writing summary Markdown",
            path: path.to_path_buf(),
            source,
        })
    }
}

fn phase_row(label: &str, phase: &PhaseSummary) -> String {
    let rate = match (phase.agent1_win_rate, phase.agent1_win_rate_ci95) {
        (Some(rate), Some((low, high))) => format!(
            "{:.1}% [{:.1}%, {:.1}%]",
            rate * 100.0,
            low * 100.0,
            high * 100.0
        ),
        _ => "n/a".to_string(),
    };
    format!(
        "| {label} | {} | {} | {} | {} | {} | {} | {rate} | {} |\n",
        phase.mode.as_str(),
        phase.episodes,
        phase.tally.agent1_win,
        phase.tally.agent2_win,
        phase.tally.draw,
        phase.tally.skipped,
        phase.elapsed_ms
    )
}

fn describe_load(status: LoadStatus) -> String {
    match status {
        LoadStatus::Loaded { entries } => format!("loaded ({entries} entries)"),
        LoadStatus::Missing => "missing, started empty".to_string(),
        LoadStatus::Corrupt => "unreadable, started empty".to_string(),
    }
}

fn ensure_parent(path: &Path) -> Result<(), ReportError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| ReportError::Io {
                context: "creating output directory",
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wilson_matches_reference_values() {
        // 50 / 100 at 95%: [0.4038, 0.5962]
        let (low, high) = wilson_interval(50, 100, 0.95).unwrap();
        assert!((low - 0.4038).abs() < 1e-3);
        assert!((high - 0.5962).abs() < 1e-3);
    }

    #[test]
    fn wilson_stays_inside_unit_interval() {
        let (low, high) = wilson_interval(0, 10, 0.95).unwrap();
        assert!(low.abs() < 1e-12);
        assert!(high > 0.0 && high < 1.0);
        let (low, high) = wilson_interval(10, 10, 0.95).unwrap();
        assert!(low > 0.0 && low < 1.0);
        assert!(high <= 1.0);
    }

    #[test]
    fn wilson_needs_trials() {
        assert_eq!(wilson_interval(0, 0, 0.95), None);
        assert_eq!(wilson_interval(1, 2, 1.0), None);
    }
}
