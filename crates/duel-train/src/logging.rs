use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

const TELEMETRY_FILE: &str = "telemetry.jsonl";

/// Keeps the background writer alive; dropping it flushes pending events.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub telemetry_path: Option<PathBuf>,
}

/// Install the global subscriber for a training run.
///
/// Human-readable runs log compactly to stderr. Structured runs write JSON
/// lines to `telemetry.jsonl` beside the Markdown summary. `RUST_LOG`
/// overrides the configured level in both cases.
pub fn init_logging(logging: &LoggingConfig, outputs: &ResolvedOutputs) -> Result<LoggingGuard> {
    let filter = env_filter(logging.level().unwrap_or(Level::INFO));

    let (writer, guard, telemetry_path) = if logging.enable_structured {
        let path = telemetry_path(outputs);
        let file = open_telemetry(&path)?;
        let (writer, guard) = background(file);
        (writer, guard, Some(path))
    } else {
        let (writer, guard) = background(io::stderr());
        (writer, guard, None)
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(writer);
    // A subscriber may already be installed when several runs share a process.
    let _ = if logging.enable_structured {
        tracing::subscriber::set_global_default(
            builder
                .json()
                .with_current_span(false)
                .with_span_events(FmtSpan::NONE)
                .finish(),
        )
    } else {
        tracing::subscriber::set_global_default(builder.compact().with_target(true).finish())
    };

    Ok(LoggingGuard {
        _guard: guard,
        telemetry_path,
    })
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

fn background<W: io::Write + Send + 'static>(sink: W) -> (NonBlocking, WorkerGuard) {
    NonBlockingBuilder::default().lossy(false).finish(sink)
}

fn telemetry_path(outputs: &ResolvedOutputs) -> PathBuf {
    outputs
        .summary_md
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        .join(TELEMETRY_FILE)
}

fn open_telemetry(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating telemetry directory at {}", dir.display()))?;
    }
    File::create(path).with_context(|| format!("creating telemetry file at {}", path.display()))
}
