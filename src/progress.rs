//! Progress reporting for long-running pipelines.
//!
//! Contributor aggregation can take hours on a cold cache because of the
//! GitHub call budget, so it reports one event per record. Events go to
//! **stderr**; stdout stays reserved for command output.

use serde::Serialize;
use std::io::Write;

/// A single progress event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A record's contributor snapshot is available.
    Record {
        record: String,
        n: u64,
        total: u64,
        cached: bool,
    },
    /// A record was skipped in a non-fatal way.
    Warning { record: String, message: String },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

fn write_stderr(line: &str) {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{}", line);
    let _ = stderr.flush();
}

/// `[ 12/245  4%] go (cached)`
fn human_line(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Record {
            record,
            n,
            total,
            cached,
        } => {
            let width = total.to_string().len();
            let percent = if *total == 0 { 100 } else { n * 100 / total };
            format!(
                "[{:>width$}/{} {:>3}%] {} ({})",
                n,
                total,
                percent,
                record,
                if *cached { "cached" } else { "fetched" },
                width = width
            )
        }
        ProgressEvent::Warning { record, message } => {
            format!("warning: {}: {}", record, message)
        }
    }
}

/// Human-readable progress on stderr.
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        write_stderr(&human_line(&event));
    }
}

/// One JSON object per line on stderr, tagged by `"event"`.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        if let Ok(line) = serde_json::to_string(&event) {
            write_stderr(&line);
        }
    }
}

pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Human progress when stderr is a terminal, otherwise none.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
