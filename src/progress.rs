/*! Progress tracking and reporting

The controller owns a [ProgressState] and hands read-only snapshots to a [Reporter]
after every milestone (unpacking, component transitions, block flushes, completion and failure).

Reporting is fire-and-forget: a reporter must not block, and whatever goes wrong while reporting
is none of the pipeline's business.
!*/
use std::fmt;
use std::sync::mpsc::Sender;

use log::{debug, warn};
use serde::Serialize;

/// Counters of an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    pub total_files: usize,
    /// Cumulative across components.
    pub processed_files: usize,
    pub total_components: usize,
    pub processed_components: usize,
    pub words: u64,
    pub sentences: u64,
    pub done: bool,
    pub error: Option<String>,
    pub message: String,
    /// Backtrace captured when the run failed.
    pub stack: Option<String>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            total_files: 0,
            processed_files: 0,
            total_components: 0,
            processed_components: 0,
            words: 0,
            sentences: 0,
            done: false,
            error: None,
            message: "Not started yet".to_string(),
            stack: None,
        }
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    part as f64 * 100.0 / total.max(1) as f64
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} files ({:.1}%). {}/{} components ({:.1}%). {} words, {} sentences.",
            self.message,
            self.processed_files,
            self.total_files,
            percentage(self.processed_files, self.total_files),
            self.processed_components,
            self.total_components,
            percentage(self.processed_components, self.total_components),
            self.words,
            self.sentences
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Progress,
    Failure,
}

/// What gets reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Event {
    Progress(ProgressState),
    Failure {
        exc_type: String,
        exc_message: String,
        #[serde(flatten)]
        progress: ProgressState,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Progress(_) => EventKind::Progress,
            Event::Failure { .. } => EventKind::Failure,
        }
    }

    pub fn progress(&self) -> &ProgressState {
        match self {
            Event::Progress(progress) => progress,
            Event::Failure { progress, .. } => progress,
        }
    }
}

/// Observer of a run.
pub trait Reporter {
    fn report(&self, event: &Event);
}

/// Logs the payload of each event, at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: &Event) {
        match serde_json::to_string(event) {
            Ok(payload) => debug!("{:?} {}", event.kind(), payload),
            Err(e) => warn!("could not serialize {:?} event: {}", event.kind(), e),
        }
    }
}

/// Forwards events to a channel. A closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: Sender<Event>,
}

impl ChannelReporter {
    pub fn new(tx: Sender<Event>) -> Self {
        Self { tx }
    }
}

impl Reporter for ChannelReporter {
    fn report(&self, event: &Event) {
        let _ = self.tx.send(event.clone());
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: &Event) {}
}
