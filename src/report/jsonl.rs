//! JSONL run log: append-only line-delimited JSON of run events.
//!
//! Each line is a self-contained JSON object, assembled in memory and written
//! atomically via `write_all` so a tailing process never sees a partial line.
//! Degradation chain: primary file, then stderr with a `[PTH-JSONL]` prefix,
//! then silent discard. Reporting must never fail a run.

#![allow(missing_docs)]

use std::fs::{File, OpenOptions, create_dir_all};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::framework::case::TestCase;
use crate::framework::runner::RunObserver;
use crate::framework::suite::TestSuite;

/// Run lifecycle events, one per log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEvent {
    RunStart,
    SuiteStart,
    CaseStart,
    CaseEnd,
    SuiteEnd,
    RunEnd,
}

/// One JSONL log line. Fields absent from an event are omitted entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLogEntry {
    /// ISO 8601 UTC timestamp, millisecond precision.
    pub ts: String,
    pub event: RunEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failures: Option<Vec<String>>,
}

impl RunLogEntry {
    /// New entry stamped with the current UTC time.
    #[must_use]
    pub fn new(event: RunEvent) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            suite: None,
            case: None,
            state: None,
            suite_count: None,
            case_count: None,
            failed_count: None,
            failures: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    File,
    Stderr,
    Discard,
}

struct Sink {
    writer: Option<BufWriter<File>>,
    state: SinkState,
}

impl Sink {
    fn open(path: &Path) -> Self {
        match open_append(path) {
            Ok(file) => Self {
                writer: Some(BufWriter::new(file)),
                state: SinkState::File,
            },
            Err(error) => {
                let _ = writeln!(
                    io::stderr(),
                    "[PTH-JSONL] cannot open {}: {error}; logging to stderr",
                    path.display()
                );
                Self {
                    writer: None,
                    state: SinkState::Stderr,
                }
            }
        }
    }

    const fn disabled() -> Self {
        Self {
            writer: None,
            state: SinkState::Discard,
        }
    }

    fn write_line(&mut self, line: &str) {
        match self.state {
            SinkState::File => {
                let failed = self
                    .writer
                    .as_mut()
                    .is_none_or(|writer| writer.write_all(line.as_bytes()).is_err());
                if failed {
                    self.writer = None;
                    self.state = SinkState::Stderr;
                    let _ = writeln!(io::stderr(), "[PTH-JSONL] file write failed, using stderr");
                    self.write_line(line);
                }
            }
            SinkState::Stderr => {
                let _ = write!(io::stderr(), "[PTH-JSONL] {line}");
            }
            SinkState::Discard => {}
        }
    }

    fn flush(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            let _ = writer.flush();
        }
    }
}

/// Run observer that appends one JSONL entry per run event.
///
/// Cloning shares the underlying sink, so the same log can back several
/// composition layers at once.
#[derive(Clone)]
pub struct JsonlRunLog {
    sink: Arc<Mutex<Sink>>,
}

impl JsonlRunLog {
    /// Open (or create) the log file, degrading on failure.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Sink::open(path.as_ref()))),
        }
    }

    /// A log that silently discards everything. Used when no log path is
    /// configured.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            sink: Arc::new(Mutex::new(Sink::disabled())),
        }
    }

    /// Current sink state: `"file"`, `"stderr"`, or `"discard"`.
    #[must_use]
    pub fn state(&self) -> &'static str {
        match self.sink.lock().state {
            SinkState::File => "file",
            SinkState::Stderr => "stderr",
            SinkState::Discard => "discard",
        }
    }

    /// Append one entry as a single atomic line.
    pub fn write_entry(&self, entry: &RunLogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(error) => {
                let _ = writeln!(io::stderr(), "[PTH-JSONL] serialize error: {error}");
                return;
            }
        };
        self.sink.lock().write_line(&line);
    }

    /// Flush buffered lines.
    pub fn flush(&self) {
        self.sink.lock().flush();
    }
}

impl RunObserver for JsonlRunLog {
    fn on_start(&mut self, suite_count: usize, case_count: usize) {
        let mut entry = RunLogEntry::new(RunEvent::RunStart);
        entry.suite_count = Some(suite_count);
        entry.case_count = Some(case_count);
        self.write_entry(&entry);
    }

    fn on_suite_start(&mut self, suite: &TestSuite, selected: &[String]) {
        let mut entry = RunLogEntry::new(RunEvent::SuiteStart);
        entry.suite = Some(suite.name().to_string());
        entry.case_count = Some(selected.len());
        self.write_entry(&entry);
    }

    fn on_case_start(&mut self, case: &TestCase) {
        let mut entry = RunLogEntry::new(RunEvent::CaseStart);
        entry.case = Some(case.full_name());
        self.write_entry(&entry);
    }

    fn on_case_end(&mut self, case: &TestCase) {
        let mut entry = RunLogEntry::new(RunEvent::CaseEnd);
        entry.case = Some(case.full_name());
        entry.state = Some(case.state().as_str().to_string());
        if case.has_failures() {
            entry.failures = Some(case.failures().iter().map(ToString::to_string).collect());
        }
        self.write_entry(&entry);
    }

    fn on_suite_end(&mut self, suite: &TestSuite) {
        let mut entry = RunLogEntry::new(RunEvent::SuiteEnd);
        entry.suite = Some(suite.name().to_string());
        self.write_entry(&entry);
    }

    fn on_end(&mut self, failed: &[&TestCase]) {
        let mut entry = RunLogEntry::new(RunEvent::RunEnd);
        entry.failed_count = Some(failed.len());
        if !failed.is_empty() {
            entry.failures = Some(failed.iter().map(|case| case.full_name()).collect());
        }
        self.write_entry(&entry);
        self.flush();
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
