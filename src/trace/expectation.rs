//! Expectations over result artifacts: file counts and trace content.
//!
//! Expectations are the layer that turns a false predicate into a case
//! failure. They operate on the file list a case produced, match artifacts by
//! glob, and report through the case's execution context.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::errors::{HarnessError, Result};
use crate::framework::case::{CaseContext, CaseResult};
use crate::framework::filter::GlobPattern;
use crate::trace::predicate::TracePredicate;
use crate::trace::snapshot::TraceSnapshot;

/// Anything below this is not a plausible trace file.
pub const ETL_MIN_SIZE: u64 = 10 * 1024;
/// Minimum plausible minidump size.
pub const DMP_MIN_SIZE: u64 = 1024;

/// The dumper-tool seam: produces a snapshot for one trace artifact.
pub trait SnapshotSource {
    /// Obtain the snapshot describing `artifact`.
    fn snapshot_for(&self, artifact: &Path) -> Result<TraceSnapshot>;
}

/// Snapshot source backed by dumper JSON files on disk.
///
/// The JSON for `<dir>/<name>.etl` is looked up as `<name>.json`, either in a
/// dedicated directory or next to the artifact.
#[derive(Debug, Clone, Default)]
pub struct DumpFileSource {
    json_dir: Option<PathBuf>,
}

impl DumpFileSource {
    /// Look for dumper JSON next to each artifact.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for dumper JSON in `dir` instead.
    #[must_use]
    pub fn with_json_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            json_dir: Some(dir.into()),
        }
    }
}

impl SnapshotSource for DumpFileSource {
    fn snapshot_for(&self, artifact: &Path) -> Result<TraceSnapshot> {
        let stem = artifact
            .file_stem()
            .ok_or_else(|| HarnessError::MalformedDump {
                context: "artifact path",
                details: format!("no file stem in {}", artifact.display()),
            })?;
        let dir = self
            .json_dir
            .as_deref()
            .or_else(|| artifact.parent())
            .unwrap_or_else(|| Path::new("."));
        let mut json_path = dir.join(stem);
        json_path.set_extension("json");
        TraceSnapshot::from_dump_file(&json_path)
    }
}

/// Expects a given number of matching files, each meeting a size floor.
pub struct FileCountExpectation {
    pattern: GlobPattern,
    expected_count: usize,
    min_size: u64,
}

impl FileCountExpectation {
    /// Expect exactly `expected_count` files matching `pattern`, each at
    /// least `min_size` bytes.
    pub fn new(pattern: &str, expected_count: usize, min_size: u64) -> Result<Self> {
        Ok(Self {
            pattern: GlobPattern::compile(pattern)?,
            expected_count,
            min_size,
        })
    }

    /// Check the expectation against a case's result file list, reporting
    /// failures as fatal assertions on `cx`.
    pub fn evaluate(&self, files: &[PathBuf], cx: &mut CaseContext<'_>) -> CaseResult {
        let mut matching = 0usize;
        for file in files {
            if !self.pattern.matches(&file.to_string_lossy()) {
                continue;
            }
            matching += 1;
            let size = fs::metadata(file)
                .map_err(|source| HarnessError::io(file, source))?
                .len();
            cx.assert_true(
                size >= self.min_size,
                &format!("size of {} >= {}", file.display(), self.min_size),
            )?;
        }
        cx.assert_eq(
            matching,
            self.expected_count,
            &format!("count of files matching {:?}", self.pattern.pattern()),
        )
    }
}

/// Evaluates a predicate list against the snapshot of every matching artifact.
///
/// Predicates run in list order; the first unsatisfied one escalates to a
/// fatal case failure carrying its explanation, and the rest are skipped for
/// that artifact.
pub struct TraceContentExpectation {
    pattern: GlobPattern,
    predicates: Vec<Box<dyn TracePredicate>>,
}

impl TraceContentExpectation {
    /// Check every artifact matching `pattern` against `predicates`.
    pub fn new(pattern: &str, predicates: Vec<Box<dyn TracePredicate>>) -> Result<Self> {
        Ok(Self {
            pattern: GlobPattern::compile(pattern)?,
            predicates,
        })
    }

    /// Evaluate against a case's result file list, resolving snapshots
    /// through `source`.
    pub fn evaluate(
        &mut self,
        files: &[PathBuf],
        source: &dyn SnapshotSource,
        cx: &mut CaseContext<'_>,
    ) -> CaseResult {
        for file in files {
            if !self.pattern.matches(&file.to_string_lossy()) {
                continue;
            }
            let snapshot = source.snapshot_for(file)?;
            for predicate in &mut self.predicates {
                if !predicate.evaluate(&snapshot) {
                    return cx.fail(&format!(
                        "Trace content predicate ({}) is not satisfied: {}",
                        predicate.name(),
                        predicate.explain()
                    ));
                }
            }
        }
        Ok(())
    }
}
