//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use profiler_test_harness::prelude::*;
//! ```

// Core
pub use crate::core::config::HarnessConfig;
pub use crate::core::errors::{HarnessError, Result};

// Framework
pub use crate::framework::case::{CaseAbort, CaseContext, CaseResult, CaseState, TestCase};
pub use crate::framework::failure::{FailureRecord, SourceLocation};
pub use crate::framework::filter::{CaseFilter, GlobPattern, MATCH_ALL};
pub use crate::framework::fixture::Fixture;
pub use crate::framework::runner::{NullObserver, RunObserver, TestRunner};
pub use crate::framework::suite::{SuiteRegistry, TestSuite};

// Reporting
#[cfg(feature = "console")]
pub use crate::report::console::ConsoleReporter;
pub use crate::report::jsonl::JsonlRunLog;

// Trace verification
pub use crate::trace::expectation::{
    DumpFileSource, FileCountExpectation, SnapshotSource, TraceContentExpectation,
};
pub use crate::trace::ids::{EventId, ProviderId};
pub use crate::trace::operator::CompareOp;
pub use crate::trace::predicate::{
    CounterCompare, EventCountSubset, ImageSubset, ProcessSetMatch, StackCountAtLeast,
    ThreadCountAtLeast, TracePredicate,
};
pub use crate::trace::snapshot::{CounterKind, ProcessKey, SnapshotBuilder, TraceSnapshot};

// External collaborators
pub use crate::exec::{ManagedProcess, ProcessOutcome, ensure_success};
