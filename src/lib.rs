#![forbid(unsafe_code)]

//! Profiler test harness: suite orchestration plus trace-content verification.
//!
//! Two engines under one roof:
//! 1. **Framework** — declarative suite/case registry, sequential runner with
//!    per-case fixtures, fatal assertions and non-fatal expectations with
//!    call-site attribution.
//! 2. **Trace verification** — a composable predicate algebra evaluated
//!    against immutable snapshots of dumped trace data (processes, images,
//!    threads, per-provider event counters).
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use profiler_test_harness::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use profiler_test_harness::framework::runner::TestRunner;
//! use profiler_test_harness::trace::predicate::CounterCompare;
//! ```

pub mod prelude;

pub mod core;
pub mod exec;
pub mod framework;
pub mod report;
pub mod trace;
