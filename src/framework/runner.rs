//! The sequential test runner.
//!
//! Cases share external mutable state (trace sessions, temp directories,
//! named synchronization objects), so execution is strictly sequential and
//! single-threaded; order is suite declaration order, then case declaration
//! order within each suite.

use std::collections::HashSet;

use crate::core::errors::{HarnessError, Result};
use crate::framework::case::TestCase;
use crate::framework::filter::CaseFilter;
use crate::framework::suite::{SuiteRegistry, TestSuite};

/// Reporting hooks invoked around a run.
///
/// All six callbacks are pure observers: they must not affect control flow,
/// only record or display state. Every method has a no-op default, so
/// implementations override only what they report on.
pub trait RunObserver {
    /// A run begins; counts reflect the filtered view.
    fn on_start(&mut self, suite_count: usize, case_count: usize) {
        let _ = (suite_count, case_count);
    }

    /// A suite begins; `selected` holds the qualified names of the cases the
    /// filter retained, in execution order.
    fn on_suite_start(&mut self, suite: &TestSuite, selected: &[String]) {
        let _ = (suite, selected);
    }

    /// A case is about to be invoked.
    fn on_case_start(&mut self, case: &TestCase) {
        let _ = case;
    }

    /// A case finished, in its terminal state, failures recorded.
    fn on_case_end(&mut self, case: &TestCase) {
        let _ = case;
    }

    /// All retained cases of a suite finished.
    fn on_suite_end(&mut self, suite: &TestSuite) {
        let _ = suite;
    }

    /// The run finished; `failed` lists every failed case in execution order.
    fn on_end(&mut self, failed: &[&TestCase]) {
        let _ = failed;
    }
}

/// Observer that reports nothing.
pub struct NullObserver;

impl RunObserver for NullObserver {}

/// Executes the registered suites against a filter.
///
/// Construction snapshots the registry into a suite/cases view; the runner is
/// single-shot per run, matching the one-shot lifecycle of its cases.
pub struct TestRunner {
    suites: Vec<TestSuite>,
    failed: Vec<(usize, usize)>,
    ran: bool,
}

impl TestRunner {
    /// Consume a registry. Fails if two cases share a qualified name, since
    /// filtering and reporting both key on `Suite::Case`.
    pub fn new(registry: SuiteRegistry) -> Result<Self> {
        let suites = registry.into_suites();
        let mut seen = HashSet::new();
        for suite in &suites {
            for case in suite.cases() {
                let full_name = case.full_name();
                if !seen.insert(full_name.clone()) {
                    return Err(HarnessError::DuplicateCase { full_name });
                }
            }
        }
        Ok(Self {
            suites,
            failed: Vec::new(),
            ran: false,
        })
    }

    /// Number of registered suites (unfiltered).
    #[must_use]
    pub fn suite_count(&self) -> usize {
        self.suites.len()
    }

    /// Number of registered cases (unfiltered).
    #[must_use]
    pub fn case_count(&self) -> usize {
        self.suites.iter().map(TestSuite::len).sum()
    }

    /// Execute every case whose qualified name matches `filter`.
    ///
    /// Suites left empty by the filter are skipped entirely. A case counts as
    /// failed when its body aborts fatally *or* when it returns cleanly with
    /// non-fatal failures recorded; the clean-return check is what keeps
    /// expectation-only failures from being dropped.
    pub fn run(&mut self, filter: &str, observer: &mut dyn RunObserver) -> Result<()> {
        if self.ran {
            return Err(HarnessError::RunnerExhausted);
        }
        let filter = CaseFilter::compile(filter)?;
        self.ran = true;

        let mut selection: Vec<(usize, Vec<usize>)> = Vec::new();
        for (suite_index, suite) in self.suites.iter().enumerate() {
            let retained: Vec<usize> = suite
                .cases()
                .iter()
                .enumerate()
                .filter(|(_, case)| filter.matches(&case.full_name()))
                .map(|(case_index, _)| case_index)
                .collect();
            if !retained.is_empty() {
                selection.push((suite_index, retained));
            }
        }

        let case_total: usize = selection.iter().map(|(_, cases)| cases.len()).sum();
        observer.on_start(selection.len(), case_total);

        for (suite_index, retained) in &selection {
            let suite_index = *suite_index;
            let selected_names: Vec<String> = retained
                .iter()
                .map(|&case_index| self.suites[suite_index].cases()[case_index].full_name())
                .collect();
            observer.on_suite_start(&self.suites[suite_index], &selected_names);

            for &case_index in retained {
                observer.on_case_start(&self.suites[suite_index].cases()[case_index]);

                let outcome = self.suites[suite_index].case_mut(case_index).invoke();
                let case = self.suites[suite_index].case_mut(case_index);
                let passed = match outcome {
                    Err(abort) => {
                        case.add_failure(abort.into_record());
                        false
                    }
                    Ok(()) => !case.has_failures(),
                };
                case.conclude(passed);
                if !passed {
                    self.failed.push((suite_index, case_index));
                }

                observer.on_case_end(&self.suites[suite_index].cases()[case_index]);
            }

            observer.on_suite_end(&self.suites[suite_index]);
        }

        let failed: Vec<&TestCase> = self
            .failed
            .iter()
            .map(|&(suite_index, case_index)| &self.suites[suite_index].cases()[case_index])
            .collect();
        observer.on_end(&failed);
        Ok(())
    }

    /// Whether any case failed during the run.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Failed cases in execution order, with their ordered failure records.
    #[must_use]
    pub fn failed_cases(&self) -> Vec<&TestCase> {
        self.failed
            .iter()
            .map(|&(suite_index, case_index)| &self.suites[suite_index].cases()[case_index])
            .collect()
    }
}
