//! Test cases: bodies, execution context, and check primitives.

use std::fmt;
use std::panic::{self, AssertUnwindSafe, Location};

use crate::core::errors::HarnessError;
use crate::framework::failure::{FailureRecord, SourceLocation};
use crate::framework::fixture::Fixture;

/// Fatal outcome of a case body, tagged by failure kind.
///
/// Bodies propagate these with `?`; the runner matches on the variant at the
/// invocation boundary. Non-fatal expectations never appear here, they only
/// append to the case's failure list.
#[derive(Debug)]
pub enum CaseAbort {
    /// A fatal assertion did not hold.
    AssertionFailed(FailureRecord),
    /// An explicit, message-only failure.
    CaseFailed(FailureRecord),
    /// Any other error escaping the body.
    UnhandledError(FailureRecord),
}

impl CaseAbort {
    /// Extract the failure record, discarding the kind tag.
    #[must_use]
    pub fn into_record(self) -> FailureRecord {
        match self {
            Self::AssertionFailed(record)
            | Self::CaseFailed(record)
            | Self::UnhandledError(record) => record,
        }
    }

    /// Borrow the failure record.
    #[must_use]
    pub fn record(&self) -> &FailureRecord {
        match self {
            Self::AssertionFailed(record)
            | Self::CaseFailed(record)
            | Self::UnhandledError(record) => record,
        }
    }
}

impl From<HarnessError> for CaseAbort {
    fn from(value: HarnessError) -> Self {
        Self::UnhandledError(FailureRecord::unhandled(value.to_string(), None))
    }
}

impl From<std::io::Error> for CaseAbort {
    fn from(value: std::io::Error) -> Self {
        Self::UnhandledError(FailureRecord::unhandled(format!("IO error: {value}"), None))
    }
}

impl From<serde_json::Error> for CaseAbort {
    fn from(value: serde_json::Error) -> Self {
        Self::UnhandledError(FailureRecord::unhandled(
            format!("JSON error: {value}"),
            None,
        ))
    }
}

/// Result type every case body returns.
pub type CaseResult = Result<(), CaseAbort>;

/// Boxed case body.
pub type CaseBody = Box<dyn FnMut(&mut CaseContext<'_>) -> CaseResult>;

/// Lifecycle of one case. Terminal states are never left again; a case is
/// single-shot per process run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    NotRun,
    Running,
    Passed,
    Failed,
}

impl CaseState {
    /// Stable lowercase label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotRun => "not_run",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

/// Execution context handed to a case body for the duration of its run.
///
/// Carries the qualified case name (used as the location scope of every
/// failure) and the sink for non-fatal failure records. There is no ambient
/// "current case" anywhere; all routing goes through this value.
pub struct CaseContext<'a> {
    scope: &'a str,
    failures: &'a mut Vec<FailureRecord>,
}

impl<'a> CaseContext<'a> {
    pub(crate) fn new(scope: &'a str, failures: &'a mut Vec<FailureRecord>) -> Self {
        Self { scope, failures }
    }

    /// Qualified `Suite::Case` name of the running case.
    #[must_use]
    pub fn case_name(&self) -> &str {
        self.scope
    }

    /// Number of non-fatal failures recorded so far in this body.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    #[track_caller]
    fn caller_location(&self) -> SourceLocation {
        SourceLocation::from_caller(self.scope, Location::caller())
    }

    // ──────────────────── fatal checks ────────────────────

    /// Fatal check that `value` is true.
    #[track_caller]
    pub fn assert_true(&mut self, value: bool, expression: &str) -> CaseResult {
        if value {
            Ok(())
        } else {
            Err(CaseAbort::AssertionFailed(FailureRecord::assertion(
                expression,
                "was not true",
                self.caller_location(),
            )))
        }
    }

    /// Fatal check that `value` is false.
    #[track_caller]
    pub fn assert_false(&mut self, value: bool, expression: &str) -> CaseResult {
        if value {
            Err(CaseAbort::AssertionFailed(FailureRecord::assertion(
                expression,
                "was not false",
                self.caller_location(),
            )))
        } else {
            Ok(())
        }
    }

    /// Fatal check that two values compare equal.
    #[track_caller]
    pub fn assert_eq<T: PartialEq + fmt::Debug>(
        &mut self,
        left: T,
        right: T,
        expression: &str,
    ) -> CaseResult {
        if left == right {
            Ok(())
        } else {
            Err(CaseAbort::AssertionFailed(FailureRecord::assertion(
                expression,
                format!("values differ (left: {left:?}, right: {right:?})"),
                self.caller_location(),
            )))
        }
    }

    /// Fatal check that `left` is strictly greater than `right`.
    #[track_caller]
    pub fn assert_gt<T: PartialOrd + fmt::Debug>(
        &mut self,
        left: T,
        right: T,
        expression: &str,
    ) -> CaseResult {
        if left > right {
            Ok(())
        } else {
            Err(CaseAbort::AssertionFailed(FailureRecord::assertion(
                expression,
                format!("was not greater (left: {left:?}, right: {right:?})"),
                self.caller_location(),
            )))
        }
    }

    /// Fatal check that `value` is zero.
    #[track_caller]
    pub fn assert_zero(&mut self, value: u64, expression: &str) -> CaseResult {
        if value == 0 {
            Ok(())
        } else {
            Err(CaseAbort::AssertionFailed(FailureRecord::assertion(
                expression,
                format!("was not zero (actual: {value})"),
                self.caller_location(),
            )))
        }
    }

    /// Fatal check that `value` is non-zero.
    #[track_caller]
    pub fn assert_nonzero(&mut self, value: u64, expression: &str) -> CaseResult {
        if value == 0 {
            Err(CaseAbort::AssertionFailed(FailureRecord::assertion(
                expression,
                "was zero",
                self.caller_location(),
            )))
        } else {
            Ok(())
        }
    }

    /// Explicit fatal failure with a message and no expression text.
    #[track_caller]
    pub fn fail(&mut self, message: &str) -> CaseResult {
        Err(CaseAbort::CaseFailed(FailureRecord::explicit(
            message,
            self.caller_location(),
        )))
    }

    // ──────────────────── non-fatal checks ────────────────────

    /// Non-fatal check that `value` is true; execution continues either way.
    #[track_caller]
    pub fn expect_true(&mut self, value: bool, expression: &str) {
        if !value {
            let record =
                FailureRecord::assertion(expression, "was not true", self.caller_location());
            self.failures.push(record);
        }
    }

    /// Non-fatal check that `value` is false.
    #[track_caller]
    pub fn expect_false(&mut self, value: bool, expression: &str) {
        if value {
            let record =
                FailureRecord::assertion(expression, "was not false", self.caller_location());
            self.failures.push(record);
        }
    }

    /// Non-fatal check that two values compare equal.
    #[track_caller]
    pub fn expect_eq<T: PartialEq + fmt::Debug>(&mut self, left: T, right: T, expression: &str) {
        if left != right {
            let record = FailureRecord::assertion(
                expression,
                format!("values differ (left: {left:?}, right: {right:?})"),
                self.caller_location(),
            );
            self.failures.push(record);
        }
    }

    /// Non-fatal check that `left` is strictly greater than `right`.
    #[track_caller]
    pub fn expect_gt<T: PartialOrd + fmt::Debug>(&mut self, left: T, right: T, expression: &str) {
        if left > right {
            return;
        }
        let record = FailureRecord::assertion(
            expression,
            format!("was not greater (left: {left:?}, right: {right:?})"),
            self.caller_location(),
        );
        self.failures.push(record);
    }

    /// Non-fatal check that `value` is zero.
    #[track_caller]
    pub fn expect_zero(&mut self, value: u64, expression: &str) {
        if value != 0 {
            let record = FailureRecord::assertion(
                expression,
                format!("was not zero (actual: {value})"),
                self.caller_location(),
            );
            self.failures.push(record);
        }
    }

    /// Non-fatal check that `value` is non-zero.
    #[track_caller]
    pub fn expect_nonzero(&mut self, value: u64, expression: &str) {
        if value == 0 {
            let record = FailureRecord::assertion(expression, "was zero", self.caller_location());
            self.failures.push(record);
        }
    }
}

/// Fatal check macro capturing the expression text.
#[macro_export]
macro_rules! assert_true {
    ($cx:expr, $cond:expr) => {
        $cx.assert_true($cond, stringify!($cond))?
    };
}

/// Fatal check macro capturing the expression text.
#[macro_export]
macro_rules! assert_false {
    ($cx:expr, $cond:expr) => {
        $cx.assert_false($cond, stringify!($cond))?
    };
}

/// Fatal check macro capturing the expression text.
#[macro_export]
macro_rules! assert_zero {
    ($cx:expr, $value:expr) => {
        $cx.assert_zero($value, stringify!($value))?
    };
}

/// Fatal check macro capturing the expression text.
#[macro_export]
macro_rules! assert_nonzero {
    ($cx:expr, $value:expr) => {
        $cx.assert_nonzero($value, stringify!($value))?
    };
}

/// Non-fatal check macro capturing the expression text.
#[macro_export]
macro_rules! expect_true {
    ($cx:expr, $cond:expr) => {
        $cx.expect_true($cond, stringify!($cond))
    };
}

/// Non-fatal check macro capturing the expression text.
#[macro_export]
macro_rules! expect_false {
    ($cx:expr, $cond:expr) => {
        $cx.expect_false($cond, stringify!($cond))
    };
}

/// Non-fatal check macro capturing the expression text.
#[macro_export]
macro_rules! expect_zero {
    ($cx:expr, $value:expr) => {
        $cx.expect_zero($value, stringify!($value))
    };
}

/// Non-fatal check macro capturing the expression text.
#[macro_export]
macro_rules! expect_nonzero {
    ($cx:expr, $value:expr) => {
        $cx.expect_nonzero($value, stringify!($value))
    };
}

/// One registered test case.
pub struct TestCase {
    name: String,
    suite_name: Option<String>,
    body: CaseBody,
    fixture: Option<Box<dyn Fixture>>,
    failures: Vec<FailureRecord>,
    state: CaseState,
}

impl TestCase {
    /// Create a case with no fixture.
    pub fn new(
        name: impl Into<String>,
        body: impl FnMut(&mut CaseContext<'_>) -> CaseResult + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            suite_name: None,
            body: Box::new(body),
            fixture: None,
            failures: Vec::new(),
            state: CaseState::NotRun,
        }
    }

    /// Create a case wrapped in a fixture.
    pub fn with_fixture(
        name: impl Into<String>,
        fixture: impl Fixture + 'static,
        body: impl FnMut(&mut CaseContext<'_>) -> CaseResult + 'static,
    ) -> Self {
        let mut case = Self::new(name, body);
        case.fixture = Some(Box::new(fixture));
        case
    }

    /// Bare case name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Qualified `Suite::Case` name; the bare name until the case is added
    /// to a suite. The owning suite is set once and never reassigned.
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.suite_name {
            Some(suite) => format!("{suite}::{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> CaseState {
        self.state
    }

    /// Failure records accumulated during this case's run, in order.
    #[must_use]
    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    /// Whether any failure has been recorded.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub(crate) fn set_suite_name(&mut self, suite_name: &str) {
        self.suite_name = Some(suite_name.to_string());
    }

    pub(crate) fn add_failure(&mut self, record: FailureRecord) {
        self.failures.push(record);
    }

    pub(crate) fn conclude(&mut self, passed: bool) {
        self.state = if passed {
            CaseState::Passed
        } else {
            CaseState::Failed
        };
    }

    /// Run fixture setup, the body, and fixture teardown.
    ///
    /// Teardown runs on every body exit path: the teardown guard is dropped
    /// after `catch_unwind` has resolved the body outcome, so a normal
    /// return, a `CaseAbort`, and a panic all release the fixture.
    pub(crate) fn invoke(&mut self) -> CaseResult {
        self.state = CaseState::Running;
        let full_name = self.full_name();

        if let Some(fixture) = self.fixture.as_mut() {
            if let Err(error) = fixture.setup() {
                return Err(CaseAbort::UnhandledError(FailureRecord::unhandled(
                    format!("fixture setup failed: {error}"),
                    Some(SourceLocation::scope_only(&full_name)),
                )));
            }
        }

        let guard = TeardownGuard {
            fixture: self
                .fixture
                .as_deref_mut()
                .map(|f| f as &mut (dyn Fixture + '_)),
        };
        let mut cx = CaseContext::new(&full_name, &mut self.failures);
        let body = &mut self.body;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&mut cx)));
        drop(guard);

        match outcome {
            Ok(result) => result,
            Err(payload) => Err(CaseAbort::UnhandledError(FailureRecord::unhandled(
                format!("panic: {}", panic_message(&*payload)),
                Some(SourceLocation::scope_only(&full_name)),
            ))),
        }
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.full_name())
            .field("state", &self.state)
            .field("failures", &self.failures.len())
            .finish_non_exhaustive()
    }
}

struct TeardownGuard<'a> {
    fixture: Option<&'a mut (dyn Fixture + 'a)>,
}

impl Drop for TeardownGuard<'_> {
    fn drop(&mut self) {
        if let Some(fixture) = self.fixture.as_mut() {
            fixture.teardown();
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::Result;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn passing_body_returns_ok_and_records_nothing() {
        let mut case = TestCase::new("ok", |cx| {
            assert_true!(cx, 1 + 1 == 2);
            Ok(())
        });
        assert!(case.invoke().is_ok());
        assert!(!case.has_failures());
    }

    #[test]
    fn fatal_assertion_aborts_the_body() {
        let executed = Rc::new(Cell::new(false));
        let executed_in_body = Rc::clone(&executed);
        let mut case = TestCase::new("fatal", move |cx| {
            assert_true!(cx, false);
            executed_in_body.set(true);
            Ok(())
        });

        let abort = case.invoke().expect_err("expected abort");
        assert!(matches!(abort, CaseAbort::AssertionFailed(_)));
        assert!(!executed.get(), "statements after a fatal assertion must not run");
    }

    #[test]
    fn nonfatal_expectation_continues_the_body() {
        let steps = Rc::new(Cell::new(0));
        let steps_in_body = Rc::clone(&steps);
        let mut case = TestCase::new("nonfatal", move |cx| {
            expect_true!(cx, false);
            steps_in_body.set(steps_in_body.get() + 1);
            steps_in_body.set(steps_in_body.get() + 1);
            Ok(())
        });

        assert!(case.invoke().is_ok());
        assert_eq!(steps.get(), 2);
        assert_eq!(case.failures().len(), 1);
        assert_eq!(case.failures()[0].description(), "Assertion failed");
    }

    #[test]
    fn expect_gt_records_without_aborting() {
        let mut case = TestCase::new("gt", |cx| {
            cx.expect_gt(1u64, 2u64, "1 > 2");
            cx.expect_gt(3u64, 2u64, "3 > 2");
            Ok(())
        });
        assert!(case.invoke().is_ok());
        assert_eq!(case.failures().len(), 1);
        assert!(
            case.failures()[0]
                .message()
                .is_some_and(|m| m.contains("was not greater"))
        );
    }

    #[test]
    fn fail_produces_message_only_record() {
        let mut case = TestCase::new("explicit", |cx| cx.fail("trace was empty"));
        let abort = case.invoke().expect_err("expected abort");
        let CaseAbort::CaseFailed(record) = abort else {
            panic!("expected CaseFailed, got {abort:?}");
        };
        assert_eq!(record.expression(), None);
        assert_eq!(record.message(), Some("trace was empty"));
    }

    #[test]
    fn panic_is_wrapped_as_unhandled_error() {
        let mut case = TestCase::new("panics", |_cx| panic!("kaboom"));
        let abort = case.invoke().expect_err("expected abort");
        let CaseAbort::UnhandledError(record) = abort else {
            panic!("expected UnhandledError, got {abort:?}");
        };
        assert_eq!(record.description(), "Unhandled error");
        assert!(record.message().is_some_and(|m| m.contains("kaboom")));
    }

    #[test]
    fn harness_error_converts_to_unhandled_abort() {
        let mut case = TestCase::new("errors", |_cx| {
            let err: Result<()> = Err(HarnessError::Runtime {
                details: "dumper crashed".to_string(),
            });
            err?;
            Ok(())
        });
        let abort = case.invoke().expect_err("expected abort");
        assert!(matches!(abort, CaseAbort::UnhandledError(_)));
        assert!(
            abort
                .record()
                .message()
                .is_some_and(|m| m.contains("dumper crashed"))
        );
    }

    struct CountingFixture {
        setups: Rc<Cell<u32>>,
        teardowns: Rc<Cell<u32>>,
        fail_setup: bool,
    }

    impl Fixture for CountingFixture {
        fn setup(&mut self) -> Result<()> {
            self.setups.set(self.setups.get() + 1);
            if self.fail_setup {
                return Err(HarnessError::Runtime {
                    details: "no trace session".to_string(),
                });
            }
            Ok(())
        }

        fn teardown(&mut self) {
            self.teardowns.set(self.teardowns.get() + 1);
        }
    }

    fn counting_fixture(
        fail_setup: bool,
    ) -> (CountingFixture, Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let setups = Rc::new(Cell::new(0));
        let teardowns = Rc::new(Cell::new(0));
        let fixture = CountingFixture {
            setups: Rc::clone(&setups),
            teardowns: Rc::clone(&teardowns),
            fail_setup,
        };
        (fixture, setups, teardowns)
    }

    #[test]
    fn teardown_runs_after_normal_return() {
        let (fixture, setups, teardowns) = counting_fixture(false);
        let mut case = TestCase::with_fixture("normal", fixture, |_cx| Ok(()));
        assert!(case.invoke().is_ok());
        assert_eq!(setups.get(), 1);
        assert_eq!(teardowns.get(), 1);
    }

    #[test]
    fn teardown_runs_after_fatal_assertion() {
        let (fixture, _setups, teardowns) = counting_fixture(false);
        let mut case = TestCase::with_fixture("fatal", fixture, |cx| {
            assert_true!(cx, false);
            Ok(())
        });
        assert!(case.invoke().is_err());
        assert_eq!(teardowns.get(), 1);
    }

    #[test]
    fn teardown_runs_after_panic() {
        let (fixture, _setups, teardowns) = counting_fixture(false);
        let mut case = TestCase::with_fixture("panics", fixture, |_cx| panic!("boom"));
        assert!(case.invoke().is_err());
        assert_eq!(teardowns.get(), 1);
    }

    #[test]
    fn failed_setup_skips_body_and_teardown() {
        let (fixture, setups, teardowns) = counting_fixture(true);
        let ran = Rc::new(Cell::new(false));
        let ran_in_body = Rc::clone(&ran);
        let mut case = TestCase::with_fixture("setup_fails", fixture, move |_cx| {
            ran_in_body.set(true);
            Ok(())
        });

        let abort = case.invoke().expect_err("expected abort");
        assert!(matches!(abort, CaseAbort::UnhandledError(_)));
        assert_eq!(setups.get(), 1);
        assert_eq!(teardowns.get(), 0, "setup never completed, nothing to release");
        assert!(!ran.get());
    }

    #[test]
    fn location_points_at_the_check_call_site() {
        let mut case = TestCase::new("located", |cx| {
            assert_true!(cx, false);
            Ok(())
        });
        case.set_suite_name("Suite");
        let abort = case.invoke().expect_err("expected abort");
        let location = abort.record().location().expect("location captured");
        assert_eq!(location.file(), Some("case.rs"));
        assert_eq!(location.scope(), "Suite::located");
        assert!(location.line().is_some());
    }
}
