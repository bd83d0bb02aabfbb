//! Suites and the suite registry.

use crate::framework::case::{CaseContext, CaseResult, TestCase};
use crate::framework::fixture::Fixture;

/// A named, ordered collection of cases. Insertion order is execution order.
pub struct TestSuite {
    name: String,
    cases: Vec<TestCase>,
}

impl TestSuite {
    /// Create an empty suite.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
        }
    }

    /// Suite name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered cases in declaration order.
    #[must_use]
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Number of registered cases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Whether the suite has no cases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Add a prebuilt case; the suite takes ownership and stamps itself as
    /// the owning suite (set once, never reassigned).
    pub fn add_case(&mut self, mut case: TestCase) -> &mut Self {
        case.set_suite_name(&self.name);
        self.cases.push(case);
        self
    }

    /// Declare a case inline.
    pub fn case(
        &mut self,
        name: impl Into<String>,
        body: impl FnMut(&mut CaseContext<'_>) -> CaseResult + 'static,
    ) -> &mut Self {
        self.add_case(TestCase::new(name, body))
    }

    /// Declare a case wrapped in a fixture.
    pub fn case_with_fixture(
        &mut self,
        name: impl Into<String>,
        fixture: impl Fixture + 'static,
        body: impl FnMut(&mut CaseContext<'_>) -> CaseResult + 'static,
    ) -> &mut Self {
        self.add_case(TestCase::with_fixture(name, fixture, body))
    }

    pub(crate) fn case_mut(&mut self, index: usize) -> &mut TestCase {
        &mut self.cases[index]
    }
}

/// Ordered, append-only collection of suites, scoped to one run's setup.
///
/// The registry is an explicit collaborator: callers own the value and hand
/// it to the runner, there is no process-wide registration side channel.
#[derive(Default)]
pub struct SuiteRegistry {
    suites: Vec<TestSuite>,
}

impl SuiteRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a suite. Registration order is execution order.
    pub fn add_suite(&mut self, suite: TestSuite) -> &mut Self {
        self.suites.push(suite);
        self
    }

    /// Borrow the suite with the given name, appending an empty one first if
    /// it does not exist yet. Supports declarative registration:
    ///
    /// ```
    /// # use profiler_test_harness::framework::suite::SuiteRegistry;
    /// let mut registry = SuiteRegistry::new();
    /// registry
    ///     .suite("CommandLine")
    ///     .case("NoArgs", |cx| cx.fail("not implemented"));
    /// ```
    pub fn suite(&mut self, name: &str) -> &mut TestSuite {
        let index = match self.suites.iter().position(|s| s.name() == name) {
            Some(index) => index,
            None => {
                self.suites.push(TestSuite::new(name));
                self.suites.len() - 1
            }
        };
        &mut self.suites[index]
    }

    /// Registered suites in declaration order.
    #[must_use]
    pub fn suites(&self) -> &[TestSuite] {
        &self.suites
    }

    /// Total number of suites.
    #[must_use]
    pub fn suite_count(&self) -> usize {
        self.suites.len()
    }

    /// Total number of cases across all suites.
    #[must_use]
    pub fn case_count(&self) -> usize {
        self.suites.iter().map(TestSuite::len).sum()
    }

    pub(crate) fn into_suites(self) -> Vec<TestSuite> {
        self.suites
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_a_case_stamps_the_owning_suite() {
        let mut suite = TestSuite::new("Profile");
        suite.case("Minimal", |_cx| Ok(()));
        assert_eq!(suite.cases()[0].full_name(), "Profile::Minimal");
    }

    #[test]
    fn case_order_is_declaration_order() {
        let mut suite = TestSuite::new("S");
        suite.case("first", |_cx| Ok(()));
        suite.case("second", |_cx| Ok(()));
        suite.case("third", |_cx| Ok(()));
        let names: Vec<&str> = suite.cases().iter().map(TestCase::name).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn registry_preserves_suite_order() {
        let mut registry = SuiteRegistry::new();
        registry.suite("B").case("one", |_cx| Ok(()));
        registry.suite("A").case("one", |_cx| Ok(()));
        let names: Vec<&str> = registry.suites().iter().map(TestSuite::name).collect();
        assert_eq!(names, ["B", "A"]);
        assert_eq!(registry.suite_count(), 2);
        assert_eq!(registry.case_count(), 2);
    }

    #[test]
    fn suite_accessor_reuses_existing_suite() {
        let mut registry = SuiteRegistry::new();
        registry.suite("S").case("one", |_cx| Ok(()));
        registry.suite("S").case("two", |_cx| Ok(()));
        assert_eq!(registry.suite_count(), 1);
        assert_eq!(registry.suites()[0].len(), 2);
    }
}
