//! Console reporter with gtest-flavored output.

use colored::Colorize;

use crate::framework::case::{CaseState, TestCase};
use crate::framework::runner::RunObserver;
use crate::framework::suite::TestSuite;

/// Prints run progress to stdout.
pub struct ConsoleReporter {
    color: bool,
    case_total: usize,
}

impl ConsoleReporter {
    /// Build a reporter; `color` disables ANSI styling when false.
    #[must_use]
    pub const fn new(color: bool) -> Self {
        Self {
            color,
            case_total: 0,
        }
    }

    fn green(&self, text: &str) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    fn red(&self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }
}

impl RunObserver for ConsoleReporter {
    fn on_start(&mut self, suite_count: usize, case_count: usize) {
        self.case_total = case_count;
        println!("[==========] Running {case_count} case(s) from {suite_count} suite(s).");
    }

    fn on_suite_start(&mut self, suite: &TestSuite, selected: &[String]) {
        println!("[----------] {} case(s) from {}", selected.len(), suite.name());
    }

    fn on_case_start(&mut self, case: &TestCase) {
        println!("[ RUN      ] {}", case.full_name());
    }

    fn on_case_end(&mut self, case: &TestCase) {
        if case.state() == CaseState::Failed {
            for record in case.failures() {
                println!("{record}");
            }
            println!("{} {}", self.red("[  FAILED  ]"), case.full_name());
        } else {
            println!("{} {}", self.green("[       OK ]"), case.full_name());
        }
    }

    fn on_suite_end(&mut self, suite: &TestSuite) {
        println!("[----------] {} finished.", suite.name());
        println!();
    }

    fn on_end(&mut self, failed: &[&TestCase]) {
        println!("[==========] {} case(s) ran.", self.case_total);
        let passed = self.case_total - failed.len();
        println!("{} {passed} case(s).", self.green("[  PASSED  ]"));
        if !failed.is_empty() {
            println!("{} {} case(s), listed below:", self.red("[  FAILED  ]"), failed.len());
            for case in failed {
                println!("{} {}", self.red("[  FAILED  ]"), case.full_name());
            }
        }
    }
}
