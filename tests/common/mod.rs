//! Shared helpers for the integration suites.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use profiler_test_harness::prelude::*;

/// The helper process most trace scenarios revolve around.
pub fn helper_process() -> ProcessKey {
    ProcessKey::new("ProfileTestHelper.exe", 1234)
}

/// A snapshot resembling a short profiling session of the helper process.
pub fn helper_snapshot() -> TraceSnapshot {
    SnapshotBuilder::new("out/test.etl")
        .process("ProfileTestHelper.exe", 1234)
        .process("", 0)
        .images(1234, ["ntdll.dll", "kernel32.dll", "KernelBase.dll", "ProfileTestHelper.exe"])
        .expect("images")
        .images(0, ["afd.sys", "beep.sys", "ntfs.sys"])
        .expect("images")
        .threads(1234, [100, 101, 102])
        .expect("threads")
        .counter(CounterKind::SampledProfile, 1234, 750)
        .expect("counter")
        .build()
}

/// Observer that records the callback sequence as readable event strings.
#[derive(Default)]
pub struct CollectingObserver {
    pub events: Vec<String>,
}

impl RunObserver for CollectingObserver {
    fn on_start(&mut self, suite_count: usize, case_count: usize) {
        self.events.push(format!("start {suite_count} {case_count}"));
    }

    fn on_suite_start(&mut self, suite: &TestSuite, selected: &[String]) {
        self.events
            .push(format!("suite_start {} {}", suite.name(), selected.len()));
    }

    fn on_case_start(&mut self, case: &TestCase) {
        self.events.push(format!("case_start {}", case.full_name()));
    }

    fn on_case_end(&mut self, case: &TestCase) {
        self.events.push(format!(
            "case_end {} {}",
            case.full_name(),
            case.state().as_str()
        ));
    }

    fn on_suite_end(&mut self, suite: &TestSuite) {
        self.events.push(format!("suite_end {}", suite.name()));
    }

    fn on_end(&mut self, failed: &[&TestCase]) {
        self.events.push(format!("end {}", failed.len()));
    }
}

/// Fixture counting its setup and teardown invocations.
pub struct CountingFixture {
    pub setups: Rc<Cell<u32>>,
    pub teardowns: Rc<Cell<u32>>,
}

impl CountingFixture {
    pub fn new() -> (Self, Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let setups = Rc::new(Cell::new(0));
        let teardowns = Rc::new(Cell::new(0));
        let fixture = Self {
            setups: Rc::clone(&setups),
            teardowns: Rc::clone(&teardowns),
        };
        (fixture, setups, teardowns)
    }
}

impl Fixture for CountingFixture {
    fn setup(&mut self) -> Result<()> {
        self.setups.set(self.setups.get() + 1);
        Ok(())
    }

    fn teardown(&mut self) {
        self.teardowns.set(self.teardowns.get() + 1);
    }
}
