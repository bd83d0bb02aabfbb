//! Predicates over trace snapshots.
//!
//! Every predicate is a pure boolean check with a stored explanation. The
//! explanation describes *why* the verdict holds, for both outcomes, because
//! positive verdicts are logged for diagnostics too. Evaluation never errors
//! and is idempotent for a fixed snapshot.
//!
//! Absence rule shared by all counter predicates: a missing entry may only
//! stand in for zero when the comparison admits equality and the expected
//! value is exactly zero. Every other combination treats absence as a hard
//! miss.

use std::collections::{BTreeMap, HashSet};

use crate::trace::ids::{
    EventId, MB_A, MB_B, PERF_INFO, PERF_INFO_SAMPLED_PROFILE, ProviderId, TL_A, TL_B,
};
use crate::trace::operator::CompareOp;
use crate::trace::snapshot::{CounterKind, ProcessKey, TraceSnapshot};

/// A check against an observed snapshot.
pub trait TracePredicate {
    /// Short name used when a failed predicate is escalated to a case failure.
    fn name(&self) -> &'static str;

    /// Evaluate against a snapshot, storing the explanation as a side effect.
    fn evaluate(&mut self, snapshot: &TraceSnapshot) -> bool;

    /// Explanation for the most recent verdict. Empty before any evaluation.
    fn explain(&self) -> &str;
}

/// True iff the observed process set equals the expected one, compared as an
/// unordered set with case-insensitive image names.
pub struct ProcessSetMatch {
    expected: Vec<ProcessKey>,
    explanation: String,
}

impl ProcessSetMatch {
    /// Expect exactly these processes.
    #[must_use]
    pub fn new(expected: impl IntoIterator<Item = ProcessKey>) -> Self {
        Self {
            expected: expected.into_iter().collect(),
            explanation: String::new(),
        }
    }
}

impl TracePredicate for ProcessSetMatch {
    fn name(&self) -> &'static str {
        "process set match"
    }

    fn evaluate(&mut self, snapshot: &TraceSnapshot) -> bool {
        let expected: HashSet<&ProcessKey> = self.expected.iter().collect();
        let observed: HashSet<&ProcessKey> = snapshot.processes().collect();
        if expected == observed {
            self.explanation =
                "The observed process set is equivalent to the expected one.".to_string();
            true
        } else {
            self.explanation = format!(
                "The observed process set is not equivalent to the expected one.\n\tExpected: {}\n\tObserved: {}",
                format_process_set(&self.expected),
                format_process_set(&snapshot.processes().cloned().collect::<Vec<_>>()),
            );
            false
        }
    }

    fn explain(&self) -> &str {
        &self.explanation
    }
}

fn format_process_set(processes: &[ProcessKey]) -> String {
    let mut sorted: Vec<&ProcessKey> = processes.iter().collect();
    sorted.sort_by(|a, b| {
        let name_a = a.image_name().to_ascii_lowercase();
        let name_b = b.image_name().to_ascii_lowercase();
        (name_a, a.pid()).cmp(&(name_b, b.pid()))
    });
    let rendered: Vec<String> = sorted.iter().map(ToString::to_string).collect();
    format!("{{{}}}", rendered.join(", "))
}

/// True iff every expected image is present in the snapshot's image list for
/// one process. A process with no image list at all fails outright.
pub struct ImageSubset {
    process: ProcessKey,
    images: Vec<String>,
    explanation: String,
}

impl ImageSubset {
    /// Expect `images` (case-insensitive) to be loaded in `process`.
    #[must_use]
    pub fn new(process: ProcessKey, images: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            process,
            images: images.into_iter().map(Into::into).collect(),
            explanation: String::new(),
        }
    }
}

impl TracePredicate for ImageSubset {
    fn name(&self) -> &'static str {
        "image subset"
    }

    fn evaluate(&mut self, snapshot: &TraceSnapshot) -> bool {
        let Some(observed) = snapshot.images(&self.process) else {
            self.explanation = format!("No images are associated with {}", self.process);
            return false;
        };

        let missing: Vec<&String> = self
            .images
            .iter()
            .filter(|expected| !observed.iter().any(|o| o.eq_ignore_ascii_case(expected)))
            .collect();

        if missing.is_empty() {
            self.explanation = format!(
                "The expected image list is a subset of the observed one for {}.",
                self.process
            );
            true
        } else {
            let missing: Vec<&str> = missing.iter().map(|s| s.as_str()).collect();
            self.explanation = format!(
                "The expected image list is not a subset of the observed one for {}.\n\tMissing: {}\n\tObserved: {}",
                self.process,
                missing.join(", "),
                observed.join(", "),
            );
            false
        }
    }

    fn explain(&self) -> &str {
        &self.explanation
    }
}

/// True iff the snapshot's thread count for a process meets a minimum. A
/// process with no thread entry fails outright.
pub struct ThreadCountAtLeast {
    process: ProcessKey,
    minimum: usize,
    explanation: String,
}

impl ThreadCountAtLeast {
    /// Expect at least `minimum` threads for `process`.
    #[must_use]
    pub fn new(process: ProcessKey, minimum: usize) -> Self {
        Self {
            process,
            minimum,
            explanation: String::new(),
        }
    }
}

impl TracePredicate for ThreadCountAtLeast {
    fn name(&self) -> &'static str {
        "thread count"
    }

    fn evaluate(&mut self, snapshot: &TraceSnapshot) -> bool {
        let Some(threads) = snapshot.threads(&self.process) else {
            self.explanation = format!("No threads are associated with {}", self.process);
            return false;
        };

        if threads.len() >= self.minimum {
            self.explanation = format!(
                "The thread count for {} was >= the expected minimum.",
                self.process
            );
            true
        } else {
            self.explanation = format!(
                "The thread count for {} was < the expected minimum.\n\tObserved: {}\n\tMinimum: {}",
                self.process,
                threads.len(),
                self.minimum,
            );
            false
        }
    }

    fn explain(&self) -> &str {
        &self.explanation
    }
}

/// Compares one named scalar counter of a process against an expected value.
pub struct CounterCompare {
    kind: CounterKind,
    process: ProcessKey,
    op: CompareOp,
    expected: u64,
    explanation: String,
}

impl CounterCompare {
    /// General form: `observed <op> expected` for the given counter.
    #[must_use]
    pub fn new(kind: CounterKind, process: ProcessKey, op: CompareOp, expected: u64) -> Self {
        Self {
            kind,
            process,
            op,
            expected,
            explanation: String::new(),
        }
    }

    /// Sampled-profile count at least `minimum`.
    #[must_use]
    pub fn sampled_profile_at_least(process: ProcessKey, minimum: u64) -> Self {
        Self::new(CounterKind::SampledProfile, process, CompareOp::Ge, minimum)
    }

    /// Context-switch count at least `minimum`.
    #[must_use]
    pub fn context_switch_at_least(process: ProcessKey, minimum: u64) -> Self {
        Self::new(CounterKind::ContextSwitch, process, CompareOp::Ge, minimum)
    }

    /// Ready-thread count at least `minimum`.
    #[must_use]
    pub fn ready_thread_at_least(process: ProcessKey, minimum: u64) -> Self {
        Self::new(CounterKind::ReadyThread, process, CompareOp::Ge, minimum)
    }

    /// Exactly zero context switches. Vacuously satisfied when the process
    /// has no context-switch entry at all.
    #[must_use]
    pub fn zero_context_switches(process: ProcessKey) -> Self {
        Self::new(CounterKind::ContextSwitch, process, CompareOp::Eq, 0)
    }

    /// Exactly zero ready-thread events.
    #[must_use]
    pub fn zero_ready_threads(process: ProcessKey) -> Self {
        Self::new(CounterKind::ReadyThread, process, CompareOp::Eq, 0)
    }
}

impl TracePredicate for CounterCompare {
    fn name(&self) -> &'static str {
        match self.kind {
            CounterKind::SampledProfile => "sampled profile count",
            CounterKind::ContextSwitch => "context switch count",
            CounterKind::ReadyThread => "ready thread count",
        }
    }

    fn evaluate(&mut self, snapshot: &TraceSnapshot) -> bool {
        let description = self.kind.description();
        match snapshot.scalar_count(self.kind, &self.process) {
            None => {
                if self.op.has_equality() && self.expected == 0 {
                    self.explanation = format!(
                        "Even though no {description} count is associated with {}, the expected value was zero",
                        self.process
                    );
                    true
                } else {
                    self.explanation = format!(
                        "No {description} count is associated with {}",
                        self.process
                    );
                    false
                }
            }
            Some(observed) => {
                if self.op.apply(observed, self.expected) {
                    self.explanation = format!(
                        "The {description} count for {} was {} to/than the expected value.",
                        self.process, self.op
                    );
                    true
                } else {
                    self.explanation = format!(
                        "The {description} count for {} was {} to/than the expected value.\n\tObserved: {observed}\n\tExpected: {}",
                        self.process,
                        self.op.inverse(),
                        self.expected,
                    );
                    false
                }
            }
        }
    }

    fn explain(&self) -> &str {
        &self.explanation
    }
}

/// Per-(provider, event) stack-count minimums for one process.
///
/// Closed-world by default: stack events observed for any (provider, event)
/// pair outside the expected key set fail the predicate. [`Self::open_world`]
/// relaxes that to a pure at-least check.
pub struct StackCountAtLeast {
    process: ProcessKey,
    expected: BTreeMap<(ProviderId, EventId), u64>,
    closed_world: bool,
    explanation: String,
}

impl StackCountAtLeast {
    /// Expect at least the given count for each (provider, event) key.
    #[must_use]
    pub fn new(
        process: ProcessKey,
        expected: impl IntoIterator<Item = ((ProviderId, EventId), u64)>,
    ) -> Self {
        Self {
            process,
            expected: expected.into_iter().collect(),
            closed_world: true,
            explanation: String::new(),
        }
    }

    /// Tolerate stack events outside the expected key set.
    #[must_use]
    pub fn open_world(mut self) -> Self {
        self.closed_world = false;
        self
    }
}

impl TracePredicate for StackCountAtLeast {
    fn name(&self) -> &'static str {
        "stack count"
    }

    fn evaluate(&mut self, snapshot: &TraceSnapshot) -> bool {
        let Some(observed) = snapshot.stack_counts(&self.process) else {
            return if self.expected.values().all(|&minimum| minimum == 0) {
                self.explanation = format!(
                    "Even though no stack events are associated with {}, all expected minimums were zero",
                    self.process
                );
                true
            } else {
                self.explanation =
                    format!("No stack events are associated with {}", self.process);
                false
            };
        };

        if self.closed_world {
            let mut observed_keys: Vec<&(ProviderId, EventId)> = observed.keys().collect();
            observed_keys.sort();
            for &(provider, event) in observed_keys {
                if self.expected.contains_key(&(provider, event)) {
                    continue;
                }
                let provider_expected =
                    self.expected.keys().any(|(expected, _)| *expected == provider);
                self.explanation = if provider_expected {
                    format!(
                        "Unexpected stack events found for event id {event} of provider \"{provider}\""
                    )
                } else {
                    format!("Unexpected stack events found for provider \"{provider}\"")
                };
                return false;
            }
        }

        for (&(provider, event), &minimum) in &self.expected {
            match observed.get(&(provider, event)) {
                None if minimum == 0 => {}
                None => {
                    self.explanation = format!(
                        "No stack events are associated with event id {event} of provider \"{provider}\" for {}",
                        self.process
                    );
                    return false;
                }
                Some(&count) if count < minimum => {
                    self.explanation = format!(
                        "The stack event count for provider \"{provider}\" and event id {event} was < the expected minimum.\n\tObserved: {count}\n\tMinimum: {minimum}"
                    );
                    return false;
                }
                Some(_) => {}
            }
        }

        self.explanation =
            "The stack event counts for every expected provider and event id were >= the expected minimums."
                .to_string();
        true
    }

    fn explain(&self) -> &str {
        &self.explanation
    }
}

/// Per-(provider, event) general event counts for one process, each checked
/// with its own operator. Open-world: keys outside the expected set are
/// ignored.
pub struct EventCountSubset {
    process: ProcessKey,
    expected: BTreeMap<(ProviderId, EventId), (CompareOp, u64)>,
    explanation: String,
}

impl EventCountSubset {
    /// Expect `observed <op> value` for each (provider, event) key.
    #[must_use]
    pub fn new(
        process: ProcessKey,
        expected: impl IntoIterator<Item = ((ProviderId, EventId), (CompareOp, u64))>,
    ) -> Self {
        Self {
            process,
            expected: expected.into_iter().collect(),
            explanation: String::new(),
        }
    }
}

impl TracePredicate for EventCountSubset {
    fn name(&self) -> &'static str {
        "event count"
    }

    fn evaluate(&mut self, snapshot: &TraceSnapshot) -> bool {
        let Some(observed) = snapshot.event_counts(&self.process) else {
            let all_vacuous = self
                .expected
                .values()
                .all(|&(op, value)| op.has_equality() && value == 0);
            return if all_vacuous {
                self.explanation = format!(
                    "Even though no events are associated with {}, all expected values were zero",
                    self.process
                );
                true
            } else {
                self.explanation = format!("No events are associated with {}", self.process);
                false
            };
        };

        for (&(provider, event), &(op, expected)) in &self.expected {
            match observed.get(&(provider, event)) {
                None if op.has_equality() && expected == 0 => {}
                None => {
                    self.explanation = format!(
                        "No events are associated with event id {event} of provider \"{provider}\" for {}",
                        self.process
                    );
                    return false;
                }
                Some(&count) => {
                    if !op.apply(count, expected) {
                        self.explanation = format!(
                            "The event count for provider \"{provider}\" and event id {event} was {} to/than the expected value.\n\tObserved: {count}\n\tExpected: {expected}",
                            op.inverse()
                        );
                        return false;
                    }
                }
            }
        }

        self.explanation =
            "The event counts for every expected provider and event id were in line with the expected values."
                .to_string();
        true
    }

    fn explain(&self) -> &str {
        &self.explanation
    }
}

/// The pseudo-process traces attribute kernel driver images and unattributed
/// activity to.
#[must_use]
pub fn unknown_process() -> ProcessKey {
    ProcessKey::new("", 0)
}

/// Expected counts covering every event of the four test user providers,
/// all compared with `=` against the same value.
#[must_use]
pub fn uniform_user_provider_counts(
    count: u64,
) -> BTreeMap<(ProviderId, EventId), (CompareOp, u64)> {
    let mut expected = BTreeMap::new();
    for provider in [MB_A, MB_B] {
        for event in 0..=2 {
            expected.insert((provider, event), (CompareOp::Eq, count));
        }
    }
    for provider in [TL_A, TL_B] {
        for event in 0..=1 {
            expected.insert((provider, event), (CompareOp::Eq, count));
        }
    }
    expected
}

/// Expected counts asserting that no test user provider emitted anything.
#[must_use]
pub fn empty_user_provider_counts() -> BTreeMap<(ProviderId, EventId), (CompareOp, u64)> {
    uniform_user_provider_counts(0)
}

/// The predicate bundle most trace-content checks start from: driver images
/// under the unknown process, an exact process set, and per-target image,
/// thread, sampled-profile, and stack-count checks. The default minimums are
/// empiric values that hold for any non-trivial profiling session.
#[must_use]
pub fn basic_trace_content_predicates(
    targets: &[ProcessKey],
    thread_count_min: usize,
    sampled_profile_min: u64,
) -> Vec<Box<dyn TracePredicate>> {
    let mut predicates: Vec<Box<dyn TracePredicate>> = Vec::new();

    predicates.push(Box::new(ImageSubset::new(
        unknown_process(),
        ["afd.sys", "beep.sys", "ntfs.sys"],
    )));

    let mut all_processes = vec![unknown_process()];
    all_processes.extend(targets.iter().cloned());
    predicates.push(Box::new(ProcessSetMatch::new(all_processes)));

    for target in targets {
        let images = [
            "ntdll.dll".to_string(),
            "kernel32.dll".to_string(),
            "kernelbase.dll".to_string(),
            target.image_name().to_string(),
        ];
        predicates.push(Box::new(ImageSubset::new(target.clone(), images)));
        predicates.push(Box::new(ThreadCountAtLeast::new(
            target.clone(),
            thread_count_min,
        )));
        predicates.push(Box::new(CounterCompare::sampled_profile_at_least(
            target.clone(),
            sampled_profile_min,
        )));
        // Sampled profiles should come with call stacks.
        predicates.push(Box::new(StackCountAtLeast::new(
            target.clone(),
            [((PERF_INFO, PERF_INFO_SAMPLED_PROFILE), sampled_profile_min)],
        )));
    }

    predicates
}
