//! Observed trace snapshots: the immutable data predicates evaluate against.
//!
//! A snapshot is the structured summary an external dumper tool produces from
//! one trace artifact. Every per-process container distinguishes "no entry for
//! this process" from "an entry holding zero"; predicates decide what absence
//! means, the snapshot only reports it faithfully via `Option`.

use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::errors::{HarnessError, Result};
use crate::trace::ids::{EventId, ProviderId};

/// Process identity: image name plus numeric id. The name is compared and
/// hashed case-insensitively, matching how trace tooling reports it.
#[derive(Debug, Clone)]
pub struct ProcessKey {
    image_name: String,
    pid: u32,
}

impl ProcessKey {
    /// Build a process identity.
    #[must_use]
    pub fn new(image_name: impl Into<String>, pid: u32) -> Self {
        Self {
            image_name: image_name.into(),
            pid,
        }
    }

    /// Image name as reported, original casing preserved.
    #[must_use]
    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    /// Numeric process id.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }
}

impl PartialEq for ProcessKey {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid && self.image_name.eq_ignore_ascii_case(&other.image_name)
    }
}

impl Eq for ProcessKey {}

impl Hash for ProcessKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.image_name.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u32(self.pid);
    }
}

impl std::fmt::Display for ProcessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" (pid {})", self.image_name, self.pid)
    }
}

/// Which per-process scalar counter a predicate targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    /// Sampled-profile interrupt count.
    SampledProfile,
    /// Context-switch count.
    ContextSwitch,
    /// Ready-thread count.
    ReadyThread,
}

impl CounterKind {
    /// Human label used in explanations.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::SampledProfile => "sampled profile",
            Self::ContextSwitch => "context switch",
            Self::ReadyThread => "ready thread",
        }
    }
}

type KeyedCounts = HashMap<(ProviderId, EventId), u64>;

/// Immutable summary of one trace artifact.
#[derive(Debug, Clone, Default)]
pub struct TraceSnapshot {
    etl_path: PathBuf,
    processes_by_pid: HashMap<u32, ProcessKey>,
    images: HashMap<ProcessKey, Vec<String>>,
    threads: HashMap<ProcessKey, Vec<u32>>,
    sampled_profile: HashMap<ProcessKey, u64>,
    context_switch: HashMap<ProcessKey, u64>,
    ready_thread: HashMap<ProcessKey, u64>,
    stack_counts: HashMap<ProcessKey, KeyedCounts>,
    event_counts: HashMap<ProcessKey, KeyedCounts>,
}

impl TraceSnapshot {
    /// Parse a dumper JSON document.
    pub fn from_dump_str(json: &str) -> Result<Self> {
        let doc: DumpDoc = serde_json::from_str(json)?;
        doc.into_snapshot()
    }

    /// Read and parse a dumper JSON file.
    pub fn from_dump_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| HarnessError::io(path, source))?;
        Self::from_dump_str(&raw)
    }

    /// Path of the trace artifact this snapshot summarizes.
    #[must_use]
    pub fn etl_path(&self) -> &Path {
        &self.etl_path
    }

    /// All processes observed in the trace, in no particular order.
    pub fn processes(&self) -> impl Iterator<Item = &ProcessKey> {
        self.processes_by_pid.values()
    }

    /// Number of observed processes.
    #[must_use]
    pub fn process_count(&self) -> usize {
        self.processes_by_pid.len()
    }

    /// Loaded-image names for a process. `None` means the trace holds no
    /// image list for it at all.
    #[must_use]
    pub fn images(&self, process: &ProcessKey) -> Option<&[String]> {
        self.images.get(process).map(Vec::as_slice)
    }

    /// Thread ids for a process. `None` means no thread entry exists.
    #[must_use]
    pub fn threads(&self, process: &ProcessKey) -> Option<&[u32]> {
        self.threads.get(process).map(Vec::as_slice)
    }

    /// Scalar counter value for a process. `None` means the container has no
    /// entry for the process, which is distinct from a stored zero.
    #[must_use]
    pub fn scalar_count(&self, kind: CounterKind, process: &ProcessKey) -> Option<u64> {
        self.scalar_container(kind).get(process).copied()
    }

    /// Per-(provider, event) stack counts for a process.
    #[must_use]
    pub fn stack_counts(&self, process: &ProcessKey) -> Option<&KeyedCounts> {
        self.stack_counts.get(process)
    }

    /// Per-(provider, event) general event counts for a process.
    #[must_use]
    pub fn event_counts(&self, process: &ProcessKey) -> Option<&KeyedCounts> {
        self.event_counts.get(process)
    }

    fn scalar_container(&self, kind: CounterKind) -> &HashMap<ProcessKey, u64> {
        match kind {
            CounterKind::SampledProfile => &self.sampled_profile,
            CounterKind::ContextSwitch => &self.context_switch,
            CounterKind::ReadyThread => &self.ready_thread,
        }
    }
}

/// Builder for in-memory snapshots. Sections reference processes by pid and
/// must name a previously added process, mirroring the ingestion contract.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshot: TraceSnapshot,
}

impl SnapshotBuilder {
    /// Start a snapshot for the given artifact path.
    #[must_use]
    pub fn new(etl_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot: TraceSnapshot {
                etl_path: etl_path.into(),
                ..TraceSnapshot::default()
            },
        }
    }

    /// Add an observed process.
    #[must_use]
    pub fn process(mut self, image_name: impl Into<String>, pid: u32) -> Self {
        let key = ProcessKey::new(image_name, pid);
        self.snapshot.processes_by_pid.insert(pid, key);
        self
    }

    /// Attach an image list to a process.
    pub fn images<I, S>(mut self, pid: u32, images: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = self.resolve(pid, "imageLists")?;
        self.snapshot
            .images
            .insert(key, images.into_iter().map(Into::into).collect());
        Ok(self)
    }

    /// Attach a thread list to a process.
    pub fn threads(mut self, pid: u32, tids: impl IntoIterator<Item = u32>) -> Result<Self> {
        let key = self.resolve(pid, "threadLists")?;
        self.snapshot.threads.insert(key, tids.into_iter().collect());
        Ok(self)
    }

    /// Store a scalar counter value for a process.
    pub fn counter(mut self, kind: CounterKind, pid: u32, count: u64) -> Result<Self> {
        let section = match kind {
            CounterKind::SampledProfile => "sampledProfileCounts",
            CounterKind::ContextSwitch => "contextSwitchCounts",
            CounterKind::ReadyThread => "readyThreadCounts",
        };
        let key = self.resolve(pid, section)?;
        let container = match kind {
            CounterKind::SampledProfile => &mut self.snapshot.sampled_profile,
            CounterKind::ContextSwitch => &mut self.snapshot.context_switch,
            CounterKind::ReadyThread => &mut self.snapshot.ready_thread,
        };
        container.insert(key, count);
        Ok(self)
    }

    /// Store one stack count for a (provider, event) pair of a process.
    pub fn stack_count(
        mut self,
        pid: u32,
        provider: ProviderId,
        event: EventId,
        count: u64,
    ) -> Result<Self> {
        let key = self.resolve(pid, "stackCounts")?;
        self.snapshot
            .stack_counts
            .entry(key)
            .or_default()
            .insert((provider, event), count);
        Ok(self)
    }

    /// Store one general event count for a (provider, event) pair of a process.
    pub fn event_count(
        mut self,
        pid: u32,
        provider: ProviderId,
        event: EventId,
        count: u64,
    ) -> Result<Self> {
        let key = self.resolve(pid, "generalEventCounts")?;
        self.snapshot
            .event_counts
            .entry(key)
            .or_default()
            .insert((provider, event), count);
        Ok(self)
    }

    /// Finish the snapshot.
    #[must_use]
    pub fn build(self) -> TraceSnapshot {
        self.snapshot
    }

    fn resolve(&self, pid: u32, section: &'static str) -> Result<ProcessKey> {
        self.snapshot
            .processes_by_pid
            .get(&pid)
            .cloned()
            .ok_or(HarnessError::UnknownPid { section, pid })
    }
}

// Raw serde model of the dumper's JSON document. Field names follow the
// dumper's camelCase wire format.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DumpDoc {
    etl_path: PathBuf,
    data: DumpData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DumpData {
    #[serde(default)]
    process_list: Vec<DumpProcess>,
    #[serde(default)]
    image_lists: Vec<DumpImageList>,
    #[serde(default)]
    thread_lists: Vec<DumpThreadList>,
    #[serde(default)]
    sampled_profile_counts: Vec<DumpScalarCount>,
    #[serde(default)]
    context_switch_counts: Vec<DumpScalarCount>,
    #[serde(default)]
    ready_thread_counts: Vec<DumpScalarCount>,
    #[serde(default)]
    stack_counts: Vec<DumpStackCounts>,
    #[serde(default)]
    general_event_counts: Vec<DumpEventCounts>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DumpProcess {
    image_name: String,
    pid: u32,
}

#[derive(Debug, Deserialize)]
struct DumpProcessRef {
    pid: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DumpImageList {
    process: DumpProcessRef,
    image_list: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DumpThreadList {
    process: DumpProcessRef,
    thread_list: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct DumpScalarCount {
    process: DumpProcessRef,
    count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DumpStackCounts {
    process: DumpProcessRef,
    stack_counts_by_provider_and_id: Vec<DumpKeyedCount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DumpEventCounts {
    process: DumpProcessRef,
    general_event_counts_by_provider_and_id: Vec<DumpKeyedCount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DumpKeyedCount {
    provider_id: ProviderId,
    event_id: EventId,
    count: u64,
}

impl DumpDoc {
    fn into_snapshot(self) -> Result<TraceSnapshot> {
        let mut builder = SnapshotBuilder::new(self.etl_path);
        for process in self.data.process_list {
            builder = builder.process(process.image_name, process.pid);
        }
        for list in self.data.image_lists {
            builder = builder.images(list.process.pid, list.image_list)?;
        }
        for list in self.data.thread_lists {
            builder = builder.threads(list.process.pid, list.thread_list)?;
        }
        for entry in self.data.sampled_profile_counts {
            builder = builder.counter(CounterKind::SampledProfile, entry.process.pid, entry.count)?;
        }
        for entry in self.data.context_switch_counts {
            builder = builder.counter(CounterKind::ContextSwitch, entry.process.pid, entry.count)?;
        }
        for entry in self.data.ready_thread_counts {
            builder = builder.counter(CounterKind::ReadyThread, entry.process.pid, entry.count)?;
        }
        for section in self.data.stack_counts {
            let pid = section.process.pid;
            // An empty keyed section never touches the builder, so the pid
            // must be resolved up front.
            builder.resolve(pid, "stackCounts")?;
            for keyed in section.stack_counts_by_provider_and_id {
                builder =
                    builder.stack_count(pid, keyed.provider_id, keyed.event_id, keyed.count)?;
            }
        }
        for section in self.data.general_event_counts {
            let pid = section.process.pid;
            builder.resolve(pid, "generalEventCounts")?;
            for keyed in section.general_event_counts_by_provider_and_id {
                builder =
                    builder.event_count(pid, keyed.provider_id, keyed.event_id, keyed.count)?;
            }
        }
        Ok(builder.build())
    }
}
