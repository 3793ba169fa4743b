//! Cooperative conflict detection woven into graph accessors.
//!
//! Graphs in this crate are traversed concurrently by worker threads running
//! logically independent tasks. Before an accessor observes or mutates shared
//! node/edge state it asks an external concurrency-control collaborator, the
//! [`ConflictGuard`], whether the calling task may own the touched nodes.
//! The guard is an injected capability: the storage core never talks to a
//! global scheduler, so it stays testable in isolation.
//!
//! Acquisition either succeeds immediately or fails immediately with a
//! [`Conflict`]; nothing here blocks, retries, or rolls back. A failed
//! acquisition means the calling task must abort and be retried by whatever
//! runtime drives it.

use crate::topology::handle::NodeId;
use thiserror::Error;

/// Per-call policy selecting how strictly an accessor enforces exclusive
/// access before returning data.
///
/// The default is the strictest policy, matching the expectation that
/// speculative parallel loops opt *out* of protection rather than in.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum AcquirePolicy {
    /// No conflict detection; the caller guarantees isolation. Useful for
    /// single-threaded phases or already-partitioned work.
    None,
    /// Acquire the target node before reading; writes are not permitted.
    Read,
    /// Acquire the target node; payload writes are permitted afterwards.
    Write,
    /// Acquire the target node and, for edge-range iteration, every
    /// destination reachable from it.
    #[default]
    Neighbors,
}

impl AcquirePolicy {
    /// Whether the accessor must consult the guard at all.
    #[inline]
    pub fn should_lock(self) -> bool {
        !matches!(self, AcquirePolicy::None)
    }

    /// Whether edge-range iteration must also acquire every destination.
    #[inline]
    pub fn lock_neighbors(self) -> bool {
        matches!(self, AcquirePolicy::Neighbors)
    }

    /// Whether payload mutation is allowed under this policy.
    #[inline]
    pub fn permits_write(self) -> bool {
        !matches!(self, AcquirePolicy::Read)
    }
}

/// Signal that a node needed by the calling task is owned by another task.
///
/// Not a fatal error: the enclosing runtime is expected to abort the task,
/// release whatever it acquired, and retry it later. The core never retries
/// internally.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("node {node} is owned by another task")]
pub struct Conflict {
    /// The contended node.
    pub node: NodeId,
}

/// Injected concurrency-control capability.
///
/// `try_acquire` must be reentrant for the calling task: acquiring a node the
/// task already owns succeeds. Everything else (spinning, fairness, abort
/// bookkeeping) is up to the implementation's own contract.
pub trait ConflictGuard {
    /// Attempt to take ownership of `node` for the calling task.
    fn try_acquire(&self, node: NodeId) -> bool;
}

/// Guard that always succeeds. The moral equivalent of [`AcquirePolicy::None`]
/// for call sites that still want to pass a guard.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unguarded;

impl ConflictGuard for Unguarded {
    #[inline]
    fn try_acquire(&self, _node: NodeId) -> bool {
        true
    }
}

/// Sharded node-ownership table: a reference [`ConflictGuard`] backend.
///
/// Maps each acquired node to the numeric id of the task owning it. Intended
/// for runtimes without their own lock manager and for tests; a real
/// scheduler can implement [`ConflictGuard`] directly against its own lock
/// records.
#[derive(Debug, Default)]
pub struct OwnerTable {
    owners: dashmap::DashMap<NodeId, u64>,
}

impl OwnerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A guard bound to `task`. Acquisitions through it are reentrant for
    /// that task and conflict with every other task.
    pub fn handle(&self, task: u64) -> TaskHandle<'_> {
        TaskHandle { table: self, task }
    }

    /// Current owner of `node`, if any.
    pub fn owner(&self, node: NodeId) -> Option<u64> {
        self.owners.get(&node).map(|r| *r)
    }

    /// Release everything `task` owns. Called by the runtime on task commit
    /// or abort; the core never calls it.
    pub fn release_all(&self, task: u64) {
        self.owners.retain(|_, t| *t != task);
    }

    /// Number of currently owned nodes.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Per-task view of an [`OwnerTable`].
#[derive(Debug, Clone, Copy)]
pub struct TaskHandle<'a> {
    table: &'a OwnerTable,
    task: u64,
}

impl ConflictGuard for TaskHandle<'_> {
    fn try_acquire(&self, node: NodeId) -> bool {
        use dashmap::mapref::entry::Entry;
        match self.table.owners.entry(node) {
            Entry::Occupied(e) => *e.get() == self.task,
            Entry::Vacant(v) => {
                v.insert(self.task);
                true
            }
        }
    }
}

/// Acquire a single node under `policy`, or signal a conflict.
#[inline]
pub(crate) fn acquire_node(
    guard: &impl ConflictGuard,
    policy: AcquirePolicy,
    node: NodeId,
) -> Result<(), Conflict> {
    if policy.should_lock() && !guard.try_acquire(node) {
        return Err(Conflict { node });
    }
    Ok(())
}
