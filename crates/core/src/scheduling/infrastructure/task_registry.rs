use std::collections::BTreeMap;

use crate::scheduling::domain::blur_task::TaskId;
use crate::scheduling::domain::tracking_policy::TrackingPolicy;
use crate::shared::cancel_token::CancelToken;

/// In-flight asynchronous tasks of one invoker, keyed by task identity.
///
/// Entries are removed deterministically: on delivery, on failure, or when
/// cancelled. A cancelled entry is removed in the same call that cancels it,
/// so a tracked entry is always a live one.
///
/// The owner guards the registry with a single mutex. The lock is held only
/// for these map operations, never while blurring or delivering.
#[derive(Debug)]
pub struct TaskRegistry {
    policy: TrackingPolicy,
    slots: BTreeMap<TaskId, CancelToken>,
}

impl TaskRegistry {
    pub fn new(policy: TrackingPolicy) -> Self {
        Self {
            policy,
            slots: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> TrackingPolicy {
        self.policy
    }

    /// Tracks a newly submitted task. Under [`TrackingPolicy::Single`] every
    /// previously tracked task is cancelled and dropped first. Returns how
    /// many tasks were replaced.
    pub fn register(&mut self, id: TaskId, token: CancelToken) -> usize {
        let replaced = match self.policy {
            TrackingPolicy::Single => self.cancel_all(),
            TrackingPolicy::Multi => 0,
        };
        self.slots.insert(id, token);
        replaced
    }

    /// Cancels and drops every tracked task. Returns how many there were.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.slots.len();
        for token in self.slots.values() {
            token.cancel();
        }
        self.slots.clear();
        count
    }

    /// Drops a finished task. Returns whether it was still tracked, i.e. not
    /// cancelled in the meantime.
    pub fn complete(&mut self, id: TaskId) -> bool {
        self.slots.remove(&id).is_some()
    }

    pub fn is_tracked(&self, id: TaskId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
