//! Debounced, de-duplicated durable view recording.
//!
//! Lifecycle of an entry in `pending`: inserted on `Enter` of an uncommitted
//! item, removed on `Exit`, on commit, or on teardown. `committed` only ever
//! grows for the lifetime of the session.

use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::Instant;

use super::model::{ItemId, UserId};

/// Default continuous visibility required before a view is recorded.
pub const DEFAULT_VIEW_COMMIT_DELAY: Duration = Duration::from_millis(3000);

pub struct ViewCommitScheduler {
    viewer: UserId,
    delay: Duration,
    pending: HashMap<ItemId, Instant>,
    committed: HashSet<(ItemId, UserId)>,
}

impl ViewCommitScheduler {
    pub fn new(viewer: UserId, delay: Duration) -> Self {
        Self {
            viewer,
            delay,
            pending: HashMap::new(),
            committed: HashSet::new(),
        }
    }

    /// Start the debounce timer unless the item is already committed or
    /// already counting. Returns true if a new timer was started.
    pub fn on_enter(&mut self, item: &ItemId, now: Instant) -> bool {
        if self.is_committed(item) || self.pending.contains_key(item) {
            return false;
        }
        self.pending.insert(item.clone(), now + self.delay);
        true
    }

    /// Cancel the item's timer. A later `Enter` starts over from zero.
    pub fn on_exit(&mut self, item: &ItemId) -> bool {
        let cancelled = self.pending.remove(item).is_some();
        if cancelled {
            tracing::debug!(item_id = %item, "View timer cancelled before threshold");
        }
        cancelled
    }

    /// Drop every pending timer (feed reset). Commits are kept.
    pub fn teardown_all(&mut self) {
        self.pending.clear();
    }

    /// Collect every timer that has fired by `now` and mark those items
    /// committed in the same step, so no item can be returned twice.
    pub fn take_due(&mut self, now: Instant) -> Vec<ItemId> {
        let mut due: Vec<(Instant, ItemId)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, deadline)| (*deadline, id.clone()))
            .collect();
        due.sort();

        due.into_iter()
            .filter_map(|(_, id)| {
                self.pending.remove(&id);
                // check-then-set on the commit set
                self.committed
                    .insert((id.clone(), self.viewer.clone()))
                    .then_some(id)
            })
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    pub fn is_committed(&self, item: &ItemId) -> bool {
        self.committed.contains(&(item.clone(), self.viewer.clone()))
    }

    pub fn is_pending(&self, item: &ItemId) -> bool {
        self.pending.contains_key(item)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn committed_count(&self) -> usize {
        self.committed.len()
    }
}
