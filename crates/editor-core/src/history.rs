//! Snapshot-based undo/redo.
//!
//! Each entry is the full RTF serialization of the document at one point in
//! time. `last_saved` is the snapshot of the live document; it moves onto
//! the undo stack when a new, different snapshot is recorded.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::trace;

pub type Snapshot = Arc<str>;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct EditHistory {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    last_saved: Snapshot,
    replaying: bool,
    capacity: usize,
}

impl EditHistory {
    pub fn new(initial: impl Into<Snapshot>, capacity: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            last_saved: initial.into(),
            replaying: false,
            capacity: capacity.max(1),
        }
    }

    pub fn current(&self) -> &Snapshot {
        &self.last_saved
    }

    /// Records the live document after a user edit. Returns false when
    /// nothing was pushed: the snapshot is unchanged, or a replay is running.
    pub fn record(&mut self, current: impl Into<Snapshot>) -> bool {
        if self.replaying {
            trace!("ignoring snapshot recorded during replay");
            return false;
        }
        let current = current.into();
        if current == self.last_saved {
            return false;
        }

        let previous = std::mem::replace(&mut self.last_saved, current);
        self.undo.push_back(previous);
        self.redo.clear();
        self.evict_overflow();
        trace!(undo = self.undo.len(), "recorded snapshot");
        true
    }

    /// The snapshot [`commit_undo`](Self::commit_undo) would restore.
    pub fn peek_undo(&self) -> Option<&Snapshot> {
        self.undo.back()
    }

    pub fn peek_redo(&self) -> Option<&Snapshot> {
        self.redo.last()
    }

    /// Pops the newest undo entry, parking `current` on the redo stack.
    pub fn commit_undo(&mut self, current: impl Into<Snapshot>) -> Option<Snapshot> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current.into());
        self.last_saved = previous.clone();
        Some(previous)
    }

    pub fn commit_redo(&mut self, current: impl Into<Snapshot>) -> Option<Snapshot> {
        let next = self.redo.pop()?;
        self.undo.push_back(current.into());
        self.evict_overflow();
        self.last_saved = next.clone();
        Some(next)
    }

    /// Forgets everything and starts over from `initial`.
    pub fn reset(&mut self, initial: impl Into<Snapshot>) {
        self.undo.clear();
        self.redo.clear();
        self.last_saved = initial.into();
        self.replaying = false;
    }

    /// Marks a replay until the guard drops; [`record`](Self::record) is a
    /// no-op meanwhile.
    pub fn begin_replay(&mut self) -> ReplayGuard<'_> {
        self.replaying = true;
        ReplayGuard { history: self }
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict_overflow(&mut self) {
        while self.undo.len() > self.capacity {
            self.undo.pop_front();
            trace!(capacity = self.capacity, "evicted oldest undo snapshot");
        }
    }
}

pub struct ReplayGuard<'a> {
    history: &'a mut EditHistory,
}

impl Deref for ReplayGuard<'_> {
    type Target = EditHistory;

    fn deref(&self) -> &EditHistory {
        self.history
    }
}

impl DerefMut for ReplayGuard<'_> {
    fn deref_mut(&mut self) -> &mut EditHistory {
        self.history
    }
}

impl Drop for ReplayGuard<'_> {
    fn drop(&mut self) {
        self.history.replaying = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_pushes_previous_snapshot() {
        let mut history = EditHistory::new("A", 10);
        assert!(history.record("AB"));
        assert!(!history.record("AB"));
        assert_eq!(history.peek_undo().map(|s| &**s), Some("A"));
        assert_eq!(&**history.current(), "AB");
    }

    #[test]
    fn undo_then_redo_moves_between_stacks() {
        let mut history = EditHistory::new("A", 10);
        history.record("AB");
        history.record("ABC");

        assert_eq!(history.commit_undo("ABC").as_deref(), Some("AB"));
        assert_eq!(history.commit_undo("AB").as_deref(), Some("A"));
        assert_eq!(history.commit_undo("A"), None);
        assert_eq!(history.redo_len(), 2);

        assert_eq!(history.commit_redo("A").as_deref(), Some("AB"));
        assert_eq!(&**history.current(), "AB");
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut history = EditHistory::new("A", 10);
        history.record("AB");
        history.commit_undo("AB");
        assert!(history.can_redo());
        history.record("AX");
        assert!(!history.can_redo());
    }

    #[test]
    fn replay_guard_suppresses_recording() {
        let mut history = EditHistory::new("A", 10);
        {
            let mut replay = history.begin_replay();
            assert!(replay.is_replaying());
            assert!(!replay.record("B"));
        }
        assert!(!history.is_replaying());
        assert!(history.record("B"));
    }

    #[test]
    fn oldest_entries_are_evicted_first() {
        let mut history = EditHistory::new("0", 3);
        for n in 1..=5 {
            history.record(n.to_string());
        }
        let undo: Vec<&str> = history.undo.iter().map(|s| &**s).collect();
        assert_eq!(undo, vec!["2", "3", "4"]);
    }
}
