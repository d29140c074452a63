//! Snapshot-based undo/redo for a note store

use crate::config::EditorConfig;
use crate::services::{AudioPreview, Journal, ModifiedFlag};
use nf_core::{Key, Note, NoteStore};
use std::collections::VecDeque;

/// Default number of undo steps kept
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Undo/redo history of whole-store snapshots
#[derive(Debug, Clone)]
pub struct SnapshotJournal {
    undo_stack: VecDeque<Vec<Note>>,
    redo_stack: Vec<Vec<Note>>,
    max_history: usize,
}

impl Default for SnapshotJournal {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl SnapshotJournal {
    pub fn new(max_history: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(max_history.min(DEFAULT_MAX_HISTORY)),
            redo_stack: Vec::new(),
            max_history: max_history.max(1),
        }
    }

    /// Record the current content as an undo step
    pub fn checkpoint(&mut self, notes: &NoteStore) {
        // Enforce max history
        while self.undo_stack.len() >= self.max_history {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(notes.notes().to_vec());

        // Clear redo stack on new checkpoint
        self.redo_stack.clear();
    }

    /// Restore the last checkpoint
    pub fn undo(&mut self, notes: &mut NoteStore) -> bool {
        match self.undo_stack.pop_back() {
            Some(snapshot) => {
                self.redo_stack.push(notes.notes().to_vec());
                notes.replace_all(snapshot);
                log::debug!("undo: {} notes restored", notes.len());
                true
            }
            None => false,
        }
    }

    /// Reapply the last undone step
    pub fn redo(&mut self, notes: &mut NoteStore) -> bool {
        match self.redo_stack.pop() {
            Some(snapshot) => {
                self.undo_stack.push_back(notes.notes().to_vec());
                notes.replace_all(snapshot);
                log::debug!("redo: {} notes restored", notes.len());
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Journal for SnapshotJournal {
    fn add_checkpoint(&mut self, notes: &NoteStore) {
        self.checkpoint(notes);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOST
// ═══════════════════════════════════════════════════════════════════════════════

/// Host with a real undo history and no audio.
///
/// Counts modifications so callers can tell whether the pattern changed.
#[derive(Debug, Clone, Default)]
pub struct JournalHost {
    pub journal: SnapshotJournal,
    pub modifications: usize,
}

impl JournalHost {
    pub fn new(max_history: usize) -> Self {
        Self {
            journal: SnapshotJournal::new(max_history),
            modifications: 0,
        }
    }

    /// Host whose journal keeps `config.max_undo_history` steps
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.max_undo_history)
    }

    pub fn is_modified(&self) -> bool {
        self.modifications > 0
    }
}

impl Journal for JournalHost {
    fn add_checkpoint(&mut self, notes: &NoteStore) {
        self.journal.checkpoint(notes);
    }
}

impl AudioPreview for JournalHost {
    fn key_press(&mut self, _key: Key, _velocity: u8) {}

    fn key_release(&mut self, _key: Key) {}
}

impl ModifiedFlag for JournalHost {
    fn set_modified(&mut self) {
        self.modifications += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(positions: &[i64]) -> NoteStore {
        NoteStore::from_notes(positions.iter().map(|&p| Note::new(48, p, 60)))
    }

    #[test]
    fn test_undo_redo() {
        let mut journal = SnapshotJournal::new(10);
        let mut store = store_with(&[0]);

        journal.checkpoint(&store);
        store.add_note(Note::new(48, 96, 60));
        assert_eq!(store.len(), 2);

        assert!(journal.undo(&mut store));
        assert_eq!(store.len(), 1);
        assert!(journal.can_redo());

        assert!(journal.redo(&mut store));
        assert_eq!(store.len(), 2);
        assert!(!journal.redo(&mut store));
    }

    #[test]
    fn test_history_bounded() {
        let mut journal = SnapshotJournal::new(3);
        let store = store_with(&[0]);
        for _ in 0..5 {
            journal.checkpoint(&store);
        }
        assert_eq!(journal.undo_count(), 3);
    }

    #[test]
    fn test_new_checkpoint_clears_redo() {
        let mut journal = SnapshotJournal::new(10);
        let mut store = store_with(&[0]);
        journal.checkpoint(&store);
        journal.undo(&mut store);
        assert_eq!(journal.redo_count(), 1);
        journal.checkpoint(&store);
        assert!(!journal.can_redo());
    }

    #[test]
    fn test_undo_keeps_ids() {
        let mut journal = SnapshotJournal::new(10);
        let mut store = NoteStore::new();
        let id = store.add_note(Note::new(48, 0, 60));
        journal.checkpoint(&store);
        store.get_mut(id).unwrap().key = 72;
        journal.undo(&mut store);
        assert_eq!(store.get(id).map(|n| n.key), Some(60));
    }
}
