//! Note Store
//!
//! Owns every note of the pattern being edited. Structural mutations
//! (add, remove, rearrange) keep the notes sorted by ascending position;
//! in-place edits through [`NoteStore::get_mut`] or [`NoteStore::iter_mut`]
//! may break the order until [`NoteStore::rearrange_all`] is called.

use crate::{Key, Note, NoteId, Tick};
use std::ops::Range;

/// Ordered collection of the notes of one pattern
#[derive(Debug, Clone)]
pub struct NoteStore {
    notes: Vec<Note>,
    next_id: u64,
}

impl Default for NoteStore {
    fn default() -> Self {
        Self {
            notes: Vec::new(),
            next_id: 1,
        }
    }
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing notes, assigning fresh ids
    pub fn from_notes(notes: impl IntoIterator<Item = Note>) -> Self {
        let mut store = Self::new();
        for note in notes {
            store.add_note(note);
        }
        store
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Structure
    // ─────────────────────────────────────────────────────────────────────────────

    /// Insert a note and return its identity.
    ///
    /// The note lands after every note with the same or smaller position.
    pub fn add_note(&mut self, mut note: Note) -> NoteId {
        let id = NoteId(self.next_id);
        self.next_id += 1;
        note.id = id;

        let idx = self.notes.partition_point(|n| n.position <= note.position);
        self.notes.insert(idx, note);
        id
    }

    /// Remove a note. Removing an id twice is a no-op.
    pub fn remove_note(&mut self, id: NoteId) -> Option<Note> {
        let pos = self.notes.iter().position(|n| n.id == id)?;
        Some(self.notes.remove(pos))
    }

    /// Remove several notes in one pass, returning how many were removed
    pub fn remove_notes(&mut self, ids: &[NoteId]) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let before = self.notes.len();
        self.notes.retain(|n| !ids.contains(&n.id));
        let removed = before - self.notes.len();
        log::trace!("removed {} of {} requested notes", removed, ids.len());
        removed
    }

    /// Stable re-sort by position
    pub fn rearrange_all(&mut self) {
        self.notes.sort_by_key(|n| n.position);
    }

    /// Replace the whole content, keeping the ids carried by `notes`
    pub fn replace_all(&mut self, notes: Vec<Note>) {
        let max_id = notes.iter().map(|n| n.id.0).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_id + 1);
        self.notes = notes;
        self.rearrange_all();
        log::trace!("store replaced: {} notes", self.notes.len());
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Access
    // ─────────────────────────────────────────────────────────────────────────────

    /// Notes in ascending position order
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Note> {
        self.notes.iter_mut()
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn get_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Notes that start or sound inside `ticks` and whose key is in `keys`
    pub fn notes_in_view(&self, ticks: Range<Tick>, keys: Range<Key>) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|n| {
                keys.contains(&n.key)
                    && n.position < ticks.end
                    && n.position + n.hit_length().max(1) > ticks.start
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn has_selection(&self) -> bool {
        self.notes.iter().any(|n| n.selected)
    }

    pub fn selection_count(&self) -> usize {
        self.notes.iter().filter(|n| n.selected).count()
    }

    pub fn selected_ids(&self) -> Vec<NoteId> {
        self.notes
            .iter()
            .filter(|n| n.selected)
            .map(|n| n.id)
            .collect()
    }

    pub fn selected_notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(|n| n.selected)
    }

    pub fn clear_selection(&mut self) {
        for note in &mut self.notes {
            note.selected = false;
        }
    }

    /// Select every note with a positive length
    pub fn select_all(&mut self) {
        for note in &mut self.notes {
            note.selected = note.length > 0;
        }
    }

    /// Set the selection flag of one note
    pub fn set_selected(&mut self, id: NoteId, selected: bool) {
        if let Some(note) = self.get_mut(id) {
            note.selected = selected;
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Drag snapshots
    // ─────────────────────────────────────────────────────────────────────────────

    /// Capture old position/length/key of every note
    pub fn snapshot_all(&mut self) {
        for note in &mut self.notes {
            note.snapshot();
        }
    }

    /// Restore every note from its snapshot and re-sort
    pub fn restore_all(&mut self) {
        for note in &mut self.notes {
            note.restore_snapshot();
        }
        self.rearrange_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(store: &NoteStore) -> Vec<Tick> {
        store.notes().iter().map(|n| n.position).collect()
    }

    #[test]
    fn test_add_keeps_order() {
        let mut store = NoteStore::new();
        store.add_note(Note::new(10, 10, 60));
        store.add_note(Note::new(10, 5, 60));
        store.add_note(Note::new(10, 20, 60));
        assert_eq!(positions(&store), vec![5, 10, 20]);
    }

    #[test]
    fn test_ids_unique_and_remove_idempotent() {
        let mut store = NoteStore::new();
        let a = store.add_note(Note::new(48, 0, 60));
        let b = store.add_note(Note::new(48, 0, 60));
        assert_ne!(a, b);

        assert!(store.remove_note(a).is_some());
        assert!(store.remove_note(a).is_none());
        assert_eq!(store.len(), 1);

        // Ids are never reused
        let c = store.add_note(Note::new(48, 0, 60));
        assert_ne!(c, a);
    }

    #[test]
    fn test_overlapping_notes_addressable() {
        let mut store = NoteStore::new();
        let a = store.add_note(Note::new(48, 0, 60));
        let b = store.add_note(Note::new(48, 0, 60));
        store.get_mut(b).unwrap().volume = 10;
        assert_eq!(store.get(a).unwrap().volume, 100);
        assert_eq!(store.get(b).unwrap().volume, 10);
    }

    #[test]
    fn test_rearrange_after_edit() {
        let mut store = NoteStore::new();
        let a = store.add_note(Note::new(10, 0, 60));
        store.add_note(Note::new(10, 50, 60));
        store.get_mut(a).unwrap().position = 100;
        store.rearrange_all();
        assert_eq!(positions(&store), vec![50, 100]);
    }

    #[test]
    fn test_remove_notes_bulk() {
        let mut store = NoteStore::new();
        let a = store.add_note(Note::new(10, 0, 60));
        let b = store.add_note(Note::new(10, 10, 60));
        store.add_note(Note::new(10, 20, 60));
        assert_eq!(store.remove_notes(&[a, b, a]), 2);
        assert_eq!(store.remove_notes(&[a]), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_select_all_skips_steps() {
        let mut store = NoteStore::new();
        store.add_note(Note::new(10, 0, 60));
        store.add_note(Note::new(0, 10, 60));
        store.select_all();
        assert_eq!(store.selection_count(), 1);
        store.clear_selection();
        assert!(!store.has_selection());
    }

    #[test]
    fn test_notes_in_view() {
        let mut store = NoteStore::new();
        store.add_note(Note::new(48, 0, 60));
        store.add_note(Note::new(48, 96, 60));
        store.add_note(Note::new(48, 0, 30));
        let visible = store.notes_in_view(40..100, 48..72);
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_replace_all_bumps_ids() {
        let mut store = NoteStore::new();
        store.add_note(Note::new(10, 0, 60));
        let saved = store.notes().to_vec();
        let mut other = NoteStore::new();
        other.replace_all(saved);
        let fresh = other.add_note(Note::new(10, 0, 60));
        assert_eq!(fresh, NoteId(2));
    }
}
