//! Rubber-band selection in (tick, key) space

use nf_core::{Key, NoteId, NoteStore, Tick};
use std::ops::{Range, RangeInclusive};

/// Rectangle spanned by a selection gesture.
///
/// Spans are signed while the gesture runs and only normalized when the
/// region is committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionRegion {
    pub start_tick: Tick,
    pub tick_span: Tick,
    pub start_key: Key,
    pub key_span: Key,
}

impl SelectionRegion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor a new region at the pointer-down cell
    pub fn begin(&mut self, anchor_tick: Tick, anchor_key: Key) {
        self.start_tick = anchor_tick;
        self.tick_span = 0;
        self.start_key = anchor_key;
        self.key_span = 0;
    }

    /// Stretch the region to the current pointer cell
    pub fn update(&mut self, tick: Tick, key: Key) {
        self.tick_span = tick - self.start_tick;
        if self.start_tick + self.tick_span < 0 {
            self.tick_span = -self.start_tick;
        }
        self.key_span = key - self.start_key;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Half-open normalized tick range
    pub fn tick_range(&self) -> Range<Tick> {
        let end = self.start_tick + self.tick_span;
        self.start_tick.min(end)..self.start_tick.max(end)
    }

    /// Inclusive normalized key rows
    pub fn key_range(&self) -> RangeInclusive<Key> {
        let end = self.start_key + self.key_span;
        self.start_key.min(end)..=self.start_key.max(end)
    }

    /// True when the region covers no ticks
    pub fn is_empty(&self) -> bool {
        self.tick_span == 0
    }

    /// Notes hit by the region
    pub fn matching(&self, store: &NoteStore) -> Vec<NoteId> {
        if self.is_empty() {
            return Vec::new();
        }
        let ticks = self.tick_range();
        let keys = self.key_range();

        store
            .iter()
            .filter(|n| n.length != 0 && keys.contains(&n.key))
            .filter(|n| n.position < ticks.end && n.position + n.hit_length() > ticks.start)
            .map(|n| n.id())
            .collect()
    }

    /// Apply the region to the store and reset it.
    ///
    /// Additive commits toggle every matched note. Otherwise the selection
    /// is replaced by the matched notes. Returns the matched notes.
    pub fn commit(&mut self, store: &mut NoteStore, additive: bool) -> Vec<NoteId> {
        let matched = self.matching(store);

        if !additive {
            store.clear_selection();
        }
        for &id in &matched {
            if let Some(note) = store.get_mut(id) {
                note.selected = !additive || !note.selected;
            }
        }

        log::debug!(
            "selection commit: {} notes matched (additive: {})",
            matched.len(),
            additive
        );
        self.reset();
        matched
    }

    /// Region covering every note with a positive length
    pub fn bounding(store: &NoteStore) -> Option<Self> {
        let mut notes = store.iter().filter(|n| n.length > 0);
        let first = notes.next()?;

        let mut left = first.position;
        let mut right = first.end_position();
        let mut bottom = first.key;
        let mut top = first.key;
        for note in notes {
            left = left.min(note.position);
            right = right.max(note.end_position());
            bottom = bottom.min(note.key);
            top = top.max(note.key);
        }

        Some(Self {
            start_tick: left,
            tick_span: right - left,
            start_key: bottom,
            key_span: top - bottom,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nf_core::Note;

    fn store() -> (NoteStore, Vec<NoteId>) {
        let mut store = NoteStore::new();
        let ids = vec![
            store.add_note(Note::new(48, 0, 60)),
            store.add_note(Note::new(48, 96, 62)),
            store.add_note(Note::new(48, 192, 70)),
        ];
        (store, ids)
    }

    #[test]
    fn test_replace_selection() {
        let (mut store, ids) = store();
        store.set_selected(ids[2], true);

        let mut region = SelectionRegion::new();
        region.begin(10, 60);
        region.update(100, 62);
        let matched = region.commit(&mut store, false);

        assert_eq!(matched, vec![ids[0], ids[1]]);
        assert_eq!(store.selected_ids(), vec![ids[0], ids[1]]);
        assert_eq!(region, SelectionRegion::default());
    }

    #[test]
    fn test_reverse_drag_normalizes() {
        let (mut store, ids) = store();
        let mut region = SelectionRegion::new();
        region.begin(100, 62);
        region.update(10, 60);
        region.commit(&mut store, false);
        assert_eq!(store.selected_ids(), vec![ids[0], ids[1]]);
    }

    #[test]
    fn test_additive_twice_restores() {
        let (mut store, ids) = store();
        store.set_selected(ids[0], true);
        let before: Vec<bool> = store.iter().map(|n| n.selected).collect();

        for _ in 0..2 {
            let mut region = SelectionRegion::new();
            region.begin(0, 60);
            region.update(150, 62);
            region.commit(&mut store, true);
        }

        let after: Vec<bool> = store.iter().map(|n| n.selected).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_empty_region_matches_nothing() {
        let (mut store, ids) = store();
        store.set_selected(ids[0], true);
        let mut region = SelectionRegion::new();
        region.begin(10, 60);
        assert!(region.commit(&mut store, false).is_empty());
        assert!(!store.has_selection());
    }

    #[test]
    fn test_step_and_sentinel_notes() {
        let mut store = NoteStore::new();
        let step = store.add_note(Note::new(0, 10, 60));
        let sentinel = store.add_note(Note::new(-1, 20, 60));

        let mut region = SelectionRegion::new();
        region.begin(0, 60);
        region.update(22, 60);
        let matched = region.commit(&mut store, false);
        assert!(!matched.contains(&step));
        assert!(matched.contains(&sentinel));

        // The sentinel only reaches 4 ticks past its start
        region.begin(24, 60);
        region.update(40, 60);
        assert!(region.commit(&mut store, false).is_empty());
    }

    #[test]
    fn test_update_clamps_at_zero() {
        let mut region = SelectionRegion::new();
        region.begin(20, 60);
        region.update(-50, 60);
        assert_eq!(region.tick_range(), 0..20);
    }

    #[test]
    fn test_bounding() {
        let (store, _) = store();
        let region = SelectionRegion::bounding(&store).unwrap();
        assert_eq!(region.tick_range(), 0..240);
        assert_eq!(region.key_range(), 60..=70);
        assert!(SelectionRegion::bounding(&NoteStore::new()).is_none());
    }
}
