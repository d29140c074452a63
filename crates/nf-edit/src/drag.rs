//! Drag transform engine
//!
//! Moves and resizes notes relative to the snapshot taken at pointer-down,
//! so repeated updates never accumulate rounding error.

use crate::quantize::snap;
use nf_core::{clamp_key, Key, Note, NoteId, NoteStore, Tick, MAX_KEY};

/// What a drag gesture changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    /// Position and key of the selected notes
    Move,
    /// Length of the selected notes
    Resize,
}

/// Bounding box of the dragged notes at pointer-down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveBoundary {
    pub left: Tick,
    pub right: Tick,
    /// Highest key
    pub top: Key,
    /// Lowest key
    pub bottom: Key,
}

impl MoveBoundary {
    pub fn of_note(note: &Note) -> Self {
        Self {
            left: note.position,
            right: note.end_position(),
            top: note.key,
            bottom: note.key,
        }
    }

    /// Box around every selected note
    pub fn of_selection(store: &NoteStore) -> Option<Self> {
        let mut notes = store.selected_notes();
        let first = Self::of_note(notes.next()?);
        Some(notes.fold(first, |b, n| Self {
            left: b.left.min(n.position),
            right: b.right.max(n.end_position()),
            top: b.top.max(n.key),
            bottom: b.bottom.min(n.key),
        }))
    }

    /// Shrink offsets so the whole box stays inside the grid
    pub fn clamp_offsets(&self, off_ticks: Tick, off_key: Key) -> (Tick, Key) {
        let mut off_ticks = off_ticks;
        let mut off_key = off_key;
        if self.left + off_ticks < 0 {
            off_ticks = -self.left;
        }
        if self.top + off_key > MAX_KEY {
            off_key = MAX_KEY - self.top;
        }
        if self.bottom + off_key < 0 {
            off_key = -self.bottom;
        }
        (off_ticks, off_key)
    }
}

/// Result of one drag update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragUpdate {
    /// Notes whose position, key or length was written
    pub touched: Vec<NoteId>,
    /// Length of the last resized note, to become the new-note length
    pub resized_length: Option<Tick>,
}

/// State of one move/resize gesture
#[derive(Debug, Clone)]
pub struct DragSession {
    kind: DragKind,
    boundary: MoveBoundary,
    started_with_shift: bool,
    propagated: bool,
}

impl DragSession {
    /// Snapshot every note and start a gesture over the current selection.
    ///
    /// `fallback` bounds the gesture when nothing is selected.
    pub fn begin(
        store: &mut NoteStore,
        kind: DragKind,
        fallback: MoveBoundary,
        started_with_shift: bool,
    ) -> Self {
        store.snapshot_all();
        let boundary = MoveBoundary::of_selection(store).unwrap_or(fallback);
        log::debug!("drag begin: {:?} {:?}", kind, boundary);
        Self {
            kind,
            boundary,
            started_with_shift,
            propagated: false,
        }
    }

    pub fn kind(&self) -> DragKind {
        self.kind
    }

    pub fn boundary(&self) -> MoveBoundary {
        self.boundary
    }

    pub fn started_with_shift(&self) -> bool {
        self.started_with_shift
    }

    /// Shift pressed during a move that did not start with shift
    pub fn is_quick_resize(&self, shift: bool) -> bool {
        self.kind == DragKind::Move && shift && !self.started_with_shift
    }

    /// Apply offsets from the pointer-down cell.
    ///
    /// Without `free` the tick offset is floor-snapped to `granularity`.
    /// Moves clamp one shared offset so the group keeps its shape.
    pub fn update(
        &mut self,
        store: &mut NoteStore,
        off_ticks: Tick,
        off_key: Key,
        granularity: Tick,
        free: bool,
        shift: bool,
    ) -> DragUpdate {
        let mut off_ticks = if free { off_ticks } else { snap(off_ticks, granularity) };
        let mut off_key = off_key;

        let quick_resize = self.is_quick_resize(shift);
        if self.kind == DragKind::Move && !quick_resize {
            (off_ticks, off_key) = self.boundary.clamp_offsets(off_ticks, off_key);
        }
        log::trace!("drag update: {} ticks, {} keys", off_ticks, off_key);

        let mut result = DragUpdate::default();

        if self.kind == DragKind::Resize && shift {
            self.propagated = true;
            result.touched.extend(propagate_shift(store, off_ticks));
        }

        for note in store.iter_mut().filter(|n| n.selected) {
            if self.kind == DragKind::Move && !quick_resize {
                note.position = (note.old_position + off_ticks).max(0);
                note.key = clamp_key(note.old_key + off_key);
            } else {
                note.length = (note.old_length + off_ticks).max(1);
                result.resized_length = Some(note.length);
            }
            if !result.touched.contains(&note.id()) {
                result.touched.push(note.id());
            }
        }

        result
    }

    /// Finish the gesture. Returns true when the store was re-sorted.
    pub fn end(self, store: &mut NoteStore) -> bool {
        let rearrange = self.kind == DragKind::Move || self.propagated;
        if rearrange {
            store.rearrange_all();
        }
        // A lone note is deselected so it does not capture later lane edits
        if store.selection_count() == 1 {
            store.clear_selection();
        }
        log::debug!("drag end: {:?}", self.kind);
        rearrange
    }

    /// Abort the gesture, restoring every note to its snapshot
    pub fn cancel(self, store: &mut NoteStore) {
        store.restore_all();
        log::debug!("drag cancelled: {:?}", self.kind);
    }
}

/// Shift notes after resized ones by the resize offset.
///
/// Walking distinct pre-drag positions in ascending order, every position
/// group that holds a selected note whose new length did not clamp adds
/// `off_ticks` once to all strictly later notes. Returns the notes moved.
fn propagate_shift(store: &mut NoteStore, off_ticks: Tick) -> Vec<NoteId> {
    let mut groups: Vec<(Tick, bool)> = store
        .iter()
        .map(|n| (n.old_position, n.selected && n.old_length + off_ticks > 0))
        .collect();
    groups.sort_by_key(|&(pos, _)| pos);
    groups.dedup_by(|later, earlier| {
        if later.0 == earlier.0 {
            earlier.1 |= later.1;
            true
        } else {
            false
        }
    });

    // Accumulated shift applying to each group
    let mut shift = 0;
    let offsets: Vec<(Tick, Tick)> = groups
        .iter()
        .map(|&(pos, resized)| {
            let before = shift;
            if resized {
                shift += off_ticks;
            }
            (pos, before)
        })
        .collect();

    let mut moved = Vec::new();
    for note in store.iter_mut() {
        let Ok(idx) = offsets.binary_search_by_key(&note.old_position, |&(pos, _)| pos) else {
            continue;
        };
        let position = (note.old_position + offsets[idx].1).max(0);
        if position != note.position {
            note.position = position;
            moved.push(note.id());
        }
    }
    moved
}
