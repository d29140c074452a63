//! Note edit-property engine: volume and panning in the property lane

use crate::services::AudioPreview;
use nf_core::{
    clamp_panning, clamp_volume, Note, NoteId, NoteStore, Tick, DEFAULT_PANNING, DEFAULT_VOLUME,
    MAX_VOLUME, MIDI_DEFAULT_VELOCITY, MIN_VOLUME, PANNING_LEFT, PANNING_RIGHT,
};
use serde::{Deserialize, Serialize};

/// Pixel window around the pointer while dragging in the lane
pub const DRAG_PIXEL_RANGE: i32 = 14;

/// Pixel window around the pointer for wheel steps
pub const WHEEL_PIXEL_RANGE: i32 = 8;

/// Pixel window around the pointer for double-click value entry
pub const VALUE_ENTRY_PIXEL_RANGE: i32 = 4;

/// Property shown and edited in the lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoteEditMode {
    #[default]
    Volume,
    Panning,
}

impl NoteEditMode {
    /// Next mode in the lane's mode cycle
    pub fn next(self) -> Self {
        match self {
            NoteEditMode::Volume => NoteEditMode::Panning,
            NoteEditMode::Panning => NoteEditMode::Volume,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NoteEditMode::Volume => "Note Volume",
            NoteEditMode::Panning => "Note Panning",
        }
    }

    /// Inclusive value bounds
    pub fn bounds(&self) -> (i32, i32) {
        match self {
            NoteEditMode::Volume => (MIN_VOLUME as i32, MAX_VOLUME as i32),
            NoteEditMode::Panning => (PANNING_LEFT as i32, PANNING_RIGHT as i32),
        }
    }

    pub fn default_value(&self) -> i32 {
        match self {
            NoteEditMode::Volume => DEFAULT_VOLUME as i32,
            NoteEditMode::Panning => DEFAULT_PANNING as i32,
        }
    }

    pub fn value_of(&self, note: &Note) -> i32 {
        match self {
            NoteEditMode::Volume => note.volume as i32,
            NoteEditMode::Panning => note.panning as i32,
        }
    }

    /// Write a value, clamped into the bounds
    pub fn write(&self, note: &mut Note, value: i32) {
        match self {
            NoteEditMode::Volume => note.volume = clamp_volume(value),
            NoteEditMode::Panning => note.panning = clamp_panning(value),
        }
    }

    /// Human readable value for tooltips
    pub fn describe(&self, value: i32) -> String {
        match self {
            NoteEditMode::Volume => format!("Volume: {}%", value),
            NoteEditMode::Panning if value < 0 => format!("Panning: {}% left", -value),
            NoteEditMode::Panning if value > 0 => format!("Panning: {}% right", value),
            NoteEditMode::Panning => "Panning: center".to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALUE MAPPING
// ═══════════════════════════════════════════════════════════════════════════════

/// Map a lane pixel to a value: the lane bottom is `min`, the top is `max`
pub fn value_from_pointer(y: i32, top: i32, bottom: i32, min: i32, max: i32) -> i32 {
    if bottom <= top {
        return min;
    }
    let fraction = (bottom - y) as f32 / (bottom - top) as f32;
    let value = min + (fraction * (max - min) as f32) as i32;
    value.clamp(min, max)
}

/// Whether a note takes part in a lane edit over `[start, end]`
#[inline]
pub fn in_edit_range(note: &Note, start: Tick, end: Tick, has_selection: bool) -> bool {
    note.position >= start
        && note.position <= end
        && note.length != 0
        && (note.selected || !has_selection)
}

/// Start the audio preview of a note unless it is already sounding
pub fn preview_note<P: AudioPreview + ?Sized>(note: &mut Note, preview: &mut P) {
    if note.is_playing {
        return;
    }
    note.is_playing = true;
    preview.key_press(note.key, note.midi_velocity(MIDI_DEFAULT_VELOCITY));
    preview.note_panning(note.key, note.panning);
}

/// Stop the audio preview of a note if it is sounding
pub fn release_note<P: AudioPreview + ?Sized>(note: &mut Note, preview: &mut P) {
    if note.is_playing {
        note.is_playing = false;
        preview.key_release(note.key);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RANGE EDITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Set the property of every note in range and preview it.
///
/// Sounding notes outside the range are released. Returns the edited notes.
pub fn apply_to_range<P: AudioPreview + ?Sized>(
    store: &mut NoteStore,
    start: Tick,
    end: Tick,
    mode: NoteEditMode,
    value: i32,
    preview: &mut P,
) -> Vec<NoteId> {
    let has_selection = store.has_selection();
    let mut edited = Vec::new();

    for note in store.iter_mut() {
        if in_edit_range(note, start, end, has_selection) {
            preview_note(note, preview);
            mode.write(note, value);
            match mode {
                NoteEditMode::Volume => {
                    preview.key_pressure(note.key, note.midi_velocity(MIDI_DEFAULT_VELOCITY))
                }
                NoteEditMode::Panning => preview.note_panning(note.key, note.panning),
            }
            edited.push(note.id());
        } else {
            release_note(note, preview);
        }
    }

    if !edited.is_empty() {
        log::trace!("{} notes set to {}", edited.len(), mode.describe(value));
    }
    edited
}

/// Step the property of every note in range by `step`, clamped
pub fn step_in_range(
    store: &mut NoteStore,
    start: Tick,
    end: Tick,
    mode: NoteEditMode,
    step: i32,
) -> Vec<NoteId> {
    let has_selection = store.has_selection();
    store
        .iter_mut()
        .filter(|n| in_edit_range(n, start, end, has_selection))
        .map(|note| {
            let value = mode.value_of(note) + step;
            mode.write(note, value);
            note.id()
        })
        .collect()
}

/// Notes a double-click in the lane refers to.
///
/// When several notes are in range only those sharing the position
/// closest to `middle` are kept.
pub fn pick_for_value_entry(
    store: &NoteStore,
    start: Tick,
    end: Tick,
    middle: Tick,
) -> Vec<NoteId> {
    let has_selection = store.has_selection();
    let candidates: Vec<&Note> = store
        .iter()
        .filter(|n| in_edit_range(n, start, end, has_selection))
        .collect();

    let Some(closest) = candidates.iter().min_by_key(|n| (n.position - middle).abs()) else {
        return Vec::new();
    };
    let position = closest.position;

    candidates
        .iter()
        .filter(|n| n.position == position)
        .map(|n| n.id())
        .collect()
}

/// Write an entered value to the given notes
pub fn set_value(store: &mut NoteStore, ids: &[NoteId], mode: NoteEditMode, value: i32) -> usize {
    let mut count = 0;
    for &id in ids {
        if let Some(note) = store.get_mut(id) {
            mode.write(note, value);
            count += 1;
        }
    }
    count
}
