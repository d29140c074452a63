//! Note: a single musical event on the (tick × key) grid

use crate::{
    key_name, DetuningCurve, Key, Panning, Tick, Volume, DEFAULT_PANNING, DEFAULT_VOLUME,
    MIDI_MAX_VELOCITY, STEP_NOTE_HIT_LENGTH,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a note within its store
///
/// Assigned by [`crate::NoteStore::add_note`]. Zero means "not stored yet".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NoteId(pub u64);

impl NoteId {
    pub const UNASSIGNED: Self = Self(0);
}

/// A note placed in a pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    #[serde(skip)]
    pub(crate) id: NoteId,
    /// Start tick (never negative once stored by the editor)
    pub position: Tick,
    /// Duration in ticks. `0` is a step placeholder, negative values are the
    /// legacy step sentinel.
    pub length: Tick,
    pub key: Key,
    pub volume: Volume,
    pub panning: Panning,
    pub selected: bool,
    /// Audio preview is sounding this note
    #[serde(skip)]
    pub is_playing: bool,
    #[serde(skip)]
    pub old_position: Tick,
    #[serde(skip)]
    pub old_length: Tick,
    #[serde(skip)]
    pub old_key: Key,
    /// Pitch bend curve, created on first edit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detuning: Option<DetuningCurve>,
}

impl Note {
    pub fn new(length: Tick, position: Tick, key: Key) -> Self {
        Self {
            id: NoteId::UNASSIGNED,
            position,
            length,
            key,
            volume: DEFAULT_VOLUME,
            panning: DEFAULT_PANNING,
            selected: false,
            is_playing: false,
            old_position: position,
            old_length: length,
            old_key: key,
            detuning: None,
        }
    }

    pub fn with_volume(mut self, volume: Volume) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_panning(mut self, panning: Panning) -> Self {
        self.panning = panning;
        self
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn id(&self) -> NoteId {
        self.id
    }

    /// First tick after the note
    pub fn end_position(&self) -> Tick {
        self.position + self.length
    }

    /// Length used when hit-testing presses and selection regions.
    /// Negative (sentinel) lengths count as [`STEP_NOTE_HIT_LENGTH`].
    pub fn hit_length(&self) -> Tick {
        if self.length < 0 {
            STEP_NOTE_HIT_LENGTH
        } else {
            self.length
        }
    }

    /// Step placeholder (zero length)
    pub fn is_step(&self) -> bool {
        self.length == 0
    }

    /// MIDI velocity for previewing this note on an instrument whose base
    /// velocity maps to the default volume
    pub fn midi_velocity(&self, base_velocity: u8) -> u8 {
        let velocity = self.volume as u32 * base_velocity as u32 / DEFAULT_VOLUME as u32;
        velocity.min(MIDI_MAX_VELOCITY as u32) as u8
    }

    /// Round the length to the nearest multiple of `q`, never below `q`
    pub fn quantize_length(&mut self, q: Tick) {
        self.length = round_to_multiple(self.length, q);
        if self.length == 0 {
            self.length = q;
        }
    }

    /// Round the position to the nearest multiple of `q`
    pub fn quantize_position(&mut self, q: Tick) {
        self.position = round_to_multiple(self.position, q).max(0);
    }

    /// Remember position, length and key before a drag gesture
    pub fn snapshot(&mut self) {
        self.old_position = self.position;
        self.old_length = self.length;
        self.old_key = self.key;
    }

    /// Return to the state captured by [`Note::snapshot`]
    pub fn restore_snapshot(&mut self) {
        self.position = self.old_position;
        self.length = self.old_length;
        self.key = self.old_key;
    }

    pub fn detuning(&self) -> Option<&DetuningCurve> {
        self.detuning.as_ref()
    }

    /// Detuning curve, created empty if the note has none yet
    pub fn detuning_mut(&mut self) -> &mut DetuningCurve {
        self.detuning.get_or_insert_with(DetuningCurve::new)
    }

    pub fn has_detuning(&self) -> bool {
        self.detuning.is_some()
    }

    pub fn set_detuning(&mut self, curve: Option<DetuningCurve>) {
        self.detuning = curve;
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}+{}", key_name(self.key), self.position, self.length)
    }
}

fn round_to_multiple(value: Tick, q: Tick) -> Tick {
    assert!(q > 0, "quantization step must be positive");
    (value + q / 2).div_euclid(q) * q
}
