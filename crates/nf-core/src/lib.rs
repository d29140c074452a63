//! nf-core: Note model and storage for the NoteForge piano roll
//!
//! This crate provides the data types shared by the editing engines:
//! notes, the per-pattern note store, detuning curves and the
//! musical constants everything is measured in.

mod error;
mod note;
mod detuning;
mod store;
mod pitch;

pub use error::*;
pub use note::*;
pub use detuning::*;
pub use store::*;
pub use pitch::*;

// ═══════════════════════════════════════════════════════════════════════════════
// UNITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Time in ticks. Signed so drag offsets and relative positions share the type.
pub type Tick = i64;

/// Pitch index, `0..NUM_KEYS`
pub type Key = i32;

/// Note volume in percent, `MIN_VOLUME..=MAX_VOLUME`
pub type Volume = u8;

/// Note panning, `PANNING_LEFT..=PANNING_RIGHT`
pub type Panning = i8;

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Ticks per tact (bar)
pub const TICKS_PER_TACT: Tick = 192;

/// Grid steps per tact (16th notes)
pub const STEPS_PER_TACT: Tick = 16;

/// Beats per tact
pub const BEATS_PER_TACT: Tick = 4;

pub const KEYS_PER_OCTAVE: Key = 12;
pub const NUM_OCTAVES: Key = 9;

/// Total number of addressable keys
pub const NUM_KEYS: Key = KEYS_PER_OCTAVE * NUM_OCTAVES;

/// Highest valid key
pub const MAX_KEY: Key = NUM_KEYS - 1;

pub const MIN_VOLUME: Volume = 0;
pub const MAX_VOLUME: Volume = 200;
pub const DEFAULT_VOLUME: Volume = 100;

pub const PANNING_LEFT: Panning = -100;
pub const PANNING_RIGHT: Panning = 100;
pub const DEFAULT_PANNING: Panning = 0;

/// Length used for hit-testing notes carrying the legacy negative-length
/// step sentinel
pub const STEP_NOTE_HIT_LENGTH: Tick = 4;

pub const MIDI_MAX_VELOCITY: u8 = 127;
pub const MIDI_DEFAULT_VELOCITY: u8 = 63;

/// Clamp a key into the valid key range
#[inline]
pub fn clamp_key(key: Key) -> Key {
    key.clamp(0, MAX_KEY)
}

/// Clamp a wide integer into the volume range
#[inline]
pub fn clamp_volume(value: i32) -> Volume {
    value.clamp(MIN_VOLUME as i32, MAX_VOLUME as i32) as Volume
}

/// Clamp a wide integer into the panning range
#[inline]
pub fn clamp_panning(value: i32) -> Panning {
    value.clamp(PANNING_LEFT as i32, PANNING_RIGHT as i32) as Panning
}
