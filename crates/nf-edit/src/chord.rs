//! Chord and scale tables
//!
//! Used for stamping chords when drawing notes and for marking the
//! semitones of a scale or chord on the keyboard.

use nf_core::{Key, KEYS_PER_OCTAVE, NUM_KEYS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Menu entry meaning "no chord selected"
pub const NO_CHORD: &str = "No chord";

/// Menu entry meaning "no scale selected"
pub const NO_SCALE: &str = "No scale";

/// Whether a table entry repeats every octave or is a bounded stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChordKind {
    Chord,
    Scale,
}

/// A named interval set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    pub name: String,
    pub kind: ChordKind,
    /// Semitone offsets from the root, ascending, starting at 0
    pub intervals: Vec<Key>,
}

impl Chord {
    pub fn new(name: &str, kind: ChordKind, intervals: &[Key]) -> Self {
        Self {
            name: name.to_string(),
            kind,
            intervals: intervals.to_vec(),
        }
    }

    pub fn is_scale(&self) -> bool {
        self.kind == ChordKind::Scale
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Largest interval
    pub fn last(&self) -> Key {
        self.intervals.last().copied().unwrap_or(0)
    }

    pub fn has_semitone(&self, semitone: Key) -> bool {
        self.intervals.contains(&semitone)
    }

    /// Repeat length used for the modular membership test. Scales repeat each
    /// octave; a chord repeats after its last interval, falling back to an
    /// octave when that is zero.
    pub fn period(&self) -> Key {
        if self.is_scale() || self.last() == 0 {
            KEYS_PER_OCTAVE
        } else {
            self.last()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Read-only lookup table of chords and scales
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChordTable {
    entries: Vec<Chord>,
}

impl ChordTable {
    pub fn new(entries: Vec<Chord>) -> Self {
        Self { entries }
    }

    /// Shared built-in table
    pub fn global() -> &'static ChordTable {
        static TABLE: OnceLock<ChordTable> = OnceLock::new();
        TABLE.get_or_init(ChordTable::standard)
    }

    /// Built-in chords and scales
    pub fn standard() -> Self {
        use ChordKind::{Chord as C, Scale as S};

        let table: &[(&str, ChordKind, &[Key])] = &[
            ("octave", C, &[0]),
            ("Major", C, &[0, 4, 7]),
            ("Majb5", C, &[0, 4, 6]),
            ("minor", C, &[0, 3, 7]),
            ("minb5", C, &[0, 3, 6]),
            ("sus2", C, &[0, 2, 7]),
            ("sus4", C, &[0, 5, 7]),
            ("aug", C, &[0, 4, 8]),
            ("augsus4", C, &[0, 5, 8]),
            ("tri", C, &[0, 3, 6, 9]),
            ("6", C, &[0, 4, 7, 9]),
            ("6sus4", C, &[0, 5, 7, 9]),
            ("6add9", C, &[0, 4, 7, 9, 14]),
            ("m6", C, &[0, 3, 7, 9]),
            ("m6add9", C, &[0, 3, 7, 9, 14]),
            ("7", C, &[0, 4, 7, 10]),
            ("7sus4", C, &[0, 5, 7, 10]),
            ("7#5", C, &[0, 4, 8, 10]),
            ("7b5", C, &[0, 4, 6, 10]),
            ("7#9", C, &[0, 4, 7, 10, 15]),
            ("7b9", C, &[0, 4, 7, 10, 13]),
            ("Maj7", C, &[0, 4, 7, 11]),
            ("Maj7b5", C, &[0, 4, 6, 11]),
            ("Maj7#5", C, &[0, 4, 8, 11]),
            ("m7", C, &[0, 3, 7, 10]),
            ("m7b5", C, &[0, 3, 6, 10]),
            ("m7b9", C, &[0, 3, 7, 10, 13]),
            ("m-Maj7", C, &[0, 3, 7, 11]),
            ("9", C, &[0, 4, 7, 10, 14]),
            ("9sus4", C, &[0, 5, 7, 10, 14]),
            ("add9", C, &[0, 4, 7, 14]),
            ("Maj9", C, &[0, 4, 7, 11, 14]),
            ("m9", C, &[0, 3, 7, 10, 14]),
            ("madd9", C, &[0, 3, 7, 14]),
            ("11", C, &[0, 4, 7, 10, 14, 17]),
            ("m11", C, &[0, 3, 7, 10, 14, 17]),
            ("13", C, &[0, 4, 7, 10, 14, 21]),
            ("Maj13", C, &[0, 4, 7, 11, 14, 21]),
            ("m13", C, &[0, 3, 7, 10, 14, 21]),
            ("Major", S, &[0, 2, 4, 5, 7, 9, 11]),
            ("Harmonic minor", S, &[0, 2, 3, 5, 7, 8, 11]),
            ("Melodic minor", S, &[0, 2, 3, 5, 7, 9, 11]),
            ("Whole tone", S, &[0, 2, 4, 6, 8, 10]),
            ("Diminished", S, &[0, 2, 3, 5, 6, 8, 9, 11]),
            ("Major pentatonic", S, &[0, 2, 4, 7, 9]),
            ("Minor pentatonic", S, &[0, 3, 5, 7, 10]),
            ("Jap in sen", S, &[0, 1, 5, 7, 10]),
            ("Major bebop", S, &[0, 2, 4, 5, 7, 8, 9, 11]),
            ("Dominant bebop", S, &[0, 2, 4, 5, 7, 9, 10, 11]),
            ("Blues", S, &[0, 3, 5, 6, 7, 10]),
            ("Arabic", S, &[0, 1, 4, 5, 7, 8, 11]),
            ("Hungarian minor", S, &[0, 2, 3, 6, 7, 8, 11]),
            ("Dorian", S, &[0, 2, 3, 5, 7, 9, 10]),
            ("Phrygian", S, &[0, 1, 3, 5, 7, 8, 10]),
            ("Lydian", S, &[0, 2, 4, 6, 7, 9, 11]),
            ("Mixolydian", S, &[0, 2, 4, 5, 7, 9, 10]),
            ("Aeolian", S, &[0, 2, 3, 5, 7, 8, 10]),
            ("Locrian", S, &[0, 1, 3, 5, 6, 8, 10]),
            ("Minor", S, &[0, 2, 3, 5, 7, 8, 10]),
            ("Chromatic", S, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]),
        ];

        Self::new(
            table
                .iter()
                .map(|(name, kind, intervals)| Chord::new(name, *kind, intervals))
                .collect(),
        )
    }

    /// First non-scale entry with this name
    pub fn chord_by_name(&self, name: &str) -> Option<&Chord> {
        self.entries.iter().find(|c| !c.is_scale() && c.name == name)
    }

    /// First scale entry with this name
    pub fn scale_by_name(&self, name: &str) -> Option<&Chord> {
        self.entries.iter().find(|c| c.is_scale() && c.name == name)
    }

    pub fn chords(&self) -> impl Iterator<Item = &Chord> {
        self.entries.iter().filter(|c| !c.is_scale())
    }

    pub fn scales(&self) -> impl Iterator<Item = &Chord> {
        self.entries.iter().filter(|c| c.is_scale())
    }

    /// Chord menu: `No chord` followed by every chord name
    pub fn chord_names(&self) -> Vec<&str> {
        std::iter::once(NO_CHORD)
            .chain(self.chords().map(|c| c.name.as_str()))
            .collect()
    }

    /// Scale menu: `No scale` followed by every scale name
    pub fn scale_names(&self) -> Vec<&str> {
        std::iter::once(NO_SCALE)
            .chain(self.scales().map(|c| c.name.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STAMPING
// ═══════════════════════════════════════════════════════════════════════════════

/// Keys of `chord` rooted at `base_key`. Keys outside the key range are
/// dropped; no chord yields nothing.
pub fn stamp_chord(base_key: Key, chord: Option<&Chord>) -> Vec<Key> {
    let Some(chord) = chord else {
        return Vec::new();
    };
    chord
        .intervals
        .iter()
        .map(|interval| base_key + interval)
        .filter(|key| (0..NUM_KEYS).contains(key))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEMITONE MARKS
// ═══════════════════════════════════════════════════════════════════════════════

/// Keyboard marking actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemitoneMarkAction {
    UnmarkAll,
    /// Mark or unmark the key under the pointer
    ToggleCurrent,
    MarkScale,
    MarkChord,
}

/// Set of highlighted keys
pub type SemitoneMarks = BTreeSet<Key>;

fn mark_matching(
    marks: &mut SemitoneMarks,
    keys: std::ops::RangeInclusive<Key>,
    reference_key: Key,
    chord: &Chord,
) {
    let period = chord.period();
    for key in keys {
        if chord.has_semitone((key - reference_key).rem_euclid(period)) {
            marks.insert(key);
        }
    }
}

/// Compute the new mark set for a marking action
pub fn mark_semitones(
    action: SemitoneMarkAction,
    reference_key: Key,
    scale: Option<&Chord>,
    chord: Option<&Chord>,
    existing: &SemitoneMarks,
) -> SemitoneMarks {
    let mut marks = existing.clone();

    match action {
        SemitoneMarkAction::UnmarkAll => marks.clear(),
        SemitoneMarkAction::ToggleCurrent => {
            if !marks.remove(&reference_key) {
                marks.insert(reference_key);
            }
        }
        SemitoneMarkAction::MarkScale => {
            if let Some(scale) = scale.filter(|s| !s.is_empty()) {
                marks.clear();
                mark_matching(&mut marks, 0..=NUM_KEYS - 1, reference_key, scale);
            }
        }
        SemitoneMarkAction::MarkChord => {
            if let Some(chord) = chord.filter(|c| !c.is_empty()) {
                let keys = if chord.last() == 0 {
                    0..=NUM_KEYS - 1
                } else {
                    reference_key.max(0)..=(reference_key + chord.last()).min(NUM_KEYS - 1)
                };
                mark_matching(&mut marks, keys, reference_key, chord);
            }
        }
    }

    marks
}
