//! Clipboard codec
//!
//! Notes are stored as JSON with positions relative to the start of the
//! tact holding the first note, so pasting at a tick keeps their offsets
//! within the bar.

use nf_core::{
    clamp_key, clamp_panning, clamp_volume, DetuningCurve, Key, NfError, NfResult, Note, NoteId,
    NoteStore, Tick, TICKS_PER_TACT,
};
use serde::{Deserialize, Serialize};

/// Format version written into every clipboard document
pub const CLIPBOARD_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ClipboardDocument {
    version: u32,
    notes: Vec<ClipboardNote>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClipboardNote {
    position: Tick,
    length: Tick,
    key: Key,
    volume: i32,
    panning: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detuning: Option<DetuningCurve>,
}

/// Encode notes for the clipboard
pub fn serialize_notes<'a>(notes: impl IntoIterator<Item = &'a Note>) -> NfResult<String> {
    let notes: Vec<&Note> = notes.into_iter().collect();
    let base = notes
        .first()
        .map(|n| n.position.div_euclid(TICKS_PER_TACT) * TICKS_PER_TACT)
        .unwrap_or(0);

    let document = ClipboardDocument {
        version: CLIPBOARD_FORMAT_VERSION,
        notes: notes
            .iter()
            .map(|n| ClipboardNote {
                position: n.position - base,
                length: n.length,
                key: n.key,
                volume: n.volume as i32,
                panning: n.panning as i32,
                detuning: n.detuning().cloned(),
            })
            .collect(),
    };

    serde_json::to_string(&document).map_err(|e| NfError::Serialization(e.to_string()))
}

/// Decode clipboard data into notes with relative positions.
///
/// Out-of-range values are clamped.
pub fn deserialize_notes(blob: &str) -> NfResult<Vec<Note>> {
    let document: ClipboardDocument =
        serde_json::from_str(blob).map_err(|e| NfError::Serialization(e.to_string()))?;

    if document.version > CLIPBOARD_FORMAT_VERSION {
        return Err(NfError::Serialization(format!(
            "unsupported clipboard format version {}",
            document.version
        )));
    }

    Ok(document
        .notes
        .into_iter()
        .map(|c| {
            let mut note = Note::new(c.length, c.position, clamp_key(c.key))
                .with_volume(clamp_volume(c.volume))
                .with_panning(clamp_panning(c.panning));
            note.set_detuning(c.detuning);
            note
        })
        .collect())
}

/// Add decoded notes at `at`, selecting only them. Returns the new ids.
pub fn paste_notes(store: &mut NoteStore, notes: Vec<Note>, at: Tick) -> Vec<NoteId> {
    store.clear_selection();
    notes
        .into_iter()
        .map(|mut note| {
            note.position = (note.position + at).max(0);
            note.selected = true;
            store.add_note(note)
        })
        .collect()
}
