//! Collaborator interfaces
//!
//! The editing core never undoes, plays audio or tracks project state by
//! itself. It talks to the surrounding application through these traits.

use nf_core::{Key, NoteStore, Panning};

/// Undo checkpoint service.
///
/// Called once before the first mutation of every user edit, so that a
/// whole gesture undoes as one step.
pub trait Journal {
    fn add_checkpoint(&mut self, notes: &NoteStore);
}

/// Audio preview of notes while editing
pub trait AudioPreview {
    fn key_press(&mut self, key: Key, velocity: u8);

    fn key_release(&mut self, key: Key);

    /// Change the velocity of a sounding key
    fn key_pressure(&mut self, _key: Key, _velocity: u8) {}

    /// Change the panning of a sounding key
    fn note_panning(&mut self, _key: Key, _panning: Panning) {}
}

/// Project modified flag
pub trait ModifiedFlag {
    fn set_modified(&mut self);
}

/// Everything the editor needs from its host
pub trait EditorHost: Journal + AudioPreview + ModifiedFlag {}

impl<T: Journal + AudioPreview + ModifiedFlag> EditorHost for T {}

/// Host that ignores every call
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl Journal for NullHost {
    fn add_checkpoint(&mut self, _notes: &NoteStore) {}
}

impl AudioPreview for NullHost {
    fn key_press(&mut self, _key: Key, _velocity: u8) {}

    fn key_release(&mut self, _key: Key) {}
}

impl ModifiedFlag for NullHost {
    fn set_modified(&mut self) {}
}
