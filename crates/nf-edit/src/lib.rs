//! nf-edit: Piano roll editing engine for NoteForge
//!
//! Engines operating on an [`nf_core::NoteStore`]:
//! - Selection regions and hit-testing
//! - Quantization and grid lines
//! - Chord stamping and semitone marking
//! - Move/resize drag transforms
//! - Volume/panning property lane
//! - Clipboard codec and snapshot undo journal
//!
//! [`NoteEditor`] ties them together behind pointer and keyboard input.

mod chord;
mod clipboard;
mod config;
mod drag;
mod editor;
mod journal;
mod property;
mod quantize;
mod selection;
mod services;
mod view;

pub use chord::*;
pub use clipboard::*;
pub use config::*;
pub use drag::*;
pub use editor::*;
pub use journal::*;
pub use property::*;
pub use quantize::*;
pub use selection::*;
pub use services::*;
pub use view::*;
