//! Editor configuration
//!
//! Persistent editor settings:
//! - Quantization and new-note length
//! - Active tool, chord and scale
//! - Property lane mode and zoom
//! - Undo history depth

use crate::chord::{ChordTable, NO_CHORD, NO_SCALE};
use crate::journal::DEFAULT_MAX_HISTORY;
use crate::property::NoteEditMode;
use crate::quantize::{resolve_granularity, NoteLength, Quantization, FINEST_DIVISION};
use nf_core::{NfError, NfResult, TICKS_PER_TACT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Active editing tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EditMode {
    #[default]
    Draw,
    Erase,
    Select,
    /// Open the detuning curve of a clicked note
    Detuning,
}

/// Settings of one piano roll editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub quantization: Quantization,
    pub note_length: NoteLength,
    pub edit_mode: EditMode,
    /// Chord stamped when drawing, or `No chord`
    pub chord: String,
    /// Scale used for semitone marking, or `No scale`
    pub scale: String,
    pub note_edit_mode: NoteEditMode,
    /// Horizontal zoom in percent of the default scale
    pub zoom_percent: u32,
    /// Undo steps kept by the snapshot journal
    pub max_undo_history: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            quantization: Quantization::default(),
            note_length: NoteLength::default(),
            edit_mode: EditMode::default(),
            chord: NO_CHORD.to_string(),
            scale: NO_SCALE.to_string(),
            note_edit_mode: NoteEditMode::default(),
            zoom_percent: 100,
            max_undo_history: DEFAULT_MAX_HISTORY,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> NfResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| NfError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> NfResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| NfError::Serialization(e.to_string()))
    }

    /// Load from a file
    pub fn load<P: AsRef<Path>>(path: P) -> NfResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load from a file, falling back to defaults when it is missing or invalid
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("using default editor config ({}): {}", path.as_ref().display(), e);
                Self::default()
            }
        }
    }

    /// Save to a file, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> NfResult<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Check settings that would otherwise fail deep inside the engines
    pub fn validate(&self) -> NfResult<()> {
        let division_ok = |d: u32| d > 0 && d <= FINEST_DIVISION && TICKS_PER_TACT / d as i64 > 0;

        if let Quantization::Division(d) = self.quantization {
            if !division_ok(d) {
                return Err(NfError::InvalidConfig(format!("quantization 1/{} is too fine", d)));
            }
        }
        if let NoteLength::Division(d) = self.note_length {
            if !division_ok(d) {
                return Err(NfError::InvalidConfig(format!("note length 1/{} is too short", d)));
            }
        }
        if self.zoom_percent == 0 {
            return Err(NfError::InvalidConfig("zoom must be positive".to_string()));
        }

        let table = ChordTable::global();
        if self.chord != NO_CHORD && table.chord_by_name(&self.chord).is_none() {
            return Err(NfError::InvalidConfig(format!("unknown chord '{}'", self.chord)));
        }
        if self.scale != NO_SCALE && table.scale_by_name(&self.scale).is_none() {
            return Err(NfError::InvalidConfig(format!("unknown scale '{}'", self.scale)));
        }
        Ok(())
    }

    /// Grid spacing in ticks for a given last-note length
    pub fn granularity(&self, last_length: i64) -> i64 {
        resolve_granularity(self.quantization, self.note_length, last_length)
    }
}
