//! Per-note detuning (pitch bend) curves

use crate::Tick;
use serde::{Deserialize, Serialize};

/// A single detuning point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetuningPoint {
    /// Offset from the note start
    pub tick: Tick,
    /// Pitch offset in semitones
    pub semitones: f32,
}

/// Time-indexed pitch bend curve scoped to one note
///
/// Points are kept sorted by tick and ticks are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetuningCurve {
    points: Vec<DetuningPoint>,
}

impl DetuningCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a point, replacing any point already at `tick`
    pub fn add_point(&mut self, tick: Tick, semitones: f32) {
        let tick = tick.max(0);
        match self.points.binary_search_by(|p| p.tick.cmp(&tick)) {
            Ok(idx) => self.points[idx].semitones = semitones,
            Err(idx) => self.points.insert(idx, DetuningPoint { tick, semitones }),
        }
    }

    /// Remove the point at `tick`
    pub fn remove_point(&mut self, tick: Tick) -> Option<DetuningPoint> {
        self.points
            .binary_search_by(|p| p.tick.cmp(&tick))
            .ok()
            .map(|idx| self.points.remove(idx))
    }

    /// Interpolated value at a tick relative to the note start
    pub fn value_at(&self, tick: Tick) -> Option<f32> {
        let first = self.points.first()?;
        let last = self.points.last()?;

        if tick <= first.tick {
            return Some(first.semitones);
        }
        if tick >= last.tick {
            return Some(last.semitones);
        }

        let idx = self
            .points
            .binary_search_by(|p| p.tick.cmp(&tick))
            .unwrap_or_else(|i| i);
        let p2 = &self.points[idx];
        if p2.tick == tick {
            return Some(p2.semitones);
        }
        let p1 = &self.points[idx - 1];

        let t = (tick - p1.tick) as f32 / (p2.tick - p1.tick) as f32;
        Some(p1.semitones + (p2.semitones - p1.semitones) * t)
    }

    /// Drop points that lie past the end of a note of `length` ticks
    pub fn trim_to(&mut self, length: Tick) {
        self.points.retain(|p| p.tick <= length.max(0));
    }

    pub fn points(&self) -> &[DetuningPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
