//! Quantization and new-note length resolution

use nf_core::{Tick, STEPS_PER_TACT, TICKS_PER_TACT};
use serde::{Deserialize, Serialize};

/// Number of plain power-of-two note lengths offered (1/1 .. 1/32)
pub const NUM_EVEN_LENGTHS: u32 = 6;

/// Number of triplet note lengths offered (1/3 .. 1/48)
pub const NUM_TRIPLET_LENGTHS: u32 = 5;

/// Finest offered quantization (one tick)
pub const FINEST_DIVISION: u32 = 192;

// ═══════════════════════════════════════════════════════════════════════════════
// SETTINGS
// ═══════════════════════════════════════════════════════════════════════════════

/// Quantization setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quantization {
    /// Lock the grid to the new-note length
    NoteLock,
    /// `1/d` of a tact
    Division(u32),
}

impl Default for Quantization {
    fn default() -> Self {
        Quantization::Division(16)
    }
}

impl Quantization {
    /// Every selectable setting, in menu order
    pub fn all() -> Vec<Self> {
        let mut items = vec![Quantization::NoteLock];
        items.extend((0..=NUM_EVEN_LENGTHS).map(|i| Quantization::Division(1 << i)));
        items.extend((0..NUM_TRIPLET_LENGTHS).map(|i| Quantization::Division((1 << i) * 3)));
        items.push(Quantization::Division(FINEST_DIVISION));
        items
    }

    pub fn label(&self) -> String {
        match self {
            Quantization::NoteLock => "Note lock".to_string(),
            Quantization::Division(d) => format!("1/{}", d),
        }
    }
}

/// Length of newly drawn notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoteLength {
    /// Reuse the length of the last note touched
    #[default]
    LastNote,
    /// `1/d` of a tact
    Division(u32),
}

impl NoteLength {
    /// Every selectable setting, in menu order
    pub fn all() -> Vec<Self> {
        let mut items = vec![NoteLength::LastNote];
        items.extend((0..NUM_EVEN_LENGTHS).map(|i| NoteLength::Division(1 << i)));
        items.extend((0..NUM_TRIPLET_LENGTHS).map(|i| NoteLength::Division((1 << i) * 3)));
        items
    }

    pub fn label(&self) -> String {
        match self {
            NoteLength::LastNote => "Last note".to_string(),
            NoteLength::Division(d) => format!("1/{}", d),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

fn division_ticks(d: u32) -> Tick {
    if d == 0 { 0 } else { TICKS_PER_TACT / d as Tick }
}

/// Length in ticks for newly created notes
pub fn resolve_note_length(setting: NoteLength, last_length: Tick) -> Tick {
    match setting {
        NoteLength::LastNote => last_length,
        NoteLength::Division(d) => division_ticks(d),
    }
}

/// Grid spacing in ticks.
///
/// Panics when the configuration resolves to zero ticks, since every snap
/// and grid computation divides by it.
pub fn resolve_granularity(
    quantization: Quantization,
    note_length: NoteLength,
    last_length: Tick,
) -> Tick {
    let granularity = match quantization {
        Quantization::NoteLock => match note_length {
            NoteLength::Division(_) => resolve_note_length(note_length, last_length),
            NoteLength::LastNote => TICKS_PER_TACT / 16,
        },
        Quantization::Division(d) => division_ticks(d),
    };
    assert!(
        granularity > 0,
        "quantization {:?} resolved to a non-positive granularity",
        quantization
    );
    granularity
}

/// Triplet grid detection. Even granularities are multiples of 3 ticks;
/// triplet ones are not.
#[inline]
pub fn is_triplet(granularity: Tick) -> bool {
    granularity % 3 != 0
}

/// Floor-snap a tick (or tick offset) to the grid
#[inline]
pub fn snap(tick: Tick, granularity: Tick) -> Tick {
    assert!(granularity > 0, "granularity must be positive");
    tick.div_euclid(granularity) * granularity
}

/// Round a tick to the nearest grid line
#[inline]
pub fn quantize_nearest(tick: Tick, granularity: Tick) -> Tick {
    assert!(granularity > 0, "granularity must be positive");
    (tick + granularity / 2).div_euclid(granularity) * granularity
}

// ═══════════════════════════════════════════════════════════════════════════════
// GRID LINES
// ═══════════════════════════════════════════════════════════════════════════════

/// Emphasis of a vertical grid line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLineKind {
    /// Start of a tact
    Bar,
    Beat,
    Step,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLine {
    pub tick: Tick,
    pub kind: GridLineKind,
}

/// Vertical grid lines between `start` and `end` (inclusive).
///
/// A triplet granularity switches the raster to thirds: 24 steps of 8 ticks
/// per tact instead of 16 steps of 12.
pub fn grid_lines(start: Tick, end: Tick, granularity: Tick) -> Vec<GridLine> {
    let (steps_per_tact, step) = if is_triplet(granularity) {
        (STEPS_PER_TACT * 3 / 2, TICKS_PER_TACT / STEPS_PER_TACT * 2 / 3)
    } else {
        (STEPS_PER_TACT, TICKS_PER_TACT / STEPS_PER_TACT)
    };

    let mut lines = Vec::new();
    let mut index = start.max(0).div_euclid(step);
    loop {
        let tick = index * step;
        if tick > end {
            break;
        }
        if tick >= start {
            let kind = if index % steps_per_tact == 0 {
                GridLineKind::Bar
            } else if index % 4 == 0 {
                GridLineKind::Beat
            } else {
                GridLineKind::Step
            };
            lines.push(GridLine { tick, kind });
        }
        index += 1;
    }
    lines
}
