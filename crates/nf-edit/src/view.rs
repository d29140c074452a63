//! Pixel ↔ (tick, key) mapping of the piano roll widget
//!
//! Layout from top to bottom: a header strip, the key area (keyboard on the
//! left, note grid on the right), the lane resize bar and the property lane.
//! Pixel coordinates are widget-relative integers.

use nf_core::{clamp_key, Key, Note, Tick, KEYS_PER_OCTAVE, TICKS_PER_TACT};
use serde::{Deserialize, Serialize};

/// Width of the keyboard on the left
pub const WHITE_KEY_WIDTH: i32 = 64;

/// Height of one key row
pub const KEY_LINE_HEIGHT: i32 = 12;

pub const PR_TOP_MARGIN: i32 = 16;
pub const PR_BOTTOM_MARGIN: i32 = 16;
pub const PR_RIGHT_MARGIN: i32 = 16;

pub const NOTE_EDIT_RESIZE_BAR: i32 = 6;
pub const NOTE_EDIT_MIN_HEIGHT: i32 = 50;
pub const DEFAULT_NOTE_EDIT_HEIGHT: i32 = 100;
pub const KEY_AREA_MIN_HEIGHT: i32 = 100;

/// Width of the grip at the end of a note used for resizing
pub const RESIZE_AREA_WIDTH: i32 = 4;

/// Width of a volume/panning bar in the property lane
pub const NOTE_EDIT_LINE_WIDTH: i32 = 3;

/// Bottom key shown when the editor opens (C4)
pub const INITIAL_START_KEY: Key = 4 * KEYS_PER_OCTAVE;

/// Pixels per tact at 100% zoom
pub const DEFAULT_PPT: i64 = KEY_LINE_HEIGHT as i64 * 16;

/// Part of the widget a pixel belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewRegion {
    Header,
    Keyboard,
    Grid,
    LaneResizeBar,
    PropertyLane,
    Outside,
}

/// Scroll state captured at pointer-down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragAnchor {
    pub x: i32,
    pub y: i32,
    pub position: Tick,
    pub start_key: Key,
}

/// Geometry and scroll state of the editor view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewMapping {
    /// Pixels per tact
    ppt: i64,
    /// First visible tick
    pub current_position: Tick,
    /// Key on the bottom row of the key area
    pub start_key: Key,
    pub width: i32,
    pub height: i32,
    /// Height of the property lane including its resize bar
    pub note_edit_height: i32,
}

impl Default for ViewMapping {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl ViewMapping {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            ppt: DEFAULT_PPT,
            current_position: 0,
            start_key: INITIAL_START_KEY,
            width,
            height,
            note_edit_height: DEFAULT_NOTE_EDIT_HEIGHT,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Zoom
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn ppt(&self) -> i64 {
        self.ppt
    }

    pub fn set_ppt(&mut self, ppt: i64) {
        assert!(ppt > 0, "pixels per tact must be positive");
        self.ppt = ppt;
    }

    /// Zoom relative to the default scale
    pub fn set_zoom_percent(&mut self, percent: u32) {
        self.set_ppt(DEFAULT_PPT * percent as i64 / 100);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Layout
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn key_area_bottom(&self) -> i32 {
        self.height - PR_BOTTOM_MARGIN - self.note_edit_height
    }

    pub fn note_edit_top(&self) -> i32 {
        self.height - PR_BOTTOM_MARGIN - self.note_edit_height + NOTE_EDIT_RESIZE_BAR
    }

    pub fn note_edit_bottom(&self) -> i32 {
        self.height - PR_BOTTOM_MARGIN
    }

    pub fn note_edit_right(&self) -> i32 {
        self.width - PR_RIGHT_MARGIN
    }

    pub fn region(&self, x: i32, y: i32) -> ViewRegion {
        if y > self.key_area_bottom() && y < self.note_edit_top() {
            ViewRegion::LaneResizeBar
        } else if y <= PR_TOP_MARGIN {
            ViewRegion::Header
        } else if y >= self.note_edit_bottom() || x >= self.note_edit_right() {
            ViewRegion::Outside
        } else if y > self.note_edit_top() {
            if x > WHITE_KEY_WIDTH {
                ViewRegion::PropertyLane
            } else {
                ViewRegion::Outside
            }
        } else if x < WHITE_KEY_WIDTH {
            ViewRegion::Keyboard
        } else {
            ViewRegion::Grid
        }
    }

    /// New lane height after dragging the resize bar by `dy` pixels
    pub fn resize_lane(&mut self, old_height: i32, dy: i32) {
        let max = (self.height
            - PR_TOP_MARGIN
            - NOTE_EDIT_RESIZE_BAR
            - PR_BOTTOM_MARGIN
            - KEY_AREA_MIN_HEIGHT)
            .max(NOTE_EDIT_MIN_HEIGHT);
        self.note_edit_height = (old_height - dy).clamp(NOTE_EDIT_MIN_HEIGHT, max);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Mapping
    // ─────────────────────────────────────────────────────────────────────────────

    /// Horizontal pixel distance in ticks, truncated toward zero
    pub fn pixels_to_ticks(&self, dx: i32) -> Tick {
        dx as i64 * TICKS_PER_TACT / self.ppt
    }

    pub fn x_to_tick(&self, x: i32) -> Tick {
        ((x - WHITE_KEY_WIDTH) as i64 * TICKS_PER_TACT).div_euclid(self.ppt) + self.current_position
    }

    pub fn tick_to_x(&self, tick: Tick) -> i32 {
        WHITE_KEY_WIDTH
            + ((tick - self.current_position) * self.ppt).div_euclid(TICKS_PER_TACT) as i32
    }

    /// Key row under `y`, clamped to the key range
    pub fn y_to_key(&self, y: i32) -> Key {
        let key_line_y = self.key_area_bottom() - 1;
        clamp_key((key_line_y - y).div_euclid(KEY_LINE_HEIGHT) + self.start_key)
    }

    /// Top pixel of a key row
    pub fn key_to_y(&self, key: Key) -> i32 {
        self.key_area_bottom() - (key - self.start_key + 1) * KEY_LINE_HEIGHT
    }

    /// Tick window of `pixel_range` pixels centered on `x`
    pub fn tick_window(&self, x: i32, pixel_range: i32) -> (Tick, Tick) {
        (
            self.x_to_tick(x - pixel_range / 2),
            self.x_to_tick(x + pixel_range / 2),
        )
    }

    /// Width of a property bar in ticks
    pub fn edit_line_ticks(&self) -> Tick {
        NOTE_EDIT_LINE_WIDTH as i64 * TICKS_PER_TACT / self.ppt
    }

    /// Whether `tick` lies on the resize grip at the end of `note`
    pub fn in_resize_area(&self, note: &Note, tick: Tick) -> bool {
        note.length > 0
            && tick * self.ppt / TICKS_PER_TACT
                > note.end_position() * self.ppt / TICKS_PER_TACT - RESIZE_AREA_WIDTH as i64
    }

    pub fn anchor(&self, x: i32, y: i32) -> DragAnchor {
        DragAnchor {
            x,
            y,
            position: self.current_position,
            start_key: self.start_key,
        }
    }

    /// Raw drag offsets from the anchor, compensated for scrolling that
    /// happened since pointer-down
    pub fn drag_offsets(&self, anchor: &DragAnchor, x: i32, y: i32) -> (Tick, Key) {
        let mut off_ticks = self.pixels_to_ticks(x - anchor.x);
        let mut off_key = self.y_to_key(y) - self.y_to_key(anchor.y);

        off_ticks += self.current_position - anchor.position;
        off_key += self.start_key - anchor.start_key;
        (off_ticks, off_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ViewMapping {
        let mut view = ViewMapping::new(800, 600);
        view.start_key = 48;
        view
    }

    #[test]
    fn test_layout() {
        let view = view();
        assert_eq!(view.key_area_bottom(), 484);
        assert_eq!(view.note_edit_top(), 490);
        assert_eq!(view.note_edit_bottom(), 584);

        assert_eq!(view.region(100, 10), ViewRegion::Header);
        assert_eq!(view.region(10, 200), ViewRegion::Keyboard);
        assert_eq!(view.region(100, 200), ViewRegion::Grid);
        assert_eq!(view.region(100, 487), ViewRegion::LaneResizeBar);
        assert_eq!(view.region(100, 530), ViewRegion::PropertyLane);
        assert_eq!(view.region(100, 590), ViewRegion::Outside);
    }

    #[test]
    fn test_tick_mapping() {
        let mut view = view();
        assert_eq!(view.x_to_tick(WHITE_KEY_WIDTH), 0);
        assert_eq!(view.x_to_tick(WHITE_KEY_WIDTH + 192), 192);
        assert_eq!(view.tick_to_x(96), WHITE_KEY_WIDTH + 96);

        view.set_zoom_percent(50);
        assert_eq!(view.x_to_tick(WHITE_KEY_WIDTH + 96), 192);

        view.current_position = 192;
        assert_eq!(view.x_to_tick(WHITE_KEY_WIDTH), 192);
    }

    #[test]
    #[should_panic]
    fn test_zero_zoom_is_fatal() {
        view().set_zoom_percent(0);
    }

    #[test]
    fn test_key_mapping() {
        let view = view();
        let bottom_row = view.key_area_bottom() - 1;
        assert_eq!(view.y_to_key(bottom_row), 48);
        assert_eq!(view.y_to_key(bottom_row - KEY_LINE_HEIGHT), 49);
        assert_eq!(view.y_to_key(view.key_to_y(60)), 60);
        assert_eq!(view.y_to_key(-10_000), nf_core::MAX_KEY);
    }

    #[test]
    fn test_resize_area() {
        let view = view();
        let note = Note::new(48, 0, 60);
        assert!(view.in_resize_area(&note, 46));
        assert!(!view.in_resize_area(&note, 40));
        assert!(!view.in_resize_area(&Note::new(0, 0, 60), 0));
    }

    #[test]
    fn test_drag_offsets_follow_scroll() {
        let mut view = view();
        let anchor = view.anchor(200, 300);
        assert_eq!(view.drag_offsets(&anchor, 224, 300), (24, 0));

        // Scrolling one tact right while the pointer stays put
        view.current_position += 192;
        view.start_key += 2;
        assert_eq!(view.drag_offsets(&anchor, 200, 300), (192, 2));
    }

    #[test]
    fn test_resize_lane_clamps() {
        let mut view = view();
        view.resize_lane(100, 80);
        assert_eq!(view.note_edit_height, NOTE_EDIT_MIN_HEIGHT);
        view.resize_lane(100, -1000);
        assert_eq!(view.note_edit_height, 600 - 16 - 6 - 16 - 100);
    }
}
