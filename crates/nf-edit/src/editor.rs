//! Note editor
//!
//! Translates pointer and keyboard input into edits of a [`NoteStore`].
//! The widget owning the editor forwards raw events; everything it needs
//! for painting (notes, gesture state, marks, hover target) is read back
//! from here.

use crate::chord::{mark_semitones, stamp_chord, ChordTable, SemitoneMarkAction, SemitoneMarks};
use crate::clipboard::{deserialize_notes, paste_notes, serialize_notes};
use crate::config::{EditMode, EditorConfig};
use crate::drag::{DragKind, DragSession, MoveBoundary};
use crate::property::{
    apply_to_range, in_edit_range, pick_for_value_entry, preview_note, release_note, set_value,
    step_in_range, value_from_pointer, NoteEditMode, DRAG_PIXEL_RANGE, VALUE_ENTRY_PIXEL_RANGE,
    WHEEL_PIXEL_RANGE,
};
use crate::quantize::{grid_lines, quantize_nearest, resolve_note_length, GridLine};
use crate::selection::SelectionRegion;
use crate::services::EditorHost;
use crate::view::{DragAnchor, ViewMapping, ViewRegion, PR_TOP_MARGIN, WHITE_KEY_WIDTH};
use nf_core::{
    clamp_key, Key, NfResult, Note, NoteId, NoteStore, Panning, Tick, Volume, DEFAULT_PANNING,
    DEFAULT_VOLUME, KEYS_PER_OCTAVE, MIDI_DEFAULT_VELOCITY, TICKS_PER_TACT,
};
use std::ops::Range;

// ═══════════════════════════════════════════════════════════════════════════════
// INPUT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

/// Keyboard modifiers held during a pointer event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    /// Free movement, bypassing quantization
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };
}

/// Pointer event in widget pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub x: i32,
    pub y: i32,
    /// Button pressed, released or held while moving
    pub button: Option<PointerButton>,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(x: i32, y: i32, button: Option<PointerButton>, modifiers: Modifiers) -> Self {
        Self {
            x,
            y,
            button,
            modifiers,
        }
    }

    pub fn left(x: i32, y: i32) -> Self {
        Self::new(x, y, Some(PointerButton::Left), Modifiers::NONE)
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Gesture state visible to the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Idle,
    Selecting,
    Moving,
    Resizing,
    ResizingEditLane,
    EditingProperty,
}

/// Running gesture
#[derive(Debug, Default)]
enum Gesture {
    #[default]
    Idle,
    Selecting,
    Dragging(DragSession),
    ResizingEditLane { old_height: i32, anchor_y: i32 },
    EditingProperty,
    Erasing { checkpointed: bool },
}

impl Gesture {
    fn state(&self) -> EditorState {
        match self {
            Gesture::Idle | Gesture::Erasing { .. } => EditorState::Idle,
            Gesture::Selecting => EditorState::Selecting,
            Gesture::Dragging(session) => match session.kind() {
                DragKind::Move => EditorState::Moving,
                DragKind::Resize => EditorState::Resizing,
            },
            Gesture::ResizingEditLane { .. } => EditorState::ResizingEditLane,
            Gesture::EditingProperty => EditorState::EditingProperty,
        }
    }
}

/// Note under the pointer, for cursor selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverTarget {
    pub note: NoteId,
    /// Pointer is on the resize grip
    pub on_tail: bool,
}

#[derive(Debug, Clone, Copy)]
struct RecordingNote {
    key: Key,
    position: Tick,
    volume: Volume,
    panning: Panning,
}

// ═══════════════════════════════════════════════════════════════════════════════
// EDITOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Piano roll editing state machine over one pattern
pub struct NoteEditor<H: EditorHost> {
    store: NoteStore,
    host: H,
    config: EditorConfig,
    view: ViewMapping,
    gesture: Gesture,
    /// Button whose release finishes the running gesture
    gesture_button: Option<PointerButton>,
    selection: SelectionRegion,
    anchor: DragAnchor,
    /// Tool to restore when a ctrl-initiated selection ends
    ctrl_mode: Option<EditMode>,
    last_length: Tick,
    last_volume: Volume,
    last_panning: Panning,
    /// Key sounding from a click on the keyboard
    keyboard_key: Option<Key>,
    marks: SemitoneMarks,
    touched: Vec<NoteId>,
    detuning_target: Option<NoteId>,
    recording: bool,
    recording_notes: Vec<RecordingNote>,
}

impl<H: EditorHost> NoteEditor<H> {
    /// Editor over an empty pattern. A host with real undo history is
    /// usually built from the same settings, see [`crate::JournalHost::from_config`].
    pub fn new(host: H, config: EditorConfig) -> Self {
        Self::with_store(NoteStore::new(), host, config)
    }

    pub fn with_store(store: NoteStore, host: H, config: EditorConfig) -> Self {
        let mut view = ViewMapping::default();
        view.set_zoom_percent(config.zoom_percent);
        Self {
            store,
            host,
            config,
            view,
            gesture: Gesture::Idle,
            gesture_button: None,
            selection: SelectionRegion::new(),
            anchor: DragAnchor::default(),
            ctrl_mode: None,
            last_length: TICKS_PER_TACT / 4,
            last_volume: DEFAULT_VOLUME,
            last_panning: DEFAULT_PANNING,
            keyboard_key: None,
            marks: SemitoneMarks::new(),
            touched: Vec::new(),
            detuning_target: None,
            recording: false,
            recording_notes: Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NoteStore {
        &mut self.store
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Store and host at once, e.g. to undo through a journal owned by the host
    pub fn parts_mut(&mut self) -> (&mut NoteStore, &mut H) {
        (&mut self.store, &mut self.host)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Replace the configuration after validating it
    pub fn set_config(&mut self, config: EditorConfig) -> NfResult<()> {
        config.validate()?;
        self.view.set_zoom_percent(config.zoom_percent);
        self.config = config;
        Ok(())
    }

    pub fn view(&self) -> &ViewMapping {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewMapping {
        &mut self.view
    }

    pub fn state(&self) -> EditorState {
        self.gesture.state()
    }

    pub fn edit_mode(&self) -> EditMode {
        self.config.edit_mode
    }

    pub fn set_edit_mode(&mut self, mode: EditMode) {
        self.ctrl_mode = None;
        self.config.edit_mode = mode;
    }

    pub fn note_edit_mode(&self) -> NoteEditMode {
        self.config.note_edit_mode
    }

    /// Switch the property lane to the next property
    pub fn cycle_note_edit_mode(&mut self) -> NoteEditMode {
        self.config.note_edit_mode = self.config.note_edit_mode.next();
        self.config.note_edit_mode
    }

    /// Notes written by the last pointer update
    pub fn touched_notes(&self) -> &[NoteId] {
        &self.touched
    }

    /// Live selection rectangle while selecting
    pub fn selection_region(&self) -> Option<&SelectionRegion> {
        match self.gesture {
            Gesture::Selecting => Some(&self.selection),
            _ => None,
        }
    }

    pub fn marked_semitones(&self) -> &SemitoneMarks {
        &self.marks
    }

    /// Note whose detuning curve was last opened with the detuning tool
    pub fn detuning_target(&self) -> Option<NoteId> {
        self.detuning_target
    }

    pub fn last_length(&self) -> Tick {
        self.last_length
    }

    /// Length of newly drawn notes
    pub fn new_note_length(&self) -> Tick {
        resolve_note_length(self.config.note_length, self.last_length)
    }

    /// Current grid spacing in ticks
    pub fn granularity(&self) -> Tick {
        self.config.granularity(self.last_length)
    }

    /// Grid lines of the visible area
    pub fn grid_lines(&self) -> Vec<GridLine> {
        let end = self.view.x_to_tick(self.view.note_edit_right());
        grid_lines(self.view.current_position, end, self.granularity())
    }

    pub fn notes_in_view(&self, ticks: Range<Tick>, keys: Range<Key>) -> Vec<&Note> {
        self.store.notes_in_view(ticks, keys)
    }

    /// Notes inside the visible part of the grid
    pub fn visible_notes(&self) -> Vec<&Note> {
        let ticks = self.view.current_position..self.view.x_to_tick(self.view.note_edit_right());
        let top = self.view.y_to_key(PR_TOP_MARGIN + 1);
        self.store.notes_in_view(ticks, self.view.start_key..top + 1)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Hit-testing
    // ─────────────────────────────────────────────────────────────────────────────

    /// Note a press lands on. Sentinel lengths count as a short step; the
    /// last matching note in position order wins.
    fn press_target(&self, tick: Tick, key: Key) -> Option<NoteId> {
        self.store
            .notes()
            .iter()
            .rev()
            .find(|n| {
                let len = n.hit_length();
                len > 0 && n.key == key && tick >= n.position && tick <= n.position + len
            })
            .map(|n| n.id())
    }

    /// Note under the pointer for cursor feedback. Only notes with a real
    /// length are considered.
    pub fn hover_target(&self, x: i32, y: i32) -> Option<HoverTarget> {
        if self.view.region(x, y) != ViewRegion::Grid || x <= WHITE_KEY_WIDTH {
            return None;
        }
        let tick = self.view.x_to_tick(x);
        let key = self.view.y_to_key(y);
        self.store
            .iter()
            .find(|n| {
                n.length > 0 && n.key == key && tick >= n.position && tick <= n.end_position()
            })
            .map(|n| HoverTarget {
                note: n.id(),
                on_tail: self.view.in_resize_area(n, tick),
            })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Pointer
    // ─────────────────────────────────────────────────────────────────────────────

    /// Start a gesture. Presses while another gesture runs are ignored.
    pub fn pointer_down(&mut self, ev: PointerEvent) {
        if !matches!(self.gesture, Gesture::Idle) {
            log::trace!("press of {:?} ignored during {:?}", ev.button, self.state());
            return;
        }
        self.touched.clear();
        let started_with_shift = ev.modifiers.shift;

        if self.config.edit_mode == EditMode::Detuning {
            if let Some(target) = self.hover_target(ev.x, ev.y) {
                if let Some(note) = self.store.get_mut(target.note) {
                    note.detuning_mut();
                }
                self.detuning_target = Some(target.note);
                log::debug!("detuning opened for {:?}", target.note);
                return;
            }
        }

        if ev.modifiers.ctrl && self.config.edit_mode != EditMode::Select {
            self.ctrl_mode = Some(self.config.edit_mode);
            self.config.edit_mode = EditMode::Select;
        }

        if ev.button == Some(PointerButton::Left) {
            self.anchor = self.view.anchor(ev.x, ev.y);
        }

        match self.view.region(ev.x, ev.y) {
            ViewRegion::LaneResizeBar => {
                self.gesture = Gesture::ResizingEditLane {
                    old_height: self.view.note_edit_height,
                    anchor_y: ev.y,
                };
            }
            ViewRegion::PropertyLane => {
                if self.lane_value(&ev).is_some() {
                    self.host.add_checkpoint(&self.store);
                    self.gesture = Gesture::EditingProperty;
                    self.edit_property(&ev);
                }
            }
            ViewRegion::Keyboard => self.press_keyboard(&ev),
            ViewRegion::Grid => self.press_grid(&ev, started_with_shift),
            ViewRegion::Header | ViewRegion::Outside => {}
        }

        if !matches!(self.gesture, Gesture::Idle) {
            self.gesture_button = ev.button;
        }
    }

    pub fn pointer_move(&mut self, ev: PointerEvent) {
        self.touched.clear();

        match &mut self.gesture {
            Gesture::Dragging(session) => {
                let (off_ticks, off_key) = self.view.drag_offsets(&self.anchor, ev.x, ev.y);
                let granularity = self.config.granularity(self.last_length);
                let update = session.update(
                    &mut self.store,
                    off_ticks,
                    off_key,
                    granularity,
                    ev.modifiers.alt,
                    ev.modifiers.shift,
                );
                if let Some(length) = update.resized_length {
                    self.last_length = length;
                }
                self.touched = update.touched;
                self.host.set_modified();
            }
            Gesture::Selecting => {
                let tick = self.view.x_to_tick(ev.x);
                let key = self.view.y_to_key(ev.y);
                self.selection.update(tick, key);
            }
            Gesture::ResizingEditLane { old_height, anchor_y } => {
                let (old_height, dy) = (*old_height, ev.y - *anchor_y);
                self.view.resize_lane(old_height, dy);
            }
            Gesture::EditingProperty => self.edit_property(&ev),
            Gesture::Erasing { .. } => {
                let tick = self.view.x_to_tick(ev.x);
                let key = self.view.y_to_key(ev.y);
                self.erase_at(tick, key);
            }
            Gesture::Idle => {}
        }
    }

    /// Finish the running gesture when the button that started it is released
    pub fn pointer_up(&mut self, ev: PointerEvent) {
        if !matches!(self.gesture, Gesture::Idle) && ev.button != self.gesture_button {
            return;
        }
        self.gesture_button = None;

        match std::mem::take(&mut self.gesture) {
            Gesture::Dragging(session) => {
                session.end(&mut self.store);
            }
            Gesture::Selecting => {
                let matched = self.selection.commit(&mut self.store, ev.modifiers.shift);
                self.touched = matched;
            }
            _ => {}
        }

        self.release_all_previews();
        if let Some(key) = self.keyboard_key.take() {
            self.host.key_release(key);
        }

        if !ev.modifiers.ctrl {
            self.release_ctrl();
        }
    }

    /// Restore the tool that was active before ctrl switched to selection
    pub fn release_ctrl(&mut self) {
        if let Some(mode) = self.ctrl_mode.take() {
            self.config.edit_mode = mode;
        }
    }

    /// Abort the running gesture. Drags are reverted to their snapshot.
    pub fn cancel_drag(&mut self) -> bool {
        self.gesture_button = None;
        let cancelled = match std::mem::take(&mut self.gesture) {
            Gesture::Dragging(session) => {
                session.cancel(&mut self.store);
                true
            }
            Gesture::Selecting => {
                self.selection.reset();
                true
            }
            Gesture::Idle => false,
            _ => true,
        };
        self.release_all_previews();
        cancelled
    }

    fn press_keyboard(&mut self, ev: &PointerEvent) {
        if ev.button != Some(PointerButton::Left) {
            return;
        }
        let key = self.view.y_to_key(ev.y);
        let velocity =
            (ev.x.max(0) as i64 * MIDI_DEFAULT_VELOCITY as i64 / WHITE_KEY_WIDTH as i64) as u8;
        self.host.key_press(key, velocity);
        self.keyboard_key = Some(key);
    }

    fn press_grid(&mut self, ev: &PointerEvent, started_with_shift: bool) {
        let tick = self.view.x_to_tick(ev.x);
        let key = self.view.y_to_key(ev.y);
        let target = self.press_target(tick, key);
        let mode = self.config.edit_mode;

        match ev.button {
            Some(PointerButton::Left) if mode == EditMode::Draw => {
                self.press_note(tick, key, target, started_with_shift)
            }
            Some(PointerButton::Right) if mode == EditMode::Draw => self.begin_erase(tick, key),
            Some(_) if mode == EditMode::Erase => self.begin_erase(tick, key),
            Some(PointerButton::Left) if mode == EditMode::Select => {
                self.selection.begin(tick, key);
                self.gesture = Gesture::Selecting;
            }
            _ => {}
        }
    }

    fn press_note(&mut self, tick: Tick, key: Key, target: Option<NoteId>, shift: bool) {
        let (id, is_new) = match target {
            Some(id) => (id, false),
            None => (self.create_notes(tick, key, shift), true),
        };

        let Some(note) = self.store.get(id) else {
            return;
        };
        self.last_volume = note.volume;
        self.last_panning = note.panning;
        self.last_length = note.length;
        let fallback = MoveBoundary::of_note(note);
        let on_tail = self.view.in_resize_area(note, tick);

        if !note.selected {
            self.store.clear_selection();
            self.store.set_selected(id, true);
        }

        // A freshly drawn note was checkpointed before it was added
        if !is_new {
            self.host.add_checkpoint(&self.store);
        }
        let kind = if on_tail {
            DragKind::Resize
        } else {
            if !is_new && shift {
                self.duplicate_selected();
            }
            if !self.recording {
                if let Some(note) = self.store.get_mut(id) {
                    preview_note(note, &mut self.host);
                }
            }
            DragKind::Move
        };

        let session = DragSession::begin(&mut self.store, kind, fallback, shift);
        self.gesture = Gesture::Dragging(session);
        self.host.set_modified();
    }

    /// Draw a note (plus chord) at the pointer and return the clicked one
    fn create_notes(&mut self, tick: Tick, key: Key, arpeggio: bool) -> NoteId {
        self.host.add_checkpoint(&self.store);
        self.store.clear_selection();

        let granularity = self.granularity();
        let length = self.new_note_length();
        let position = quantize_nearest(tick - granularity / 2, granularity).max(0);

        let make = |position: Tick, key: Key, volume: Volume, panning: Panning| {
            Note::new(length, position, key)
                .with_volume(volume)
                .with_panning(panning)
                .with_selected(true)
        };

        let id = self
            .store
            .add_note(make(position, key, self.last_volume, self.last_panning));

        let chord = ChordTable::global().chord_by_name(&self.config.chord);
        let mut chord_position = position;
        for chord_key in stamp_chord(key, chord).into_iter().skip(1) {
            if arpeggio {
                chord_position += length;
            }
            self.store.add_note(make(
                chord_position,
                chord_key,
                self.last_volume,
                self.last_panning,
            ));
        }

        log::debug!("note created at {} key {} length {}", position, key, length);
        id
    }

    /// Leave an unselected copy of every selected note in place
    fn duplicate_selected(&mut self) {
        let copies: Vec<Note> = self
            .store
            .selected_notes()
            .map(|n| n.clone().with_selected(false))
            .collect();
        let count = copies.len();
        for copy in copies {
            self.store.add_note(copy);
        }
        log::debug!("duplicated {} notes", count);
    }

    fn begin_erase(&mut self, tick: Tick, key: Key) {
        self.gesture = Gesture::Erasing { checkpointed: false };
        self.erase_at(tick, key);
    }

    /// Erase the note under a cell. Returns true when something changed.
    pub fn erase_at(&mut self, tick: Tick, key: Key) -> bool {
        let Some(id) = self.press_target(tick, key) else {
            return false;
        };

        let checkpointed = matches!(self.gesture, Gesture::Erasing { checkpointed: true });
        if !checkpointed {
            self.host.add_checkpoint(&self.store);
            if let Gesture::Erasing { checkpointed } = &mut self.gesture {
                *checkpointed = true;
            }
        }

        let Some(length) = self.store.get(id).map(|n| n.length) else {
            return false;
        };
        if length > 0 {
            self.store.remove_note(id);
        } else if let Some(note) = self.store.get_mut(id) {
            note.length = 0;
        }
        self.touched = vec![id];
        self.host.set_modified();
        true
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Property lane
    // ─────────────────────────────────────────────────────────────────────────────

    /// Value a lane event sets: pointer position with the left button,
    /// the default with the middle button or shift+right
    fn lane_value(&self, ev: &PointerEvent) -> Option<i32> {
        let mode = self.config.note_edit_mode;
        match ev.button {
            Some(PointerButton::Left) => {
                let (min, max) = mode.bounds();
                Some(value_from_pointer(
                    ev.y,
                    self.view.note_edit_top(),
                    self.view.note_edit_bottom(),
                    min,
                    max,
                ))
            }
            Some(PointerButton::Middle) => Some(mode.default_value()),
            Some(PointerButton::Right) if ev.modifiers.shift => Some(mode.default_value()),
            _ => None,
        }
    }

    fn edit_property(&mut self, ev: &PointerEvent) {
        let Some(value) = self.lane_value(ev) else {
            return;
        };
        let mode = self.config.note_edit_mode;
        match mode {
            NoteEditMode::Volume => self.last_volume = nf_core::clamp_volume(value),
            NoteEditMode::Panning => self.last_panning = nf_core::clamp_panning(value),
        }

        let (start, end) = self.view.tick_window(ev.x, DRAG_PIXEL_RANGE);
        let edited = apply_to_range(&mut self.store, start, end, mode, value, &mut self.host);
        if !edited.is_empty() {
            self.host.set_modified();
        }
        self.touched = edited;
    }

    /// Wheel in the property lane: step the property of notes near `x`
    pub fn wheel(&mut self, x: i32, y: i32, delta: i32) -> Vec<NoteId> {
        if delta == 0 || self.view.region(x, y) != ViewRegion::PropertyLane {
            return Vec::new();
        }
        let (start, end) = self.view.tick_window(x, WHEEL_PIXEL_RANGE);
        let has_selection = self.store.has_selection();
        if !self.store.iter().any(|n| in_edit_range(n, start, end, has_selection)) {
            return Vec::new();
        }

        self.host.add_checkpoint(&self.store);
        let step = delta.signum();
        let edited = step_in_range(&mut self.store, start, end, self.config.note_edit_mode, step);
        self.host.set_modified();
        self.touched = edited.clone();
        edited
    }

    /// Double-click in the property lane: notes whose value should be entered
    pub fn double_click(&self, x: i32, y: i32) -> Vec<NoteId> {
        if self.view.region(x, y) != ViewRegion::PropertyLane {
            return Vec::new();
        }
        let (start, end) = self.view.tick_window(x, VALUE_ENTRY_PIXEL_RANGE);
        let middle = self.view.x_to_tick(x);
        pick_for_value_entry(&self.store, start, end, middle)
    }

    /// Apply a value entered for notes picked by [`NoteEditor::double_click`]
    pub fn enter_value(&mut self, ids: &[NoteId], value: i32) -> usize {
        if ids.is_empty() {
            return 0;
        }
        self.host.add_checkpoint(&self.store);
        let count = set_value(&mut self.store, ids, self.config.note_edit_mode, value);
        if count > 0 {
            self.host.set_modified();
        }
        count
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Audio preview
    // ─────────────────────────────────────────────────────────────────────────────

    fn release_all_previews(&mut self) {
        for note in self.store.iter_mut() {
            release_note(note, &mut self.host);
        }
    }

    /// Silence sounding previews without forgetting them, or restart them
    pub fn pause_preview(&mut self, pause: bool) {
        for note in self.store.iter_mut().filter(|n| n.is_playing) {
            if pause {
                self.host.key_release(note.key);
            } else {
                note.is_playing = false;
                preview_note(note, &mut self.host);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Keyboard operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Transpose the selection, or every note when nothing is selected
    pub fn shift_semitone(&mut self, amount: Key) {
        let all = !self.store.has_selection();
        let changes = |n: &Note| (all || n.selected) && clamp_key(n.key + amount) != n.key;
        if !self.store.iter().any(changes) {
            return;
        }

        self.host.add_checkpoint(&self.store);
        for note in self.store.iter_mut().filter(|n| all || n.selected) {
            note.key = clamp_key(note.key + amount);
        }
        self.host.set_modified();
    }

    pub fn shift_octave(&mut self, direction: Key) {
        self.shift_semitone(direction.signum() * KEYS_PER_OCTAVE);
    }

    /// Move the selection in time, or every real note when nothing is
    /// selected. The offset is clamped at the leftmost affected note.
    pub fn shift_position(&mut self, amount: Tick) {
        let all = !self.store.has_selection();

        let Some(left) = self
            .store
            .iter()
            .filter(|n| n.selected || (all && n.length > 0))
            .map(|n| n.position)
            .min()
        else {
            return;
        };
        let amount = amount.max(-left);
        if amount == 0 {
            return;
        }

        self.host.add_checkpoint(&self.store);
        for note in self.store.iter_mut().filter(|n| n.selected || (all && n.length > 0)) {
            note.position += amount;
        }
        self.store.rearrange_all();
        self.host.set_modified();
    }

    /// Nudge by one grid step, or one tick when `free`
    pub fn nudge_position(&mut self, direction: i32, free: bool) {
        let step = if free { 1 } else { self.granularity() };
        self.shift_position(direction.signum() as Tick * step);
    }

    /// Nudge by one tact
    pub fn nudge_tact(&mut self, direction: i32) {
        self.shift_position(direction.signum() as Tick * TICKS_PER_TACT);
    }

    /// Delete every selected note. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.store.selected_ids();
        if ids.is_empty() {
            return 0;
        }
        self.host.add_checkpoint(&self.store);
        let removed = self.store.remove_notes(&ids);
        self.host.set_modified();
        log::debug!("deleted {} notes", removed);
        removed
    }

    pub fn select_all(&mut self) {
        self.store.select_all();
    }

    pub fn clear_selection(&mut self) {
        self.store.clear_selection();
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Clipboard
    // ─────────────────────────────────────────────────────────────────────────────

    /// Encode the selected notes, `None` without a selection
    pub fn copy_selected(&self) -> NfResult<Option<String>> {
        if !self.store.has_selection() {
            return Ok(None);
        }
        serialize_notes(self.store.selected_notes()).map(Some)
    }

    /// Encode and delete the selected notes
    pub fn cut_selected(&mut self) -> NfResult<Option<String>> {
        let blob = self.copy_selected()?;
        if blob.is_some() {
            self.delete_selected();
        }
        Ok(blob)
    }

    /// Insert clipboard notes relative to `at`. Only the pasted notes end
    /// up selected.
    pub fn paste(&mut self, blob: &str, at: Tick) -> NfResult<Vec<NoteId>> {
        let notes = deserialize_notes(blob).inspect_err(|e| {
            log::warn!("clipboard data rejected: {}", e);
        })?;
        if notes.is_empty() {
            return Ok(Vec::new());
        }

        self.host.add_checkpoint(&self.store);
        let ids = paste_notes(&mut self.store, notes, at);
        self.host.set_modified();
        log::debug!("pasted {} notes at {}", ids.len(), at);
        Ok(ids)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Semitone marks
    // ─────────────────────────────────────────────────────────────────────────────

    /// Apply a marking action using the configured scale and chord
    pub fn mark_semitones(&mut self, action: SemitoneMarkAction, reference_key: Key) {
        let table = ChordTable::global();
        self.marks = mark_semitones(
            action,
            reference_key,
            table.scale_by_name(&self.config.scale),
            table.chord_by_name(&self.config.chord),
            &self.marks,
        );
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Recording
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
        if !recording {
            self.recording_notes.clear();
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// A key went down while recording at pattern tick `tick`
    pub fn record_note_on(&mut self, key: Key, tick: Tick, volume: Volume, panning: Panning) {
        if self.recording && tick >= 0 {
            self.recording_notes.push(RecordingNote {
                key,
                position: tick,
                volume,
                panning,
            });
        }
    }

    /// A key was released after `length` ticks; the note is quantized and stored
    pub fn record_note_off(&mut self, key: Key, length: Tick) -> Option<NoteId> {
        if !self.recording {
            return None;
        }
        let idx = self.recording_notes.iter().position(|r| r.key == key)?;
        let pending = self.recording_notes.remove(idx);

        let mut note = Note::new(length, pending.position, clamp_key(pending.key))
            .with_volume(pending.volume)
            .with_panning(pending.panning);
        note.quantize_length(self.granularity());

        let id = self.store.add_note(note);
        self.host.set_modified();
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::RecordingHost;
    use crate::view::KEY_LINE_HEIGHT;

    fn editor() -> NoteEditor<RecordingHost> {
        let mut editor = NoteEditor::new(RecordingHost::default(), EditorConfig::default());
        editor.view_mut().start_key = 48;
        editor
    }

    /// Pixel center of a (tick, key) cell at default zoom
    fn cell(editor: &NoteEditor<RecordingHost>, tick: Tick, key: Key) -> (i32, i32) {
        let view = editor.view();
        (view.tick_to_x(tick), view.key_to_y(key) + KEY_LINE_HEIGHT / 2)
    }

    #[test]
    fn test_draw_creates_selected_note() {
        let mut editor = editor();
        let (x, y) = cell(&editor, 30, 60);
        editor.pointer_down(PointerEvent::left(x, y));

        assert_eq!(editor.state(), EditorState::Moving);
        let note = &editor.store().notes()[0];
        assert_eq!((note.position, note.key, note.length), (24, 60, 48));
        assert!(note.selected);
        assert_eq!(editor.host().checkpoints, 1);
        assert_eq!(editor.host().pressed, vec![(60, 63)]);

        editor.pointer_up(PointerEvent::left(x, y));
        assert_eq!(editor.state(), EditorState::Idle);
        // Single note gets deselected after the gesture
        assert!(!editor.store().has_selection());
        assert_eq!(editor.host().released, vec![60]);
    }

    #[test]
    fn test_draw_chord_and_arpeggio() {
        let mut config = EditorConfig::default();
        config.chord = "Major".to_string();
        let mut editor = NoteEditor::new(RecordingHost::default(), config);
        editor.view_mut().start_key = 48;

        let (x, y) = cell(&editor, 0, 60);
        editor.pointer_down(PointerEvent::left(x, y));
        editor.pointer_up(PointerEvent::left(x, y));
        let keys: Vec<Key> = editor.store().iter().map(|n| n.key).collect();
        assert_eq!(keys, vec![60, 64, 67]);

        let (x, y) = cell(&editor, 384, 60);
        let ev = PointerEvent::left(x, y).with_modifiers(Modifiers::SHIFT);
        editor.pointer_down(ev);
        editor.pointer_up(ev);
        let arpeggio: Vec<Tick> = editor
            .store()
            .iter()
            .filter(|n| n.position >= 384)
            .map(|n| n.position)
            .collect();
        assert_eq!(arpeggio, vec![384, 432, 480]);
    }

    #[test]
    fn test_resize_from_tail() {
        let mut editor = editor();
        let id = editor.store_mut().add_note(Note::new(48, 0, 60));
        let (x, y) = cell(&editor, 47, 60);
        editor.pointer_down(PointerEvent::left(x, y));
        assert_eq!(editor.state(), EditorState::Resizing);

        editor.pointer_move(PointerEvent::left(x + 24, y));
        assert_eq!(editor.store().get(id).unwrap().length, 72);
        assert_eq!(editor.last_length(), 72);
        assert_eq!(editor.touched_notes(), &[id]);
        editor.pointer_up(PointerEvent::left(x + 24, y));
        assert_eq!(editor.new_note_length(), 72);
    }

    #[test]
    fn test_shift_press_duplicates() {
        let mut editor = editor();
        let id = editor.store_mut().add_note(Note::new(48, 0, 60).with_selected(true));
        let (x, y) = cell(&editor, 10, 60);
        let ev = PointerEvent::left(x, y).with_modifiers(Modifiers::SHIFT);
        editor.pointer_down(ev);
        editor.pointer_move(PointerEvent::left(x + 96, y).with_modifiers(Modifiers::SHIFT));
        editor.pointer_up(ev);

        assert_eq!(editor.store().len(), 2);
        assert_eq!(editor.store().get(id).unwrap().position, 96);
        assert_eq!(editor.store().notes()[0].position, 0);
    }

    #[test]
    fn test_ctrl_selects_and_restores_tool() {
        let mut editor = editor();
        editor.store_mut().add_note(Note::new(48, 0, 60));
        editor.store_mut().add_note(Note::new(48, 96, 62));

        let (x0, y0) = cell(&editor, 0, 62);
        let (x1, y1) = cell(&editor, 150, 60);
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        editor.pointer_down(PointerEvent::left(x0, y0).with_modifiers(ctrl));
        assert_eq!(editor.state(), EditorState::Selecting);
        editor.pointer_move(PointerEvent::left(x1, y1).with_modifiers(ctrl));
        assert!(editor.selection_region().is_some());
        editor.pointer_up(PointerEvent::left(x1, y1));

        assert_eq!(editor.store().selection_count(), 2);
        assert_eq!(editor.edit_mode(), EditMode::Draw);
    }

    #[test]
    fn test_right_button_erases() {
        let mut editor = editor();
        editor.store_mut().add_note(Note::new(48, 0, 60));
        let step = editor.store_mut().add_note(Note::new(-1, 96, 60));
        editor.store_mut().add_note(Note::new(48, 192, 60));

        let (x, y) = cell(&editor, 10, 60);
        let right = PointerEvent::new(x, y, Some(PointerButton::Right), Modifiers::NONE);
        editor.pointer_down(right);
        assert_eq!(editor.store().len(), 2);

        let (x, y) = cell(&editor, 98, 60);
        editor.pointer_move(PointerEvent::new(x, y, Some(PointerButton::Right), Modifiers::NONE));
        assert_eq!(editor.store().get(step).unwrap().length, 0);

        let (x, y) = cell(&editor, 200, 60);
        editor.pointer_move(PointerEvent::new(x, y, Some(PointerButton::Right), Modifiers::NONE));
        editor.pointer_up(right);
        assert_eq!(editor.store().len(), 1);
        // One checkpoint for the whole erase gesture
        assert_eq!(editor.host().checkpoints, 1);
    }

    #[test]
    fn test_hover_excludes_sentinels() {
        let mut editor = editor();
        editor.store_mut().add_note(Note::new(-1, 0, 60));
        let (x, y) = cell(&editor, 1, 60);
        assert!(editor.hover_target(x, y).is_none());

        let id = editor.store_mut().add_note(Note::new(48, 96, 60));
        let (x, y) = cell(&editor, 143, 60);
        assert_eq!(editor.hover_target(x, y), Some(HoverTarget { note: id, on_tail: true }));
    }

    #[test]
    fn test_property_lane_drag() {
        let mut editor = editor();
        let id = editor.store_mut().add_note(Note::new(48, 96, 60));
        let x = editor.view().tick_to_x(96);
        let top = editor.view().note_edit_top();

        // Just below the lane top maps to 93/94 of the volume range
        editor.pointer_down(PointerEvent::left(x, top + 1));
        assert_eq!(editor.state(), EditorState::EditingProperty);
        assert_eq!(editor.store().get(id).unwrap().volume, 197);

        let middle = PointerEvent::new(x, top + 10, Some(PointerButton::Middle), Modifiers::NONE);
        editor.pointer_move(middle);
        assert_eq!(editor.store().get(id).unwrap().volume, DEFAULT_VOLUME);
        editor.pointer_up(PointerEvent::left(x, top + 10));
        assert_eq!(editor.host().checkpoints, 1);
        assert!(!editor.store().get(id).unwrap().is_playing);
    }

    #[test]
    fn test_wheel_and_value_entry() {
        let mut editor = editor();
        let id = editor.store_mut().add_note(Note::new(48, 96, 60));
        editor.cycle_note_edit_mode();
        let x = editor.view().tick_to_x(96);
        let y = editor.view().note_edit_top() + 20;

        assert_eq!(editor.wheel(x, y, 120), vec![id]);
        assert_eq!(editor.store().get(id).unwrap().panning, 1);

        let picked = editor.double_click(x, y);
        assert_eq!(picked, vec![id]);
        assert_eq!(editor.enter_value(&picked, -40), 1);
        assert_eq!(editor.store().get(id).unwrap().panning, -40);

        // Grid area ignores the wheel
        let (gx, gy) = cell(&editor, 96, 60);
        assert!(editor.wheel(gx, gy, 120).is_empty());
    }

    #[test]
    fn test_other_buttons_ignored_during_drag() {
        let mut editor = editor();
        let dragged = editor.store_mut().add_note(Note::new(48, 96, 60));
        let other = editor.store_mut().add_note(Note::new(48, 192, 60));

        let (x, y) = cell(&editor, 100, 60);
        editor.pointer_down(PointerEvent::left(x, y));
        editor.pointer_move(PointerEvent::left(x + 192, y));

        // Right button on the other note neither erases nor ends the move
        let (rx, ry) = cell(&editor, 200, 60);
        let right = PointerEvent::new(rx, ry, Some(PointerButton::Right), Modifiers::NONE);
        editor.pointer_down(right);
        editor.pointer_up(right);
        assert_eq!(editor.state(), EditorState::Moving);
        assert!(editor.store().contains(other));

        editor.pointer_up(PointerEvent::left(x + 192, y));
        assert_eq!(editor.state(), EditorState::Idle);
        let order: Vec<NoteId> = editor.store().iter().map(|n| n.id()).collect();
        assert_eq!(order, vec![other, dragged]);
        let positions: Vec<Tick> = editor.store().iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![192, 288]);
        assert!(!editor.store().has_selection());
    }

    #[test]
    fn test_shift_semitone_without_change_is_noop() {
        let mut editor = editor();
        editor.shift_semitone(12);
        assert_eq!(editor.host().checkpoints, 0);
        assert_eq!(editor.host().modified, 0);

        editor.store_mut().add_note(Note::new(48, 0, nf_core::MAX_KEY));
        editor.shift_semitone(5);
        editor.shift_semitone(0);
        assert_eq!(editor.host().checkpoints, 0);
        assert_eq!(editor.host().modified, 0);

        editor.shift_semitone(-1);
        assert_eq!(editor.host().checkpoints, 1);
        assert_eq!(editor.store().notes()[0].key, nf_core::MAX_KEY - 1);
    }

    #[test]
    fn test_shift_position_at_zero_is_noop() {
        let mut editor = editor();
        editor.store_mut().add_note(Note::new(48, 0, 60));
        editor.shift_position(-24);
        assert_eq!(editor.host().checkpoints, 0);
        editor.shift_position(0);
        assert_eq!(editor.host().modified, 0);
    }

    #[test]
    fn test_cancel_drag_restores() {
        let mut editor = editor();
        let id = editor.store_mut().add_note(Note::new(48, 96, 60));
        let (x, y) = cell(&editor, 100, 60);
        editor.pointer_down(PointerEvent::left(x, y));
        editor.pointer_move(PointerEvent::left(x + 192, y - 3 * KEY_LINE_HEIGHT));
        assert_eq!(editor.store().get(id).unwrap().position, 288);

        assert!(editor.cancel_drag());
        let note = editor.store().get(id).unwrap();
        assert_eq!((note.position, note.key), (96, 60));
        assert_eq!(editor.state(), EditorState::Idle);
        assert!(!editor.cancel_drag());
    }

    #[test]
    fn test_shift_position_clamps_at_zero() {
        let mut editor = editor();
        editor.store_mut().add_note(Note::new(48, 24, 60));
        editor.store_mut().add_note(Note::new(48, 96, 60));
        editor.store_mut().add_note(Note::new(0, 0, 64));

        editor.shift_position(-48);
        let positions: Vec<Tick> = editor.store().iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![0, 0, 72]);

        editor.nudge_tact(1);
        let last = editor.store().notes().last().map(|n| n.position);
        assert_eq!(last, Some(264));
    }

    #[test]
    fn test_copy_cut_paste() {
        let mut editor = editor();
        editor.store_mut().add_note(Note::new(48, 200, 60).with_selected(true));
        editor.store_mut().add_note(Note::new(48, 0, 62));

        let blob = editor.cut_selected().unwrap().unwrap();
        assert_eq!(editor.store().len(), 1);

        let ids = editor.paste(&blob, 384).unwrap();
        assert_eq!(editor.store().get(ids[0]).unwrap().position, 392);
        assert_eq!(editor.store().selection_count(), 1);
        assert!(editor.paste("garbage", 0).is_err());

        editor.clear_selection();
        assert!(editor.copy_selected().unwrap().is_none());
    }

    #[test]
    fn test_recording_quantizes_length() {
        let mut editor = editor();
        editor.record_note_on(60, 10, 80, 0);
        assert!(editor.record_note_off(60, 20).is_none());

        editor.set_recording(true);
        editor.record_note_on(60, 10, 80, 0);
        editor.record_note_on(62, -5, 80, 0);
        let id = editor.record_note_off(60, 20).unwrap();
        let note = editor.store().get(id).unwrap();
        assert_eq!((note.position, note.length, note.volume), (10, 24, 80));
        assert!(editor.record_note_off(62, 20).is_none());
    }

    #[test]
    fn test_mark_semitones_uses_config() {
        let mut config = EditorConfig::default();
        config.chord = "minor".to_string();
        let mut editor = NoteEditor::new(RecordingHost::default(), config);
        editor.mark_semitones(SemitoneMarkAction::MarkChord, 57);
        let marks: Vec<Key> = editor.marked_semitones().iter().copied().collect();
        assert_eq!(marks, vec![57, 60, 64]);
        editor.mark_semitones(SemitoneMarkAction::UnmarkAll, 57);
        assert!(editor.marked_semitones().is_empty());
    }

    #[test]
    fn test_detuning_tool() {
        let mut editor = editor();
        editor.set_edit_mode(EditMode::Detuning);
        let id = editor.store_mut().add_note(Note::new(48, 0, 60));
        let (x, y) = cell(&editor, 10, 60);
        editor.pointer_down(PointerEvent::left(x, y));
        assert_eq!(editor.detuning_target(), Some(id));
        assert!(editor.store().get(id).unwrap().has_detuning());
        assert_eq!(editor.state(), EditorState::Idle);
    }
}
