//! The canvas engine: routes pointer, wheel, and keyboard input through the
//! gesture state machine and reports every document change as an [`Action`].
//!
//! `EngineCore` owns the block store, camera, UI state, and the active
//! gesture. It never performs I/O; the host turns the returned actions into
//! autosaves, reminder cascades, and re-renders.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use crate::camera::{Camera, Point, Size};
use crate::consts::{WHEEL_ZOOM_IN, WHEEL_ZOOM_OUT};
use crate::doc::{Block, BlockId, BlockKind, BlockPatch, BlockStore, ShapeType, TextBlock, create_block};
use crate::draw::{DrawSession, DrawStyle};
use crate::gesture::{
    BoxResizeGesture, DragGesture, EndpointGesture, Gesture, IconResizeGesture, RotateGesture, SegmentEnd,
    TextResizeGesture,
};
use crate::hit::{self, HitPart};
use crate::input::{Button, InputState, Key, Modifiers, Tool, UiState, WheelDelta};
use crate::listeners::{ListenerKind, ListenerRegistry};
use crate::render::{self, Scene};

/// Document listeners attached for the lifetime of a pointer gesture.
const GESTURE_LISTENERS: [ListenerKind; 2] = [ListenerKind::PointerMove, ListenerKind::PointerUp];

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    BlockCreated(Block),
    BlockUpdated { id: BlockId, patch: BlockPatch },
    /// `reminder_ids` lists the reminders referenced by the deleted block's content.
    BlockDeleted { id: BlockId, reminder_ids: Vec<String> },
    SelectionChanged(Option<BlockId>),
    CameraChanged(Camera),
    ToolChanged(Tool),
    /// The user asked to edit the label of a shape.
    EditTextRequested { id: BlockId },
    SetCursor(String),
    RenderNeeded,
}

impl Action {
    /// Whether this action changes what gets persisted.
    #[must_use]
    pub fn mutates_document(&self) -> bool {
        matches!(
            self,
            Self::BlockCreated(_) | Self::BlockUpdated { .. } | Self::BlockDeleted { .. } | Self::CameraChanged(_)
        )
    }
}

/// Core engine state. Free of any browser dependency so it can be driven from tests.
#[derive(Debug, Default)]
pub struct EngineCore {
    pub doc: BlockStore,
    pub camera: Camera,
    pub ui: UiState,
    pub input: InputState,
    pub viewport: Size,
    listeners: ListenerRegistry,
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that attaches its gesture listeners to a shared registry.
    #[must_use]
    pub fn with_listeners(listeners: ListenerRegistry) -> Self {
        Self { listeners, ..Self::default() }
    }

    #[must_use]
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    // --- Data inputs ---

    /// Replace the scene with a loaded document. Any gesture in progress is dropped.
    pub fn load(&mut self, blocks: Vec<Block>, camera: Camera) {
        self.input = InputState::Idle;
        self.doc.load(blocks);
        self.camera = camera;
        self.ui.selected_id = None;
    }

    /// Record the host viewport size in CSS pixels.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Size::new(width, height);
    }

    /// The host reports whether a text surface has keyboard focus.
    pub fn set_text_editing(&mut self, editing: bool) {
        self.ui.text_editing = editing;
    }

    pub fn set_draw_style(&mut self, style: DrawStyle) {
        self.ui.draw_style = style;
    }

    // --- Tool / selection ---

    /// Arm a drawing tool or return to selection.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        if self.ui.tool == tool {
            return Vec::new();
        }
        if matches!(self.input, InputState::Drawing { .. }) {
            self.input = InputState::Idle;
        }
        self.ui.tool = tool;
        vec![Action::ToolChanged(tool), Action::RenderNeeded]
    }

    /// Select a block, or clear the selection. Unknown ids clear it.
    pub fn select(&mut self, id: Option<BlockId>) -> Vec<Action> {
        let id = id.filter(|id| self.doc.get(id).is_some());
        if self.ui.selected_id == id {
            return Vec::new();
        }
        self.ui.selected_id = id;
        vec![Action::SelectionChanged(id), Action::RenderNeeded]
    }

    // --- Block mutations ---

    /// Insert a new block built from `patch`, select it, and report it.
    pub fn create_block(
        &mut self,
        kind: BlockKind,
        shape_type: ShapeType,
        icon_name: &str,
        patch: &BlockPatch,
    ) -> Vec<Action> {
        self.insert_selected(create_block(kind, shape_type, icon_name, patch))
    }

    /// Double-click on empty canvas: a default text block at the world point.
    pub fn create_text_at(&mut self, world: Point) -> Vec<Action> {
        self.insert_selected(Block::Text(TextBlock::new(world)))
    }

    /// Add an AI summary as a new text block beside the existing text.
    pub fn add_summary_block(&mut self, html: &str) -> Vec<Action> {
        let block = self.doc.summary_block(html);
        self.insert_selected(block)
    }

    fn insert_selected(&mut self, block: Block) -> Vec<Action> {
        let id = block.id();
        self.doc.insert(block.clone());
        self.ui.selected_id = Some(id);
        vec![Action::BlockCreated(block), Action::SelectionChanged(Some(id)), Action::RenderNeeded]
    }

    /// Merge `patch` into a block. Unknown ids are a no-op.
    pub fn update_block(&mut self, id: BlockId, patch: BlockPatch) -> Vec<Action> {
        if !self.doc.apply_patch(&id, &patch) {
            return Vec::new();
        }
        vec![Action::BlockUpdated { id, patch }, Action::RenderNeeded]
    }

    /// Merge `patch` into the selected block, if any.
    pub fn update_selected(&mut self, patch: BlockPatch) -> Vec<Action> {
        match self.ui.selected_id {
            Some(id) => self.update_block(id, patch),
            None => Vec::new(),
        }
    }

    /// Remove a block. The action carries the reminder ids its content referenced
    /// so the host can delete them too.
    pub fn delete_block(&mut self, id: BlockId) -> Vec<Action> {
        let Some(block) = self.doc.remove(&id) else {
            return Vec::new();
        };
        if self.input.editing_id() == Some(id) {
            self.input = InputState::Idle;
        }
        let mut actions = vec![Action::BlockDeleted { id, reminder_ids: block.reminder_ids() }];
        if self.ui.selected_id == Some(id) {
            self.ui.selected_id = None;
            actions.push(Action::SelectionChanged(None));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Camera ---

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.camera.zoom_in();
        self.camera_changed()
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.camera.zoom_out();
        self.camera_changed()
    }

    /// Fit every block into the current viewport.
    pub fn zoom_to_fit(&mut self) -> Vec<Action> {
        self.camera.zoom_to_fit(self.doc.extents(), self.viewport);
        self.camera_changed()
    }

    fn camera_changed(&self) -> Vec<Action> {
        vec![Action::CameraChanged(self.camera), Action::RenderNeeded]
    }

    // --- Input events ---

    /// Pointer pressed. Starts at most one gesture; presses during a gesture are ignored.
    pub fn on_pointer_down(&mut self, screen: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if !self.input.is_idle() {
            return Vec::new();
        }
        match button {
            Button::Middle => {
                self.start_panning(screen);
                Vec::new()
            }
            Button::Secondary => Vec::new(),
            Button::Primary => self.primary_down(screen),
        }
    }

    fn primary_down(&mut self, screen: Point) -> Vec<Action> {
        let Some(hit) = hit::hit_test(screen, &self.doc, &self.camera, self.ui.selected_id) else {
            if let Some(shape_type) = self.ui.tool.shape_type() {
                let world = self.camera.screen_to_world(screen);
                self.input = InputState::Drawing {
                    session: DrawSession::begin(shape_type, world),
                    listeners: self.listeners.subscribe(&GESTURE_LISTENERS),
                };
                return vec![Action::SetCursor("crosshair".into())];
            }
            let mut actions = self.select(None);
            self.start_panning(screen);
            actions.push(Action::SetCursor("grabbing".into()));
            return actions;
        };

        let mut actions = self.select(Some(hit.block_id));
        if let Some(gesture) = self.begin_gesture(hit.block_id, hit.part, screen) {
            actions.push(Action::SetCursor(gesture.cursor().into()));
            self.input = InputState::Editing {
                id: hit.block_id,
                gesture,
                listeners: self.listeners.subscribe(&GESTURE_LISTENERS),
            };
        }
        actions
    }

    fn start_panning(&mut self, screen: Point) {
        self.input = InputState::Panning {
            last_screen: screen,
            listeners: self.listeners.subscribe(&GESTURE_LISTENERS),
        };
    }

    /// Snapshot what a gesture on `part` of block `id` needs. `None` if the block
    /// or the part does not exist.
    fn begin_gesture(&self, id: BlockId, part: HitPart, screen: Point) -> Option<Gesture> {
        let block = self.doc.get(&id)?;
        let zoom = self.camera.zoom;
        let gesture = match (part, block) {
            (HitPart::Body, _) => {
                Gesture::Drag(DragGesture { start_screen: screen, start_position: block.position(), zoom })
            }
            (HitPart::Corner(corner), Block::Shape(shape)) => Gesture::ResizeBox(BoxResizeGesture {
                corner,
                start_screen: screen,
                start_position: shape.position,
                start_size: shape.size()?,
                zoom,
            }),
            (HitPart::Endpoint(end), Block::Shape(shape)) => {
                let (start, finish) = shape.segment()?;
                let start_point = match end {
                    SegmentEnd::Start => start,
                    SegmentEnd::End => finish,
                };
                Gesture::Endpoint(EndpointGesture { end, start_screen: screen, start_point, zoom })
            }
            (HitPart::IconResize, Block::Icon(icon)) => {
                Gesture::ResizeIcon(IconResizeGesture { start_screen: screen, start_size: icon.size, zoom })
            }
            (HitPart::TextResize, Block::Text(text)) => Gesture::ResizeText(TextResizeGesture {
                start_screen: screen,
                start_width: text.width,
                start_height: text.height,
                zoom,
            }),
            (HitPart::Rotate, Block::Shape(shape)) => {
                let center = self.camera.world_to_screen(block.extent().center());
                Gesture::Rotate(RotateGesture::begin(center, screen, shape.rotation))
            }
            _ => return None,
        };
        Some(gesture)
    }

    /// Pointer moved. Drives the active gesture; a move with no gesture does nothing.
    pub fn on_pointer_move(&mut self, screen: Point, _modifiers: Modifiers) -> Vec<Action> {
        match &mut self.input {
            InputState::Idle => Vec::new(),
            InputState::Panning { last_screen, .. } => {
                self.camera.pan(screen.x - last_screen.x, screen.y - last_screen.y);
                *last_screen = screen;
                self.camera_changed()
            }
            InputState::Editing { id, gesture, .. } => {
                let id = *id;
                let patch = gesture.patch_at(screen);
                if self.doc.apply_patch(&id, &patch) {
                    vec![Action::BlockUpdated { id, patch }, Action::RenderNeeded]
                } else {
                    self.input = InputState::Idle;
                    Vec::new()
                }
            }
            InputState::Drawing { session, .. } => {
                session.update(self.camera.screen_to_world(screen));
                vec![Action::RenderNeeded]
            }
        }
    }

    /// Pointer released. Ends the active gesture and detaches its listeners.
    pub fn on_pointer_up(&mut self, screen: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::Panning { .. } | InputState::Editing { .. } => vec![Action::SetCursor("default".into())],
            InputState::Drawing { mut session, .. } => {
                session.update(self.camera.screen_to_world(screen));
                let Some(shape) = session.commit(&self.ui.draw_style) else {
                    return vec![Action::RenderNeeded];
                };
                let mut actions = self.insert_selected(Block::Shape(shape));
                self.ui.tool = Tool::Select;
                actions.push(Action::ToolChanged(Tool::Select));
                actions.push(Action::SetCursor("default".into()));
                actions
            }
        }
    }

    /// Double click: on empty canvas creates a text block; on a box shape asks to edit its label.
    pub fn on_double_click(&mut self, screen: Point) -> Vec<Action> {
        if self.ui.tool.is_drawing() {
            return Vec::new();
        }
        let world = self.camera.screen_to_world(screen);
        let top = self
            .doc
            .draw_order()
            .into_iter()
            .rev()
            .find(|b| hit::hits_body(b, world))
            .map(|b| (b.id(), b.is_shape()));
        match top {
            None => self.create_text_at(world),
            Some((id, true)) => {
                let mut actions = self.select(Some(id));
                actions.push(Action::EditTextRequested { id });
                actions
            }
            Some((_, false)) => Vec::new(),
        }
    }

    /// Wheel: zooms toward the pointer while Ctrl/Meta is held; otherwise ignored.
    pub fn on_wheel(&mut self, screen: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if !modifiers.command() {
            return Vec::new();
        }
        let factor = if delta.dy > 0.0 { WHEEL_ZOOM_OUT } else { WHEEL_ZOOM_IN };
        self.camera.zoom_at(screen, factor);
        self.camera_changed()
    }

    /// Key pressed at document level.
    pub fn on_key_down(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        if key.is("Escape") {
            if matches!(self.input, InputState::Drawing { .. }) {
                self.input = InputState::Idle;
            }
            if self.ui.tool.is_drawing() {
                return self.set_tool(Tool::Select);
            }
            return Vec::new();
        }

        if (key.is("Delete") || key.is("Backspace")) && !self.ui.text_editing {
            let selected_shape = self.ui.selected_id.filter(|id| self.doc.get(id).is_some_and(Block::is_shape));
            if let Some(id) = selected_shape {
                return self.delete_block(id);
            }
        }
        Vec::new()
    }

    /// Abandon the active gesture (focus loss, pointer capture lost). Changes already
    /// applied stay; no further updates are emitted.
    pub fn cancel_gesture(&mut self) -> Vec<Action> {
        if self.input.is_idle() {
            return Vec::new();
        }
        self.input = InputState::Idle;
        vec![Action::SetCursor("default".into()), Action::RenderNeeded]
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> Option<BlockId> {
        self.ui.selected_id
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.doc.get(id)
    }

    /// Display list for the current frame.
    #[must_use]
    pub fn scene(&self) -> Scene {
        render::build_scene(&self.doc, &self.camera, &self.ui, &self.input)
    }

    /// The draw session in progress, if any.
    #[must_use]
    pub fn draw_session(&self) -> Option<&DrawSession> {
        match &self.input {
            InputState::Drawing { session, .. } => Some(session),
            InputState::Idle | InputState::Panning { .. } | InputState::Editing { .. } => None,
        }
    }
}
