//! Input model: tools, modifier keys, mouse buttons, and the gesture state machine.
//!
//! `Tool` and `Modifiers` capture the user's intent at the time of a pointer
//! event. `InputState` is the gesture tracked between pointer-down and
//! pointer-up. Every active variant owns the [`ListenerGuard`] for the
//! document listeners it attached, so returning to `Idle` (by release,
//! cancel, or dropping the engine) detaches them.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::doc::{BlockId, ShapeType};
use crate::draw::{DrawSession, DrawStyle};
use crate::gesture::Gesture;
use crate::listeners::ListenerGuard;

/// Which tool is currently armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Pointer / selection tool (default).
    #[default]
    Select,
    Line,
    Arrow,
    Rectangle,
    Circle,
    Triangle,
}

impl Tool {
    /// The tool that draws `shape_type`.
    #[must_use]
    pub fn drawing(shape_type: ShapeType) -> Self {
        match shape_type {
            ShapeType::Line => Self::Line,
            ShapeType::Arrow => Self::Arrow,
            ShapeType::Rectangle => Self::Rectangle,
            ShapeType::Circle => Self::Circle,
            ShapeType::Triangle => Self::Triangle,
        }
    }

    /// Shape drawn by this tool, or `None` for the selection tool.
    #[must_use]
    pub fn shape_type(self) -> Option<ShapeType> {
        match self {
            Self::Select => None,
            Self::Line => Some(ShapeType::Line),
            Self::Arrow => Some(ShapeType::Arrow),
            Self::Rectangle => Some(ShapeType::Rectangle),
            Self::Circle => Some(ShapeType::Circle),
            Self::Triangle => Some(ShapeType::Triangle),
        }
    }

    /// Whether a drawing tool is armed.
    #[must_use]
    pub fn is_drawing(self) -> bool {
        self != Self::Select
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Meta / Command key.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
}

/// A keyboard key, named as the browser reports it (e.g. `"Delete"`, `"Escape"`, `"a"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0 == name
    }

    /// The character this key types, if it is a single printable character.
    #[must_use]
    pub fn printable(&self) -> Option<char> {
        let mut chars = self.0.chars();
        let c = chars.next()?;
        if chars.next().is_none() && !c.is_control() { Some(c) } else { None }
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    pub dx: f64,
    /// Positive = down.
    pub dy: f64,
}

/// Persistent UI state visible to the renderer and the host.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub tool: Tool,
    pub selected_id: Option<BlockId>,
    /// Style applied to newly drawn shapes.
    pub draw_style: DrawStyle,
    /// A text surface has keyboard focus; Delete/Backspace belong to it.
    pub text_editing: bool,
}

/// The gesture currently tracked by the engine.
#[derive(Debug, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Dragging the empty canvas.
    Panning {
        /// Screen position of the previous pointer event.
        last_screen: Point,
        listeners: ListenerGuard,
    },
    /// Moving, resizing, or rotating an existing block.
    Editing {
        id: BlockId,
        gesture: Gesture,
        listeners: ListenerGuard,
    },
    /// Drawing a new shape with an armed tool.
    Drawing {
        session: DrawSession,
        listeners: ListenerGuard,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Id of the block being edited, if any.
    #[must_use]
    pub fn editing_id(&self) -> Option<BlockId> {
        match self {
            Self::Editing { id, .. } => Some(*id),
            Self::Idle | Self::Panning { .. } | Self::Drawing { .. } => None,
        }
    }
}
