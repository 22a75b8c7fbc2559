//! Overlays: popups, dialogs, and menus drawn above the camera-transformed
//! content in screen space.
//!
//! An [`OverlayLayer`] owns every open overlay in z-order. Each overlay gets
//! a fresh generation when it opens; async work started for it carries a
//! [`RequestTicket`] that stops being accepted once that generation closes,
//! so late responses are dropped instead of landing in a different popup.
//!
//! Dismissal follows the document-listener model: every open overlay holds
//! a key-down listener for Escape, and an outside-click listener that is
//! only attached once the arm delay has passed, so the click that opened an
//! overlay never closes it.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use crate::camera::{Point, Rect, Size};
use crate::consts::{MIN_SELECTION_CHARS, OUTSIDE_CLICK_ARM_MS};
use crate::input::Key;
use crate::listeners::{ListenerGuard, ListenerKind, ListenerRegistry};

/// Gap between the anchor and a popup below it.
const POPUP_OFFSET: f64 = 10.0;
/// Minimum distance between a popup and the viewport edge.
const POPUP_MARGIN: f64 = 20.0;
/// Minimum distance between the command menu and the viewport edge.
const MENU_PADDING: f64 = 10.0;
/// Height of the caret line the command menu flips over.
const MENU_LINE_HEIGHT: f64 = 20.0;

/// What an overlay shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Insight,
    Annotation,
    CommandMenu,
    Reminder,
}

impl OverlayKind {
    /// Delay before an outside click can dismiss this overlay, in ms.
    #[must_use]
    pub fn arm_delay_ms(self) -> f64 {
        match self {
            Self::CommandMenu => 0.0,
            Self::Insight | Self::Annotation | Self::Reminder => OUTSIDE_CLICK_ARM_MS,
        }
    }
}

/// How an overlay is placed relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Below the anchor; flips above when it would overflow the bottom.
    Popup(Size),
    /// Command menu at the caret; flips above the caret line, pinned to the
    /// bottom edge when flipping would leave the viewport.
    Menu(Size),
}

impl Placement {
    /// Insight popup; it grows once an insight is shown.
    #[must_use]
    pub fn insight(has_insight: bool) -> Self {
        Self::Popup(Size::new(320.0, if has_insight { 400.0 } else { 200.0 }))
    }

    #[must_use]
    pub fn annotation() -> Self {
        Self::Popup(Size::new(350.0, 300.0))
    }

    #[must_use]
    pub fn reminder() -> Self {
        Self::Popup(Size::new(360.0, 400.0))
    }

    /// Command menu of measured `size`.
    #[must_use]
    pub fn menu(size: Size) -> Self {
        Self::Menu(size)
    }

    #[must_use]
    pub fn size(&self) -> Size {
        match self {
            Self::Popup(s) | Self::Menu(s) => *s,
        }
    }

    /// Top-left corner in screen space for an overlay anchored at `anchor`.
    #[must_use]
    pub fn position(&self, anchor: Point, viewport: Size) -> Point {
        match *self {
            Self::Popup(size) => {
                let mut left = anchor.x;
                if left + size.width > viewport.width - POPUP_MARGIN {
                    left = viewport.width - size.width - POPUP_MARGIN;
                }
                if left < POPUP_MARGIN {
                    left = POPUP_MARGIN;
                }
                let mut top = anchor.y + POPUP_OFFSET;
                if top + size.height > viewport.height - POPUP_MARGIN {
                    top = (anchor.y - size.height - POPUP_OFFSET).max(POPUP_MARGIN);
                }
                Point::new(left, top)
            }
            Self::Menu(size) => {
                let mut top = anchor.y;
                if anchor.y + size.height > viewport.height - MENU_PADDING {
                    top = anchor.y - size.height - MENU_LINE_HEIGHT;
                    if top < MENU_PADDING {
                        top = viewport.height - size.height - MENU_PADDING;
                    }
                }
                let mut left = anchor.x;
                if anchor.x + size.width > viewport.width - MENU_PADDING {
                    left = viewport.width - size.width - MENU_PADDING;
                }
                if left < MENU_PADDING {
                    left = MENU_PADDING;
                }
                Point::new(left, top)
            }
        }
    }
}

/// Identity of one opening of an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayId(u64);

/// Proof that a request was started for a specific overlay generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    overlay: OverlayId,
}

impl RequestTicket {
    #[must_use]
    pub fn overlay(&self) -> OverlayId {
        self.overlay
    }
}

/// An open overlay.
#[derive(Debug)]
pub struct Overlay {
    pub id: OverlayId,
    pub kind: OverlayKind,
    /// Screen-space anchor supplied by the gesture that opened it.
    pub anchor: Point,
    pub placement: Placement,
    opened_at_ms: f64,
    escape_listener: ListenerGuard,
    outside_listener: Option<ListenerGuard>,
}

impl Overlay {
    /// Screen rectangle after viewport clamping.
    #[must_use]
    pub fn rect(&self, viewport: Size) -> Rect {
        let at = self.placement.position(self.anchor, viewport);
        let size = self.placement.size();
        Rect::new(at.x, at.y, size.width, size.height)
    }

    /// Whether outside clicks currently dismiss this overlay.
    #[must_use]
    pub fn dismisses_on_outside_click(&self) -> bool {
        self.outside_listener.is_some()
    }
}

/// Why an overlay closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Escape,
    OutsideClick,
    Replaced,
    Requested,
}

/// A closed overlay, reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed {
    pub id: OverlayId,
    pub kind: OverlayKind,
    pub reason: CloseReason,
}

/// Screen-space overlay layer, ordered bottom to top.
#[derive(Debug, Default)]
pub struct OverlayLayer {
    overlays: Vec<Overlay>,
    next_generation: u64,
    listeners: ListenerRegistry,
    viewport: Size,
}

impl OverlayLayer {
    #[must_use]
    pub fn new(listeners: ListenerRegistry, viewport: Size) -> Self {
        Self { overlays: Vec::new(), next_generation: 0, listeners, viewport }
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Open an overlay on top of the stack. An open overlay of the same kind is
    /// closed first; there is at most one of each kind.
    pub fn open(
        &mut self,
        kind: OverlayKind,
        anchor: Point,
        placement: Placement,
        now_ms: f64,
    ) -> (OverlayId, Vec<Closed>) {
        let replaced: Vec<Closed> = self
            .overlays
            .iter()
            .filter(|o| o.kind == kind)
            .map(|o| Closed { id: o.id, kind, reason: CloseReason::Replaced })
            .collect();
        self.overlays.retain(|o| o.kind != kind);

        self.next_generation += 1;
        let id = OverlayId(self.next_generation);
        let mut overlay = Overlay {
            id,
            kind,
            anchor,
            placement,
            opened_at_ms: now_ms,
            escape_listener: self.listeners.subscribe(&[ListenerKind::KeyDown]),
            outside_listener: None,
        };
        if kind.arm_delay_ms() <= 0.0 {
            overlay.outside_listener = Some(self.listeners.subscribe(&[ListenerKind::PointerDown]));
        }
        self.overlays.push(overlay);
        (id, replaced)
    }

    /// Close one overlay. Returns `None` if it is not open.
    pub fn close(&mut self, id: OverlayId) -> Option<Closed> {
        self.remove(id, CloseReason::Requested)
    }

    /// Close every overlay of `kind`.
    pub fn close_kind(&mut self, kind: OverlayKind) -> Vec<Closed> {
        let ids: Vec<OverlayId> = self.overlays.iter().filter(|o| o.kind == kind).map(|o| o.id).collect();
        ids.into_iter().filter_map(|id| self.remove(id, CloseReason::Requested)).collect()
    }

    fn remove(&mut self, id: OverlayId, reason: CloseReason) -> Option<Closed> {
        let idx = self.overlays.iter().position(|o| o.id == id)?;
        let overlay = self.overlays.remove(idx);
        Some(Closed { id, kind: overlay.kind, reason })
    }

    /// Attach outside-click listeners for overlays whose arm delay has passed.
    pub fn arm_due(&mut self, now_ms: f64) {
        for overlay in &mut self.overlays {
            if overlay.outside_listener.is_none() && now_ms - overlay.opened_at_ms >= overlay.kind.arm_delay_ms() {
                overlay.outside_listener = Some(self.listeners.subscribe(&[ListenerKind::PointerDown]));
            }
        }
    }

    /// Pointer pressed anywhere. Closes every armed overlay the point is outside of.
    pub fn on_pointer_down(&mut self, screen: Point, now_ms: f64) -> Vec<Closed> {
        self.arm_due(now_ms);
        let viewport = self.viewport;
        let outside: Vec<OverlayId> = self
            .overlays
            .iter()
            .filter(|o| o.dismisses_on_outside_click() && !o.rect(viewport).contains(screen))
            .map(|o| o.id)
            .collect();
        outside.into_iter().filter_map(|id| self.remove(id, CloseReason::OutsideClick)).collect()
    }

    /// Key pressed at document level. Escape closes the topmost overlay.
    pub fn on_key_down(&mut self, key: &Key) -> Option<Closed> {
        if !key.is("Escape") {
            return None;
        }
        let id = self.overlays.last()?.id;
        self.remove(id, CloseReason::Escape)
    }

    /// Ticket for a request tied to `id`, or `None` if it is not open.
    #[must_use]
    pub fn ticket(&self, id: OverlayId) -> Option<RequestTicket> {
        self.get(id).map(|_| RequestTicket { overlay: id })
    }

    /// Whether a response carrying `ticket` may still be shown.
    #[must_use]
    pub fn accepts(&self, ticket: RequestTicket) -> bool {
        self.get(ticket.overlay).is_some()
    }

    /// Replace the placement of an open overlay (measured size, grown content).
    pub fn set_placement(&mut self, id: OverlayId, placement: Placement) -> bool {
        match self.overlays.iter_mut().find(|o| o.id == id) {
            Some(o) => {
                o.placement = placement;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, id: OverlayId) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.id == id)
    }

    /// The open overlay of `kind`, if any.
    #[must_use]
    pub fn find_kind(&self, kind: OverlayKind) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.kind == kind)
    }

    /// Screen rectangle of an open overlay.
    #[must_use]
    pub fn rect(&self, id: OverlayId) -> Option<Rect> {
        self.get(id).map(|o| o.rect(self.viewport))
    }

    /// Open overlays, bottom to top.
    #[must_use]
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}

/// A text selection reported by a text surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSelection {
    pub text: String,
    /// Document positions of the selection, kept for wrapping it in a marker later.
    pub from: usize,
    pub to: usize,
    /// Screen rectangle of the selection.
    pub rect: Rect,
}

impl TextSelection {
    /// The trimmed text, if it is long enough to ask about.
    #[must_use]
    pub fn insight_text(&self) -> Option<&str> {
        let text = self.text.trim();
        (text.chars().count() >= MIN_SELECTION_CHARS).then_some(text)
    }

    /// Where an insight popup for this selection is anchored: bottom-centre.
    #[must_use]
    pub fn anchor(&self) -> Point {
        Point::new(self.rect.x + self.rect.width / 2.0, self.rect.bottom())
    }
}
