//! Document-level listener bookkeeping.
//!
//! Gestures and overlays need pointer/keyboard events from the whole document,
//! not just from the element that started them, so a drag keeps tracking
//! after the pointer leaves its hit area. Each subscription is held by a
//! [`ListenerGuard`]; dropping the guard detaches the listeners. Because the
//! guard lives inside the gesture or overlay state, every exit path (pointer-up,
//! cancel, teardown of the engine) releases it.

#[cfg(test)]
#[path = "listeners_test.rs"]
mod listeners_test;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Which document event a listener observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    PointerDown,
    PointerMove,
    PointerUp,
    KeyDown,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    active: BTreeMap<u64, ListenerKind>,
}

/// Shared registry of attached document listeners.
///
/// Cloning yields another handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    inner: Rc<RefCell<Registry>>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach one listener per kind. They stay attached until the guard drops.
    #[must_use]
    pub fn subscribe(&self, kinds: &[ListenerKind]) -> ListenerGuard {
        let mut ids = Vec::with_capacity(kinds.len());
        if let Ok(mut reg) = self.inner.try_borrow_mut() {
            for kind in kinds {
                let id = reg.next_id;
                reg.next_id += 1;
                reg.active.insert(id, *kind);
                ids.push(id);
            }
        }
        ListenerGuard { registry: Rc::downgrade(&self.inner), ids }
    }

    /// Number of listeners currently attached.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.inner.try_borrow().map_or(0, |reg| reg.active.len())
    }

    /// Whether any listener of `kind` is attached.
    #[must_use]
    pub fn is_listening(&self, kind: ListenerKind) -> bool {
        self.inner
            .try_borrow()
            .is_ok_and(|reg| reg.active.values().any(|k| *k == kind))
    }
}

/// Scoped ownership of a set of document listeners.
pub struct ListenerGuard {
    registry: Weak<RefCell<Registry>>,
    ids: Vec<u64>,
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGuard").field("ids", &self.ids).finish()
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        if let Ok(mut reg) = registry.try_borrow_mut() {
            for id in &self.ids {
                reg.active.remove(id);
            }
        }
    }
}
