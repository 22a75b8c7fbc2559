//! Reminder cleanup when the text that references a reminder goes away.
//!
//! Two triggers: a deleted text block (the engine reports the reminder ids
//! its content referenced) and an edit that removes a reminder marker from
//! a block's content. Both end in fire-and-forget deletes; a failed delete
//! is logged and never blocks the edit that caused it.

#[cfg(test)]
#[path = "cascade_test.rs"]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use canvas::doc::{Block, BlockId};
use canvas::markers::{MarkerRef, removed_reminders, scan_markers};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::ReminderStore;

/// Delete `reminder_ids` in the background. Returns `None` when there is nothing to do.
pub fn spawn_reminder_cascade(store: Arc<dyn ReminderStore>, reminder_ids: Vec<String>) -> Option<JoinHandle<()>> {
    if reminder_ids.is_empty() {
        return None;
    }
    Some(tokio::spawn(async move {
        for id in reminder_ids {
            match store.delete_reminder(&id).await {
                Ok(()) => debug!(reminder_id = %id, "reminder deleted"),
                Err(e) => warn!(reminder_id = %id, error = %e, "reminder delete failed"),
            }
        }
    }))
}

/// Last known marker references per text block.
#[derive(Debug, Default)]
pub struct MarkerTracker {
    known: HashMap<BlockId, Vec<MarkerRef>>,
}

impl MarkerTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything and record the markers of every text block in `blocks`.
    pub fn reset<'a>(&mut self, blocks: impl IntoIterator<Item = &'a Block>) {
        self.known.clear();
        for block in blocks {
            if let Block::Text(text) = block {
                self.known.insert(text.id, scan_markers(&text.content));
            }
        }
    }

    /// Record new content for `id` and return reminder ids it no longer references.
    pub fn observe(&mut self, id: BlockId, content: &str) -> Vec<String> {
        let after = scan_markers(content);
        let removed = self
            .known
            .get(&id)
            .map(|before| removed_reminders(before, &after))
            .unwrap_or_default();
        self.known.insert(id, after);
        removed
    }

    pub fn forget(&mut self, id: &BlockId) {
        self.known.remove(id);
    }

    #[must_use]
    pub fn markers(&self, id: &BlockId) -> &[MarkerRef] {
        self.known.get(id).map(Vec::as_slice).unwrap_or_default()
    }
}
