//! Debounced, dirty-checked canvas persistence.
//!
//! DESIGN
//! ======
//! Every document mutation calls [`Autosaver::schedule`] with the freshly
//! encoded canvas. Scheduling aborts the previous timer, so a burst of edits
//! (a drag emits one update per pointer move) collapses into one save after
//! the debounce window. Before calling the store, the encoded document is
//! compared against the last successfully saved fingerprint; unchanged
//! content never reaches the network.
//!
//! Only the debounce wait can be cancelled. Once the timer fires, the save
//! runs as its own task, so a later schedule cannot abort a request that is
//! already on the network. A save that is dropped anyway (its caller gave up
//! on [`Autosaver::save_now`]) releases its in-flight mark, so the same
//! content is sent again on the next trigger.
//!
//! Each note switch bumps a generation counter. A timer task carries the
//! generation it was scheduled under and gives up if the counter moved, so
//! a save for the previous note can never land after a switch. Saves are
//! also gated on [`Autosaver::mark_loaded`]: until the note's stored canvas
//! has been loaded, an empty scene must not overwrite it.

#[cfg(test)]
#[path = "autosave_test.rs"]
mod tests;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::document::fingerprint;
use crate::api::{ApiError, CanvasStore};

/// Result of one save attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved,
    /// Content matches the last save (or the save already in flight).
    Unchanged,
    /// No note is open, or its canvas has not finished loading.
    NotReady,
    /// The note changed while the save was pending.
    Stale,
    Failed(ApiError),
}

#[derive(Debug, Default)]
struct SaveState {
    note_id: Option<String>,
    generation: u64,
    ready: bool,
    last_saved: Option<String>,
    in_flight: Option<String>,
}

pub struct Autosaver {
    store: Arc<dyn CanvasStore>,
    debounce: Duration,
    state: Arc<Mutex<SaveState>>,
    timer: Option<JoinHandle<()>>,
}

impl Autosaver {
    pub fn new(store: Arc<dyn CanvasStore>, debounce: Duration) -> Self {
        Self { store, debounce, state: Arc::new(Mutex::new(SaveState::default())), timer: None }
    }

    /// Start tracking `note_id`. Any pending save for the previous note is
    /// cancelled and saves stay disabled until [`Self::mark_loaded`].
    pub fn switch_note(&mut self, note_id: &str) {
        self.cancel_timer();
        let mut state = lock(&self.state);
        state.generation += 1;
        state.note_id = Some(note_id.to_string());
        state.ready = false;
        state.last_saved = None;
        state.in_flight = None;
    }

    /// The note's canvas is loaded; `loaded` becomes the dirty-check baseline.
    pub fn mark_loaded(&mut self, loaded: &Value) {
        let mut state = lock(&self.state);
        if state.note_id.is_some() {
            state.ready = true;
            state.last_saved = Some(fingerprint(loaded));
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        lock(&self.state).ready
    }

    /// Whether a debounced save is waiting to fire or still running.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Save `doc` once the debounce window passes without another schedule.
    pub fn schedule(&mut self, doc: Value) {
        let generation = {
            let state = lock(&self.state);
            if !state.ready {
                debug!("autosave skipped: canvas not loaded");
                return;
            }
            state.generation
        };

        self.cancel_timer();
        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let debounce = self.debounce;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            // Detached: aborting the timer from here on leaves the save running.
            let save = tokio::spawn(async move { save_if_dirty(store.as_ref(), &state, generation, doc).await });
            if let Err(e) = save.await {
                warn!(error = %e, "autosave task failed");
            }
        }));
    }

    /// Save immediately, skipping the debounce but not the dirty check.
    pub async fn save_now(&mut self, doc: Value) -> SaveOutcome {
        self.cancel_timer();
        let generation = lock(&self.state).generation;
        save_if_dirty(self.store.as_ref(), &self.state, generation, doc).await
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for Autosaver {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

/// Clears the in-flight mark if the save is dropped before it finishes.
struct InFlight<'a> {
    state: &'a Mutex<SaveState>,
    generation: u64,
    print: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut s = lock(self.state);
        if s.generation == self.generation && s.in_flight.as_ref() == Some(&self.print) {
            s.in_flight = None;
        }
    }
}

fn lock(state: &Mutex<SaveState>) -> std::sync::MutexGuard<'_, SaveState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn save_if_dirty(store: &dyn CanvasStore, state: &Mutex<SaveState>, generation: u64, doc: Value) -> SaveOutcome {
    let print = fingerprint(&doc);
    let note_id = {
        let mut s = lock(state);
        if s.generation != generation {
            return SaveOutcome::Stale;
        }
        let Some(note_id) = s.note_id.clone().filter(|_| s.ready) else {
            return SaveOutcome::NotReady;
        };
        if s.last_saved.as_ref() == Some(&print) || s.in_flight.as_ref() == Some(&print) {
            return SaveOutcome::Unchanged;
        }
        s.in_flight = Some(print.clone());
        note_id
    };

    let guard = InFlight { state, generation, print: print.clone() };
    let result = store.save_canvas(&note_id, &doc).await;
    drop(guard);

    let mut s = lock(state);
    if s.generation != generation {
        return SaveOutcome::Stale;
    }
    match result {
        Ok(()) => {
            s.last_saved = Some(print);
            info!(note_id = %note_id, "canvas saved");
            SaveOutcome::Saved
        }
        Err(e) => {
            warn!(note_id = %note_id, error = %e, retryable = e.retryable(), "canvas save failed");
            SaveOutcome::Failed(e)
        }
    }
}
