//! One open note: the canvas engine, its overlays, and everything the host
//! does in response to engine actions.
//!
//! DESIGN
//! ======
//! The engine and overlay layer share one listener registry and are not
//! `Send`, so a session lives on the UI task and is driven by `&mut self`
//! calls. Every engine call funnels through [`CanvasSession::process`],
//! which schedules an autosave for document mutations and starts the
//! reminder cascade for deleted blocks.
//!
//! Slow AI work is the exception. [`CanvasSession::insight_job`] hands out
//! an owned, `Send` job carrying a request ticket for the insight overlay.
//! The host runs it wherever it likes and passes the reply back to
//! [`CanvasSession::complete_insight`], which drops it if the overlay it was
//! started for has since closed.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::sync::Arc;

use canvas::camera::{Point, Size};
use canvas::command_menu::{CommandTrigger, MenuOutcome};
use canvas::doc::{Block, BlockId};
use canvas::engine::{Action, EngineCore};
use canvas::input::{Button, Key, Modifiers, WheelDelta};
use canvas::listeners::ListenerRegistry;
use canvas::overlay::{Closed, CloseReason, OverlayId, OverlayKind, OverlayLayer, Placement, RequestTicket, TextSelection};
use serde_json::Value;
use time::{OffsetDateTime, UtcOffset};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::rest::RestClient;
use crate::api::{Annotation, AnnotationStore, ApiError, CanvasStore, CommandSource, ReminderStore, TextTransform};
use crate::config::ClientConfig;
use crate::services::autosave::{Autosaver, SaveOutcome};
use crate::services::cascade::{MarkerTracker, spawn_reminder_cascade};
use crate::services::document::{self, CanvasOrigin};
use crate::services::insight::{self, AnnotationOwner, InsightError};
use crate::services::reminder::{self, ReminderDraft, ReminderError};

/// Command menu size used until the host reports a measured one.
const DEFAULT_MENU_SIZE: Size = Size { width: 240.0, height: 280.0 };

/// Backend collaborators, one handle per concern.
#[derive(Clone)]
pub struct Collaborators {
    pub canvas: Arc<dyn CanvasStore>,
    pub ai: Arc<dyn TextTransform>,
    pub annotations: Arc<dyn AnnotationStore>,
    pub reminders: Arc<dyn ReminderStore>,
    pub commands: Arc<dyn CommandSource>,
}

impl Collaborators {
    /// Every concern served by one REST client.
    #[must_use]
    pub fn rest(client: Arc<RestClient>) -> Self {
        Self {
            canvas: client.clone(),
            ai: client.clone(),
            annotations: client.clone(),
            reminders: client.clone(),
            commands: client,
        }
    }
}

/// Insight popup state.
#[derive(Debug, Clone)]
struct PendingInsight {
    overlay: OverlayId,
    selection: TextSelection,
    owner: Option<BlockId>,
    context: Option<String>,
    prompt: String,
    insight: Option<String>,
}

/// Reminder dialog state.
#[derive(Debug, Clone, Copy)]
struct PendingReminder {
    overlay: OverlayId,
    block: Option<BlockId>,
    /// Text position the marker is inserted at.
    at: usize,
}

/// An insight request detached from the session.
pub struct InsightJob {
    ticket: RequestTicket,
    ai: Arc<dyn TextTransform>,
    selected: String,
    context: Option<String>,
    prompt: String,
}

impl InsightJob {
    /// Ask the AI collaborator. Never touches the session.
    pub async fn run(self) -> InsightReply {
        let result =
            insight::request_insight(self.ai.as_ref(), &self.selected, self.context.as_deref(), &self.prompt).await;
        InsightReply { ticket: self.ticket, prompt: self.prompt, result }
    }
}

/// Answer to an [`InsightJob`].
#[derive(Debug, Clone)]
pub struct InsightReply {
    ticket: RequestTicket,
    prompt: String,
    result: Result<String, InsightError>,
}

/// What [`CanvasSession::complete_insight`] did with a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightUpdate {
    /// The overlay it belonged to is gone.
    Dropped,
    Shown(String),
    Failed(String),
}

/// Marker text to splice into a text block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub block: Option<BlockId>,
    pub from: usize,
    pub to: usize,
    pub text: String,
}

pub struct CanvasSession {
    engine: EngineCore,
    overlays: OverlayLayer,
    commands: CommandTrigger,
    autosaver: Autosaver,
    markers: MarkerTracker,
    collaborators: Collaborators,
    note_id: Option<String>,
    annotations: Vec<Annotation>,
    legacy_store: Option<Value>,
    editing_block: Option<BlockId>,
    insight: Option<PendingInsight>,
    reminder: Option<PendingReminder>,
    menu_size: Size,
    background: Vec<JoinHandle<()>>,
    started: Instant,
}

impl CanvasSession {
    #[must_use]
    pub fn new(collaborators: Collaborators, config: &ClientConfig, viewport: Size) -> Self {
        let listeners = ListenerRegistry::new();
        let mut engine = EngineCore::with_listeners(listeners.clone());
        engine.set_viewport(viewport.width, viewport.height);
        Self {
            engine,
            overlays: OverlayLayer::new(listeners, viewport),
            commands: CommandTrigger::default(),
            autosaver: Autosaver::new(collaborators.canvas.clone(), config.autosave_debounce()),
            markers: MarkerTracker::new(),
            collaborators,
            note_id: None,
            annotations: Vec::new(),
            legacy_store: None,
            editing_block: None,
            insight: None,
            reminder: None,
            menu_size: DEFAULT_MENU_SIZE,
            background: Vec::new(),
            started: Instant::now(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn engine(&self) -> &EngineCore {
        &self.engine
    }

    #[must_use]
    pub fn overlays(&self) -> &OverlayLayer {
        &self.overlays
    }

    #[must_use]
    pub fn command_trigger(&self) -> &CommandTrigger {
        &self.commands
    }

    #[must_use]
    pub fn note_id(&self) -> Option<&str> {
        self.note_id.as_deref()
    }

    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// The open insight popup's answer, once it has one.
    #[must_use]
    pub fn insight_text(&self) -> Option<&str> {
        self.insight.as_ref().and_then(|p| p.insight.as_deref())
    }

    /// Whether an autosave timer is waiting.
    #[must_use]
    pub fn save_pending(&self) -> bool {
        self.autosaver.is_pending()
    }

    /// The canvas as it would be saved right now.
    #[must_use]
    pub fn document(&self) -> Value {
        document::encode(self.engine.doc.blocks(), &self.engine.camera, self.legacy_store.as_ref())
    }

    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    // =========================================================================
    // Note lifecycle
    // =========================================================================

    /// Switch to `note_id` and load its canvas.
    ///
    /// Pending saves for the previous note are cancelled before the request
    /// goes out. If loading fails the session stays on `note_id` with saves
    /// gated, so the empty scene never overwrites the stored canvas.
    ///
    /// # Errors
    ///
    /// Returns the store's error when the note cannot be loaded.
    pub async fn open_note(&mut self, note_id: &str) -> Result<CanvasOrigin, ApiError> {
        self.autosaver.switch_note(note_id);
        self.close_overlays();
        self.editing_block = None;
        self.engine.set_text_editing(false);
        self.note_id = Some(note_id.to_string());
        self.annotations.clear();
        self.legacy_store = None;

        let note = self.collaborators.canvas.load_note(note_id).await?;
        let loaded = document::decode_or_empty(note_id, note.canvas_data.as_ref());
        let origin = loaded.origin;
        let block_count = loaded.blocks.len();

        self.engine.load(loaded.blocks, loaded.camera);
        self.legacy_store = loaded.legacy_store;
        self.annotations = note.annotations;
        self.markers.reset(self.engine.doc.blocks());
        self.autosaver.mark_loaded(&self.document());

        info!(note_id = %note_id, blocks = block_count, skipped = loaded.skipped, ?origin, "note opened");
        Ok(origin)
    }

    /// Fetch the `@` menu entries. A failure keeps the current catalog.
    pub async fn refresh_commands(&mut self) {
        match self.collaborators.commands.get_commands().await {
            Ok(catalog) => {
                debug!(templates = catalog.templates.len(), actions = catalog.actions.len(), "commands loaded");
                self.commands.set_catalog(catalog);
            }
            Err(e) => warn!(error = %e, "command catalog unavailable"),
        }
    }

    /// Save immediately (Ctrl/Cmd+S), skipping the debounce.
    pub async fn save_shortcut(&mut self) -> SaveOutcome {
        let doc = self.document();
        self.autosaver.save_now(doc).await
    }

    /// Wait for background reminder deletes to finish.
    pub async fn settle(&mut self) {
        for handle in self.background.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task failed");
            }
        }
    }

    // =========================================================================
    // Engine events
    // =========================================================================

    /// Handle the actions an engine call produced and hand them back.
    pub fn process(&mut self, actions: Vec<Action>) -> Vec<Action> {
        let mut dirty = false;
        for action in &actions {
            match action {
                Action::BlockDeleted { id, reminder_ids } => {
                    self.markers.forget(id);
                    if self.editing_block == Some(*id) {
                        self.editing_block = None;
                    }
                    self.cascade(reminder_ids.clone());
                }
                Action::BlockCreated(Block::Text(text)) => {
                    self.markers.observe(text.id, &text.content);
                }
                _ => {}
            }
            dirty |= action.mutates_document();
        }
        if dirty {
            self.autosaver.schedule(self.document());
        }
        actions
    }

    /// Run any engine call through [`Self::process`].
    pub fn apply(&mut self, f: impl FnOnce(&mut EngineCore) -> Vec<Action>) -> Vec<Action> {
        let actions = f(&mut self.engine);
        self.process(actions)
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.engine.set_viewport(viewport.width, viewport.height);
        self.overlays.set_viewport(viewport);
    }

    /// Pointer pressed. Overlays see it first; a press inside one never
    /// reaches the canvas.
    pub fn pointer_down(&mut self, screen: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let now = self.now_ms();
        let closed = self.overlays.on_pointer_down(screen, now);
        self.forget_closed(&closed);
        let viewport = self.overlays.viewport();
        if self.overlays.overlays().iter().any(|o| o.rect(viewport).contains(screen)) {
            return Vec::new();
        }
        self.apply(|engine| engine.on_pointer_down(screen, button, modifiers))
    }

    pub fn pointer_move(&mut self, screen: Point, modifiers: Modifiers) -> Vec<Action> {
        self.apply(|engine| engine.on_pointer_move(screen, modifiers))
    }

    pub fn pointer_up(&mut self, screen: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.apply(|engine| engine.on_pointer_up(screen, button, modifiers))
    }

    pub fn double_click(&mut self, screen: Point) -> Vec<Action> {
        self.apply(|engine| engine.on_double_click(screen))
    }

    pub fn wheel(&mut self, screen: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        self.apply(|engine| engine.on_wheel(screen, delta, modifiers))
    }

    /// Document-level key. Escape closes the topmost overlay before the
    /// canvas sees it.
    pub fn key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if let Some(closed) = self.overlays.on_key_down(key) {
            self.forget_closed(&[closed]);
            return vec![Action::RenderNeeded];
        }
        self.apply(|engine| engine.on_key_down(key, modifiers))
    }

    /// Put AI-generated summary HTML on the canvas.
    pub fn add_summary(&mut self, html: &str) -> Vec<Action> {
        self.apply(|engine| engine.add_summary_block(html))
    }

    fn cascade(&mut self, reminder_ids: Vec<String>) {
        self.background.retain(|h| !h.is_finished());
        if let Some(handle) = spawn_reminder_cascade(self.collaborators.reminders.clone(), reminder_ids) {
            self.background.push(handle);
        }
    }

    // =========================================================================
    // Text surfaces
    // =========================================================================

    /// A text block's editor gained focus.
    pub fn focus_text(&mut self, block: BlockId) {
        self.editing_block = Some(block);
        self.engine.set_text_editing(true);
    }

    /// The editor lost focus. Any open command menu goes with it.
    pub fn blur_text(&mut self) {
        self.editing_block = None;
        self.engine.set_text_editing(false);
        self.commands.close();
        self.overlays.close_kind(OverlayKind::CommandMenu);
    }

    /// A text block's content changed. Reminders whose markers were removed
    /// are deleted in the background.
    pub fn text_changed(&mut self, block: BlockId, content: &str) -> Vec<Action> {
        let removed = self.markers.observe(block, content);
        self.cascade(removed);
        let patch = canvas::doc::BlockPatch { content: Some(content.to_string()), ..Default::default() };
        self.apply(|engine| engine.update_block(block, patch))
    }

    /// Text was typed at `caret`. May open or update the command menu.
    pub fn text_inserted(&mut self, inserted: &str, caret: usize, caret_bottom: Point) -> MenuOutcome {
        let outcome = self.commands.on_insert(inserted, caret, caret_bottom);
        match outcome {
            MenuOutcome::Opened => {
                if let Some(anchor) = self.commands.menu().map(|m| m.anchor) {
                    let now = self.now_ms();
                    let (_, closed) =
                        self.overlays.open(OverlayKind::CommandMenu, anchor, Placement::menu(self.menu_size), now);
                    self.forget_closed(&closed);
                }
            }
            MenuOutcome::Closed => {
                self.overlays.close_kind(OverlayKind::CommandMenu);
            }
            MenuOutcome::Ignored | MenuOutcome::Updated | MenuOutcome::Commit(_) => {}
        }
        outcome
    }

    /// Key pressed inside a text editor. `Ignored` means the editor should
    /// handle it normally.
    pub fn text_key(&mut self, key: &Key) -> MenuOutcome {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let outcome = self.commands.on_key(key, now);
        match &outcome {
            MenuOutcome::Closed => {
                self.overlays.close_kind(OverlayKind::CommandMenu);
            }
            MenuOutcome::Commit(edit) => {
                self.overlays.close_kind(OverlayKind::CommandMenu);
                if let Some(anchor) = edit.reminder_anchor {
                    self.open_reminder(anchor, edit.delete_from);
                }
            }
            MenuOutcome::Ignored | MenuOutcome::Opened | MenuOutcome::Updated => {}
        }
        outcome
    }

    /// The host measured the command menu; re-place it.
    pub fn set_command_menu_size(&mut self, size: Size) {
        self.menu_size = size;
        if let Some(id) = self.overlays.find_kind(OverlayKind::CommandMenu).map(|o| o.id) {
            self.overlays.set_placement(id, Placement::menu(size));
        }
    }

    // =========================================================================
    // Overlays
    // =========================================================================

    fn close_overlays(&mut self) {
        for kind in [OverlayKind::Insight, OverlayKind::Annotation, OverlayKind::CommandMenu, OverlayKind::Reminder] {
            self.overlays.close_kind(kind);
        }
        self.insight = None;
        self.reminder = None;
        self.commands.close();
    }

    fn forget_closed(&mut self, closed: &[Closed]) {
        for c in closed {
            match c.kind {
                OverlayKind::Insight if self.insight.as_ref().is_some_and(|p| p.overlay == c.id) => {
                    self.insight = None;
                }
                OverlayKind::Reminder if self.reminder.is_some_and(|p| p.overlay == c.id) => {
                    self.reminder = None;
                }
                OverlayKind::CommandMenu if c.reason != CloseReason::Replaced => self.commands.close(),
                _ => {}
            }
        }
    }

    /// Open the reminder dialog for an insertion at text position `at`.
    pub fn open_reminder(&mut self, anchor: Point, at: usize) -> OverlayId {
        let now = self.now_ms();
        let (id, closed) = self.overlays.open(OverlayKind::Reminder, anchor, Placement::reminder(), now);
        self.forget_closed(&closed);
        self.reminder = Some(PendingReminder { overlay: id, block: self.editing_block, at });
        id
    }

    /// Create the reminder from the dialog and return the marker to insert.
    ///
    /// Returns `Ok(None)` when no dialog is open. On error the dialog stays
    /// open so the message can be shown inline.
    ///
    /// # Errors
    ///
    /// Returns validation errors or the store's failure.
    pub async fn save_reminder(&mut self, draft: &ReminderDraft) -> Result<Option<TextEdit>, ReminderError> {
        let (Some(pending), Some(note_id)) = (self.reminder, self.note_id.clone()) else {
            return Ok(None);
        };
        let block_id = pending.block.map(|b| b.to_string());
        let created = reminder::create_reminder(
            self.collaborators.reminders.as_ref(),
            &note_id,
            block_id.as_deref(),
            draft,
            local_offset(),
        )
        .await?;

        self.overlays.close(pending.overlay);
        self.reminder = None;
        Ok(Some(TextEdit { block: pending.block, from: pending.at, to: pending.at, text: created.insert }))
    }

    /// Open the insight popup for `selection` inside `owner`. Short
    /// selections are ignored.
    pub fn open_insight(
        &mut self,
        selection: TextSelection,
        owner: Option<BlockId>,
        context: Option<String>,
    ) -> Option<OverlayId> {
        selection.insight_text()?;
        let now = self.now_ms();
        let (id, closed) = self.overlays.open(OverlayKind::Insight, selection.anchor(), Placement::insight(false), now);
        self.forget_closed(&closed);
        self.insight =
            Some(PendingInsight { overlay: id, selection, owner, context, prompt: String::new(), insight: None });
        Some(id)
    }

    /// Start an insight request for the open popup.
    #[must_use]
    pub fn insight_job(&self, user_prompt: &str) -> Option<InsightJob> {
        let pending = self.insight.as_ref()?;
        let ticket = self.overlays.ticket(pending.overlay)?;
        let selected = pending.selection.insight_text()?.to_string();
        Some(InsightJob {
            ticket,
            ai: self.collaborators.ai.clone(),
            selected,
            context: pending.context.clone(),
            prompt: user_prompt.to_string(),
        })
    }

    /// Show an insight reply, unless its popup closed in the meantime.
    pub fn complete_insight(&mut self, reply: InsightReply) -> InsightUpdate {
        if !self.overlays.accepts(reply.ticket) {
            debug!("late insight reply dropped");
            return InsightUpdate::Dropped;
        }
        let Some(pending) = self.insight.as_mut().filter(|p| p.overlay == reply.ticket.overlay()) else {
            return InsightUpdate::Dropped;
        };
        match reply.result {
            Ok(text) => {
                pending.insight = Some(text.clone());
                pending.prompt = reply.prompt;
                let overlay = pending.overlay;
                self.overlays.set_placement(overlay, Placement::insight(true));
                InsightUpdate::Shown(text)
            }
            Err(e) => InsightUpdate::Failed(e.display_message()),
        }
    }

    /// Store the shown insight as an annotation and return the edit that
    /// wraps the selection in its marker.
    ///
    /// Returns `Ok(None)` when there is no insight to attach.
    ///
    /// # Errors
    ///
    /// Returns [`InsightError::Attach`] when the store rejects it; the popup
    /// stays open.
    pub async fn attach_insight(&mut self) -> Result<Option<TextEdit>, InsightError> {
        let Some(pending) = self.insight.clone() else {
            return Ok(None);
        };
        let (Some(text), Some(note_id)) = (pending.insight.as_deref(), self.note_id.clone()) else {
            return Ok(None);
        };
        let owner = match pending.owner.and_then(|id| self.engine.block(&id)) {
            Some(block) if block.is_shape() => AnnotationOwner::Shape(block.id().to_string()),
            Some(block) => AnnotationOwner::Block(block.id().to_string()),
            None => return Ok(None),
        };
        let selected = pending.selection.text.trim().to_string();
        let attached = insight::attach_insight(
            self.collaborators.annotations.as_ref(),
            &note_id,
            owner,
            &selected,
            text,
            Some(pending.prompt.as_str()),
        )
        .await?;

        self.annotations.push(attached.annotation);
        self.overlays.close(pending.overlay);
        self.insight = None;
        Ok(Some(TextEdit {
            block: pending.owner,
            from: pending.selection.from,
            to: pending.selection.to,
            text: attached.markup,
        }))
    }

    /// Show a stored annotation next to its marker.
    pub fn open_annotation(&mut self, annotation_id: &str, anchor: Point) -> Option<OverlayId> {
        if !self.annotations.iter().any(|a| a.id == annotation_id) {
            return None;
        }
        let now = self.now_ms();
        let (id, closed) = self.overlays.open(OverlayKind::Annotation, anchor, Placement::annotation(), now);
        self.forget_closed(&closed);
        Some(id)
    }

    /// Delete an annotation and close its popup.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the annotation is kept locally.
    pub async fn delete_annotation(&mut self, annotation_id: &str) -> Result<(), ApiError> {
        let Some(note_id) = self.note_id.clone() else {
            return Ok(());
        };
        self.collaborators.annotations.delete_annotation(&note_id, annotation_id).await?;
        self.annotations.retain(|a| a.id != annotation_id);
        self.overlays.close_kind(OverlayKind::Annotation);
        info!(note_id = %note_id, annotation_id = %annotation_id, "annotation deleted");
        Ok(())
    }
}

fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}
