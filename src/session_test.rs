#![allow(clippy::float_cmp)]

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use canvas::camera::{Camera, Rect};
use canvas::command_menu::{CommandAction, CommandCatalog};
use canvas::doc::{BlockPatch, ShapeBlock, ShapeType, TextBlock};
use canvas::input::Tool;
use canvas::markers::{annotation_markup, reminder_markup};
use serde_json::json;
use time::macros::date;

use super::*;
use crate::api::{NewAnnotation, NewReminder, NoteRecord, Reminder};
use crate::config::ClientConfig;
use crate::services::document::LEGACY_STORE_KEY;

const DEBOUNCE: Duration = Duration::from_millis(4000);

// =============================================================================
// Fake backend
// =============================================================================

#[derive(Default)]
struct FakeBackend {
    notes: StdMutex<HashMap<String, NoteRecord>>,
    saves: StdMutex<Vec<(String, Value)>>,
    prompts: StdMutex<Vec<String>>,
    created_reminders: StdMutex<Vec<NewReminder>>,
    deleted_reminders: StdMutex<Vec<String>>,
    added_annotations: StdMutex<Vec<NewAnnotation>>,
    deleted_annotations: StdMutex<Vec<String>>,
    catalog: CommandCatalog,
    ai_down: bool,
}

impl FakeBackend {
    fn with_note(id: &str, canvas_data: Option<Value>) -> Self {
        let backend = Self { catalog: reminder_catalog(), ..Self::default() };
        backend.put_note(id, canvas_data);
        backend
    }

    fn put_note(&self, id: &str, canvas_data: Option<Value>) {
        let note = NoteRecord { id: id.to_string(), title: String::new(), canvas_data, annotations: Vec::new() };
        self.notes.lock().unwrap().insert(id.to_string(), note);
    }

    fn saves(&self) -> Vec<(String, Value)> {
        self.saves.lock().unwrap().clone()
    }

    fn deleted_reminders(&self) -> Vec<String> {
        self.deleted_reminders.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CanvasStore for FakeBackend {
    async fn load_note(&self, note_id: &str) -> Result<NoteRecord, ApiError> {
        self.notes
            .lock()
            .unwrap()
            .get(note_id)
            .cloned()
            .ok_or_else(|| ApiError::Response { status: 404, body: r#"{"error":"Note not found"}"#.into() })
    }

    async fn save_canvas(&self, note_id: &str, canvas: &Value) -> Result<(), ApiError> {
        self.saves.lock().unwrap().push((note_id.to_string(), canvas.clone()));
        Ok(())
    }
}

#[async_trait::async_trait]
impl TextTransform for FakeBackend {
    async fn transform(&self, text: &str, _action: &str, _context: Option<&str>) -> Result<String, ApiError> {
        self.prompts.lock().unwrap().push(text.to_string());
        if self.ai_down {
            return Err(ApiError::Response { status: 503, body: r#"{"error":"AI is napping"}"#.into() });
        }
        Ok("Two particles share one quantum state.".into())
    }
}

#[async_trait::async_trait]
impl AnnotationStore for FakeBackend {
    async fn add_annotation(&self, _note_id: &str, annotation: &NewAnnotation) -> Result<Annotation, ApiError> {
        let mut added = self.added_annotations.lock().unwrap();
        added.push(annotation.clone());
        Ok(Annotation {
            id: format!("a{}", added.len()),
            selected_text: annotation.selected_text.clone(),
            insight: annotation.insight.clone(),
            block_id: annotation.block_id.clone(),
            shape_id: annotation.shape_id.clone(),
            prompt: annotation.prompt.clone(),
        })
    }

    async fn delete_annotation(&self, _note_id: &str, annotation_id: &str) -> Result<(), ApiError> {
        self.deleted_annotations.lock().unwrap().push(annotation_id.to_string());
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReminderStore for FakeBackend {
    async fn create_reminder(&self, reminder: &NewReminder) -> Result<Reminder, ApiError> {
        let mut created = self.created_reminders.lock().unwrap();
        created.push(reminder.clone());
        Ok(Reminder {
            id: format!("r{}", created.len()),
            note_id: Some(reminder.note_id.clone()),
            block_id: reminder.block_id.clone(),
            message: reminder.message.clone(),
            due_date: Some(reminder.due_date.clone()),
            early_reminder_minutes: reminder.early_reminder_minutes,
            notified: false,
            completed: false,
        })
    }

    async fn delete_reminder(&self, reminder_id: &str) -> Result<(), ApiError> {
        self.deleted_reminders.lock().unwrap().push(reminder_id.to_string());
        Ok(())
    }
}

#[async_trait::async_trait]
impl CommandSource for FakeBackend {
    async fn get_commands(&self) -> Result<CommandCatalog, ApiError> {
        Ok(self.catalog.clone())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn reminder_catalog() -> CommandCatalog {
    CommandCatalog {
        templates: Vec::new(),
        actions: vec![CommandAction {
            id: "reminder".into(),
            name: "Reminder".into(),
            icon: Some("Bell".into()),
            pattern: None,
            template: None,
        }],
    }
}

fn collaborators(backend: &Arc<FakeBackend>) -> Collaborators {
    Collaborators {
        canvas: backend.clone(),
        ai: backend.clone(),
        annotations: backend.clone(),
        reminders: backend.clone(),
        commands: backend.clone(),
    }
}

fn session_for(backend: &Arc<FakeBackend>) -> CanvasSession {
    CanvasSession::new(collaborators(backend), &ClientConfig::default(), Size::new(800.0, 600.0))
}

fn canvas_with(blocks: &[Block]) -> Value {
    document::encode(blocks, &Camera::default(), None)
}

fn rect_at(x: f64, y: f64) -> Block {
    Block::Shape(ShapeBlock::new(ShapeType::Rectangle, Point::new(x, y)))
}

fn text_with(x: f64, y: f64, content: &str) -> Block {
    let mut text = TextBlock::new(Point::new(x, y));
    text.content = content.to_string();
    Block::Text(text)
}

fn press(session: &mut CanvasSession, x: f64, y: f64) -> Vec<Action> {
    session.pointer_down(Point::new(x, y), Button::Primary, Modifiers::default())
}

fn drag(session: &mut CanvasSession, from: Point, to: Point) {
    session.pointer_down(from, Button::Primary, Modifiers::default());
    session.pointer_move(to, Modifiers::default());
    session.pointer_up(to, Button::Primary, Modifiers::default());
}

fn selection(text: &str) -> TextSelection {
    TextSelection { text: text.to_string(), from: 3, to: 3 + text.len(), rect: Rect::new(100.0, 100.0, 80.0, 20.0) }
}

async fn past_debounce() {
    tokio::time::sleep(DEBOUNCE + Duration::from_millis(1)).await;
}

// =============================================================================
// Loading and autosave
// =============================================================================

#[tokio::test(start_paused = true)]
async fn opening_a_note_loads_blocks_without_saving() {
    let block = rect_at(10.0, 10.0);
    let backend = Arc::new(FakeBackend::with_note("n1", Some(canvas_with(&[block.clone()]))));
    let mut session = session_for(&backend);

    let origin = session.open_note("n1").await.unwrap();
    assert_eq!(origin, CanvasOrigin::V2);
    assert_eq!(session.engine().doc.blocks(), &[block]);
    assert_eq!(session.note_id(), Some("n1"));

    past_debounce().await;
    assert!(backend.saves().is_empty());
}

#[tokio::test(start_paused = true)]
async fn drag_is_saved_once_after_debounce() {
    let block = rect_at(0.0, 0.0);
    let id = block.id();
    let backend = Arc::new(FakeBackend::with_note("n1", Some(canvas_with(&[block]))));
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();

    drag(&mut session, Point::new(10.0, 10.0), Point::new(60.0, 30.0));
    assert!(session.save_pending());
    past_debounce().await;

    let saves = backend.saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].0, "n1");
    let moved = session.engine().block(&id).map(Block::position);
    assert_eq!(moved, Some(Point::new(50.0, 20.0)));
    assert_eq!(saves[0].1, session.document());
}

#[tokio::test(start_paused = true)]
async fn switching_notes_cancels_the_pending_save() {
    let backend = Arc::new(FakeBackend::with_note("n1", Some(canvas_with(&[rect_at(0.0, 0.0)]))));
    backend.put_note("n2", None);
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();

    drag(&mut session, Point::new(10.0, 10.0), Point::new(60.0, 30.0));
    let origin = session.open_note("n2").await.unwrap();
    assert_eq!(origin, CanvasOrigin::Empty);
    past_debounce().await;

    assert!(backend.saves().is_empty());
    assert!(session.engine().doc.is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_load_keeps_saves_gated() {
    let backend = Arc::new(FakeBackend::default());
    let mut session = session_for(&backend);

    let err = session.open_note("missing").await.unwrap_err();
    assert_eq!(err.server_message().as_deref(), Some("Note not found"));
    session.apply(|engine| engine.create_text_at(Point::new(5.0, 5.0)));
    assert_eq!(session.save_shortcut().await, SaveOutcome::NotReady);
    past_debounce().await;
    assert!(backend.saves().is_empty());
}

#[tokio::test(start_paused = true)]
async fn save_shortcut_skips_unchanged_content() {
    let backend = Arc::new(FakeBackend::with_note("n1", None));
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();

    assert_eq!(session.save_shortcut().await, SaveOutcome::Unchanged);
    session.add_summary("<p>Key points</p>");
    assert_eq!(session.save_shortcut().await, SaveOutcome::Saved);
    assert_eq!(session.save_shortcut().await, SaveOutcome::Unchanged);
    assert_eq!(backend.saves().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn legacy_canvas_is_carried_into_saves() {
    let legacy = json!({
        "store": {
            "shape:box": {
                "id": "shape:box", "type": "geo", "x": 10, "y": 20,
                "props": { "geo": "rectangle", "w": 120, "h": 80 }
            }
        }
    });
    let backend = Arc::new(FakeBackend::with_note("old", Some(legacy.clone())));
    let mut session = session_for(&backend);

    assert_eq!(session.open_note("old").await.unwrap(), CanvasOrigin::Legacy);
    assert_eq!(session.engine().doc.len(), 1);
    session.apply(|engine| engine.zoom_in());
    assert_eq!(session.save_shortcut().await, SaveOutcome::Saved);

    let saved = &backend.saves()[0].1;
    assert_eq!(saved["version"], 2);
    assert_eq!(saved[LEGACY_STORE_KEY], legacy["store"]);
}

// =============================================================================
// Reminder cascade
// =============================================================================

#[tokio::test]
async fn deleting_a_text_block_deletes_its_reminders() {
    let content = format!("{}{}", reminder_markup("r1", "a"), reminder_markup("r2", "b"));
    let block = text_with(0.0, 0.0, &content);
    let id = block.id();
    let backend = Arc::new(FakeBackend::with_note("n1", Some(canvas_with(&[block]))));
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();

    session.apply(|engine| engine.delete_block(id));
    session.settle().await;
    assert_eq!(backend.deleted_reminders(), vec!["r1".to_string(), "r2".to_string()]);
}

#[tokio::test]
async fn editing_out_a_marker_deletes_that_reminder() {
    let content = format!("<p>{} {}</p>", reminder_markup("r1", "a"), reminder_markup("r2", "b"));
    let block = text_with(0.0, 0.0, &content);
    let id = block.id();
    let backend = Arc::new(FakeBackend::with_note("n1", Some(canvas_with(&[block]))));
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();

    let edited = format!("<p>{}</p>", reminder_markup("r2", "b"));
    let actions = session.text_changed(id, &edited);
    assert!(actions.iter().any(|a| matches!(a, Action::BlockUpdated { id: u, .. } if *u == id)));
    session.settle().await;
    assert_eq!(backend.deleted_reminders(), vec!["r1".to_string()]);
}

// =============================================================================
// Overlays
// =============================================================================

#[tokio::test(start_paused = true)]
async fn escape_closes_overlay_before_the_canvas_sees_it() {
    let backend = Arc::new(FakeBackend::with_note("n1", None));
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();
    session.apply(|engine| engine.set_tool(Tool::Rectangle));
    session.open_reminder(Point::new(100.0, 100.0), 0);

    let actions = session.key_down(&Key::new("Escape"), Modifiers::default());
    assert_eq!(actions, vec![Action::RenderNeeded]);
    assert!(session.overlays().is_empty());
    assert_eq!(session.engine().ui.tool, Tool::Rectangle);

    session.key_down(&Key::new("Escape"), Modifiers::default());
    assert_eq!(session.engine().ui.tool, Tool::Select);
}

#[tokio::test(start_paused = true)]
async fn press_inside_an_overlay_never_reaches_the_canvas() {
    let backend = Arc::new(FakeBackend::with_note("n1", None));
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();
    let overlay = session.open_reminder(Point::new(100.0, 100.0), 0);
    let center = session.overlays().rect(overlay).unwrap().center();

    session.apply(|engine| {
        engine.create_block(
            canvas::doc::BlockKind::Shape,
            ShapeType::Rectangle,
            "",
            &BlockPatch::position(Point::new(center.x - 50.0, center.y - 50.0)),
        )
    });
    session.apply(|engine| engine.select(None));

    assert!(press(&mut session, center.x, center.y).is_empty());
    assert!(session.engine().selection().is_none());
    assert!(session.overlays().get(overlay).is_some());
}

// =============================================================================
// Insights
// =============================================================================

#[tokio::test(start_paused = true)]
async fn insight_is_shown_and_attached_as_annotation() {
    let block = text_with(0.0, 0.0, "<p>On quantum entanglement</p>");
    let id = block.id();
    let backend = Arc::new(FakeBackend::with_note("n1", Some(canvas_with(&[block]))));
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();

    let overlay = session.open_insight(selection("quantum entanglement"), Some(id), None).unwrap();
    let job = session.insight_job("").unwrap();
    let update = session.complete_insight(job.run().await);
    assert_eq!(update, InsightUpdate::Shown("Two particles share one quantum state.".into()));
    assert_eq!(session.overlays().get(overlay).unwrap().placement, Placement::insight(true));
    assert!(backend.prompts.lock().unwrap()[0].contains("\"quantum entanglement\""));

    let edit = session.attach_insight().await.unwrap().unwrap();
    assert_eq!(edit.block, Some(id));
    assert_eq!((edit.from, edit.to), (3, 23));
    assert_eq!(edit.text, annotation_markup("a1", "quantum entanglement"));
    assert_eq!(session.annotations().len(), 1);
    assert_eq!(backend.added_annotations.lock().unwrap()[0].block_id, Some(id.to_string()));
    assert!(session.overlays().is_empty());
}

#[tokio::test(start_paused = true)]
async fn late_insight_after_escape_is_dropped() {
    let backend = Arc::new(FakeBackend::with_note("n1", None));
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();

    session.open_insight(selection("photosynthesis"), None, None).unwrap();
    let job = session.insight_job("Explain simply").unwrap();
    session.key_down(&Key::new("Escape"), Modifiers::default());

    assert_eq!(session.complete_insight(job.run().await), InsightUpdate::Dropped);
    assert!(session.insight_text().is_none());
}

#[tokio::test(start_paused = true)]
async fn reply_for_a_replaced_popup_is_dropped() {
    let backend = Arc::new(FakeBackend::with_note("n1", None));
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();

    session.open_insight(selection("first pick"), None, None).unwrap();
    let stale = session.insight_job("").unwrap();
    session.open_insight(selection("second pick"), None, None).unwrap();

    assert_eq!(session.complete_insight(stale.run().await), InsightUpdate::Dropped);
    let fresh = session.insight_job("").unwrap();
    assert!(matches!(session.complete_insight(fresh.run().await), InsightUpdate::Shown(_)));
}

#[tokio::test(start_paused = true)]
async fn insight_failure_shows_server_message() {
    let backend = Arc::new(FakeBackend { ai_down: true, ..FakeBackend::with_note("n1", None) });
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();

    let overlay = session.open_insight(selection("mitochondria"), None, None).unwrap();
    let job = session.insight_job("").unwrap();
    assert_eq!(session.complete_insight(job.run().await), InsightUpdate::Failed("AI is napping".into()));
    assert!(session.overlays().get(overlay).is_some());
}

#[tokio::test(start_paused = true)]
async fn single_character_selection_opens_nothing() {
    let backend = Arc::new(FakeBackend::with_note("n1", None));
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();

    assert!(session.open_insight(selection(" x "), None, None).is_none());
    assert!(session.insight_job("").is_none());
}

#[tokio::test(start_paused = true)]
async fn outside_click_closes_popup_once_armed() {
    let backend = Arc::new(FakeBackend::with_note("n1", None));
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();
    session.open_insight(selection("armed popup"), None, None).unwrap();

    press(&mut session, 700.0, 580.0);
    assert!(!session.overlays().is_empty());

    tokio::time::advance(Duration::from_millis(150)).await;
    press(&mut session, 700.0, 580.0);
    assert!(session.overlays().is_empty());
    assert!(session.insight_job("").is_none());
}

// =============================================================================
// Annotations
// =============================================================================

#[tokio::test(start_paused = true)]
async fn deleting_an_annotation_closes_its_popup() {
    let backend = Arc::new(FakeBackend::with_note("n1", None));
    {
        let mut notes = backend.notes.lock().unwrap();
        let note = notes.get_mut("n1").unwrap();
        note.annotations.push(Annotation {
            id: "a9".into(),
            selected_text: "ribosome".into(),
            insight: "Makes proteins.".into(),
            block_id: None,
            shape_id: None,
            prompt: None,
        });
    }
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();

    assert!(session.open_annotation("nope", Point::new(10.0, 10.0)).is_none());
    assert!(session.open_annotation("a9", Point::new(10.0, 10.0)).is_some());
    session.delete_annotation("a9").await.unwrap();

    assert!(session.annotations().is_empty());
    assert!(session.overlays().is_empty());
    assert_eq!(*backend.deleted_annotations.lock().unwrap(), vec!["a9".to_string()]);
}

// =============================================================================
// Command menu and reminders
// =============================================================================

#[tokio::test(start_paused = true)]
async fn reminder_command_opens_dialog_and_inserts_marker() {
    let block = text_with(0.0, 0.0, "<p>Call</p>");
    let id = block.id();
    let backend = Arc::new(FakeBackend::with_note("n1", Some(canvas_with(&[block]))));
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();
    session.refresh_commands().await;
    session.focus_text(id);

    assert_eq!(session.text_inserted("@", 5, Point::new(40.0, 60.0)), MenuOutcome::Opened);
    assert!(session.overlays().find_kind(OverlayKind::CommandMenu).is_some());
    for (i, c) in ["r", "e", "m"].into_iter().enumerate() {
        assert_eq!(session.text_inserted(c, 6 + i, Point::new(40.0, 60.0)), MenuOutcome::Updated);
    }

    let MenuOutcome::Commit(edit) = session.text_key(&Key::new("Enter")) else {
        panic!("expected commit");
    };
    assert_eq!((edit.delete_from, edit.delete_to), (4, 8));
    assert!(session.overlays().find_kind(OverlayKind::CommandMenu).is_none());
    assert!(session.overlays().find_kind(OverlayKind::Reminder).is_some());

    let draft = ReminderDraft::new("Call mom", Some(date!(2026 - 10 - 18)));
    let insert = session.save_reminder(&draft).await.unwrap().unwrap();
    assert_eq!(insert.block, Some(id));
    assert_eq!((insert.from, insert.to), (4, 4));
    assert_eq!(insert.text, format!("{} ", reminder_markup("r1", "🔔 Sun, Oct 18 at 9:00 AM: \"Call mom\"")));
    assert!(session.overlays().is_empty());

    let created = backend.created_reminders.lock().unwrap().clone();
    assert_eq!(created[0].block_id, Some(id.to_string()));
    assert_eq!(created[0].note_id, "n1");
}

#[tokio::test(start_paused = true)]
async fn invalid_reminder_keeps_dialog_open() {
    let backend = Arc::new(FakeBackend::with_note("n1", None));
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();
    session.open_reminder(Point::new(10.0, 10.0), 0);

    let err = session.save_reminder(&ReminderDraft::new("   ", Some(date!(2026 - 10 - 18)))).await.unwrap_err();
    assert_eq!(err, ReminderError::EmptyMessage);
    assert!(session.overlays().find_kind(OverlayKind::Reminder).is_some());
    assert!(backend.created_reminders.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn blur_closes_command_menu() {
    let block = text_with(0.0, 0.0, "");
    let id = block.id();
    let backend = Arc::new(FakeBackend::with_note("n1", Some(canvas_with(&[block]))));
    let mut session = session_for(&backend);
    session.open_note("n1").await.unwrap();
    session.refresh_commands().await;
    session.focus_text(id);

    session.text_inserted("@", 1, Point::new(0.0, 0.0));
    session.set_command_menu_size(Size::new(200.0, 120.0));
    let menu = session.overlays().find_kind(OverlayKind::CommandMenu).unwrap();
    assert_eq!(menu.placement, Placement::menu(Size::new(200.0, 120.0)));

    session.blur_text();
    assert!(session.command_trigger().menu().is_none());
    assert!(session.overlays().is_empty());
}
