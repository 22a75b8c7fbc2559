//! Collaborators the canvas host talks to.
//!
//! DESIGN
//! ======
//! Every backend concern is an `async_trait` so the session and services can
//! run against [`rest::RestClient`] in production and in-memory fakes in
//! tests. All methods return [`ApiError`]; callers decide whether a failure
//! is logged and retried later (autosave, cascades) or shown inline (insight
//! and reminder overlays).

pub mod rest;
pub mod types;

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use canvas::command_menu::CommandCatalog;
use serde_json::Value;

pub use types::{Annotation, ApiError, NewAnnotation, NewReminder, NoteRecord, Reminder};

/// Note loading and canvas persistence.
#[async_trait::async_trait]
pub trait CanvasStore: Send + Sync {
    async fn load_note(&self, note_id: &str) -> Result<NoteRecord, ApiError>;

    async fn save_canvas(&self, note_id: &str, canvas: &Value) -> Result<(), ApiError>;
}

/// AI text transforms (insights, rewrite, summarize, ...).
#[async_trait::async_trait]
pub trait TextTransform: Send + Sync {
    async fn transform(&self, text: &str, action: &str, context: Option<&str>) -> Result<String, ApiError>;
}

#[async_trait::async_trait]
pub trait AnnotationStore: Send + Sync {
    async fn add_annotation(&self, note_id: &str, annotation: &NewAnnotation) -> Result<Annotation, ApiError>;

    async fn delete_annotation(&self, note_id: &str, annotation_id: &str) -> Result<(), ApiError>;
}

#[async_trait::async_trait]
pub trait ReminderStore: Send + Sync {
    async fn create_reminder(&self, reminder: &NewReminder) -> Result<Reminder, ApiError>;

    async fn delete_reminder(&self, reminder_id: &str) -> Result<(), ApiError>;
}

/// Source of the `@` command menu entries.
#[async_trait::async_trait]
pub trait CommandSource: Send + Sync {
    async fn get_commands(&self) -> Result<CommandCatalog, ApiError>;
}
