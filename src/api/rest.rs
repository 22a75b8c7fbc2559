//! REST client for the notes backend.
//!
//! Thin HTTP wrapper over the backend routes. Response parsing lives in pure
//! functions so it can be tested without a server.

#[cfg(test)]
#[path = "rest_test.rs"]
mod rest_test;

use std::time::Duration;

use canvas::command_menu::CommandCatalog;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::{Annotation, ApiError, NewAnnotation, NewReminder, NoteRecord, Reminder};
use super::{AnnotationStore, CanvasStore, CommandSource, ReminderStore, TextTransform};
use crate::config::ClientConfig;

// =============================================================================
// CLIENT
// =============================================================================

pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RestClient {
    /// Build a client from typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.api_base_url.clone(), token: config.api_token.clone() })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await.map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::Response { status: status.as_u16(), body: text });
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl CanvasStore for RestClient {
    async fn load_note(&self, note_id: &str) -> Result<NoteRecord, ApiError> {
        let text = self.send(self.http.get(self.url(&format!("/notes/{note_id}")))).await?;
        parse_note(&text)
    }

    async fn save_canvas(&self, note_id: &str, canvas: &Value) -> Result<(), ApiError> {
        let body = CanvasBody { canvas_data: canvas };
        self.send(self.http.put(self.url(&format!("/notes/{note_id}/canvas"))).json(&body))
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TextTransform for RestClient {
    async fn transform(&self, text: &str, action: &str, context: Option<&str>) -> Result<String, ApiError> {
        let body = TransformBody { text, action, context };
        let text = self.send(self.http.post(self.url("/ai/transform")).json(&body)).await?;
        parse_transform(&text)
    }
}

#[async_trait::async_trait]
impl AnnotationStore for RestClient {
    async fn add_annotation(&self, note_id: &str, annotation: &NewAnnotation) -> Result<Annotation, ApiError> {
        let url = self.url(&format!("/notes/{note_id}/annotations"));
        let text = self.send(self.http.post(url).json(annotation)).await?;
        parse_annotation(&text)
    }

    async fn delete_annotation(&self, note_id: &str, annotation_id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("/notes/{note_id}/annotations/{annotation_id}"));
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReminderStore for RestClient {
    async fn create_reminder(&self, reminder: &NewReminder) -> Result<Reminder, ApiError> {
        let text = self.send(self.http.post(self.url("/reminders")).json(reminder)).await?;
        parse_json(&text)
    }

    async fn delete_reminder(&self, reminder_id: &str) -> Result<(), ApiError> {
        self.send(self.http.delete(self.url(&format!("/reminders/{reminder_id}"))))
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CommandSource for RestClient {
    async fn get_commands(&self) -> Result<CommandCatalog, ApiError> {
        let text = self.send(self.http.get(self.url("/addons/commands"))).await?;
        parse_json(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
struct CanvasBody<'a> {
    canvas_data: &'a Value,
}

#[derive(serde::Serialize)]
struct TransformBody<'a> {
    text: &'a str,
    action: &'a str,
    context: Option<&'a str>,
}

#[derive(serde::Deserialize)]
struct TransformResponse {
    text: String,
}

#[derive(serde::Deserialize)]
struct NoteEnvelope {
    note: NoteRecord,
}

#[derive(serde::Deserialize)]
struct AnnotationEnvelope {
    annotation: Annotation,
}

// =============================================================================
// PARSING
// =============================================================================

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))
}

fn parse_note(text: &str) -> Result<NoteRecord, ApiError> {
    parse_json::<NoteEnvelope>(text).map(|env| env.note)
}

fn parse_annotation(text: &str) -> Result<Annotation, ApiError> {
    parse_json::<AnnotationEnvelope>(text).map(|env| env.annotation)
}

fn parse_transform(text: &str) -> Result<String, ApiError> {
    parse_json::<TransformResponse>(text).map(|r| r.text)
}
