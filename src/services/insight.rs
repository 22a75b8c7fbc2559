//! AI insight requests and attaching insights to text as annotations.

#[cfg(test)]
#[path = "insight_test.rs"]
mod tests;

use canvas::markers::annotation_markup;
use tracing::warn;

use crate::api::{Annotation, AnnotationStore, ApiError, NewAnnotation, TextTransform};

/// Transform action used for selection insights.
pub const INSIGHT_ACTION: &str = "insights";

const DEFAULT_INSTRUCTION: &str = "Provide a brief, direct explanation or definition for the following. \
If it's a name, provide relevant background. If it's a term, explain it clearly. \
If it's a phrase, analyze its meaning or significance. Do not include follow-up questions, \
suggestions, or any additional commentary. Only the direct insight.";

/// Errors shown inline in the insight popup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InsightError {
    #[error("nothing selected")]
    EmptySelection,

    #[error("insight request failed: {0}")]
    Request(ApiError),

    #[error("attaching insight failed: {0}")]
    Attach(ApiError),
}

impl InsightError {
    /// Short message for the popup. Prefers the backend's own error text.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::EmptySelection => "Select some text first".to_string(),
            Self::Request(e) => e.server_message().unwrap_or_else(|| "Failed to get AI insight".to_string()),
            Self::Attach(e) => e.server_message().unwrap_or_else(|| "Failed to add annotation".to_string()),
        }
    }
}

/// What an annotation hangs off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationOwner {
    Block(String),
    Shape(String),
}

/// An insight stored as an annotation, plus the markup to wrap the selection in.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedInsight {
    pub annotation: Annotation,
    pub markup: String,
}

/// Prompt sent for an insight on `selected`.
///
/// An empty `user_prompt` falls back to a default explanatory instruction.
#[must_use]
pub fn build_insight_prompt(selected: &str, context: Option<&str>, user_prompt: &str) -> String {
    let body = match context.filter(|c| !c.trim().is_empty()) {
        Some(context) => format!("Context: {context}\n\nSelected text: \"{selected}\""),
        None => format!("Selected text: \"{selected}\""),
    };
    let instruction = user_prompt.trim();
    if instruction.is_empty() {
        format!("{DEFAULT_INSTRUCTION}\n\n{body}")
    } else {
        format!("{user_prompt}\n\n{body}")
    }
}

/// Ask the AI collaborator for an insight on `selected`.
///
/// # Errors
///
/// Returns [`InsightError::EmptySelection`] for blank selections and
/// [`InsightError::Request`] when the transform call fails.
pub async fn request_insight(
    ai: &dyn TextTransform,
    selected: &str,
    context: Option<&str>,
    user_prompt: &str,
) -> Result<String, InsightError> {
    if selected.trim().is_empty() {
        return Err(InsightError::EmptySelection);
    }
    let prompt = build_insight_prompt(selected, context, user_prompt);
    ai.transform(&prompt, INSIGHT_ACTION, None).await.map_err(|e| {
        warn!(error = %e, "insight request failed");
        InsightError::Request(e)
    })
}

/// Run a named transform (rewrite, polish, ...) over `text`.
///
/// # Errors
///
/// Returns [`InsightError::Request`] when the transform call fails.
pub async fn transform_selection(ai: &dyn TextTransform, text: &str, action: &str) -> Result<String, InsightError> {
    if text.trim().is_empty() {
        return Err(InsightError::EmptySelection);
    }
    ai.transform(text, action, None).await.map_err(InsightError::Request)
}

/// Store `insight` as an annotation on `owner` and build the marker markup.
///
/// # Errors
///
/// Returns [`InsightError::Attach`] when the annotation store rejects it.
pub async fn attach_insight(
    store: &dyn AnnotationStore,
    note_id: &str,
    owner: AnnotationOwner,
    selected: &str,
    insight: &str,
    user_prompt: Option<&str>,
) -> Result<AttachedInsight, InsightError> {
    let (block_id, shape_id) = match owner {
        AnnotationOwner::Block(id) => (Some(id), None),
        AnnotationOwner::Shape(id) => (None, Some(id)),
    };
    let request = NewAnnotation {
        selected_text: selected.to_string(),
        insight: insight.to_string(),
        block_id,
        shape_id,
        prompt: user_prompt.map(str::trim).filter(|p| !p.is_empty()).map(str::to_string),
    };
    let annotation = store.add_annotation(note_id, &request).await.map_err(|e| {
        warn!(note_id = %note_id, error = %e, "annotation create failed");
        InsightError::Attach(e)
    })?;
    let markup = annotation_markup(&annotation.id, selected);
    Ok(AttachedInsight { annotation, markup })
}
