use super::*;

#[test]
fn retryable_classification() {
    assert!(ApiError::Request("reset".into()).retryable());
    assert!(ApiError::Response { status: 429, body: String::new() }.retryable());
    assert!(ApiError::Response { status: 503, body: String::new() }.retryable());
    assert!(!ApiError::Response { status: 404, body: String::new() }.retryable());
    assert!(!ApiError::Parse("eof".into()).retryable());
    assert!(!ApiError::HttpClientBuild("tls".into()).retryable());
}

#[test]
fn server_message_reads_error_body() {
    let err = ApiError::Response { status: 400, body: r#"{"error":"Note not found"}"#.into() };
    assert_eq!(err.server_message().as_deref(), Some("Note not found"));
    let html = ApiError::Response { status: 502, body: "<html>bad gateway</html>".into() };
    assert!(html.server_message().is_none());
    assert!(ApiError::Request("x".into()).server_message().is_none());
}

#[test]
fn note_record_tolerates_missing_fields() {
    let note: NoteRecord = serde_json::from_str(r#"{"id":"n1"}"#).unwrap();
    assert!(note.canvas_data.is_none());
    assert!(note.annotations.is_empty());
}

#[test]
fn new_annotation_omits_absent_owner() {
    let body = NewAnnotation {
        selected_text: "Rust".into(),
        insight: "A language".into(),
        block_id: Some("b1".into()),
        shape_id: None,
        prompt: None,
    };
    let v = serde_json::to_value(&body).unwrap();
    assert_eq!(v["block_id"], "b1");
    assert!(v.get("shape_id").is_none());
    assert!(v["prompt"].is_null());
}

#[test]
fn reminder_reads_backend_shape() {
    let r: Reminder = serde_json::from_str(
        r#"{"id":"r1","note_id":"n1","block_id":null,"message":"call","due_date":"2026-10-18T09:00:00","early_reminder_minutes":15,"completed":false,"notified":false,"raw_text":null}"#,
    )
    .unwrap();
    assert_eq!(r.early_reminder_minutes, 15);
    assert!(r.block_id.is_none());
}
