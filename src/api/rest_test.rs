use super::*;

#[test]
fn join_url_normalises_slashes() {
    assert_eq!(join_url("http://h/api", "/notes/1"), "http://h/api/notes/1");
    assert_eq!(join_url("http://h/api/", "notes"), "http://h/api/notes");
}

#[test]
fn client_uses_config_base_url() {
    let config = ClientConfig { api_base_url: "https://notes.test/api".into(), ..ClientConfig::default() };
    let client = RestClient::new(&config).unwrap();
    assert_eq!(client.url("/reminders/r1"), "https://notes.test/api/reminders/r1");
}

#[test]
fn parse_note_unwraps_envelope() {
    let note = parse_note(
        r#"{"note":{"id":"n1","title":"Ideas","canvas_data":{"version":2,"blocks":[]},"annotations":[
            {"id":"a1","selected_text":"x","insight":"y","block_id":"b1","prompt":null}
        ]},"linked_notes":[]}"#,
    )
    .unwrap();
    assert_eq!(note.id, "n1");
    assert_eq!(note.canvas_data.unwrap()["version"], 2);
    assert_eq!(note.annotations[0].block_id.as_deref(), Some("b1"));
}

#[test]
fn parse_note_rejects_bare_record() {
    let err = parse_note(r#"{"id":"n1"}"#).unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}

#[test]
fn parse_annotation_takes_created_entry() {
    let a = parse_annotation(
        r#"{"message":"Annotation added","annotation":{"id":"a2","selected_text":"s","insight":"i"},"annotations":[]}"#,
    )
    .unwrap();
    assert_eq!(a.id, "a2");
    assert!(a.prompt.is_none());
}

#[test]
fn parse_transform_reads_text() {
    assert_eq!(parse_transform(r#"{"text":"done","action":"insights"}"#).unwrap(), "done");
    assert!(parse_transform("not json").is_err());
}

#[test]
fn commands_parse_ignores_extra_fields() {
    let catalog: CommandCatalog = parse_json(
        r#"{"templates":[{"id":"now","name":"Now","pattern":"@now","is_inline":true,"addon_id":"core"}],"actions":[],"ui_components":[]}"#,
    )
    .unwrap();
    assert_eq!(catalog.templates.len(), 1);
}
