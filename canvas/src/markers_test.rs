use super::*;

fn reminder(id: &str) -> MarkerRef {
    MarkerRef { kind: MarkerKind::Reminder, id: id.into() }
}

fn annotation(id: &str) -> MarkerRef {
    MarkerRef { kind: MarkerKind::Annotation, id: id.into() }
}

// =============================================================
// scan_markers
// =============================================================

#[test]
fn scan_empty_content() {
    assert!(scan_markers("").is_empty());
    assert!(scan_markers("<p>plain text</p>").is_empty());
}

#[test]
fn scan_finds_both_kinds_in_document_order() {
    let html = r#"<p><span data-annotation-id="a1">x</span> and <span data-reminder-id="r1" class="reminder-tag">y</span></p>"#;
    assert_eq!(scan_markers(html), vec![annotation("a1"), reminder("r1")]);
}

#[test]
fn scan_deduplicates() {
    let html = r#"<span data-reminder-id="r1">a</span><span data-reminder-id="r1">b</span>"#;
    assert_eq!(scan_markers(html), vec![reminder("r1")]);
}

#[test]
fn scan_accepts_single_quotes_and_spacing() {
    let html = "<span data-reminder-id = 'r9'>a</span>";
    assert_eq!(scan_markers(html), vec![reminder("r9")]);
}

#[test]
fn scan_ignores_longer_attribute_names() {
    let html = r#"<span xdata-reminder-id="nope">a</span>"#;
    assert!(scan_markers(html).is_empty());
}

#[test]
fn scan_ignores_unterminated_and_empty_values() {
    assert!(scan_markers(r#"<span data-reminder-id="">a</span>"#).is_empty());
    assert!(scan_markers(r#"<span data-reminder-id="r1"#).is_empty());
}

#[test]
fn scan_handles_multibyte_text() {
    let html = r#"<p>🔔 Reminder</p><span data-reminder-id="é1">🔔</span>"#;
    assert_eq!(scan_markers(html), vec![reminder("é1")]);
}

// =============================================================
// removed_reminders
// =============================================================

#[test]
fn removed_reminders_reports_only_missing_reminders() {
    let before = vec![reminder("r1"), reminder("r2"), annotation("a1")];
    let after = vec![reminder("r2")];
    assert_eq!(removed_reminders(&before, &after), vec!["r1".to_string()]);
}

#[test]
fn removed_reminders_none_when_unchanged() {
    let markers = vec![reminder("r1")];
    assert!(removed_reminders(&markers, &markers).is_empty());
}

// =============================================================
// Markup
// =============================================================

#[test]
fn reminder_markup_scans_back() {
    let html = reminder_markup("r42", "🔔 Mon: \"call\"");
    assert!(html.contains("&quot;call&quot;"));
    assert_eq!(scan_markers(&html), vec![reminder("r42")]);
}

#[test]
fn annotation_markup_scans_back() {
    let html = annotation_markup("a7", "<b>");
    assert!(html.contains("&lt;b&gt;"));
    assert_eq!(scan_markers(&html), vec![annotation("a7")]);
}

// =============================================================
// TextSurface default methods
// =============================================================

struct Buffer(String);

impl TextSurface for Buffer {
    fn content(&self) -> String {
        self.0.clone()
    }

    fn replace_range(&mut self, from: usize, to: usize, text: &str) {
        self.0.replace_range(from..to, text);
    }
}

#[test]
fn surface_insert_and_markers() {
    let mut buf = Buffer("hello".into());
    buf.insert_at(5, &reminder_markup("r1", "!"));
    assert_eq!(buf.markers(), vec![reminder("r1")]);
}
