//! Canvas document codec.
//!
//! DESIGN
//! ======
//! Notes store their canvas in `canvas_data`. The current format is
//! `{ "version": 2, "blocks": [...], "camera": {...} }`. Older notes carry a
//! drawing-library snapshot `{ "store": { "shape:<id>": record, ... } }`
//! instead; those are read by mapping each shape record onto a block and
//! are never written back in that form.
//!
//! Decoding is tolerant: a bad block is skipped and logged, and
//! [`decode_or_empty`] turns a structurally broken document into an empty
//! scene so a load never fails outright. The legacy store is kept verbatim
//! under `legacy_store` in the first version-2 write, so records this codec
//! cannot map are not lost on upgrade.

#[cfg(test)]
#[path = "document_test.rs"]
mod tests;

use canvas::camera::{Camera, Point};
use canvas::doc::{Block, BoxSize, ShapeBlock, ShapeGeometry, ShapeType, StrokeStyle, TextBlock};
use serde_json::{Map, Value, json};
use tracing::warn;
use uuid::Uuid;

pub const CURRENT_VERSION: u64 = 2;

const LEGACY_SHAPE_PREFIX: &str = "shape:";
pub const LEGACY_STORE_KEY: &str = "legacy_store";

/// Errors produced while decoding a stored canvas document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("canvas data is not a JSON object")]
    NotAnObject,

    #[error("unsupported canvas version {0}")]
    UnsupportedVersion(u64),

    #[error("canvas field `{0}` has the wrong type")]
    InvalidField(&'static str),
}

/// Which stored format a canvas came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasOrigin {
    V2,
    Legacy,
    Empty,
}

/// A decoded canvas, ready to load into the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCanvas {
    pub blocks: Vec<Block>,
    pub camera: Camera,
    pub origin: CanvasOrigin,
    /// Legacy snapshot to carry forward on the next write.
    pub legacy_store: Option<Value>,
    /// Entries that could not be read.
    pub skipped: usize,
}

impl LoadedCanvas {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            blocks: Vec::new(),
            camera: Camera::default(),
            origin: CanvasOrigin::Empty,
            legacy_store: None,
            skipped: 0,
        }
    }
}

/// Decode `canvas_data`. `None` and `null` decode to an empty canvas.
///
/// # Errors
///
/// Returns an error if the value is not an object, names an unknown version,
/// or has a non-array `blocks` or non-object `store`.
pub fn decode(value: Option<&Value>) -> Result<LoadedCanvas, DocumentError> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(LoadedCanvas::empty());
    };
    let obj = value.as_object().ok_or(DocumentError::NotAnObject)?;

    match obj.get("version") {
        Some(version) => {
            let version = version.as_u64().ok_or(DocumentError::InvalidField("version"))?;
            if version != CURRENT_VERSION {
                return Err(DocumentError::UnsupportedVersion(version));
            }
            decode_v2(obj)
        }
        None if obj.contains_key("store") => decode_legacy(obj),
        None if obj.contains_key("blocks") => decode_v2(obj),
        None => Ok(LoadedCanvas::empty()),
    }
}

/// Decode `canvas_data`, logging and falling back to an empty canvas on error.
#[must_use]
pub fn decode_or_empty(note_id: &str, value: Option<&Value>) -> LoadedCanvas {
    match decode(value) {
        Ok(loaded) => {
            if loaded.skipped > 0 {
                warn!(note_id = %note_id, skipped = loaded.skipped, "skipped unreadable canvas entries");
            }
            loaded
        }
        Err(e) => {
            warn!(note_id = %note_id, error = %e, "canvas data unreadable; starting empty");
            LoadedCanvas::empty()
        }
    }
}

/// Encode the current scene. Always writes the current format.
#[must_use]
pub fn encode(blocks: &[Block], camera: &Camera, legacy_store: Option<&Value>) -> Value {
    let mut doc = json!({
        "version": CURRENT_VERSION,
        "blocks": blocks,
        "camera": camera,
    });
    if let (Some(store), Some(obj)) = (legacy_store, doc.as_object_mut()) {
        obj.insert(LEGACY_STORE_KEY.to_string(), store.clone());
    }
    doc
}

/// Deterministic text form of an encoded document, used for dirty checks.
#[must_use]
pub fn fingerprint(doc: &Value) -> String {
    doc.to_string()
}

// =============================================================================
// VERSION 2
// =============================================================================

fn decode_v2(obj: &Map<String, Value>) -> Result<LoadedCanvas, DocumentError> {
    let raw_blocks: &[Value] = match obj.get("blocks") {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items,
        Some(_) => return Err(DocumentError::InvalidField("blocks")),
    };

    let mut skipped = 0;
    let mut blocks = Vec::with_capacity(raw_blocks.len());
    for raw in raw_blocks {
        match serde_json::from_value::<Block>(raw.clone()) {
            Ok(block) => blocks.push(block),
            Err(e) => {
                skipped += 1;
                warn!(error = %e, "skipping unreadable block");
            }
        }
    }

    let camera = obj
        .get("camera")
        .and_then(|c| serde_json::from_value::<Camera>(c.clone()).ok())
        .unwrap_or_default();

    Ok(LoadedCanvas {
        blocks,
        camera,
        origin: CanvasOrigin::V2,
        legacy_store: obj.get(LEGACY_STORE_KEY).filter(|v| !v.is_null()).cloned(),
        skipped,
    })
}

// =============================================================================
// LEGACY
// =============================================================================

fn decode_legacy(obj: &Map<String, Value>) -> Result<LoadedCanvas, DocumentError> {
    let store = obj
        .get("store")
        .and_then(Value::as_object)
        .ok_or(DocumentError::InvalidField("store"))?;

    let mut skipped = 0;
    let mut blocks = Vec::new();
    let mut keys: Vec<&String> = store.keys().filter(|k| k.starts_with(LEGACY_SHAPE_PREFIX)).collect();
    keys.sort();
    for key in keys {
        match store.get(key).and_then(|record| legacy_block(key, record)) {
            Some(block) => blocks.push(block),
            None => skipped += 1,
        }
    }

    Ok(LoadedCanvas {
        blocks,
        camera: Camera::default(),
        origin: CanvasOrigin::Legacy,
        legacy_store: Some(Value::Object(store.clone())),
        skipped,
    })
}

/// Map one legacy shape record onto a block, if its type is understood.
/// The block id is derived from the record key, so it is the same on every load.
fn legacy_block(key: &str, record: &Value) -> Option<Block> {
    let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes());
    let kind = record.get("type")?.as_str()?;
    let position = Point::new(num(record, "x"), num(record, "y"));
    let rotation = num(record, "rotation").to_degrees();
    let props = record.get("props").cloned().unwrap_or(Value::Null);

    match kind {
        "geo" => {
            let shape_type = match props.get("geo").and_then(Value::as_str).unwrap_or("rectangle") {
                "rectangle" => ShapeType::Rectangle,
                "ellipse" | "oval" => ShapeType::Circle,
                "triangle" => ShapeType::Triangle,
                _ => return None,
            };
            let mut shape = styled_shape(id, shape_type, position, rotation, &props);
            let size = BoxSize::new(num_or(&props, "w", 100.0), num_or(&props, "h", 100.0));
            shape.geometry = ShapeGeometry::Box { size };
            shape.text = props
                .get("text")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            Some(Block::Shape(shape))
        }
        "line" | "arrow" => {
            let shape_type = if kind == "arrow" { ShapeType::Arrow } else { ShapeType::Line };
            let (start, end) = legacy_segment(kind, &props)?;
            let mut shape = styled_shape(id, shape_type, position, rotation, &props);
            shape.geometry = ShapeGeometry::Segment { start, end };
            Some(Block::Shape(shape))
        }
        "text" | "note" => {
            let mut text = TextBlock::new(position);
            text.id = id;
            if let Some(w) = props.get("w").and_then(Value::as_f64) {
                text.width = w;
            }
            text.content = paragraphs(props.get("text").and_then(Value::as_str).unwrap_or_default());
            Some(Block::Text(text))
        }
        _ => None,
    }
}

/// End points of a legacy line or arrow, relative to the record position.
fn legacy_segment(kind: &str, props: &Value) -> Option<(Point, Point)> {
    let point = |v: &Value| Some(Point::new(v.get("x")?.as_f64()?, v.get("y")?.as_f64()?));
    if kind == "arrow" {
        return Some((point(props.get("start")?)?, point(props.get("end")?)?));
    }
    // Lines keep an index-keyed handle map; the first and last handles are the ends.
    let handles = props.get("points").or_else(|| props.get("handles"))?.as_object()?;
    let mut ordered: Vec<(&str, Point)> = handles
        .values()
        .filter_map(|h| Some((h.get("index")?.as_str().unwrap_or_default(), point(h)?)))
        .collect();
    ordered.sort_by(|a, b| a.0.cmp(b.0));
    Some((ordered.first()?.1, ordered.last()?.1))
}

fn styled_shape(id: Uuid, shape_type: ShapeType, position: Point, rotation: f64, props: &Value) -> ShapeBlock {
    let mut shape = ShapeBlock::new(shape_type, position);
    shape.id = id;
    shape.rotation = rotation;
    if let Some(color) = props.get("color").and_then(Value::as_str).and_then(legacy_color) {
        shape.stroke_color = color.to_string();
        if props.get("fill").and_then(Value::as_str).is_some_and(|f| f != "none") {
            shape.fill_color = color.to_string();
        }
    }
    shape.stroke_style = match props.get("dash").and_then(Value::as_str) {
        Some("dashed") => StrokeStyle::Dashed,
        Some("dotted") => StrokeStyle::Dotted,
        _ => StrokeStyle::Solid,
    };
    if let Some(width) = props.get("size").and_then(Value::as_str).and_then(legacy_stroke_width) {
        shape.stroke_width = width;
    }
    shape
}

fn legacy_color(name: &str) -> Option<&'static str> {
    Some(match name {
        "black" => "#1d1d1d",
        "grey" => "#9fa8b2",
        "light-violet" => "#e085f4",
        "violet" => "#ae3ec9",
        "blue" => "#4465e9",
        "light-blue" => "#4ba1f1",
        "yellow" => "#f1ac4b",
        "orange" => "#e16919",
        "green" => "#099268",
        "light-green" => "#4cb05e",
        "light-red" => "#f87777",
        "red" => "#e03131",
        _ => return None,
    })
}

fn legacy_stroke_width(size: &str) -> Option<f64> {
    Some(match size {
        "s" => 2.0,
        "m" => 3.5,
        "l" => 5.0,
        "xl" => 10.0,
        _ => return None,
    })
}

fn num(v: &Value, key: &str) -> f64 {
    num_or(v, key, 0.0)
}

fn num_or(v: &Value, key: &str, default: f64) -> f64 {
    v.get(key).and_then(Value::as_f64).filter(|n| n.is_finite()).unwrap_or(default)
}

/// Plain text to paragraph markup, one `<p>` per line.
fn paragraphs(text: &str) -> String {
    text.lines()
        .map(|line| {
            let escaped = line.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;");
            format!("<p>{escaped}</p>")
        })
        .collect()
}
