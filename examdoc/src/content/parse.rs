use super::legacy::{looks_like_legacy_html, split_dollar_math, HtmlLegacyConverter, LegacyConverter};
use crate::geometry::limits::MAX_SEGMENTS;
use crate::model::ContentSegment;
use serde_json::Value;

/// The shapes content arrives in from the exam store.
#[derive(Clone, Debug)]
pub enum ContentInput {
    Segments(Vec<ContentSegment>),
    Json(Value),
    Str(String),
}

impl From<Vec<ContentSegment>> for ContentInput {
    fn from(v: Vec<ContentSegment>) -> Self {
        ContentInput::Segments(v)
    }
}

impl From<Value> for ContentInput {
    fn from(v: Value) -> Self {
        ContentInput::Json(v)
    }
}

impl From<&str> for ContentInput {
    fn from(s: &str) -> Self {
        ContentInput::Str(s.to_string())
    }
}

impl From<String> for ContentInput {
    fn from(s: String) -> Self {
        ContentInput::Str(s)
    }
}

/// Parse content defensively with the default legacy converter. Never fails:
/// anything unparseable is treated as legacy text.
pub fn parse_content(input: impl Into<ContentInput>) -> Vec<ContentSegment> {
    parse_content_with(input, &HtmlLegacyConverter)
}

pub fn parse_content_with(input: impl Into<ContentInput>, legacy: &dyn LegacyConverter) -> Vec<ContentSegment> {
    let mut segments = match input.into() {
        ContentInput::Segments(v) => v,
        ContentInput::Json(v) => from_value(v, legacy),
        ContentInput::Str(s) => from_str(&s, legacy),
    };
    if segments.len() > MAX_SEGMENTS {
        tracing::debug!(count = segments.len(), limit = MAX_SEGMENTS, "content truncated");
        segments.truncate(MAX_SEGMENTS);
    }
    segments
}

fn from_str(s: &str, legacy: &dyn LegacyConverter) -> Vec<ContentSegment> {
    let trimmed = s.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(v @ (Value::Array(_) | Value::Object(_))) => return from_value(v, legacy),
            Ok(_) => {}
            Err(err) => tracing::debug!(error = %err, "content is not JSON, reading as legacy text"),
        }
    }
    legacy_segments(s, legacy)
}

fn legacy_segments(s: &str, legacy: &dyn LegacyConverter) -> Vec<ContentSegment> {
    if s.trim().is_empty() {
        return Vec::new();
    }
    if looks_like_legacy_html(s) {
        split_dollar_math(&legacy.convert(s))
    } else {
        split_dollar_math(s)
    }
}

fn from_value(v: Value, legacy: &dyn LegacyConverter) -> Vec<ContentSegment> {
    match v {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| element(i, item))
            .collect(),
        Value::Object(map) if map.contains_key("type") => element(0, Value::Object(map)).into_iter().collect(),
        Value::Object(mut map) => match map.remove("segments") {
            Some(inner @ Value::Array(_)) => from_value(inner, legacy),
            _ => Vec::new(),
        },
        Value::String(s) => legacy_segments(&s, legacy),
        Value::Null => Vec::new(),
        other => vec![ContentSegment::text("", other.to_string())],
    }
}

/// One array element; a malformed element is salvaged as text when it
/// carries any, otherwise dropped.
fn element(index: usize, item: Value) -> Option<ContentSegment> {
    match serde_json::from_value::<ContentSegment>(item.clone()) {
        Ok(seg) => Some(seg),
        Err(err) => {
            tracing::debug!(index, error = %err, "malformed content segment");
            match item {
                Value::String(s) => Some(ContentSegment::text("", s)),
                Value::Object(map) => {
                    let text = map.get("text").and_then(Value::as_str)?;
                    let id = map.get("id").and_then(Value::as_str).unwrap_or_default();
                    Some(ContentSegment::text(id, text))
                }
                _ => None,
            }
        }
    }
}
