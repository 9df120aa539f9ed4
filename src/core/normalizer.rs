//! Reduces any resolved value to one printable string for CSV cells and XML text.

use crate::domain::value::FieldValue;
use serde_json::{Map, Value};
use std::fmt::Write;

/// Keys tried, in order, when a mapping has to be shown as a single string.
pub const LABEL_KEYS: [&str; 3] = ["label", "url", "title"];

/// Separator for multi-valued cells.
pub const MULTI_VALUE_SEPARATOR: &str = "|";

/// Total: every input produces a string.
///
/// * absent or null: empty string
/// * mapping: its `label`, else `url`, else `title`, else its literal form
/// * sequence of mappings: each mapping as above, joined with `|`
/// * any other sequence: each element's string form, joined with `|`; nested
///   mappings and sequences keep their literal form
/// * scalar: its plain string form
pub fn normalize(value: &FieldValue<'_>) -> String {
    match value {
        FieldValue::Absent | FieldValue::Null => String::new(),
        FieldValue::Text(s) => (*s).to_string(),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Record(map) => normalize_record(map),
        FieldValue::Sequence(items) => normalize_sequence(items),
    }
}

fn normalize_sequence(items: &[FieldValue<'_>]) -> String {
    let all_records = !items.is_empty()
        && items.iter().all(|item| matches!(item, FieldValue::Record(_)));

    items
        .iter()
        .map(|item| match item {
            FieldValue::Record(map) if all_records => normalize_record(map),
            FieldValue::Record(_) | FieldValue::Sequence(_) => field_literal(item),
            scalar => normalize(scalar),
        })
        .collect::<Vec<_>>()
        .join(MULTI_VALUE_SEPARATOR)
}

pub fn normalize_value(value: Option<&Value>) -> String {
    normalize(&FieldValue::from(value))
}

fn normalize_record(map: &Map<String, Value>) -> String {
    LABEL_KEYS
        .iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()))
        .map(|v| normalize(&FieldValue::from(v)))
        .unwrap_or_else(|| literal_form(&Value::Object(map.clone())))
}

/// Compact single-quoted rendering, e.g. `{'other': 'v'}`.
///
/// Keys keep the order the server sent them in.
pub fn literal_form(value: &Value) -> String {
    let mut out = String::new();
    write_literal(&mut out, value);
    out
}

/// Literal form of a resolved value, which may be a fanned-out sequence that
/// no single JSON value backs.
fn field_literal(value: &FieldValue<'_>) -> String {
    let mut out = String::new();
    write_field_literal(&mut out, value);
    out
}

fn write_field_literal(out: &mut String, value: &FieldValue<'_>) {
    match value {
        FieldValue::Absent | FieldValue::Null => out.push_str("null"),
        FieldValue::Text(s) => write_quoted(out, s),
        FieldValue::Number(n) => {
            let _ = write!(out, "{}", n);
        }
        FieldValue::Bool(b) => {
            let _ = write!(out, "{}", b);
        }
        FieldValue::Record(map) => write_map(out, map),
        FieldValue::Sequence(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_field_literal(out, item);
            }
            out.push(']');
        }
    }
}

fn write_literal(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => {
            let _ = write!(out, "{}", b);
        }
        Value::Number(n) => {
            let _ = write!(out, "{}", n);
        }
        Value::String(s) => write_quoted(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_literal(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => write_map(out, map),
    }
}

fn write_map(out: &mut String, map: &Map<String, Value>) {
    out.push('{');
    for (i, (key, item)) in map.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_quoted(out, key);
        out.push_str(": ");
        write_literal(out, item);
    }
    out.push('}');
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('\'');
}
