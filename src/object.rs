//! Structured payload rendering.
//!
//! Payloads are [`serde_json::Value`]s. Rendering flattens the top level into
//! a key → value map, pretty-prints it in a JavaScript-inspector layout with
//! full nesting, and styles each value by kind:
//!
//! ```text
//! {
//!   name: "Paul",          key cyan, string bright green
//!   age: 41,               number yellow
//!   admin: false,          boolean magenta
//!   manager: null,         null gray
//!   tags: [
//!     'ops',               array string orange
//!     'dev'
//!   ]
//! }
//! ```

use std::fmt::Write;

use owo_colors::{OwoColorize, Style};
use serde_json::{Map, Value};

/// Placeholder for a payload that could not be converted to a value.
pub const UNREADABLE: &str = "[unreadable]";

const INDENT: &str = "  ";

/// Size summary of a payload's compact JSON form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSize {
    /// Human-readable size (`"512 Bytes"`, `"1.50 KB"`, `"2.00 MB"`).
    pub size: String,
    /// UTF-8 byte length.
    pub bytes: usize,
    /// Character length.
    pub chars: usize,
}

/// Flatten the top level of a payload into a map.
///
/// Objects keep their own entries. Arrays become index-keyed entries plus a
/// `length` entry. Scalars are wrapped as `{ "value": … }`.
pub fn flatten(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        Value::Array(items) => {
            let mut flat: Map<String, Value> = items
                .iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), item.clone()))
                .collect();
            flat.insert("length".to_string(), Value::from(items.len()));
            flat
        }
        scalar => {
            let mut flat = Map::new();
            flat.insert("value".to_string(), scalar.clone());
            flat
        }
    }
}

/// Styles applied per value kind.
#[derive(Debug, Clone, Copy)]
struct Palette {
    key: Style,
    string: Style,
    number: Style,
    boolean: Style,
    null: Style,
    array_string: Style,
}

impl Palette {
    fn colored() -> Self {
        Self {
            key: Style::new().cyan(),
            string: Style::new().bright_green(),
            number: Style::new().yellow(),
            boolean: Style::new().magenta(),
            null: Style::new().bright_black(),
            array_string: Style::new().truecolor(255, 135, 0),
        }
    }
}

/// Render a payload as styled multi-line text (no trailing newline).
pub fn render(value: &Value) -> String {
    let flat = Value::Object(flatten(value));
    let mut out = String::new();
    write_value(&mut out, &flat, 0, false, &Palette::colored());
    out
}

fn write_value(out: &mut String, value: &Value, depth: usize, in_array: bool, palette: &Palette) {
    match value {
        Value::Null => {
            let _ = write!(out, "{}", "null".style(palette.null));
        }
        Value::Bool(b) => {
            let _ = write!(out, "{}", b.style(palette.boolean));
        }
        Value::Number(n) => {
            let _ = write!(out, "{}", n.style(palette.number));
        }
        Value::String(s) => {
            if in_array {
                let _ = write!(out, "'{}'", s.style(palette.array_string));
            } else {
                let quoted = format!("\"{s}\"");
                let _ = write!(out, "{}", quoted.style(palette.string));
            }
        }
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                push_indent(out, depth + 1);
                write_value(out, item, depth + 1, true, palette);
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(out, depth);
            out.push(']');
        }
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (i, (key, item)) in map.iter().enumerate() {
                push_indent(out, depth + 1);
                let _ = write!(out, "{}: ", display_key(key).style(palette.key));
                write_value(out, item, depth + 1, false, palette);
                if i + 1 < map.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(out, depth);
            out.push('}');
        }
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// Identifier-like keys print bare, anything else single-quoted.
fn display_key(key: &str) -> String {
    let mut chars = key.chars();
    let bare = match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };
    let index = !key.is_empty() && key.chars().all(|c| c.is_ascii_digit());
    if bare || index {
        key.to_string()
    } else {
        format!("'{}'", key.replace('\'', "\\'"))
    }
}

/// Measure the compact JSON form of a payload.
pub fn size_of(value: &Value) -> ObjectSize {
    let serialized = value.to_string();
    let bytes = serialized.len();
    let chars = serialized.chars().count();
    ObjectSize {
        size: human_size(bytes),
        bytes,
        chars,
    }
}

/// Classify a byte count with 1024-based, mutually exclusive thresholds.
#[allow(clippy::cast_precision_loss)]
pub fn human_size(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * 1024;

    if bytes < KIB {
        format!("{bytes} Bytes")
    } else if bytes < MIB {
        format!("{:.2} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MIB as f64)
    }
}
