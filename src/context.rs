//! Context buffers: named groups of rendered lines emitted together.
//!
//! A context is created lazily by the first log call that names it, collects
//! every subsequent line logged under the same id, and lives until it is
//! flushed. Records are never expired.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::style::substitute_style_tokens;
use crate::timestamp::format_duration;

/// Color used for context frames when neither the call nor the record
/// supplies one.
pub const DEFAULT_CONTEXT_COLOR: &str = "orange";

/// Opaque identifier of a context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(String);

impl ContextId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random id (see [`generate_context_id`]).
    pub fn unique() -> Self {
        Self(generate_context_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContextId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ContextId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a context is framed when flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextMode {
    /// Boxed header and footer, every line prefixed with `║`.
    #[default]
    Full,
    /// One-line start marker and a two-line end marker.
    StartEnd,
    /// Lines only.
    Off,
}

impl ContextMode {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "full" => Some(Self::Full),
            "startend" | "start_end" => Some(Self::StartEnd),
            "off" => Some(Self::Off),
            _ => None,
        }
    }
}

/// Accumulated state of one context.
#[derive(Debug, Clone)]
pub struct ContextRecord {
    pub title: Option<String>,
    pub color: String,
    pub mode: ContextMode,
    pub start: Instant,
    pub end: Instant,
    pub lines: Vec<String>,
}

impl ContextRecord {
    /// Time between creation and the last logged line.
    pub fn elapsed(&self) -> Duration {
        self.end.saturating_duration_since(self.start)
    }
}

/// Line prefix for entries of a context in `mode`.
pub fn frame_marker(mode: ContextMode, color: &str) -> String {
    match mode {
        ContextMode::Full => substitute_style_tokens(&format!("[ansi:{color}]║[ansi:reset] ")),
        ContextMode::StartEnd | ContextMode::Off => String::new(),
    }
}

fn display_title(title: Option<&str>, id: &ContextId, label: &str) -> String {
    match title {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => format!("{label}: {id}"),
    }
}

/// Opening line synthesized when a context is created.
pub fn header(id: &ContextId, title: Option<&str>, color: &str, mode: ContextMode) -> Option<String> {
    let title = display_title(title, id, "contextId");
    match mode {
        ContextMode::Full => Some(substitute_style_tokens(&format!(
            "[ansi:{color}]╔═══════════════< Context start: {title}[ansi:reset]\n"
        ))),
        ContextMode::StartEnd => Some(substitute_style_tokens(&format!(
            "[ansi:{color}]<───────────────| Context start: {title}[ansi:reset][ansi:{color}] |───────────────>[ansi:reset]\n"
        ))),
        ContextMode::Off => None,
    }
}

/// Closing line(s) written after a flushed context.
pub fn footer(id: &ContextId, record: &ContextRecord) -> Option<String> {
    let title = display_title(record.title.as_deref(), id, "contextID");
    let color = &record.color;
    #[allow(clippy::cast_possible_truncation)]
    let duration = format_duration(record.elapsed().as_millis() as u64);
    match record.mode {
        ContextMode::Full => Some(substitute_style_tokens(&format!(
            "[ansi:{color}]╚═══════════════> Context end: {title}[ansi:reset] | [ansi:magenta]Duration:[ansi:reset] {duration}\n"
        ))),
        ContextMode::StartEnd => Some(substitute_style_tokens(&format!(
            "[ansi:{color}]┌───────────────│ Context end:{title}[ansi:reset]\n[ansi:{color}]└───────────────> [ansi:magenta]Duration:[ansi:reset] {duration}\n"
        ))),
        ContextMode::Off => None,
    }
}

/// All open contexts, keyed by id.
#[derive(Debug, Default)]
pub struct ContextBuffer {
    records: HashMap<ContextId, ContextRecord>,
}

impl ContextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the record on first use (with its header line), or refresh its
    /// end time.
    pub fn ensure(
        &mut self,
        id: &ContextId,
        title: Option<&str>,
        color: &str,
        mode: ContextMode,
    ) -> &ContextRecord {
        let now = Instant::now();
        self.records
            .entry(id.clone())
            .and_modify(|record| record.end = now)
            .or_insert_with(|| ContextRecord {
                title: title.map(str::to_string),
                color: color.to_string(),
                mode,
                start: now,
                end: now,
                lines: header(id, title, color, mode).into_iter().collect(),
            })
    }

    /// Append a rendered line or block. Returns `false` when `id` is unknown.
    pub fn append(&mut self, id: &ContextId, line: String) -> bool {
        match self.records.get_mut(id) {
            Some(record) => {
                record.lines.push(line);
                true
            }
            None => false,
        }
    }

    /// Frame color of an open context.
    pub fn color_of(&self, id: &ContextId) -> Option<&str> {
        self.records.get(id).map(|record| record.color.as_str())
    }

    /// Remove and return a record.
    pub fn take(&mut self, id: &ContextId) -> Option<ContextRecord> {
        self.records.remove(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Random 32-bit value in base 36; falls back to the wall-clock milliseconds
/// when no randomness source is available.
pub fn generate_context_id() -> String {
    let seed = match getrandom::u32() {
        Ok(value) => u64::from(value),
        Err(_) => {
            #[allow(clippy::cast_sign_loss)]
            let millis = jiff::Timestamp::now().as_millisecond().max(0) as u64;
            millis
        }
    };
    to_base36(seed)
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}
