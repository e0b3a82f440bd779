//! Segment builders for a rendered log line.
//!
//! A line is assembled from fixed segments in this order:
//!
//! ```text
//! [frame] badge timestamp memory caller message\n
//! ```
//!
//! Every builder here is pure: it takes already-sampled inputs (clock text,
//! memory snapshot, resolved caller) and returns styled text with its
//! trailing separator, or an empty string when the segment is disabled.
//! [`Loggify`](crate::Loggify) does the sampling and routing.

use serde_json::Value;

use crate::assets::{self, RESET};
use crate::caller::CallerLocation;
use crate::level::{BadgeStyle, LogType};
use crate::memory::{MemorySnapshot, mib};
use crate::object;
use crate::style::{pad_ansi_safe, strip_style_codes, substitute_glyph_tokens, substitute_style_tokens};
use crate::timestamp::format_duration_f64;

/// Visible width of a `full` badge.
pub const FULL_BADGE_WIDTH: usize = 11;

/// Left margin of object blocks.
pub const OBJECT_INDENT: &str = "         ";

/// Message used when the payload was passed in the message slot.
pub const FOUND_OBJECT_MESSAGE: &str = "Found object in message => object:";

/// Box-drawing characters removed from messages mirrored to Loki.
const TREE_GLYPHS: [char; 4] = ['╭', '├', '╰', '─'];

/// Badge segment for `log_type` in `style`, including its trailing space.
pub fn badge(style: BadgeStyle, log_type: &LogType) -> String {
    match style {
        BadgeStyle::Off => String::new(),
        BadgeStyle::Emoji => {
            let glyph = assets::emoji(log_type.name()).unwrap_or("  ");
            format!("{glyph} ")
        }
        BadgeStyle::Tiny | BadgeStyle::Mini => {
            let spacer = if style == BadgeStyle::Tiny { " " } else { "   " };
            let tag = match (log_type, log_type.badge()) {
                (_, Some(spec)) => format!("[ansi:{}][ansi:inverse]{spacer}", spec.color),
                (LogType::Custom(custom), None) => format!("{custom}{spacer}"),
                _ => spacer.to_string(),
            };
            format!("{}{RESET} ", substitute_style_tokens(&tag))
        }
        BadgeStyle::Full => {
            let tag = match (log_type, log_type.badge()) {
                (_, Some(spec)) => format!("[ansi:{}][ansi:inverse]{}", spec.color, spec.word),
                (LogType::Custom(custom), None) => custom.clone(),
                _ => String::new(),
            };
            let tag = substitute_style_tokens(&tag);
            format!("{}{RESET} ", pad_ansi_safe(&tag, FULL_BADGE_WIDTH, ' ', true))
        }
    }
}

/// `~CLOCK~` in gray.
pub fn timestamp_segment(clock: &str) -> String {
    substitute_style_tokens(&format!("[ansi:gray]~{clock}~[ansi:reset] "))
}

/// `[USED of TOTAL|RSS]` in MiB.
pub fn memory_segment(snapshot: &MemorySnapshot) -> String {
    substitute_style_tokens(&format!(
        "[ansi:gray][[ansi:reset][ansi:cyan]{}MB[ansi:reset][ansi:gray] of [ansi:reset][ansi:brightBlue]{}MB[ansi:reset][ansi:gray]|[ansi:reset][ansi:white]{}MB[ansi:reset][ansi:gray]][ansi:reset] ",
        mib(snapshot.heap_used),
        mib(snapshot.heap_total),
        mib(snapshot.rss),
    ))
}

/// `FILE:LINE(Func:NAME)`, or a red marker when the caller is unknown.
pub fn caller_segment(location: Option<&CallerLocation>, hide_function: bool) -> String {
    let Some(location) = location else {
        return substitute_style_tokens("[ansi:red]Caller unknown![ansi:reset] ");
    };
    let function = match &location.function {
        Some(name) if !hide_function => format!("[ansi:brightMagenta](Func:{name})[ansi:reset]"),
        _ => String::new(),
    };
    substitute_style_tokens(&format!(
        "[ansi:blue]{}[ansi:reset]:[ansi:yellow]{}[ansi:reset]{function} ",
        location.file_name(),
        location.line
    ))
}

/// `[Duration: D] ` prefix for metrics calls.
pub fn duration_prefix(ms: f64) -> String {
    substitute_style_tokens(&format!(
        "[ansi:gray][[ansi:reset][ansi:magenta]Duration: [ansi:reset]{}[ansi:gray]][ansi:reset] ",
        format_duration_f64(ms)
    ))
}

/// Replace style then glyph tokens in a message.
pub fn message_text(message: &str) -> String {
    substitute_glyph_tokens(&substitute_style_tokens(message))
}

/// Rendered payload plus its size line, each line prefixed with
/// `frame` and [`OBJECT_INDENT`]. Ends with a newline.
pub fn object_block(value: &Value, frame: &str) -> String {
    let prefix = format!("{frame}{OBJECT_INDENT}");
    let rendered = object::render(value);
    let size = object::size_of(value);
    let info = substitute_style_tokens(&format!(
        "[ansi:gray]Object has \"{}\" characters with a total size of {} [ansi:reset]",
        size.chars, size.size
    ));

    let mut out = String::with_capacity(rendered.len() + info.len() + 64);
    for line in rendered.lines() {
        out.push_str(&prefix);
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&prefix);
    out.push_str(&info);
    out.push('\n');
    out
}

/// Plain-text form of a rendered message for the remote sink.
pub fn remote_message(message: &str) -> String {
    strip_style_codes(message)
        .replace(TREE_GLYPHS, "")
        .trim()
        .to_string()
}
