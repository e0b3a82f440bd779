//! Call-site resolution from a captured stack.
//!
//! The stack is captured through the [`StackCapture`] capability as a list
//! of textual frames, each in one of two grammars:
//!
//! ```text
//! at FUNCTION (FILE:LINE:COLUMN)
//! at FILE:LINE:COLUMN
//! ```
//!
//! Frame 0 is the capture routine itself, frame 1 is [`resolve_caller`],
//! frame 2 the logging entry point that called it, frame 3 that entry
//! point's caller. A wrapper around the entry point shifts the real caller
//! one frame deeper per layer.
//!
//! [`BacktraceCapture`] relies on debug symbols; in stripped builds it yields
//! no usable frames and every lookup returns `None`.

use std::backtrace::Backtrace;
use std::sync::LazyLock;

use regex::Regex;

/// Default depth: the caller of the public logging entry point.
pub const DEFAULT_DEPTH: usize = 3;

static WITH_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^at (.+?) \((.+):(\d+):(\d+)\)$").expect("valid frame regex")
});

static WITHOUT_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^at (.+):(\d+):(\d+)$").expect("valid frame regex"));

/// Source location of a call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerLocation {
    pub function: Option<String>,
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl CallerLocation {
    /// Final path component of [`file`](Self::file).
    pub fn file_name(&self) -> &str {
        self.file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file.as_str())
    }
}

/// Captures the current call chain as textual frames, innermost first.
pub trait StackCapture: Send {
    fn capture(&self) -> Vec<String>;
}

/// [`StackCapture`] backed by [`std::backtrace::Backtrace`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceCapture;

impl StackCapture for BacktraceCapture {
    #[inline(never)]
    fn capture(&self) -> Vec<String> {
        let rendered = Backtrace::force_capture().to_string();
        let frames = backtrace_frames(&rendered);

        // Drop the unwinder's own frames so index 0 is this method.
        match frames
            .iter()
            .position(|f| f.contains("BacktraceCapture") && f.contains("::capture"))
        {
            Some(own) => frames[own..].to_vec(),
            None => frames,
        }
    }
}

/// Convert the `Display` rendering of a [`Backtrace`] into frames.
///
/// Each symbol (including inlined ones) becomes one frame. A symbol
/// followed by an `at FILE:LINE:COL` line renders as
/// `at SYMBOL (FILE:LINE:COL)`; a symbol without location renders as
/// `at SYMBOL`, which neither grammar accepts.
pub fn backtrace_frames(rendered: &str) -> Vec<String> {
    let mut frames: Vec<String> = Vec::new();
    let mut symbol: Option<String> = None;

    let mut finish = |symbol: &mut Option<String>, location: Option<&str>| {
        match (symbol.take(), location) {
            (Some(name), Some(loc)) => frames.push(format!("at {name} ({loc})")),
            (Some(name), None) => frames.push(format!("at {name}")),
            (None, Some(loc)) => frames.push(format!("at {loc}")),
            (None, None) => {}
        }
    };

    for raw in rendered.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(location) = line.strip_prefix("at ") {
            finish(&mut symbol, Some(location));
            continue;
        }
        // Pending symbol without a location line.
        finish(&mut symbol, None);

        let name = match line.split_once(": ") {
            Some((index, name)) if index.chars().all(|c| c.is_ascii_digit()) => name,
            _ => line,
        };
        symbol = Some(name.to_string());
    }
    finish(&mut symbol, None);
    frames
}

/// Parse one textual frame.
pub fn parse_frame(frame: &str) -> Option<CallerLocation> {
    let frame = frame.trim();

    if let Some(caps) = WITH_FUNCTION.captures(frame) {
        return Some(CallerLocation {
            function: Some(caps[1].to_string()),
            file: caps[2].to_string(),
            line: caps[3].parse().ok()?,
            column: caps[4].parse().ok()?,
        });
    }

    if let Some(caps) = WITHOUT_FUNCTION.captures(frame) {
        return Some(CallerLocation {
            function: None,
            file: caps[1].to_string(),
            line: caps[2].parse().ok()?,
            column: caps[3].parse().ok()?,
        });
    }

    None
}

/// Resolve the call site `depth` frames up from this function's caller.
#[inline(never)]
pub fn resolve_caller(capture: &dyn StackCapture, depth: usize) -> Option<CallerLocation> {
    let frames = capture.capture();
    frames.get(depth).and_then(|frame| parse_frame(frame))
}
