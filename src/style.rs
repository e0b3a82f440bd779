//! Text styling utilities: token substitution, ANSI stripping, and
//! ANSI-aware padding.
//!
//! Messages may embed `[ansi:NAME]` and `[emoji:NAME]` tokens. Unknown names
//! fail open: the literal token is kept so the mistake stays visible in the
//! output instead of silently disappearing.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::assets::{self, RESET};

static ANSI_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[ansi:(\w+)\]").expect("valid ansi token regex"));

static EMOJI_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[emoji:(\w+)\]").expect("valid emoji token regex"));

/// Control sequences introduced by ESC or the single-byte CSI.
static CONTROL_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x1b\x{9b}][\[()#;?]*(?:[0-9]{1,4}(?:;[0-9]{0,4})*)?[0-9A-ORZcf-nqry=><]")
        .expect("valid control sequence regex")
});

/// SGR (select graphic rendition) codes only: `ESC[…m`.
static SGR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid SGR regex"));

/// Replace every `[ansi:NAME]` token with its control code.
pub fn substitute_style_tokens(text: &str) -> String {
    if !text.contains("[ansi:") {
        return text.to_string();
    }
    ANSI_TOKEN
        .replace_all(text, |caps: &Captures<'_>| match assets::ansi_code(&caps[1]) {
            Some(code) => code.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Replace every `[emoji:NAME]` token with its glyph.
pub fn substitute_glyph_tokens(text: &str) -> String {
    if !text.contains("[emoji:") {
        return text.to_string();
    }
    EMOJI_TOKEN
        .replace_all(text, |caps: &Captures<'_>| match assets::emoji(&caps[1]) {
            Some(glyph) => glyph.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Remove all recognized terminal control sequences.
pub fn strip_style_codes(text: &str) -> String {
    CONTROL_SEQUENCE.replace_all(text, "").into_owned()
}

/// Number of visible characters, ignoring SGR codes.
pub fn visible_width(text: &str) -> usize {
    SGR.replace_all(text, "").chars().count()
}

/// Pad `text` to `width` visible characters.
///
/// In `center` mode the padding is split (`floor` on the left, remainder on
/// the right) and the styles still active at the end of `text` are reapplied
/// around the left padding, followed by a reset, so the padding carries the
/// same background as the label.
pub fn pad_ansi_safe(text: &str, width: usize, pad: char, center: bool) -> String {
    let visible = visible_width(text);
    if width <= visible {
        return text.to_string();
    }
    let total = width - visible;

    if !center {
        let mut out = String::with_capacity(text.len() + total);
        out.push_str(text);
        out.extend(std::iter::repeat_n(pad, total));
        return out;
    }

    let mut active: Vec<&str> = Vec::new();
    for code in SGR.find_iter(text) {
        if code.as_str() == RESET {
            active.clear();
        } else {
            active.push(code.as_str());
        }
    }

    let left = total / 2;
    let right = total - left;

    let mut out = String::with_capacity(text.len() + total + 16);
    for code in &active {
        out.push_str(code);
    }
    out.extend(std::iter::repeat_n(pad, left));
    if !active.is_empty() {
        out.push_str(RESET);
    }
    out.push_str(text);
    out.extend(std::iter::repeat_n(pad, right));
    out
}
