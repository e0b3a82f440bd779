//! Static asset tables: ANSI style names and emoji glyph names.
//!
//! Both tables are closed, ordered slices. Lookups are linear; the tables are
//! small and lookups happen once per token.

/// Reset all active SGR attributes.
pub const RESET: &str = "\x1b[0m";

/// Style and color names usable in `[ansi:NAME]` tokens.
pub const ANSI_CODES: &[(&str, &str)] = &[
    // Styles
    ("reset", RESET),
    ("bold", "\x1b[1m"),
    ("dim", "\x1b[2m"),
    ("italic", "\x1b[3m"),
    ("underline", "\x1b[4m"),
    ("inverse", "\x1b[7m"),
    ("hidden", "\x1b[8m"),
    ("strikethrough", "\x1b[9m"),
    // Foreground colors
    ("black", "\x1b[30m"),
    ("red", "\x1b[31m"),
    ("green", "\x1b[32m"),
    ("yellow", "\x1b[33m"),
    ("blue", "\x1b[34m"),
    ("magenta", "\x1b[35m"),
    ("cyan", "\x1b[36m"),
    ("white", "\x1b[37m"),
    ("gray", "\x1b[90m"),
    ("grey", "\x1b[90m"),
    ("orange", "\x1b[38;5;208m"),
    ("brightRed", "\x1b[91m"),
    ("brightGreen", "\x1b[92m"),
    ("brightYellow", "\x1b[93m"),
    ("brightBlue", "\x1b[94m"),
    ("brightMagenta", "\x1b[95m"),
    ("brightCyan", "\x1b[96m"),
    ("brightWhite", "\x1b[97m"),
    // Background colors
    ("bgBlack", "\x1b[40m"),
    ("bgRed", "\x1b[41m"),
    ("bgGreen", "\x1b[42m"),
    ("bgYellow", "\x1b[43m"),
    ("bgBlue", "\x1b[44m"),
    ("bgMagenta", "\x1b[45m"),
    ("bgCyan", "\x1b[46m"),
    ("bgWhite", "\x1b[47m"),
    ("bgGray", "\x1b[100m"),
];

/// Names that are styles rather than colors; not valid as a context color.
const STYLE_ONLY: &[&str] = &[
    "reset",
    "bold",
    "dim",
    "italic",
    "underline",
    "inverse",
    "hidden",
    "strikethrough",
];

/// Glyphs usable in `[emoji:NAME]` tokens and as `emoji` badges.
///
/// Narrow glyphs carry a trailing space so every badge occupies two columns.
pub const EMOJIS: &[(&str, &str)] = &[
    // Common
    ("okay", "✅"),
    ("success", "✅"),
    ("info", "\u{2139}\u{fe0f} "),
    ("warn", "\u{26a0}\u{fe0f} "),
    ("warning", "\u{26a0}\u{fe0f} "),
    ("error", "❌"),
    ("create", "✨"),
    ("add", "➕"),
    ("remove", "➖"),
    // Specials
    ("connect", "🛜 "),
    ("timer", "\u{23f1}\u{fe0f} "),
    ("metrics", "\u{23f1}\u{fe0f} "),
    ("explosion", "💥"),
    ("star", "\u{2b50}\u{fe0f}"),
    ("rocket", "🚀"),
    ("init", "🔸"),
    ("finished", "🏁"),
    ("upload", "🔺"),
    ("download", "🔻"),
    ("fingerprint", "🫆 "),
    ("secure", "🔐"),
    ("debug", "🐞"),
    ("smiley", "🙂"),
    // Hearts
    ("heart", "\u{2764}\u{fe0f} "),
    ("heartBroken", "💔"),
    ("heartMagenta", "🩷 "),
    ("heartRed", "\u{2764}\u{fe0f} "),
    ("heartOrange", "🧡"),
    ("heartYellow", "💛"),
    ("heartGreen", "💚"),
    ("heartCyan", "🩵 "),
    ("heartBlue", "💙"),
    ("heartPurple", "💜"),
    ("heartBlack", "🖤"),
    ("heartGray", "🩶 "),
    ("heartWhite", "🤍"),
    ("heartBrown", "🤎"),
    // Circles
    ("circleRed", "🔴"),
    ("circleOrange", "🟠"),
    ("circleYellow", "🟡"),
    ("circleGreen", "🟢"),
    ("circleBlue", "🔵"),
    ("circlePurple", "🟣"),
    ("circleBlack", "\u{26ab}\u{fe0f}"),
    ("circleWhite", "\u{26aa}\u{fe0f}"),
    ("circleBrown", "🟤"),
    // Squares
    ("squareRed", "🟥"),
    ("squareOrange", "🟧"),
    ("squareYellow", "🟨"),
    ("squareGreen", "🟩"),
    ("squareBlue", "🟦"),
    ("squarePurple", "🟪"),
    ("squareBlack", "\u{2b1b}\u{fe0f}"),
    ("squareWhite", "\u{2b1c}\u{fe0f}"),
    ("squareBrown", "🟫"),
];

/// Look up the control code for an ANSI style name.
pub fn ansi_code(name: &str) -> Option<&'static str> {
    ANSI_CODES
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, code)| *code)
}

/// Look up the glyph for an emoji name.
pub fn emoji(name: &str) -> Option<&'static str> {
    EMOJIS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, glyph)| *glyph)
}

/// Whether `name` is a known color (foreground or background), as opposed to
/// a pure style such as `bold`.
pub fn is_color(name: &str) -> bool {
    ansi_code(name).is_some() && !STYLE_ONLY.contains(&name)
}
