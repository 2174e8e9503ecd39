//! Deterministic nick color assignment.
//!
//! The same nick always maps to the same presentation color, with no state
//! and no I/O, so every view that renders a nick agrees on its color.

/// Presentation palette. Indexed by the nick hash.
pub const NICK_COLORS: [&str; 15] = [
    "#4a9eff", "#4caf50", "#ff9800", "#f44336", "#9c27b0", "#00bcd4", "#ffeb3b", "#e91e63",
    "#795548", "#607d8b", "#3f51b5", "#009688", "#ff5722", "#673ab7", "#00acc1",
];

/// Hash a nick to a palette color. Empty nicks get the first color.
///
/// Uses the classic `hash * 31 + code` rolling hash over UTF-16 code units
/// with wrapping arithmetic, so the mapping is stable across platforms and
/// sessions.
pub fn nick_color(nick: &str) -> &'static str {
    if nick.is_empty() {
        return NICK_COLORS[0];
    }
    let mut hash: i32 = 0;
    for code in nick.encode_utf16() {
        hash = (i32::from(code)).wrapping_add((hash << 5).wrapping_sub(hash));
    }
    NICK_COLORS[hash.unsigned_abs() as usize % NICK_COLORS.len()]
}
