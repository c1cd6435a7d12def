//! Bookmark naming rules.
//!
//! Word refuses to open documents whose bookmark names break its identifier
//! rules: letters, digits and underscores only, a letter first, at most 40
//! characters. Every name the crate writes goes through
//! [`sanitize_bookmark_name`].

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest bookmark name Word accepts.
pub const MAX_BOOKMARK_NAME_LEN: usize = 40;

/// Prefix inserted when a name does not start with a letter.
pub const BOOKMARK_PREFIX: &str = "BM_";

static RE_ILLEGAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

static RE_VALID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,39}$").unwrap());

/// Turn arbitrary text into a legal bookmark name.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`, a name that does not
/// start with an ASCII letter gets [`BOOKMARK_PREFIX`], and the result is cut
/// to [`MAX_BOOKMARK_NAME_LEN`]. Distinct inputs may map to the same name.
pub fn sanitize_bookmark_name(name: &str) -> String {
    let mut sanitized = RE_ILLEGAL.replace_all(name, "_").into_owned();
    if !sanitized.starts_with(|c: char| c.is_ascii_alphabetic()) {
        sanitized.insert_str(0, BOOKMARK_PREFIX);
    }
    // Only ASCII is left, so byte truncation is char-safe.
    sanitized.truncate(MAX_BOOKMARK_NAME_LEN);
    sanitized
}

/// Whether `name` already satisfies Word's bookmark identifier rules.
pub fn is_valid_bookmark_name(name: &str) -> bool {
    RE_VALID.is_match(name)
}
