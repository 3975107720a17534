//! Centralized pack naming conventions.
//!
//! This module is the single source of truth for turning a
//! user-supplied region name into a filesystem- and archive-safe pack
//! name. All other modules use [`sanitize_pack_name`] rather than
//! constructing names directly.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Stem used when a name sanitizes to nothing.
pub const FALLBACK_PACK_NAME: &str = "export";

/// Sanitizes a region name into an archive stem.
///
/// The name is decomposed (NFD) and stripped of combining diacritical
/// marks, any run of non-alphanumeric characters is replaced with a
/// single underscore, and leading/trailing underscores are trimmed.
/// A name with nothing left falls back to `"export"`.
///
/// # Examples
///
/// ```
/// use tilepack::archive::sanitize_pack_name;
///
/// assert_eq!(sanitize_pack_name("São Paulo / Test!"), "Sao_Paulo_Test");
/// assert_eq!(sanitize_pack_name("Algarve"), "Algarve");
/// assert_eq!(sanitize_pack_name("!!!"), "export");
/// ```
pub fn sanitize_pack_name(name: &str) -> String {
    let stripped: String = name.nfd().filter(|c| !is_combining_mark(*c)).collect();

    let mut out = String::with_capacity(stripped.len());
    let mut in_separator_run = false;
    for c in stripped.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            in_separator_run = false;
        } else if !in_separator_run {
            out.push('_');
            in_separator_run = true;
        }
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        FALLBACK_PACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
