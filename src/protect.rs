//! Shields engine escape sequences from the translation step.
//!
//! RPG Maker display text embeds control codes (`\C[2]`, `\V[10]`, `\{`,
//! `<WordWrap>`) that the scripting engine interprets at render time. An LLM
//! reliably mangles them, so [`protect`] swaps every code for an opaque
//! marker before translation and [`restore`] swaps them back afterwards.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Insertion-ordered marker → original code mapping produced by [`protect`].
pub type CodeMap = IndexMap<String, String>;

// Token classes in priority order: parameterized escapes (\C[2], \px[10]),
// single-character escapes (\{, \}, \$, \G, ...), bracketed tags (<...>).
static CONTROL_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\[A-Za-z]+\[[^\]]*\]|\\[A-Za-z{}$.|!><^\\]|<[^<>\r\n]+>")
        .expect("valid control code regex")
});

// Guillemets rarely occur in game text and survive LLM output verbatim.
static MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("«\\d+»").expect("valid marker regex"));

/// Replaces every recognized control code with a unique opaque marker.
///
/// Returns the cleaned text plus the marker → code map needed by
/// [`restore`]. Text without codes comes back unchanged with an empty map.
#[must_use]
pub fn protect(text: &str) -> (String, CodeMap) {
    let mut codes = CodeMap::new();

    let clean = CONTROL_CODE_RE.replace_all(text, |captures: &regex::Captures| {
        let marker = format!("«{}»", codes.len());
        codes.insert(marker.clone(), captures[0].to_string());
        marker
    });

    (clean.into_owned(), codes)
}

/// Substitutes markers back to their original codes.
///
/// Every occurrence of a known marker is replaced, so codes survive even
/// when the translation step duplicated or reordered the text around them.
/// Markers never emitted by [`protect`] (or bracket tags the LLM invented)
/// are left untouched. Identity on marker-free text.
#[must_use]
pub fn restore(text: &str, codes: &CodeMap) -> String {
    if codes.is_empty() || !text.contains('«') {
        return text.to_string();
    }

    let mut result = text.to_string();

    for (marker, code) in codes {
        result = result.replace(marker.as_str(), code);
    }

    result
}

/// Rendered character count of text, ignoring control codes and markers.
///
/// Codes occupy no horizontal space in the message window, so the reflow
/// engine measures line width with this instead of `chars().count()`.
#[must_use]
pub fn visual_len(text: &str) -> usize {
    let without_markers = MARKER_RE.replace_all(text, "");

    CONTROL_CODE_RE
        .replace_all(&without_markers, "")
        .chars()
        .count()
}
