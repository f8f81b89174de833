// SPDX-License-Identifier: AGPL-3.0-or-later
//! Content sniffing
//!
//! Guesses whether a buffer holds HTML or Markdown by looking for
//! well-known HTML tags outside fenced code.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::ConversionMode;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)<(?:!doctype\s+html|/?(?:html|head|body|main|div|section|article|header|footer|nav|p|span|h[1-6]|ul|ol|li|a|img|br|hr|table|thead|tbody|tr|td|th|pre|code|blockquote|strong|em|b|i|del|s)\b[^<>]*)>",
    )
    .unwrap()
});

/// Guess the mode of `content`; anything without recognisable HTML tags is
/// Markdown
pub fn detect_mode(content: &str) -> ConversionMode {
    let mut in_fence = false;
    for line in content.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence && HTML_TAG.is_match(line) {
            return ConversionMode::Html;
        }
    }
    ConversionMode::Markdown
}
