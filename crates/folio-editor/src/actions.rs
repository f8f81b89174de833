// SPDX-License-Identifier: AGPL-3.0-or-later
//! Toolbar formatting actions
//!
//! Each action rewrites the selected text with Markdown or HTML syntax,
//! depending on the buffer's mode, and reports the selection to show
//! afterwards.

use folio_core::ConversionMode;
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};

/// Byte range into the buffer, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check the range against `text`: in bounds and on char boundaries
    pub fn validate(&self, text: &str) -> Result<()> {
        let valid = self.start <= self.end
            && self.end <= text.len()
            && text.is_char_boundary(self.start)
            && text.is_char_boundary(self.end);
        if valid {
            Ok(())
        } else {
            Err(EditorError::InvalidSelection {
                start: self.start,
                end: self.end,
                len: text.len(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "level", rename_all = "snake_case")]
pub enum FormatAction {
    Bold,
    Italic,
    Strikethrough,
    InlineCode,
    Link,
    Image,
    /// Level is clamped to 1-6
    Heading(u8),
    BulletList,
    OrderedList,
    Quote,
    CodeBlock,
    HorizontalRule,
}

/// Outcome of an action: the new buffer and selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub content: String,
    pub selection: Selection,
}

impl FormatAction {
    pub fn apply(self, text: &str, mode: ConversionMode, selection: Selection) -> Result<Edit> {
        selection.validate(text)?;
        let html = mode == ConversionMode::Html;

        let edit = match self {
            FormatAction::Bold if html => wrap(text, selection, "<strong>", "</strong>", "bold text"),
            FormatAction::Bold => wrap(text, selection, "**", "**", "bold text"),
            FormatAction::Italic if html => wrap(text, selection, "<em>", "</em>", "italic text"),
            FormatAction::Italic => wrap(text, selection, "*", "*", "italic text"),
            FormatAction::Strikethrough if html => wrap(text, selection, "<del>", "</del>", "text"),
            FormatAction::Strikethrough => wrap(text, selection, "~~", "~~", "text"),
            FormatAction::InlineCode if html => wrap(text, selection, "<code>", "</code>", "code"),
            FormatAction::InlineCode => wrap(text, selection, "`", "`", "code"),
            FormatAction::Link if html => {
                wrap(text, selection, "<a href=\"https://\">", "</a>", "link text")
            }
            FormatAction::Link => wrap(text, selection, "[", "](https://)", "link text"),
            FormatAction::Image => {
                let alt = selected_or(text, selection, "alt text");
                let replacement = if html {
                    format!("<img src=\"https://\" alt=\"{}\">", alt.replace('"', "&quot;"))
                } else {
                    format!("![{alt}](https://)")
                };
                let len = replacement.len();
                replace(text, selection, &replacement, 0..len)
            }
            FormatAction::Heading(level) => {
                let level = level.clamp(1, 6);
                if html {
                    wrap_lines(text, selection, |line, _| {
                        format!("<h{level}>{}</h{level}>", line.trim())
                    })
                } else {
                    let marker = "#".repeat(level as usize);
                    wrap_lines(text, selection, |line, _| {
                        format!("{marker} {}", strip_heading(line))
                    })
                }
            }
            FormatAction::BulletList if html => wrap_block(text, selection, "<ul>", "</ul>", |line, _| {
                format!("<li>{}</li>", line.trim())
            }),
            FormatAction::BulletList => wrap_lines(text, selection, |line, _| format!("- {line}")),
            FormatAction::OrderedList if html => wrap_block(text, selection, "<ol>", "</ol>", |line, _| {
                format!("<li>{}</li>", line.trim())
            }),
            FormatAction::OrderedList => {
                wrap_lines(text, selection, |line, i| format!("{}. {line}", i + 1))
            }
            FormatAction::Quote if html => wrap_block(text, selection, "<blockquote>", "</blockquote>", |line, _| {
                line.to_string()
            }),
            FormatAction::Quote => wrap_lines(text, selection, |line, _| format!("> {line}")),
            FormatAction::CodeBlock if html => {
                let code = escape_html(selected_or(text, selection, ""));
                let open = "<pre><code>";
                let replacement = format!("{open}{code}</code></pre>");
                replace(text, selection, &replacement, open.len()..open.len() + code.len())
            }
            FormatAction::CodeBlock => {
                let code = selected_or(text, selection, "");
                let replacement = format!("```\n{code}\n```");
                replace(text, selection, &replacement, 4..4 + code.len())
            }
            FormatAction::HorizontalRule => {
                let rule = if html { "\n<hr>\n" } else { "\n\n---\n\n" };
                let at = Selection::caret(selection.end);
                replace(text, at, rule, rule.len()..rule.len())
            }
        };
        Ok(edit)
    }
}

fn selected_or<'t>(text: &'t str, selection: Selection, placeholder: &'t str) -> &'t str {
    if selection.is_empty() {
        placeholder
    } else {
        &text[selection.start..selection.end]
    }
}

/// Replace the selection; `inner` is the range of `replacement` to select
fn replace(text: &str, selection: Selection, replacement: &str, inner: std::ops::Range<usize>) -> Edit {
    let mut content = String::with_capacity(text.len() + replacement.len());
    content.push_str(&text[..selection.start]);
    content.push_str(replacement);
    content.push_str(&text[selection.end..]);
    Edit {
        content,
        selection: Selection::new(selection.start + inner.start, selection.start + inner.end),
    }
}

fn wrap(text: &str, selection: Selection, open: &str, close: &str, placeholder: &str) -> Edit {
    let inner = selected_or(text, selection, placeholder);
    let replacement = format!("{open}{inner}{close}");
    replace(text, selection, &replacement, open.len()..open.len() + inner.len())
}

/// Grow the selection to whole lines
fn line_span(text: &str, selection: Selection) -> Selection {
    let start = text[..selection.start].rfind('\n').map_or(0, |i| i + 1);
    let end = text[selection.end..]
        .find('\n')
        .map_or(text.len(), |i| selection.end + i);
    Selection::new(start, end)
}

/// Rewrite every selected line; the whole rewritten span stays selected
fn wrap_lines(text: &str, selection: Selection, f: impl Fn(&str, usize) -> String) -> Edit {
    let span = line_span(text, selection);
    let replacement = text[span.start..span.end]
        .split('\n')
        .enumerate()
        .map(|(i, line)| f(line, i))
        .collect::<Vec<_>>()
        .join("\n");
    let len = replacement.len();
    replace(text, span, &replacement, 0..len)
}

fn wrap_block(
    text: &str,
    selection: Selection,
    open: &str,
    close: &str,
    f: impl Fn(&str, usize) -> String,
) -> Edit {
    let span = line_span(text, selection);
    let lines: Vec<String> = text[span.start..span.end]
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| f(line, i))
        .collect();
    let replacement = format!("{open}\n{}\n{close}", lines.join("\n"));
    let len = replacement.len();
    replace(text, span, &replacement, 0..len)
}

fn strip_heading(line: &str) -> &str {
    let trimmed = line.trim_start();
    let hashes = trimmed.bytes().take_while(|b| *b == b'#').count();
    if (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ') {
        trimmed[hashes..].trim_start()
    } else {
        line
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MD: ConversionMode = ConversionMode::Markdown;
    const HTML: ConversionMode = ConversionMode::Html;

    fn selected(edit: &Edit) -> &str {
        &edit.content[edit.selection.start..edit.selection.end]
    }

    #[test]
    fn test_bold_wraps_selection() {
        let edit = FormatAction::Bold.apply("make this loud", MD, Selection::new(10, 14)).unwrap();
        assert_eq!(edit.content, "make this **loud**");
        assert_eq!(selected(&edit), "loud");

        let edit = FormatAction::Bold.apply("make this loud", HTML, Selection::new(10, 14)).unwrap();
        assert_eq!(edit.content, "make this <strong>loud</strong>");
        assert_eq!(selected(&edit), "loud");
    }

    #[test]
    fn test_empty_selection_inserts_placeholder() {
        let edit = FormatAction::Link.apply("see ", MD, Selection::caret(4)).unwrap();
        assert_eq!(edit.content, "see [link text](https://)");
        assert_eq!(selected(&edit), "link text");
    }

    #[test]
    fn test_heading_replaces_existing_marker() {
        let edit = FormatAction::Heading(3).apply("intro\n# Old\nbody", MD, Selection::caret(8)).unwrap();
        assert_eq!(edit.content, "intro\n### Old\nbody");
        assert_eq!(selected(&edit), "### Old");

        let edit = FormatAction::Heading(9).apply("Title", HTML, Selection::caret(0)).unwrap();
        assert_eq!(edit.content, "<h6>Title</h6>");
    }

    #[test]
    fn test_lists_cover_whole_lines() {
        let text = "one\ntwo\nthree";
        let edit = FormatAction::OrderedList.apply(text, MD, Selection::new(1, 5)).unwrap();
        assert_eq!(edit.content, "1. one\n2. two\nthree");

        let edit = FormatAction::BulletList.apply(text, HTML, Selection::new(0, text.len())).unwrap();
        assert_eq!(edit.content, "<ul>\n<li>one</li>\n<li>two</li>\n<li>three</li>\n</ul>");
    }

    #[test]
    fn test_code_block() {
        let edit = FormatAction::CodeBlock.apply("a < b", MD, Selection::new(0, 5)).unwrap();
        assert_eq!(edit.content, "```\na < b\n```");
        assert_eq!(selected(&edit), "a < b");

        let edit = FormatAction::CodeBlock.apply("a < b", HTML, Selection::new(0, 5)).unwrap();
        assert_eq!(edit.content, "<pre><code>a &lt; b</code></pre>");
        assert_eq!(selected(&edit), "a &lt; b");
    }

    #[test]
    fn test_horizontal_rule_inserts_after_selection() {
        let edit = FormatAction::HorizontalRule.apply("above", MD, Selection::new(0, 5)).unwrap();
        assert_eq!(edit.content, "above\n\n---\n\n");
        assert_eq!(edit.selection, Selection::caret(edit.content.len()));
    }

    #[test]
    fn test_invalid_selection() {
        let err = FormatAction::Bold.apply("abc", MD, Selection::new(2, 9)).unwrap_err();
        assert!(matches!(err, EditorError::InvalidSelection { start: 2, end: 9, len: 3 }));

        // Inside a multi-byte char
        assert!(FormatAction::Italic.apply("é", MD, Selection::new(1, 2)).is_err());
        assert!(FormatAction::Italic.apply("abc", MD, Selection::new(2, 1)).is_err());
    }

    #[test]
    fn test_action_serde() {
        let json = serde_json::to_string(&FormatAction::Heading(2)).unwrap();
        assert_eq!(json, r#"{"action":"heading","level":2}"#);
        let action: FormatAction = serde_json::from_str(r#"{"action":"bold"}"#).unwrap();
        assert_eq!(action, FormatAction::Bold);
    }
}
