// SPDX-License-Identifier: AGPL-3.0-or-later
//! Markdown renderer
//!
//! Text is escaped so that prose coming from HTML is not re-read as Markdown
//! syntax on the next parse.

use std::fmt::Write;

use crate::ast::{Block, Inline, ListKind, TableRow};
use crate::traits::{ConversionError, RenderConfig, Result};

pub fn render_blocks(output: &mut String, blocks: &[Block], config: &RenderConfig) -> Result<()> {
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            output.push_str("\n\n");
        }
        render_block(output, block, config)?;
    }
    Ok(())
}

fn render_block(output: &mut String, block: &Block, config: &RenderConfig) -> Result<()> {
    match block {
        Block::Paragraph { content } => {
            let mut line = String::new();
            render_inlines(&mut line, content, config)?;
            output.push_str(&escape_line_start(&line));
        }

        Block::Heading { level, content } => {
            if !(1..=6).contains(level) {
                return Err(ConversionError::Internal {
                    stage: "markdown render",
                    message: format!("heading level {level} out of range"),
                });
            }
            let mut text = String::new();
            render_inlines(&mut text, content, config)?;
            output.push_str(&"#".repeat(*level as usize));
            output.push(' ');
            output.push_str(&single_line(&text));
        }

        Block::CodeBlock { language, content } => {
            let fence = code_fence(content);
            output.push_str(&fence);
            if let Some(lang) = language {
                output.push_str(lang);
            }
            output.push('\n');
            if !content.is_empty() {
                output.push_str(content);
                output.push('\n');
            }
            output.push_str(&fence);
        }

        Block::BlockQuote { content } => {
            let mut inner = String::new();
            render_blocks(&mut inner, content, config)?;
            for (i, line) in inner.lines().enumerate() {
                if i > 0 {
                    output.push('\n');
                }
                if line.is_empty() {
                    output.push('>');
                } else {
                    output.push_str("> ");
                    output.push_str(line);
                }
            }
            if inner.is_empty() {
                output.push('>');
            }
        }

        Block::List { kind, items, start } => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    output.push('\n');
                }
                match kind {
                    ListKind::Bullet => {
                        output.push(config.bullet_marker);
                        output.push(' ');
                    }
                    ListKind::Ordered => {
                        let number = start.unwrap_or(1).saturating_add(i as u32);
                        write!(output, "{number}. ")?;
                    }
                }
                let mut line = String::new();
                render_inlines(&mut line, &item.content, config)?;
                output.push_str(&single_line(&line));
            }
        }

        Block::Table { header, body } => {
            render_row(output, header, config)?;
            output.push('\n');
            output.push('|');
            for _ in &header.cells {
                output.push_str(" --- |");
            }
            for row in body {
                output.push('\n');
                render_row(output, row, config)?;
            }
        }

        Block::ThematicBreak => output.push_str(&config.thematic_break),
    }
    Ok(())
}

fn render_row(output: &mut String, row: &TableRow, config: &RenderConfig) -> Result<()> {
    output.push('|');
    for cell in &row.cells {
        let mut text = String::new();
        render_inlines(&mut text, &cell.content, config)?;
        output.push(' ');
        output.push_str(&single_line(&text).replace('|', "\\|"));
        output.push_str(" |");
    }
    Ok(())
}

fn render_inlines(output: &mut String, content: &[Inline], config: &RenderConfig) -> Result<()> {
    for inline in content {
        render_inline(output, inline, config)?;
    }
    Ok(())
}

fn render_inline(output: &mut String, inline: &Inline, config: &RenderConfig) -> Result<()> {
    let marker = config.emphasis_marker;
    match inline {
        Inline::Text { content } => output.push_str(&escape_text(content)),

        Inline::Emphasis { content } => {
            output.push(marker);
            render_inlines(output, content, config)?;
            output.push(marker);
        }

        Inline::Strong { content } => {
            output.push(marker);
            output.push(marker);
            render_inlines(output, content, config)?;
            output.push(marker);
            output.push(marker);
        }

        Inline::Strikethrough { content } => {
            output.push_str("~~");
            render_inlines(output, content, config)?;
            output.push_str("~~");
        }

        Inline::Code { content } => {
            let ticks = "`".repeat(longest_run(content, '`') + 1);
            let pad = content.starts_with('`') || content.ends_with('`');
            output.push_str(&ticks);
            if pad {
                output.push(' ');
            }
            output.push_str(content);
            if pad {
                output.push(' ');
            }
            output.push_str(&ticks);
        }

        Inline::Link { url, title, content } => {
            output.push('[');
            render_inlines(output, content, config)?;
            write!(output, "]({}", link_destination(url))?;
            if let Some(t) = title {
                write!(output, " \"{}\"", t.replace('"', "'"))?;
            }
            output.push(')');
        }

        Inline::Image { url, alt, title } => {
            write!(output, "![{}]({}", escape_text(alt), link_destination(url))?;
            if let Some(t) = title {
                write!(output, " \"{}\"", t.replace('"', "'"))?;
            }
            output.push(')');
        }

        Inline::LineBreak => output.push_str("  \n"),

        Inline::SoftBreak => {
            if config.hard_breaks {
                output.push_str("  \n");
            } else {
                output.push('\n');
            }
        }
    }
    Ok(())
}

/// Line-oriented blocks cannot hold breaks
fn single_line(text: &str) -> String {
    text.split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Backslash-escape inline punctuation the parser would treat as syntax
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        let prev = i.checked_sub(1).and_then(|p| chars.get(p)).copied();
        let next = chars.get(i + 1).copied();
        let escape = match c {
            '\\' => next.is_some_and(|n| n.is_ascii_punctuation()),
            '*' | '`' | '[' | ']' => true,
            '_' => {
                !(prev.is_some_and(char::is_alphanumeric) && next.is_some_and(char::is_alphanumeric))
            }
            '~' => next == Some('~') || prev == Some('~'),
            _ => false,
        };
        if escape {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Keep the first line of a paragraph from being classified as a block marker
fn escape_line_start(line: &str) -> String {
    line.split('\n')
        .map(|l| {
            let trimmed = l.trim_start();
            if let Some(digits) = ordered_marker_digits(trimmed) {
                return format!("{}\\{}", &trimmed[..digits], &trimmed[digits..]);
            }
            let needs_escape = trimmed.starts_with(['#', '>', '|'])
                || matches!(trimmed.as_bytes(), [b'-' | b'+', b' ' | b'\t', ..] | [b'-' | b'+'])
                || (trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-'));
            if needs_escape {
                format!("\\{trimmed}")
            } else {
                l.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Digit count of a leading `12.` list marker
fn ordered_marker_digits(line: &str) -> Option<usize> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    let is_marker = digits > 0
        && line[digits..].starts_with('.')
        && matches!(line.as_bytes().get(digits + 1), None | Some(b' ' | b'\t'));
    is_marker.then_some(digits)
}

fn link_destination(url: &str) -> String {
    if url.contains([' ', '(', ')']) && !url.contains(['<', '>']) {
        let balanced = url.matches('(').count() == url.matches(')').count();
        if url.contains(' ') || !balanced {
            return format!("<{url}>");
        }
    }
    url.to_string()
}

fn longest_run(text: &str, c: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for x in text.chars() {
        if x == c {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Three backticks, or more when the content itself contains a fence
fn code_fence(content: &str) -> String {
    let inner = content
        .lines()
        .filter(|l| l.trim_start().starts_with("```"))
        .map(|l| longest_run(l, '`'))
        .max()
        .unwrap_or(0);
    "`".repeat(inner.max(2) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ListItem, TableCell};
    use pretty_assertions::assert_eq;

    fn render(blocks: &[Block]) -> String {
        let mut out = String::new();
        render_blocks(&mut out, blocks, &RenderConfig::default()).unwrap();
        out
    }

    fn para(s: &str) -> Block {
        Block::Paragraph {
            content: vec![Inline::text(s)],
        }
    }

    #[test]
    fn test_blocks_joined_by_blank_line() {
        assert_eq!(
            render(&[
                Block::Heading { level: 2, content: vec![Inline::text("Title")] },
                para("body"),
                Block::ThematicBreak,
            ]),
            "## Title\n\nbody\n\n---"
        );
    }

    #[test]
    fn test_escapes_syntax_in_text() {
        assert_eq!(render(&[para("2*3 = [six]")]), r"2\*3 = \[six\]");
        assert_eq!(render(&[para("snake_case _x_")]), r"snake_case \_x\_");
        assert_eq!(render(&[para("# not heading")]), r"\# not heading");
        assert_eq!(render(&[para("1. not a list")]), r"1\. not a list");
        assert_eq!(render(&[para("- not a list")]), r"\- not a list");
    }

    #[test]
    fn test_lists() {
        let items = vec![
            ListItem { content: vec![Inline::text("a")] },
            ListItem { content: vec![Inline::text("b")] },
        ];
        assert_eq!(
            render(&[Block::List { kind: ListKind::Ordered, items: items.clone(), start: Some(4) }]),
            "4. a\n5. b"
        );
        assert_eq!(
            render(&[Block::List { kind: ListKind::Bullet, items, start: None }]),
            "- a\n- b"
        );
    }

    #[test]
    fn test_code_block_fence_grows() {
        assert_eq!(
            render(&[Block::CodeBlock {
                language: Some("md".to_string()),
                content: "```\ninner\n```".to_string(),
            }]),
            "````md\n```\ninner\n```\n````"
        );
    }

    #[test]
    fn test_inline_code_with_backticks() {
        assert_eq!(
            render(&[Block::Paragraph {
                content: vec![Inline::Code { content: "a`b".to_string() }],
            }]),
            "``a`b``"
        );
    }

    #[test]
    fn test_table() {
        let cell = |s: &str| TableCell { content: vec![Inline::text(s)] };
        assert_eq!(
            render(&[Block::Table {
                header: TableRow { cells: vec![cell("a"), cell("b")] },
                body: vec![TableRow { cells: vec![cell("1"), cell("2")] }],
            }]),
            "| a | b |\n| --- | --- |\n| 1 | 2 |"
        );
    }

    #[test]
    fn test_blockquote_prefixes_every_line() {
        assert_eq!(
            render(&[Block::BlockQuote { content: vec![para("one"), para("two")] }]),
            "> one\n>\n> two"
        );
    }

    #[test]
    fn test_bad_heading_level_is_internal_error() {
        let mut out = String::new();
        let err = render_blocks(
            &mut out,
            &[Block::Heading { level: 9, content: vec![] }],
            &RenderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConversionError::Internal { .. }));
    }
}
