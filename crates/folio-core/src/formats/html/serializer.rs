// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTML renderer

use std::fmt::Write;

use crate::ast::{Block, Inline, ListKind, TableRow};
use crate::traits::{ConversionError, RenderConfig, Result};

/// Render blocks one per line group, separated by single newlines
pub fn render_blocks(output: &mut String, blocks: &[Block], config: &RenderConfig) -> Result<()> {
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        render_block(output, block, config)?;
    }
    Ok(())
}

fn render_block(output: &mut String, block: &Block, config: &RenderConfig) -> Result<()> {
    match block {
        Block::Paragraph { content } => {
            output.push_str("<p>");
            render_inlines(output, content, config)?;
            output.push_str("</p>");
        }

        Block::Heading { level, content } => {
            if !(1..=6).contains(level) {
                return Err(ConversionError::Internal {
                    stage: "html render",
                    message: format!("heading level {level} out of range"),
                });
            }
            write!(output, "<h{level}>")?;
            render_inlines(output, content, config)?;
            write!(output, "</h{level}>")?;
        }

        Block::CodeBlock { language, content } => {
            match language {
                Some(lang) => write!(
                    output,
                    "<pre><code class=\"{}{}\">",
                    escape_attr(&config.code_class_prefix),
                    escape_attr(lang)
                )?,
                None => output.push_str("<pre><code>"),
            }
            output.push_str(&escape_text(content));
            output.push_str("</code></pre>");
        }

        Block::BlockQuote { content } => {
            output.push_str("<blockquote>\n");
            if !content.is_empty() {
                render_blocks(output, content, config)?;
                output.push('\n');
            }
            output.push_str("</blockquote>");
        }

        Block::List { kind, items, start } => {
            let tag = match kind {
                ListKind::Bullet => "ul",
                ListKind::Ordered => "ol",
            };
            match start {
                Some(n) if *kind == ListKind::Ordered => write!(output, "<ol start=\"{n}\">")?,
                _ => write!(output, "<{tag}>")?,
            }
            for item in items {
                output.push_str("\n<li>");
                render_inlines(output, &item.content, config)?;
                output.push_str("</li>");
            }
            write!(output, "\n</{tag}>")?;
        }

        Block::Table { header, body } => {
            output.push_str("<table>\n<thead>\n");
            render_row(output, header, "th", config)?;
            output.push_str("\n</thead>");
            if !body.is_empty() {
                output.push_str("\n<tbody>");
                for row in body {
                    output.push('\n');
                    render_row(output, row, "td", config)?;
                }
                output.push_str("\n</tbody>");
            }
            output.push_str("\n</table>");
        }

        Block::ThematicBreak => output.push_str("<hr>"),
    }
    Ok(())
}

fn render_row(output: &mut String, row: &TableRow, cell_tag: &str, config: &RenderConfig) -> Result<()> {
    output.push_str("<tr>\n");
    for cell in &row.cells {
        write!(output, "<{cell_tag}>")?;
        render_inlines(output, &cell.content, config)?;
        writeln!(output, "</{cell_tag}>")?;
    }
    output.push_str("</tr>");
    Ok(())
}

fn render_inlines(output: &mut String, content: &[Inline], config: &RenderConfig) -> Result<()> {
    for inline in content {
        render_inline(output, inline, config)?;
    }
    Ok(())
}

fn render_inline(output: &mut String, inline: &Inline, config: &RenderConfig) -> Result<()> {
    match inline {
        Inline::Text { content } => output.push_str(&escape_text(content)),

        Inline::Emphasis { content } => {
            output.push_str("<em>");
            render_inlines(output, content, config)?;
            output.push_str("</em>");
        }

        Inline::Strong { content } => {
            output.push_str("<strong>");
            render_inlines(output, content, config)?;
            output.push_str("</strong>");
        }

        Inline::Strikethrough { content } => {
            output.push_str("<del>");
            render_inlines(output, content, config)?;
            output.push_str("</del>");
        }

        Inline::Code { content } => {
            write!(output, "<code>{}</code>", escape_text(content))?;
        }

        Inline::Link { url, title, content } => {
            write!(output, "<a href=\"{}\"", escape_attr(url))?;
            if let Some(t) = title {
                write!(output, " title=\"{}\"", escape_attr(t))?;
            }
            output.push('>');
            render_inlines(output, content, config)?;
            output.push_str("</a>");
        }

        Inline::Image { url, alt, title } => {
            write!(output, "<img src=\"{}\" alt=\"{}\"", escape_attr(url), escape_attr(alt))?;
            if let Some(t) = title {
                write!(output, " title=\"{}\"", escape_attr(t))?;
            }
            output.push('>');
        }

        Inline::LineBreak => output.push_str("<br>\n"),

        Inline::SoftBreak => {
            if config.hard_breaks {
                output.push_str("<br>\n");
            } else {
                output.push('\n');
            }
        }
    }
    Ok(())
}

/// Escape text content
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a double-quoted attribute value
fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
