// SPDX-License-Identifier: AGPL-3.0-or-later
//! Markdown format handler
//!
//! Parsing is line-oriented: [`classify`] tags each line, [`parser`]
//! assembles the tagged lines into blocks and [`inline`] formats the text
//! inside them. [`serializer`] renders the AST back to Markdown.

pub mod classify;
pub mod inline;
pub mod parser;
pub mod serializer;

use crate::ast::{ConversionMode, Document};
use crate::traits::{FormatHandler, ParseConfig, Parser, RenderConfig, Renderer, Result};
use parser::BlockAssembler;

const FEATURES: &[&str] = &[
    "heading",
    "bold",
    "italic",
    "strikethrough",
    "code",
    "code_block",
    "link",
    "image",
    "list",
    "table",
    "blockquote",
    "thematic_break",
];

/// Markdown format handler
pub struct MarkdownHandler;

impl MarkdownHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for MarkdownHandler {
    fn mode(&self) -> ConversionMode {
        ConversionMode::Markdown
    }

    fn parse(&self, input: &str, config: &ParseConfig) -> Result<Document> {
        let content = BlockAssembler::new(config).assemble(input);
        tracing::trace!(blocks = content.len(), "assembled markdown");
        Ok(Document {
            mode: ConversionMode::Markdown,
            content,
        })
    }
}

impl Renderer for MarkdownHandler {
    fn mode(&self) -> ConversionMode {
        ConversionMode::Markdown
    }

    fn render(&self, doc: &Document, config: &RenderConfig) -> Result<String> {
        let mut output = String::new();
        serializer::render_blocks(&mut output, &doc.content, config)?;
        Ok(output)
    }
}

impl FormatHandler for MarkdownHandler {
    fn supported_features(&self) -> &[&str] {
        FEATURES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Block;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_heading() {
        let handler = MarkdownHandler::new();
        let doc = handler
            .parse("# Hello World", &ParseConfig::default())
            .unwrap();

        assert_eq!(doc.content.len(), 1);
        if let Block::Heading { level, .. } = &doc.content[0] {
            assert_eq!(*level, 1);
        } else {
            panic!("Expected heading");
        }
    }

    #[test]
    fn test_roundtrip_structure() {
        let handler = MarkdownHandler::new();
        let input = "# Projects\n\nBuilt with **Rust** and `tokio`.\n\n- one\n- two\n\n```sh\ncargo run\n```";
        let doc = handler.parse(input, &ParseConfig::default()).unwrap();
        let output = handler.render(&doc, &RenderConfig::default()).unwrap();

        assert_eq!(output, input);
    }

    #[test]
    fn test_render_config_markers() {
        let handler = MarkdownHandler::new();
        let doc = handler
            .parse("* a *b* **c**\n\n***", &ParseConfig::default())
            .unwrap();
        let config = RenderConfig {
            bullet_marker: '+',
            emphasis_marker: '_',
            thematic_break: "***".to_string(),
            ..RenderConfig::default()
        };
        let output = handler.render(&doc, &config).unwrap();

        assert_eq!(output, "+ a _b_ __c__\n\n***");
    }
}
