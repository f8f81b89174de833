// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTML format handler
//!
//! Markup is parsed by html5ever into an `RcDom` and [`reducer`] maps the
//! `<body>` onto the document AST. [`serializer`] renders the AST as HTML.

pub mod reducer;
pub mod serializer;

use crate::ast::{ConversionMode, Document};
use crate::traits::{FormatHandler, ParseConfig, Parser, RenderConfig, Renderer, Result};

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
    "line_break",
];

/// HTML format handler
pub struct HtmlHandler;

impl HtmlHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for HtmlHandler {
    fn mode(&self) -> ConversionMode {
        ConversionMode::Html
    }

    fn parse(&self, input: &str, config: &ParseConfig) -> Result<Document> {
        // The dom owns the tree; it must outlive the reduction
        let dom = reducer::parse_dom(input);
        let content = reducer::reduce(&reducer::body(&dom), config.max_nesting);
        tracing::trace!(bytes = input.len(), blocks = content.len(), "reduced html");
        Ok(Document {
            mode: ConversionMode::Html,
            content,
        })
    }
}

impl Renderer for HtmlHandler {
    fn mode(&self) -> ConversionMode {
        ConversionMode::Html
    }

    fn render(&self, doc: &Document, config: &RenderConfig) -> Result<String> {
        let mut output = String::new();
        serializer::render_blocks(&mut output, &doc.content, config)?;
        Ok(output)
    }
}

impl FormatHandler for HtmlHandler {
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
        let handler = HtmlHandler::new();
        let doc = handler
            .parse("<h1>Hello World</h1>", &ParseConfig::default())
            .unwrap();

        assert_eq!(doc.mode, ConversionMode::Html);
        assert!(matches!(&doc.content[..], [Block::Heading { level: 1, .. }]));
    }

    #[test]
    fn test_roundtrip_structure() {
        let handler = HtmlHandler::new();
        let input = "<h2>Stack</h2>\n<p>Built with <strong>Rust</strong> and <code>tokio</code>.</p>\n<ul>\n<li>one</li>\n<li>two</li>\n</ul>";
        let doc = handler.parse(input, &ParseConfig::default()).unwrap();
        let output = handler.render(&doc, &RenderConfig::default()).unwrap();

        assert_eq!(output, input);
    }

    #[test]
    fn test_malformed_markup_parses() {
        let handler = HtmlHandler::new();
        for input in ["<p><b>open", "</div></p>", "<<>>", "<a href=\"x", "<!-- never closed", "<table><td>x"] {
            assert!(handler.parse(input, &ParseConfig::default()).is_ok(), "{input}");
        }
    }

    #[test]
    fn test_parse_decodes_entities() {
        let handler = HtmlHandler::new();
        let doc = handler
            .parse("<p>caf&eacute; &euro;5</p>", &ParseConfig::default())
            .unwrap();

        assert_eq!(
            doc.content,
            vec![Block::Paragraph {
                content: vec![crate::ast::Inline::text("café €5")],
            }]
        );
    }

    #[test]
    fn test_supports_feature() {
        let handler = HtmlHandler::new();
        assert!(handler.supports_feature("table"));
        assert!(!handler.supports_feature("footnote"));
    }
}
