// SPDX-License-Identifier: AGPL-3.0-or-later
//! Parser and Renderer traits for format handlers

use crate::ast::{ConversionMode, Document};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error type for parsing and rendering
///
/// Malformed input is never an error: every string parses to some document.
/// These variants cover internal faults only.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Internal conversion error in {stage}: {message}")]
    Internal { stage: &'static str, message: String },

    #[error("No handler registered for {mode} ({feature})")]
    UnsupportedMode {
        mode: ConversionMode,
        feature: &'static str,
    },

    #[error("Render error: {0}")]
    Render(#[from] std::fmt::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, ConversionError>;

/// Configuration for parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Honour `\*`-style escapes of Markdown punctuation
    pub backslash_escapes: bool,
    /// Minimum dashes per cell for a Markdown table separator row
    pub min_separator_dashes: usize,
    /// Deepest quote or inline formatting nesting honoured; markup nested
    /// further is kept as text
    pub max_nesting: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            backslash_escapes: true,
            min_separator_dashes: 1,
            max_nesting: 64,
        }
    }
}

/// Configuration for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Bullet used for unordered Markdown lists
    pub bullet_marker: char,
    /// Delimiter used for Markdown emphasis (`*` or `_`), doubled for strong
    pub emphasis_marker: char,
    /// Markdown thematic break line
    pub thematic_break: String,
    /// Class prefix on `<code>` inside `<pre>` for fenced languages
    pub code_class_prefix: String,
    /// Render soft breaks as hard breaks
    pub hard_breaks: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            bullet_marker: '-',
            emphasis_marker: '*',
            thematic_break: "---".to_string(),
            code_class_prefix: "language-".to_string(),
            hard_breaks: false,
        }
    }
}

/// Parser trait: convert source representation to AST
pub trait Parser: Send + Sync {
    /// The mode this parser reads
    fn mode(&self) -> ConversionMode;

    /// Parse a string into a Document
    fn parse(&self, input: &str, config: &ParseConfig) -> Result<Document>;
}

/// Renderer trait: convert AST to target representation
pub trait Renderer: Send + Sync {
    /// The mode this renderer produces
    fn mode(&self) -> ConversionMode;

    /// Render a Document to a string
    fn render(&self, doc: &Document, config: &RenderConfig) -> Result<String>;
}

/// Combined parser + renderer for a mode
pub trait FormatHandler: Parser + Renderer {
    /// Check if this format supports a specific feature
    fn supports_feature(&self, feature: &str) -> bool {
        self.supported_features().contains(&feature)
    }

    /// Get list of supported features
    fn supported_features(&self) -> &[&str];
}

/// Registry of format handlers
pub struct FormatRegistry {
    handlers: HashMap<ConversionMode, Box<dyn FormatHandler>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with the Markdown and HTML handlers installed
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::formats::MarkdownHandler::new()));
        registry.register(Box::new(crate::formats::HtmlHandler::new()));
        registry
    }

    pub fn register(&mut self, handler: Box<dyn FormatHandler>) {
        let mode = Parser::mode(handler.as_ref());
        self.handlers.insert(mode, handler);
    }

    pub fn get(&self, mode: ConversionMode) -> Option<&dyn FormatHandler> {
        self.handlers.get(&mode).map(|h| h.as_ref())
    }

    /// Parse `input` with the handler registered for `mode`
    pub fn parse(&self, input: &str, mode: ConversionMode, config: &ParseConfig) -> Result<Document> {
        let handler = self.get(mode).ok_or(ConversionError::UnsupportedMode {
            mode,
            feature: "parsing",
        })?;
        handler.parse(input, config)
    }

    /// Convert between modes
    pub fn convert(
        &self,
        input: &str,
        from: ConversionMode,
        to: ConversionMode,
        parse_config: &ParseConfig,
        render_config: &RenderConfig,
    ) -> Result<String> {
        if from == to {
            return Ok(input.to_string());
        }

        let to_handler = self.get(to).ok_or(ConversionError::UnsupportedMode {
            mode: to,
            feature: "rendering",
        })?;

        let doc = self.parse(input, from, parse_config)?;
        tracing::debug!(
            from = %from,
            to = %to,
            blocks = doc.content.len(),
            "converting document"
        );
        to_handler.render(&doc, render_config)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
