// SPDX-License-Identifier: AGPL-3.0-or-later
//! Document AST shared by the Markdown and HTML converters
//!
//! Both directions parse into this tree and render out of it, so neither
//! renderer ever sees the other representation's syntax.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::traits::{ConversionError, Result};

/// Which representation a content buffer currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMode {
    Html,
    Markdown,
}

impl ConversionMode {
    /// File extension for this mode
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "md",
        }
    }

    /// Short display name
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Html => "HTML",
            Self::Markdown => "MD",
        }
    }

    /// The other mode
    pub const fn toggled(&self) -> Self {
        match self {
            Self::Html => Self::Markdown,
            Self::Markdown => Self::Html,
        }
    }

    /// Mode for a file extension, case-insensitive
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }

    /// All modes in toolbar order
    pub const ALL: [Self; 2] = [Self::Markdown, Self::Html];
}

impl std::fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Html => "html",
            Self::Markdown => "markdown",
        })
    }
}

/// The root document node, alive for a single conversion pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub mode: ConversionMode,
    pub content: Vec<Block>,
}

impl Document {
    /// Create a new empty document
    pub fn new(mode: ConversionMode) -> Self {
        Self {
            mode,
            content: Vec::new(),
        }
    }

    /// Count words in the document
    pub fn word_count(&self) -> usize {
        self.content.iter().map(|b| b.word_count()).sum()
    }

    /// Count characters in the document
    pub fn char_count(&self) -> usize {
        self.content.iter().map(|b| b.char_count()).sum()
    }

    /// Pretty JSON dump of the tree, for debugging conversions
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConversionError::Serialization(e.to_string()))
    }
}

/// Block-level elements (structural)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Plain paragraph
    Paragraph { content: Vec<Inline> },

    /// Heading with level 1-6
    Heading { level: u8, content: Vec<Inline> },

    /// Verbatim code block with optional language
    CodeBlock {
        language: Option<String>,
        content: String,
    },

    /// Block quote, content parsed as a nested document
    BlockQuote { content: Vec<Block> },

    /// Ordered or unordered list of single-line items
    List {
        kind: ListKind,
        items: Vec<ListItem>,
        /// First number of an ordered list when it is not 1
        start: Option<u32>,
    },

    /// Table with a mandatory header row
    Table { header: TableRow, body: Vec<TableRow> },

    /// Horizontal rule / thematic break
    ThematicBreak,
}

impl Block {
    /// Count words in this block
    pub fn word_count(&self) -> usize {
        match self {
            Block::Paragraph { content } | Block::Heading { content, .. } => {
                inline_words(content)
            }
            Block::CodeBlock { content, .. } => content.unicode_words().count(),
            Block::BlockQuote { content } => content.iter().map(|b| b.word_count()).sum(),
            Block::List { items, .. } => items.iter().map(|i| inline_words(&i.content)).sum(),
            Block::Table { header, body } => std::iter::once(header)
                .chain(body)
                .flat_map(|row| &row.cells)
                .map(|cell| inline_words(&cell.content))
                .sum(),
            Block::ThematicBreak => 0,
        }
    }

    /// Count characters in this block
    pub fn char_count(&self) -> usize {
        match self {
            Block::Paragraph { content } | Block::Heading { content, .. } => {
                inline_chars(content)
            }
            Block::CodeBlock { content, .. } => content.chars().count(),
            Block::BlockQuote { content } => content.iter().map(|b| b.char_count()).sum(),
            Block::List { items, .. } => items.iter().map(|i| inline_chars(&i.content)).sum(),
            Block::Table { header, body } => std::iter::once(header)
                .chain(body)
                .flat_map(|row| &row.cells)
                .map(|cell| inline_chars(&cell.content))
                .sum(),
            Block::ThematicBreak => 0,
        }
    }
}

/// Flatten inline content to its visible text (image alts, link labels)
pub fn plain_text(content: &[Inline]) -> String {
    let mut out = String::new();
    for inline in content {
        match inline {
            Inline::Text { content } | Inline::Code { content } => out.push_str(content),
            Inline::Emphasis { content }
            | Inline::Strong { content }
            | Inline::Strikethrough { content }
            | Inline::Link { content, .. } => out.push_str(&plain_text(content)),
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::LineBreak | Inline::SoftBreak => out.push(' '),
        }
    }
    out
}

fn inline_words(content: &[Inline]) -> usize {
    content.iter().map(|i| i.word_count()).sum()
}

fn inline_chars(content: &[Inline]) -> usize {
    content.iter().map(|i| i.char_count()).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Bullet,
    Ordered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub content: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub content: Vec<Inline>,
}

/// Inline elements (character-level)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    /// Plain text
    Text { content: String },

    /// Emphasis (usually italic)
    Emphasis { content: Vec<Inline> },

    /// Strong emphasis (usually bold)
    Strong { content: Vec<Inline> },

    /// Strikethrough
    Strikethrough { content: Vec<Inline> },

    /// Inline code, always literal
    Code { content: String },

    /// Hyperlink
    Link {
        url: String,
        title: Option<String>,
        content: Vec<Inline>,
    },

    /// Image
    Image {
        url: String,
        alt: String,
        title: Option<String>,
    },

    /// Line break (hard break)
    LineBreak,

    /// Soft break (newline inside a paragraph)
    SoftBreak,
}

impl Inline {
    pub fn text(content: impl Into<String>) -> Self {
        Inline::Text {
            content: content.into(),
        }
    }

    /// Count words in this inline element
    pub fn word_count(&self) -> usize {
        match self {
            Inline::Text { content } | Inline::Code { content } => {
                content.unicode_words().count()
            }
            Inline::Emphasis { content }
            | Inline::Strong { content }
            | Inline::Strikethrough { content }
            | Inline::Link { content, .. } => inline_words(content),
            _ => 0,
        }
    }

    /// Count characters in this inline element
    pub fn char_count(&self) -> usize {
        match self {
            Inline::Text { content } | Inline::Code { content } => content.chars().count(),
            Inline::Emphasis { content }
            | Inline::Strong { content }
            | Inline::Strikethrough { content }
            | Inline::Link { content, .. } => inline_chars(content),
            Inline::SoftBreak => 1,
            _ => 0,
        }
    }
}
