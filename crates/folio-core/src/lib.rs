// SPDX-License-Identifier: AGPL-3.0-or-later
//! Folio Core - Markdown/HTML document AST and converters
//!
//! This crate provides:
//! - A document AST shared by both conversion modes
//! - Parser and renderer traits for format handlers
//! - Markdown and HTML handlers, registered in a [`FormatRegistry`]
//! - A sniffing heuristic for content of unknown mode

pub mod ast;
pub mod detect;
pub mod formats;
pub mod traits;

pub use ast::{Block, ConversionMode, Document, Inline, ListItem, ListKind, TableCell, TableRow};
pub use detect::detect_mode;
pub use traits::{
    ConversionError, FormatHandler, FormatRegistry, ParseConfig, Parser, RenderConfig, Renderer,
    Result,
};

/// Convert `content` between modes with default configuration
///
/// Same-mode conversion returns the input unchanged. Malformed input never
/// fails; an error means an internal fault.
pub fn convert(content: &str, from: ConversionMode, to: ConversionMode) -> Result<String> {
    FormatRegistry::with_defaults().convert(
        content,
        from,
        to,
        &ParseConfig::default(),
        &RenderConfig::default(),
    )
}
