// SPDX-License-Identifier: AGPL-3.0-or-later
//! Folio Editor - dual-mode content editing on top of `folio-core`
//!
//! A [`ContentEditor`] session holds one buffer in either Markdown or HTML,
//! switches between the two by full re-conversion and keeps an external
//! preview up to date. [`commands`] loads, saves and converts documents for
//! the hosting application.

pub mod actions;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod preview;
pub mod session;

pub use actions::{Edit, FormatAction, Selection};
pub use config::{EditorConfig, PreviewConfig};
pub use error::{EditorError, Result};
pub use logging::{init_from_config, init_logging};
pub use preview::{ChannelPreview, PreviewSink};
pub use session::{ContentEditor, DocumentStats};
