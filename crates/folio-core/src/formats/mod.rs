// SPDX-License-Identifier: AGPL-3.0-or-later
//! Format handlers for each conversion mode

pub mod html;
pub mod markdown;

pub use html::HtmlHandler;
pub use markdown::MarkdownHandler;
