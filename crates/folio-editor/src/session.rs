// SPDX-License-Identifier: AGPL-3.0-or-later
//! Editor session
//!
//! [`ContentEditor`] owns the buffer and its mode. Every mutation notifies
//! the change callback and pushes fresh HTML to the attached preview.

use folio_core::{detect_mode, ConversionMode, FormatRegistry, ParseConfig, RenderConfig};
use serde::{Deserialize, Serialize};

use crate::actions::{FormatAction, Selection};
use crate::config::EditorConfig;
use crate::error::Result;
use crate::preview::PreviewSink;

/// Word and character counts of the visible text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentStats {
    pub word_count: usize,
    pub char_count: usize,
}

impl DocumentStats {
    pub fn measure(
        content: &str,
        mode: ConversionMode,
        registry: &FormatRegistry,
        config: &ParseConfig,
    ) -> Self {
        match registry.parse(content, mode, config) {
            Ok(doc) => Self {
                word_count: doc.word_count(),
                char_count: doc.char_count(),
            },
            Err(e) => {
                tracing::debug!(error = %e, "counting raw buffer");
                Self {
                    word_count: content.split_whitespace().count(),
                    char_count: content.chars().count(),
                }
            }
        }
    }
}

type ChangeCallback = Box<dyn FnMut(&str) + Send>;

pub struct ContentEditor {
    content: String,
    mode: ConversionMode,
    registry: FormatRegistry,
    parse_config: ParseConfig,
    render_config: RenderConfig,
    on_change: Option<ChangeCallback>,
    preview: Option<Box<dyn PreviewSink>>,
    push_on_attach: bool,
}

impl ContentEditor {
    pub fn new(content: impl Into<String>, mode: ConversionMode) -> Self {
        Self::with_config(
            content,
            &EditorConfig {
                mode,
                ..EditorConfig::default()
            },
        )
    }

    /// Create a session whose mode and conversion settings come from `config`
    pub fn with_config(content: impl Into<String>, config: &EditorConfig) -> Self {
        Self {
            content: content.into(),
            mode: config.mode,
            registry: FormatRegistry::with_defaults(),
            parse_config: config.parse.clone(),
            render_config: config.render.clone(),
            on_change: None,
            preview: None,
            push_on_attach: config.preview.push_on_attach,
        }
    }

    /// Replace the handler registry
    pub fn with_registry(mut self, registry: FormatRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn mode(&self) -> ConversionMode {
        self.mode
    }

    /// Replace the buffer wholesale
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.notify();
    }

    /// Re-convert the buffer into `target`
    ///
    /// On failure the buffer and mode are left as they were and `false` is
    /// returned.
    pub fn switch_mode(&mut self, target: ConversionMode) -> bool {
        if target == self.mode {
            return true;
        }

        let detected = detect_mode(&self.content);
        if !self.content.trim().is_empty() && detected != self.mode {
            tracing::warn!(declared = %self.mode, detected = %detected, "buffer does not look like its mode");
        }

        match self.registry.convert(
            &self.content,
            self.mode,
            target,
            &self.parse_config,
            &self.render_config,
        ) {
            Ok(converted) => {
                tracing::debug!(from = %self.mode, to = %target, "switched mode");
                self.content = converted;
                self.mode = target;
                self.notify();
                true
            }
            Err(e) => {
                tracing::error!(error = %e, from = %self.mode, to = %target, "mode switch failed, content unchanged");
                false
            }
        }
    }

    /// Apply a toolbar action and return the selection to show
    pub fn apply_action(&mut self, action: FormatAction, selection: Selection) -> Result<Selection> {
        let edit = action.apply(&self.content, self.mode, selection)?;
        self.content = edit.content;
        self.notify();
        Ok(edit.selection)
    }

    /// Register the callback receiving the buffer after every change
    pub fn on_change(&mut self, callback: impl FnMut(&str) + Send + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    /// Attach a preview, pushing the current buffer to it unless configured
    /// otherwise
    pub fn attach_preview(&mut self, sink: impl PreviewSink + 'static) {
        self.preview = Some(Box::new(sink));
        if self.push_on_attach {
            self.push_preview();
        }
    }

    pub fn detach_preview(&mut self) {
        self.preview = None;
    }

    pub fn stats(&self) -> DocumentStats {
        DocumentStats::measure(&self.content, self.mode, &self.registry, &self.parse_config)
    }

    /// The buffer rendered as HTML
    pub fn render_html(&self) -> Result<String> {
        Ok(self.registry.convert(
            &self.content,
            self.mode,
            ConversionMode::Html,
            &self.parse_config,
            &self.render_config,
        )?)
    }

    fn notify(&mut self) {
        if let Some(callback) = self.on_change.as_mut() {
            callback(&self.content);
        }
        self.push_preview();
    }

    fn push_preview(&mut self) {
        if self.preview.is_none() {
            return;
        }
        match self.render_html() {
            Ok(html) => {
                if let Some(preview) = self.preview.as_mut() {
                    preview.push(&html);
                }
            }
            Err(e) => tracing::debug!(error = %e, "preview not updated"),
        }
    }
}

impl std::fmt::Debug for ContentEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentEditor")
            .field("mode", &self.mode)
            .field("len", &self.content.len())
            .field("preview", &self.preview.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreviewConfig;
    use crate::preview::ChannelPreview;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_switch_mode_converts() {
        let mut editor = ContentEditor::new("# Title\n\nHello **you**", ConversionMode::Markdown);
        assert!(editor.switch_mode(ConversionMode::Html));
        assert_eq!(editor.mode(), ConversionMode::Html);
        assert_eq!(editor.content(), "<h1>Title</h1>\n<p>Hello <strong>you</strong></p>");

        assert!(editor.switch_mode(ConversionMode::Markdown));
        assert_eq!(editor.content(), "# Title\n\nHello **you**");
    }

    #[test]
    fn test_failed_switch_leaves_content() {
        let mut editor = ContentEditor::new("# Title", ConversionMode::Markdown)
            .with_registry(FormatRegistry::new());
        let changes = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&changes);
        editor.on_change(move |_| *counter.lock().unwrap() += 1);

        assert!(!editor.switch_mode(ConversionMode::Html));
        assert_eq!(editor.content(), "# Title");
        assert_eq!(editor.mode(), ConversionMode::Markdown);
        assert_eq!(*changes.lock().unwrap(), 0);
    }

    #[test]
    fn test_same_mode_switch_is_noop() {
        let mut editor = ContentEditor::new("*raw*", ConversionMode::Markdown);
        assert!(editor.switch_mode(ConversionMode::Markdown));
        assert_eq!(editor.content(), "*raw*");
    }

    #[test]
    fn test_on_change_sees_every_mutation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let mut editor = ContentEditor::new("", ConversionMode::Markdown);
        editor.on_change(move |content| log.lock().unwrap().push(content.to_string()));

        editor.set_content("word");
        editor
            .apply_action(FormatAction::Bold, Selection::new(0, 4))
            .unwrap();
        editor.switch_mode(ConversionMode::Html);

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["word", "**word**", "<p><strong>word</strong></p>"]
        );
    }

    #[test]
    fn test_preview_receives_html() {
        let (preview, mut rx) = ChannelPreview::channel();
        let mut editor = ContentEditor::new("start", ConversionMode::Markdown);
        editor.attach_preview(preview);
        assert_eq!(*rx.borrow_and_update(), "<p>start</p>");

        editor.set_content("draft");
        editor.set_content("- item");
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), "<ul>\n<li>item</li>\n</ul>");

        editor.detach_preview();
        editor.set_content("gone");
        assert_eq!(*rx.borrow(), "<ul>\n<li>item</li>\n</ul>");
    }

    #[test]
    fn test_attach_without_initial_push() {
        let config = EditorConfig {
            preview: PreviewConfig {
                push_on_attach: false,
            },
            ..EditorConfig::default()
        };
        let (preview, mut rx) = ChannelPreview::channel();
        let mut editor = ContentEditor::with_config("start", &config);
        editor.attach_preview(preview);
        assert!(!rx.has_changed().unwrap());

        editor.set_content("next");
        assert_eq!(*rx.borrow_and_update(), "<p>next</p>");
    }

    #[test]
    fn test_closed_preview_does_not_block_edits() {
        let (preview, rx) = ChannelPreview::channel();
        drop(rx);
        let mut editor = ContentEditor::new("", ConversionMode::Html);
        editor.attach_preview(preview);
        editor.set_content("<p>still editable</p>");
        assert_eq!(editor.content(), "<p>still editable</p>");
    }

    #[test]
    fn test_invalid_action_leaves_content() {
        let mut editor = ContentEditor::new("abc", ConversionMode::Markdown);
        assert!(editor
            .apply_action(FormatAction::Italic, Selection::new(0, 10))
            .is_err());
        assert_eq!(editor.content(), "abc");
    }

    #[test]
    fn test_stats_count_visible_text() {
        let editor = ContentEditor::new("# Two words\n\n**three** more words", ConversionMode::Markdown);
        assert_eq!(editor.stats().word_count, 5);

        let editor = ContentEditor::new("<p>one <b>two</b></p>", ConversionMode::Html);
        assert_eq!(
            editor.stats(),
            DocumentStats {
                word_count: 2,
                char_count: 7,
            }
        );
    }
}
