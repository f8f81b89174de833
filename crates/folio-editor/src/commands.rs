// SPDX-License-Identifier: AGPL-3.0-or-later
//! Document commands for the hosting application

use std::path::Path;

use folio_core::{detect_mode, ConversionMode, FormatRegistry, ParseConfig, RenderConfig};
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::session::DocumentStats;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub path: Option<String>,
    pub mode: ConversionMode,
    pub modified: bool,
    pub word_count: usize,
    pub char_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentData {
    pub content: String,
    pub meta: DocumentMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub content: String,
    pub warnings: Vec<String>,
}

fn meta(path: &Path, content: &str, mode: ConversionMode) -> DocumentMeta {
    let stats = DocumentStats::measure(
        content,
        mode,
        &FormatRegistry::with_defaults(),
        &ParseConfig::default(),
    );
    DocumentMeta {
        path: Some(path.display().to_string()),
        mode,
        modified: false,
        word_count: stats.word_count,
        char_count: stats.char_count,
    }
}

/// Load a document from the filesystem
///
/// The mode comes from the extension; anything else is sniffed.
pub async fn load_document(path: impl AsRef<Path>) -> Result<DocumentData> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| EditorError::io(path, e))?;

    let mode = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ConversionMode::from_extension)
        .unwrap_or_else(|| detect_mode(&content));
    tracing::debug!(path = %path.display(), mode = %mode, bytes = content.len(), "loaded document");

    let meta = meta(path, &content, mode);
    Ok(DocumentData { content, meta })
}

/// Save a document to the filesystem
pub async fn save_document(
    path: impl AsRef<Path>,
    content: &str,
    mode: ConversionMode,
) -> Result<DocumentMeta> {
    let path = path.as_ref();
    tokio::fs::write(path, content)
        .await
        .map_err(|e| EditorError::io(path, e))?;
    tracing::debug!(path = %path.display(), mode = %mode, bytes = content.len(), "saved document");

    Ok(meta(path, content, mode))
}

/// Convert document content from one mode to another
///
/// Content that does not look like `from` is still converted, with a warning.
pub async fn convert_content(
    content: String,
    from: ConversionMode,
    to: ConversionMode,
) -> Result<ConversionResult> {
    let mut warnings = Vec::new();
    let detected = detect_mode(&content);
    if !content.trim().is_empty() && detected != from {
        tracing::warn!(declared = %from, detected = %detected, "content does not look like its mode");
        warnings.push(format!(
            "Content looks like {} but was declared {}",
            detected.label(),
            from.label()
        ));
    }

    if from == to {
        return Ok(ConversionResult { content, warnings });
    }

    let output = FormatRegistry::with_defaults().convert(
        &content,
        from,
        to,
        &ParseConfig::default(),
        &RenderConfig::default(),
    )?;

    Ok(ConversionResult {
        content: output,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_load_infers_mode_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("about.MD");
        tokio::fs::write(&md, "# About\n\nTwo words").await.unwrap();

        let doc = load_document(&md).await.unwrap();
        assert_eq!(doc.meta.mode, ConversionMode::Markdown);
        assert_eq!(doc.meta.word_count, 3);
        assert!(!doc.meta.modified);

        let htm = dir.path().join("index.htm");
        tokio::fs::write(&htm, "# not markdown here").await.unwrap();
        assert_eq!(load_document(&htm).await.unwrap().meta.mode, ConversionMode::Html);
    }

    #[tokio::test]
    async fn test_load_sniffs_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippet.txt");
        tokio::fs::write(&path, "<div><p>hi</p></div>").await.unwrap();

        let doc = load_document(&path).await.unwrap();
        assert_eq!(doc.meta.mode, ConversionMode::Html);
        assert_eq!(doc.content, "<div><p>hi</p></div>");
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(dir.path().join("nope.md")).await.unwrap_err();
        assert!(matches!(err, EditorError::Io { .. }));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.html");

        let meta = save_document(&path, "<p>one two</p>", ConversionMode::Html)
            .await
            .unwrap();
        assert_eq!(meta.word_count, 2);

        let doc = load_document(&path).await.unwrap();
        assert_eq!(doc.content, "<p>one two</p>");
        assert_eq!(doc.meta, meta);
    }

    #[tokio::test]
    async fn test_convert_content() {
        let result = convert_content("**hi**".to_string(), ConversionMode::Markdown, ConversionMode::Html)
            .await
            .unwrap();
        assert_eq!(result.content, "<p><strong>hi</strong></p>");
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_convert_warns_on_mode_mismatch() {
        let result = convert_content("<p>hi</p>".to_string(), ConversionMode::Markdown, ConversionMode::Html)
            .await
            .unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.content, "<p>&lt;p&gt;hi&lt;/p&gt;</p>");
    }
}
