// SPDX-License-Identifier: AGPL-3.0-or-later
//! Editor configuration
//!
//! Loaded from TOML. Every field has a default, so a partial file (or no
//! file at all) is a valid configuration.

use std::path::Path;

use folio_core::{ConversionMode, ParseConfig, RenderConfig};
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Mode of a new buffer
    pub mode: ConversionMode,
    pub parse: ParseConfig,
    pub render: RenderConfig,
    pub preview: PreviewConfig,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Push the current buffer as soon as a preview is attached
    pub push_on_attach: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            mode: ConversionMode::Markdown,
            parse: ParseConfig::default(),
            render: RenderConfig::default(),
            preview: PreviewConfig::default(),
            log_filter: "folio_core=info,folio_editor=info".to_string(),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            push_on_attach: true,
        }
    }
}

impl EditorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file, falling back to defaults if missing
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let config = Self::from_toml_str(&content)?;
                tracing::debug!(path = %path.display(), "loaded editor config");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no editor config, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(EditorError::io(path, e)),
        }
    }
}
