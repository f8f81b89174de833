// SPDX-License-Identifier: AGPL-3.0-or-later
//! External preview push
//!
//! The editor pushes rendered HTML after every buffer change. Delivery is
//! best effort: there is no acknowledgement or retry. A lagging preview only
//! ever sees the most recent render, and a preview that is gone misses the
//! update.

use tokio::sync::watch;

/// Receiver of rendered HTML
pub trait PreviewSink: Send {
    fn push(&mut self, html: &str);
}

impl<F> PreviewSink for F
where
    F: FnMut(&str) + Send,
{
    fn push(&mut self, html: &str) {
        self(html)
    }
}

/// Preview fed through a `watch` channel holding the latest render
pub struct ChannelPreview {
    tx: watch::Sender<String>,
}

impl ChannelPreview {
    /// Create a preview and the receiving end for the preview window
    ///
    /// The receiver starts empty and unchanged; the first push marks it
    /// changed.
    pub fn channel() -> (Self, watch::Receiver<String>) {
        let (tx, rx) = watch::channel(String::new());
        (Self { tx }, rx)
    }

    pub fn from_sender(tx: watch::Sender<String>) -> Self {
        Self { tx }
    }
}

impl PreviewSink for ChannelPreview {
    fn push(&mut self, html: &str) {
        match self.tx.send(html.to_string()) {
            Ok(()) => tracing::trace!(bytes = html.len(), "pushed preview"),
            Err(_) => tracing::debug!("preview closed, update dropped"),
        }
    }
}
