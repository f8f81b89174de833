// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::EditorConfig;

/// Install a global fmt subscriber
///
/// `RUST_LOG` wins over `default_filter`. Returns `false` when a subscriber
/// was already installed, which makes repeated calls harmless.
pub fn init_logging(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Install the subscriber with the filter from `config`
pub fn init_from_config(config: &EditorConfig) -> bool {
    init_logging(&config.log_filter)
}
