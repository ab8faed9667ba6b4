// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over `LOG_LEVEL` when set. `ENV=local` prints compact
//! human-readable lines; `dev` and `prod` emit JSON.

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::{Environment, LogConfig};

/// Map a `LOG_LEVEL` value to a tracing level. Unknown values fall back to `info`.
pub fn parse_level(raw: &str) -> Level {
    match raw.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(config: &LogConfig) {
    let level = parse_level(&config.level);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let _ = match config.env {
        Environment::Local => builder.compact().try_init(),
        Environment::Dev | Environment::Prod => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_current_span(true)
            .try_init(),
    };
}
