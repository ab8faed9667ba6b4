// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bootstrap errors. Anything here ends the process with a non-zero exit.

use thiserror::Error;

use crate::config::ConfigError;
use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::Store(_) => "store_error",
            AppError::Bind { .. } => "bind_error",
            AppError::Transport(_) => "transport_error",
            AppError::Task(_) => "task_error",
        }
    }
}
