// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Credential Store
//!
//! Read/write contract the authentication service depends on, split into
//! capability traits so the service only sees the operations it calls:
//!
//! | Trait | Operations |
//! |-------|------------|
//! | [`UserSaver`] | `save_user` |
//! | [`UserProvider`] | `user_by_email`, `is_admin` |
//! | [`AppProvider`] | `app` |
//!
//! ## Implementations
//!
//! - [`PgStore`] - PostgreSQL via a bounded `sqlx` pool
//! - [`InMemoryStore`] - process-local maps, for tests and local runs
//!
//! ## Consistency
//!
//! A `save_user` that returns `Ok` must be visible to every subsequent
//! `user_by_email` for the same email. Email uniqueness is enforced by the
//! store itself (a unique constraint), never by an application-level lock.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{App, AppId, User, UserId};

pub mod memory;
pub mod postgres;
pub mod retry;

pub use memory::InMemoryStore;
pub use postgres::PgStore;
pub use retry::{retry_with_backoff, RetryPolicy};

/// Error type for credential store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record matched the lookup key.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Any other storage fault (connection, query, decoding).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Creates user records.
#[async_trait]
pub trait UserSaver: Send + Sync {
    /// Insert a user and return its new identifier.
    ///
    /// Fails with [`StoreError::AlreadyExists`] when the email is taken.
    async fn save_user(&self, email: &str, pass_hash: &[u8]) -> StoreResult<UserId>;
}

/// Reads user records.
#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Full user record by exact email.
    async fn user_by_email(&self, email: &str) -> StoreResult<User>;

    /// Administrator flag of the given user.
    async fn is_admin(&self, user_id: UserId) -> StoreResult<bool>;
}

/// Reads application records.
#[async_trait]
pub trait AppProvider: Send + Sync {
    /// Application record, including its signing secret.
    async fn app(&self, app_id: AppId) -> StoreResult<App>;
}
