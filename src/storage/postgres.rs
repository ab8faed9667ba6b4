// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! PostgreSQL-backed credential store.
//!
//! ## Error Mapping
//!
//! | SQLx error | SQLSTATE | StoreError |
//! |------------|----------|------------|
//! | Database (unique violation) | `23505` | `AlreadyExists` |
//! | No row from `fetch_optional` | - | `NotFound` |
//! | Anything else | any | `Backend` |
//!
//! Classification reads the structured SQLSTATE, never the message text.
//!
//! ## Cancellation
//!
//! Every query is an ordinary future on the pool. Dropping it (caller
//! deadline, client cancel) releases the connection and abandons the query.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;

use super::retry::{retry_with_backoff, RetryPolicy};
use super::{AppProvider, StoreError, StoreResult, UserProvider, UserSaver};
use crate::config::DbConfig;
use crate::models::{App, AppId, User, UserId};

const UNIQUE_VIOLATION: &str = "23505";

/// Credential store over a bounded `sqlx` connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open the pool, retrying with backoff until the database answers or
    /// the policy's attempt/deadline bounds are hit.
    pub async fn connect(config: &DbConfig) -> StoreResult<Self> {
        let options = connect_options(config);
        let policy = RetryPolicy {
            max_attempts: config.connect_attempts,
            deadline: config.connect_timeout,
            ..RetryPolicy::default()
        };

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            max_connections = config.max_connections,
            "connecting to PostgreSQL"
        );

        let pool = retry_with_backoff(&policy, "postgres.connect", || {
            pool_options(config).connect_with(options.clone())
        })
        .await
        .map_err(|e| StoreError::backend(format!("failed to connect to PostgreSQL: {e}")))?;

        tracing::info!("connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::backend(format!("migration failed: {e}")))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn connect_options(config: &DbConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.name)
        .ssl_mode(config.ssl_mode)
}

fn pool_options(config: &DbConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .max_lifetime(Some(config.conn_max_lifetime))
        .acquire_timeout(Duration::from_secs(5))
}

/// Parse a libpq-style `sslmode` value.
pub fn parse_ssl_mode(value: &str) -> Option<PgSslMode> {
    value.parse().ok()
}

#[async_trait]
impl UserSaver for PgStore {
    async fn save_user(&self, email: &str, pass_hash: &[u8]) -> StoreResult<UserId> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(pass_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_user", e))
    }
}

#[async_trait]
impl UserProvider for PgStore {
    async fn user_by_email(&self, email: &str) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_admin, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_by_email", e))?
        .ok_or_else(|| StoreError::NotFound(format!("user {email}")))
    }

    async fn is_admin(&self, user_id: UserId) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT is_admin FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("is_admin", e))?
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))
    }
}

#[async_trait]
impl AppProvider for PgStore {
    async fn app(&self, app_id: AppId) -> StoreResult<App> {
        sqlx::query_as::<_, App>("SELECT id, name, secret FROM apps WHERE id = $1")
            .bind(app_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("app", e))?
            .ok_or_else(|| StoreError::NotFound(format!("app {app_id}")))
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        return StoreError::AlreadyExists(format!("unique constraint violated in {operation}"));
    }

    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound(format!("no row in {operation}")),
        sqlx::Error::PoolClosed => {
            StoreError::backend(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::backend(format!("timed out acquiring connection in {operation}"))
        }
        other => StoreError::backend(format!("sqlx error in {operation}: {other}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == UNIQUE_VIOLATION;
        }
    }
    false
}
