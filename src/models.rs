// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistent records read and written through the credential store.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Numeric user identifier (`users.id`).
pub type UserId = i64;

/// Numeric application identifier (`apps.id`).
pub type AppId = i32;

/// A registered identity.
///
/// Only the bcrypt digest of the password is ever held; the plaintext never
/// reaches a `User`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: UserId,
    /// Case-sensitive, unique across the store.
    pub email: String,
    /// bcrypt digest bytes (`$2b$...` in ASCII)
    #[sqlx(rename = "password_hash")]
    pub pass_hash: Vec<u8>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A client application that sessions are issued against.
///
/// Provisioned out-of-band; the service only reads it.
#[derive(Clone, PartialEq, Eq, FromRow)]
pub struct App {
    pub id: AppId,
    pub name: String,
    /// HMAC key for tokens issued to this application.
    pub secret: String,
}

impl App {
    pub fn new(id: AppId, name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            secret: secret.into(),
        }
    }
}

// Keep the signing secret out of logs.
impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}
