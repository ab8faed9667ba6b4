// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory credential store.
//!
//! Backs tests and local runs without a database. Every operation takes the
//! single lock, so a completed `save_user` is visible to the next read.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{AppProvider, StoreError, StoreResult, UserProvider, UserSaver};
use crate::models::{App, AppId, User, UserId};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    email_index: HashMap<String, UserId>,
    apps: HashMap<AppId, App>,
    next_user_id: UserId,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision an application (replaces one with the same id).
    pub async fn insert_app(&self, app: App) {
        self.tables.write().await.apps.insert(app.id, app);
    }

    /// Flip a user's administrator flag.
    pub async fn set_admin(&self, user_id: UserId, is_admin: bool) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;
        user.is_admin = is_admin;
        user.updated_at = Utc::now();
        Ok(())
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

#[async_trait]
impl UserSaver for InMemoryStore {
    async fn save_user(&self, email: &str, pass_hash: &[u8]) -> StoreResult<UserId> {
        let mut tables = self.tables.write().await;

        if tables.email_index.contains_key(email) {
            return Err(StoreError::AlreadyExists(format!("user {email}")));
        }

        tables.next_user_id += 1;
        let id = tables.next_user_id;
        let now = Utc::now();

        tables.users.insert(
            id,
            User {
                id,
                email: email.to_string(),
                pass_hash: pass_hash.to_vec(),
                is_admin: false,
                created_at: now,
                updated_at: now,
            },
        );
        tables.email_index.insert(email.to_string(), id);

        Ok(id)
    }
}

#[async_trait]
impl UserProvider for InMemoryStore {
    async fn user_by_email(&self, email: &str) -> StoreResult<User> {
        let tables = self.tables.read().await;
        tables
            .email_index
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {email}")))
    }

    async fn is_admin(&self, user_id: UserId) -> StoreResult<bool> {
        self.tables
            .read()
            .await
            .users
            .get(&user_id)
            .map(|user| user.is_admin)
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))
    }
}

#[async_trait]
impl AppProvider for InMemoryStore {
    async fn app(&self, app_id: AppId) -> StoreResult<App> {
        self.tables
            .read()
            .await
            .apps
            .get(&app_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("app {app_id}")))
    }
}
