// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication service: login, registration and privilege lookup.
//!
//! The service holds no mutable state between calls. Email uniqueness is left
//! to the store's own constraint, and nothing is retried here.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};

use super::error::AuthError;
use super::password::{self, PasswordError};
use super::token;
use crate::models::{App, AppId, UserId};
use crate::storage::{AppProvider, StoreError, UserProvider, UserSaver};

/// Message for a password bcrypt would truncate.
pub const PASSWORD_TOO_LONG: &str = "password must be at most 72 bytes";

/// Where the token signing secret comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum SigningMode {
    /// Each application's own secret.
    PerApplication,
    /// One service-wide secret for every application.
    Shared(String),
}

impl fmt::Debug for SigningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningMode::PerApplication => f.write_str("PerApplication"),
            SigningMode::Shared(_) => f.write_str("Shared(<redacted>)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub token_ttl: Duration,
    pub signing: SigningMode,
    pub bcrypt_cost: u32,
}

#[derive(Clone)]
pub struct AuthService {
    user_saver: Arc<dyn UserSaver>,
    user_provider: Arc<dyn UserProvider>,
    app_provider: Arc<dyn AppProvider>,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(
        user_saver: Arc<dyn UserSaver>,
        user_provider: Arc<dyn UserProvider>,
        app_provider: Arc<dyn AppProvider>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            user_saver,
            user_provider,
            app_provider,
            settings,
        }
    }

    /// Effective settings; the secret in [`SigningMode::Shared`] is redacted by `Debug`.
    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Authenticate `email`/`password` and issue a session token for `app_id`.
    ///
    /// Unknown email, wrong password and unknown application all yield
    /// [`AuthError::InvalidCredentials`].
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        app_id: AppId,
    ) -> Result<String, AuthError> {
        info!("attempting to login user");

        let user = match self.user_provider.user_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => {
                warn!("login failed: user not found");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, "failed to get user");
                return Err(AuthError::internal(format!("get user: {e}")));
            }
        };

        match password::verify(password.to_owned(), user.pass_hash.clone()).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(user_id = user.id, "login failed: password mismatch");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(user_id = user.id, error = %e, "failed to verify password");
                return Err(AuthError::internal(format!("verify password: {e}")));
            }
        }

        let app = match self.app_provider.app(app_id).await {
            Ok(app) => app,
            Err(StoreError::NotFound(_)) => {
                warn!("login failed: unknown application");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, "failed to get app");
                return Err(AuthError::internal(format!("get app: {e}")));
            }
        };

        let secret = self.signing_secret(&app);
        let ttl = self.settings.token_ttl;
        let user_id = user.id;
        let signed = tokio::task::spawn_blocking(move || token::issue(&user, &app, &secret, ttl))
            .await
            .map_err(|e| AuthError::internal(format!("token task: {e}")))?;

        match signed {
            Ok(token) => {
                info!(user_id, "user logged in successfully");
                Ok(token)
            }
            Err(e) => {
                error!(user_id, error = %e, "failed to issue token");
                Err(AuthError::internal(format!("issue token: {e}")))
            }
        }
    }

    /// Create a user and return its identifier.
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        info!("registering user");

        let pass_hash = match password::hash(password.to_owned(), self.settings.bcrypt_cost).await {
            Ok(hash) => hash,
            Err(PasswordError::TooLong) => {
                warn!("registration rejected: password too long");
                return Err(AuthError::invalid_input(PASSWORD_TOO_LONG));
            }
            Err(e) => {
                error!(error = %e, "failed to generate password hash");
                return Err(AuthError::internal(format!("hash password: {e}")));
            }
        };

        match self.user_saver.save_user(email, &pass_hash).await {
            Ok(user_id) => {
                info!(user_id, "user registered");
                Ok(user_id)
            }
            Err(StoreError::AlreadyExists(_)) => {
                warn!("duplicate registration attempt");
                Err(AuthError::UserExists)
            }
            Err(e) => {
                error!(error = %e, "failed to save user");
                Err(AuthError::internal(format!("save user: {e}")))
            }
        }
    }

    /// Whether `user_id` holds the administrator flag.
    #[instrument(skip(self))]
    pub async fn is_admin(&self, user_id: UserId) -> Result<bool, AuthError> {
        match self.user_provider.is_admin(user_id).await {
            Ok(is_admin) => {
                info!(is_admin, "checked if user is admin");
                Ok(is_admin)
            }
            Err(StoreError::NotFound(_)) => {
                warn!("user not found");
                Err(AuthError::SubjectNotFound)
            }
            Err(e) => {
                error!(error = %e, "failed to get admin flag");
                Err(AuthError::internal(format!("is admin: {e}")))
            }
        }
    }

    fn signing_secret(&self, app: &App) -> String {
        match &self.settings.signing {
            SigningMode::PerApplication => app.secret.clone(),
            SigningMode::Shared(secret) => secret.clone(),
        }
    }
}
