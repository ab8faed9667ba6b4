// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every failure leaving [`AuthService`](super::AuthService) is one of these
//! kinds. Store and signing faults are folded into [`AuthError::Internal`]
//! before they cross the service boundary, so nothing driver-specific reaches
//! a caller.

use thiserror::Error;

/// Closed set of failures surfaced by the authentication service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Unknown email, wrong password, or unknown application. Deliberately
    /// indistinguishable to the caller.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The email is already registered.
    #[error("user already exists")]
    UserExists,

    /// The referenced user does not exist.
    #[error("subject not found")]
    SubjectNotFound,

    /// Request rejected before reaching business logic.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Storage or signing fault. The message is for server-side logs only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Stable machine-readable code for this error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::UserExists => "user_exists",
            AuthError::SubjectNotFound => "subject_not_found",
            AuthError::InvalidInput(_) => "invalid_input",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Whether the error is safe to show to the caller verbatim.
    pub fn is_client_safe(&self) -> bool {
        !matches!(self, AuthError::Internal(_))
    }
}
