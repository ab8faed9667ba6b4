// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Credential policy and session token issuance.
//!
//! ## Flows
//!
//! - **Register**: bcrypt-hash the password, store `(email, hash)`, return
//!   the new user id. A taken email is [`AuthError::UserExists`].
//! - **Login**: look up the user, verify the password, look up the
//!   application, sign an HS256 token with the resolved secret. Every
//!   credential failure is [`AuthError::InvalidCredentials`].
//! - **IsAdmin**: read the user's admin flag. An unknown user is
//!   [`AuthError::SubjectNotFound`].
//!
//! ## Security
//!
//! - Passwords are skipped from every tracing span and never logged
//! - Tokens are never signed with an empty secret
//! - bcrypt and signing run on the blocking pool

pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use error::AuthError;
pub use service::{AuthService, AuthSettings, SigningMode};
pub use token::{SessionClaims, TokenError};
