// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token issuance.
//!
//! Tokens are HS256 JWTs carrying the claims below. They are never stored;
//! consumers validate them by signature and expiry alone.
//!
//! | Claim | Meaning |
//! |-------|---------|
//! | `user_id` | User identifier |
//! | `email` | User email at issuance |
//! | `app_id` | Application the session was issued for |
//! | `iat` | Issued-at, Unix seconds |
//! | `exp` | `iat` + TTL, Unix seconds |

use std::time::Duration;

use jsonwebtoken::{
    decode as jwt_decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{App, AppId, User, UserId};

/// Clock skew tolerance applied by [`decode`].
pub const CLOCK_SKEW_LEEWAY: u64 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("signing secret is empty")]
    EmptySecret,

    #[error("token ttl must be at least one second")]
    InvalidTtl,

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("token expired")]
    Expired,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("malformed token")]
    Malformed,
}

/// Claims embedded in every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub email: String,
    pub app_id: AppId,
    pub iat: i64,
    pub exp: i64,
}

/// Sign a session token for `user` on `app`, issued now.
pub fn issue(user: &User, app: &App, secret: &str, ttl: Duration) -> Result<String, TokenError> {
    issue_at(user, app, secret, ttl, chrono::Utc::now().timestamp())
}

/// Sign a session token with an explicit issued-at timestamp.
pub fn issue_at(
    user: &User,
    app: &App,
    secret: &str,
    ttl: Duration,
    issued_at: i64,
) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::EmptySecret);
    }
    let ttl_secs = i64::try_from(ttl.as_secs()).map_err(|_| TokenError::InvalidTtl)?;
    if ttl_secs == 0 {
        return Err(TokenError::InvalidTtl);
    }
    let exp = issued_at.checked_add(ttl_secs).ok_or(TokenError::InvalidTtl)?;

    let claims = SessionClaims {
        user_id: user.id,
        email: user.email.clone(),
        app_id: app.id,
        iat: issued_at,
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Verify a token's signature and expiry and return its claims.
pub fn decode(token: &str, secret: &str) -> Result<SessionClaims, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::EmptySecret);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = CLOCK_SKEW_LEEWAY;
    validation.validate_aud = false;

    let key = DecodingKey::from_secret(secret.as_bytes());
    let data = jwt_decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::Malformed,
    })?;

    Ok(data.claims)
}
