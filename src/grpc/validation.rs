// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request shape checks. A request that fails here never reaches the service.
//!
//! Fields are checked in order: email, password, then the numeric id.
//! Register also refuses passwords bcrypt would truncate; Login leaves them to
//! fail as ordinary credential mismatches.

use crate::auth::password::MAX_PASSWORD_BYTES;
use crate::auth::service::PASSWORD_TOO_LONG;
use crate::auth::AuthError;
use crate::proto::{IsAdminRequest, LoginRequest, RegisterRequest};

pub fn validate_login(req: &LoginRequest) -> Result<(), AuthError> {
    require_credentials(&req.email, &req.password)?;
    if req.app_id == 0 {
        return Err(AuthError::invalid_input("app_id is required"));
    }
    Ok(())
}

pub fn validate_register(req: &RegisterRequest) -> Result<(), AuthError> {
    require_credentials(&req.email, &req.password)?;
    if req.password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::invalid_input(PASSWORD_TOO_LONG));
    }
    Ok(())
}

pub fn validate_is_admin(req: &IsAdminRequest) -> Result<(), AuthError> {
    if req.user_id == 0 {
        return Err(AuthError::invalid_input("user_id is required"));
    }
    Ok(())
}

fn require_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    if email.is_empty() {
        return Err(AuthError::invalid_input("email is required"));
    }
    if password.is_empty() {
        return Err(AuthError::invalid_input("password is required"));
    }
    Ok(())
}
