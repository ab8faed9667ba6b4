// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! bcrypt password hashing.
//!
//! Both operations take tens of milliseconds at production cost, so they run
//! on the blocking pool rather than on the async workers.
//!
//! bcrypt only reads the first [`MAX_PASSWORD_BYTES`] bytes of its input.
//! Longer passwords are refused when hashing and never match when verifying,
//! so two passwords sharing a 72-byte prefix are never interchangeable.

use thiserror::Error;

/// Longest password bcrypt hashes without truncation.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password exceeds {} bytes", MAX_PASSWORD_BYTES)]
    TooLong,

    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("stored hash is not valid UTF-8")]
    CorruptHash,

    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Hash `password` with a fresh salt at the given cost.
pub async fn hash(password: String, cost: u32) -> Result<Vec<u8>, PasswordError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordError::TooLong);
    }
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hashed.into_bytes())
}

/// Compare `password` against a stored hash.
///
/// `Ok(false)` is a clean mismatch; `Err` means the stored hash itself is unusable.
pub async fn verify(password: String, stored: Vec<u8>) -> Result<bool, PasswordError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }
    let stored = String::from_utf8(stored).map_err(|_| PasswordError::CorruptHash)?;
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &stored)).await??;
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn hash_then_verify() {
        let stored = hash("Secret123!".to_string(), TEST_COST).await.unwrap();

        assert!(verify("Secret123!".to_string(), stored.clone()).await.unwrap());
        assert!(!verify("secret123!".to_string(), stored).await.unwrap());
    }

    #[tokio::test]
    async fn same_password_gets_distinct_salts() {
        let a = hash("pw".to_string(), TEST_COST).await.unwrap();
        let b = hash("pw".to_string(), TEST_COST).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn cost_is_encoded_in_hash() {
        let stored = hash("pw".to_string(), TEST_COST).await.unwrap();
        let text = String::from_utf8(stored).unwrap();
        assert!(text.starts_with("$2b$04$"));
    }

    #[tokio::test]
    async fn garbage_hash_is_an_error_not_a_mismatch() {
        let result = verify("pw".to_string(), b"not-a-bcrypt-hash".to_vec()).await;
        assert!(matches!(result, Err(PasswordError::Bcrypt(_))));

        let result = verify("pw".to_string(), vec![0xff, 0xfe]).await;
        assert!(matches!(result, Err(PasswordError::CorruptHash)));
    }

    #[tokio::test]
    async fn password_over_limit_is_refused() {
        let at_limit = "a".repeat(MAX_PASSWORD_BYTES);
        assert!(hash(at_limit, TEST_COST).await.is_ok());

        let over_limit = "a".repeat(MAX_PASSWORD_BYTES + 1);
        assert!(matches!(
            hash(over_limit, TEST_COST).await,
            Err(PasswordError::TooLong)
        ));
    }

    #[tokio::test]
    async fn shared_72_byte_prefix_does_not_match() {
        let prefix = "a".repeat(MAX_PASSWORD_BYTES);
        let stored = hash(prefix.clone(), TEST_COST).await.unwrap();

        assert!(verify(prefix.clone(), stored.clone()).await.unwrap());
        assert!(!verify(format!("{prefix}totally-wrong"), stored).await.unwrap());
    }

    #[tokio::test]
    async fn invalid_cost_is_an_error() {
        assert!(hash("pw".to_string(), 2).await.is_err());
    }
}
