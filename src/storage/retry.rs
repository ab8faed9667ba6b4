// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bounded retry with exponential backoff.
//!
//! Used only for establishing the store connection at startup; request-path
//! operations are never retried.
//!
//! Two bounds apply, whichever is hit first:
//! - `max_attempts` total calls of the operation
//! - `deadline` measured from the first attempt, which also cuts off an
//!   attempt that is still in flight
//!
//! Delay before retry `n` (0-based) is `initial_backoff * 2^n`, capped at
//! `max_backoff`.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{timeout_at, Instant};

/// Retry bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            deadline: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the `retry`-th failed attempt (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E: Display> {
    #[error("gave up after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: E },

    #[error("deadline of {deadline:?} elapsed after {attempts} attempt(s)")]
    DeadlineElapsed {
        attempts: u32,
        deadline: Duration,
        last: Option<E>,
    },
}

impl<E: Display> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. }
            | RetryError::DeadlineElapsed { attempts, .. } => *attempts,
        }
    }

    /// Error returned by the most recent completed attempt, if any.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { last, .. } => Some(last),
            RetryError::DeadlineElapsed { last, .. } => last.as_ref(),
        }
    }
}

/// Run `operation` until it succeeds or `policy` is exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let deadline = Instant::now() + policy.deadline;
    let mut last_error: Option<E> = None;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let err = match timeout_at(deadline, operation()).await {
            Ok(Ok(value)) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        "operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Ok(Err(err)) => err,
            Err(_) => {
                return Err(RetryError::DeadlineElapsed {
                    attempts: attempt,
                    deadline: policy.deadline,
                    last: last_error,
                });
            }
        };

        if attempt >= max_attempts {
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }

        let delay = policy.backoff(attempt - 1);
        if Instant::now() + delay >= deadline {
            return Err(RetryError::DeadlineElapsed {
                attempts: attempt,
                deadline: policy.deadline,
                last: Some(err),
            });
        }

        tracing::warn!(
            operation = operation_name,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "attempt failed, retrying after backoff"
        );
        last_error = Some(err);
        tokio::time::sleep(delay).await;
    }
}
