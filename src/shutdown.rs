// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process lifecycle: wait for a termination signal, then drain the server
//! within a bounded window before forcing it down.

use std::future::Future;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How the server task ended.
#[derive(Debug)]
pub enum ShutdownOutcome<T> {
    /// The server stopped on its own before any signal arrived.
    Exited(Result<T, JoinError>),
    /// A signal arrived and the server drained within the timeout.
    Drained(Result<T, JoinError>),
    /// The drain timed out and the task was aborted.
    Forced,
}

#[derive(Debug, Clone, Copy)]
pub struct ShutdownCoordinator {
    timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Supervise `server` until it exits or `signal` completes.
    ///
    /// On signal, `stop` is cancelled and the server gets `timeout` to finish
    /// in-flight work before it is aborted.
    pub async fn run<S, T>(
        &self,
        signal: S,
        stop: CancellationToken,
        mut server: JoinHandle<T>,
    ) -> ShutdownOutcome<T>
    where
        S: Future<Output = ()>,
    {
        tokio::select! {
            result = &mut server => return ShutdownOutcome::Exited(result),
            () = signal => {}
        }

        info!(timeout_secs = self.timeout.as_secs(), "Shutting down, draining in-flight requests");
        stop.cancel();

        match tokio::time::timeout(self.timeout, &mut server).await {
            Ok(result) => {
                info!("Server drained");
                ShutdownOutcome::Drained(result)
            }
            Err(_) => {
                warn!("Drain timed out, forcing server stop");
                server.abort();
                ShutdownOutcome::Forced
            }
        }
    }
}

/// Resolve on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), initiating shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating shutdown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn server_exiting_first_is_reported() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        let stop = CancellationToken::new();
        let server = tokio::spawn(async { 7 });

        let outcome = coordinator
            .run(std::future::pending::<()>(), stop.clone(), server)
            .await;

        assert!(matches!(outcome, ShutdownOutcome::Exited(Ok(7))));
        assert!(!stop.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn signal_cancels_token_and_drains() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        let stop = CancellationToken::new();
        let server_stop = stop.clone();
        let server = tokio::spawn(async move {
            server_stop.cancelled().await;
            tokio::time::sleep(Duration::from_secs(1)).await;
            "drained"
        });

        let outcome = coordinator.run(async {}, stop.clone(), server).await;

        assert!(matches!(outcome, ShutdownOutcome::Drained(Ok("drained"))));
        assert!(stop.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_server_is_forced_after_timeout() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        let stop = CancellationToken::new();
        let server = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        let started = tokio::time::Instant::now();
        let outcome = coordinator.run(async {}, stop, server).await;

        assert!(matches!(outcome, ShutdownOutcome::Forced));
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(started.elapsed() < Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn signal_waits_for_its_future() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        let stop = CancellationToken::new();
        let server_stop = stop.clone();
        let server = tokio::spawn(async move { server_stop.cancelled().await });

        let signal = tokio::time::sleep(Duration::from_secs(30));
        let started = tokio::time::Instant::now();
        let outcome = coordinator.run(signal, stop, server).await;

        assert!(matches!(outcome, ShutdownOutcome::Drained(Ok(()))));
        assert!(started.elapsed() >= Duration::from_secs(30));
    }
}
