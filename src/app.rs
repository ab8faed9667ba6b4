// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process wiring for the `serve` and `migrate` commands.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::auth::AuthService;
use crate::config::Config;
use crate::error::AppError;
use crate::grpc;
use crate::shutdown::{wait_for_signal, ShutdownCoordinator, ShutdownOutcome};
use crate::storage::PgStore;

/// Run the gRPC server until a termination signal, then drain.
pub async fn serve(config: Config) -> Result<(), AppError> {
    let store = Arc::new(PgStore::connect(&config.db).await?);
    let service = AuthService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        config.auth.clone(),
    );

    let addr = config.grpc.addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::Bind { addr, source })?;
    let settings = service.settings();
    info!(
        %addr,
        token_ttl_secs = settings.token_ttl.as_secs(),
        signing = ?settings.signing,
        bcrypt_cost = settings.bcrypt_cost,
        "gRPC server listening"
    );

    let stop = CancellationToken::new();
    let server = tokio::spawn(grpc::serve(
        listener,
        service,
        config.grpc.request_timeout,
        stop.clone(),
    ));

    let outcome = ShutdownCoordinator::new(config.shutdown_timeout)
        .run(wait_for_signal(), stop, server)
        .await;

    store.close().await;

    match outcome {
        ShutdownOutcome::Exited(result) => {
            error!("gRPC server stopped unexpectedly");
            result??;
            Ok(())
        }
        ShutdownOutcome::Drained(result) => {
            result??;
            info!("gRPC server stopped");
            Ok(())
        }
        ShutdownOutcome::Forced => {
            warn!("gRPC server forced to stop");
            Ok(())
        }
    }
}

/// Apply pending schema migrations and exit.
pub async fn migrate(config: Config) -> Result<(), AppError> {
    let store = PgStore::connect(&config.db).await?;
    store.migrate().await?;
    info!("migrations applied");
    store.close().await;
    Ok(())
}
