// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # gRPC Transport
//!
//! Exposes [`AuthService`] as the `auth.Auth` tonic service.
//!
//! ## Status Mapping
//!
//! | Error | Code | Message |
//! |-------|------|---------|
//! | `InvalidInput` | `INVALID_ARGUMENT` | the validation message |
//! | `InvalidCredentials` | `UNAUTHENTICATED` | `invalid credentials` |
//! | `UserExists` | `ALREADY_EXISTS` | `user already exists` |
//! | `SubjectNotFound` | `NOT_FOUND` | `user not found` |
//! | `Internal` | `INTERNAL` | `internal error` |
//!
//! When a request deadline elapses or the client goes away, tonic drops the
//! handler future, which drops any in-flight store query with it.

pub mod validation;

use std::time::Duration;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{error, warn};

use crate::auth::{AuthError, AuthService};
use crate::proto::auth_server::{Auth, AuthServer};
use crate::proto::{
    IsAdminRequest, IsAdminResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};

impl From<AuthError> for Status {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidInput(msg) => Status::invalid_argument(msg),
            AuthError::InvalidCredentials => Status::unauthenticated("invalid credentials"),
            AuthError::UserExists => Status::already_exists("user already exists"),
            AuthError::SubjectNotFound => Status::not_found("user not found"),
            AuthError::Internal(_) => Status::internal("internal error"),
        }
    }
}

fn log_failure(rpc: &'static str, err: &AuthError) {
    if err.is_client_safe() {
        warn!(rpc, code = err.error_code(), "request rejected");
    } else {
        error!(rpc, error = %err, "request failed");
    }
}

/// tonic adapter over [`AuthService`].
#[derive(Clone)]
pub struct AuthGrpc {
    service: AuthService,
}

impl AuthGrpc {
    pub fn new(service: AuthService) -> Self {
        Self { service }
    }

    pub fn into_server(self) -> AuthServer<Self> {
        AuthServer::new(self)
    }
}

#[tonic::async_trait]
impl Auth for AuthGrpc {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let req = request.into_inner();
        let result = match validation::validate_register(&req) {
            Ok(()) => self.service.register(&req.email, &req.password).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(user_id) => Ok(Response::new(RegisterResponse { user_id })),
            Err(e) => {
                log_failure("Register", &e);
                Err(e.into())
            }
        }
    }

    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let req = request.into_inner();
        let result = match validation::validate_login(&req) {
            Ok(()) => self.service.login(&req.email, &req.password, req.app_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(token) => Ok(Response::new(LoginResponse { token })),
            Err(e) => {
                log_failure("Login", &e);
                Err(e.into())
            }
        }
    }

    async fn is_admin(
        &self,
        request: Request<IsAdminRequest>,
    ) -> Result<Response<IsAdminResponse>, Status> {
        let req = request.into_inner();
        let result = match validation::validate_is_admin(&req) {
            Ok(()) => self.service.is_admin(req.user_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(is_admin) => Ok(Response::new(IsAdminResponse { is_admin })),
            Err(e) => {
                log_failure("IsAdmin", &e);
                Err(e.into())
            }
        }
    }
}

/// Serve `service` on an already-bound listener until `shutdown` is cancelled.
///
/// In-flight requests are allowed to finish after cancellation; bounding that
/// drain is the caller's job.
pub async fn serve(
    listener: TcpListener,
    service: AuthService,
    request_timeout: Duration,
    shutdown: CancellationToken,
) -> Result<(), tonic::transport::Error> {
    let incoming = TcpListenerStream::new(listener);

    Server::builder()
        .timeout(request_timeout)
        .add_service(AuthGrpc::new(service).into_server())
        .serve_with_incoming_shutdown(incoming, shutdown.cancelled_owned())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn errors_map_to_fixed_status() {
        let cases = [
            (
                AuthError::invalid_input("email is required"),
                Code::InvalidArgument,
                "email is required",
            ),
            (AuthError::InvalidCredentials, Code::Unauthenticated, "invalid credentials"),
            (AuthError::UserExists, Code::AlreadyExists, "user already exists"),
            (AuthError::SubjectNotFound, Code::NotFound, "user not found"),
            (AuthError::internal("pool timed out"), Code::Internal, "internal error"),
        ];

        for (err, code, message) in cases {
            let status = Status::from(err);
            assert_eq!(status.code(), code);
            assert_eq!(status.message(), message);
        }
    }

    #[test]
    fn internal_detail_never_reaches_status() {
        let status = Status::from(AuthError::internal("duplicate key value violates constraint"));
        assert!(!status.message().contains("duplicate"));
    }
}
