// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! End-to-end tests through the generated gRPC client against a real server
//! on an ephemeral port, backed by the in-memory store.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use auth_server::auth::{token, AuthService, AuthSettings, SigningMode};
use auth_server::grpc;
use auth_server::models::App;
use auth_server::proto::auth_client::AuthClient;
use auth_server::proto::{IsAdminRequest, LoginRequest, RegisterRequest};
use auth_server::storage::InMemoryStore;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tonic::Code;

const TOKEN_TTL: Duration = Duration::from_secs(3600);
const WEB_APP: i32 = 1;
const MOBILE_APP: i32 = 2;

struct TestServer {
    addr: SocketAddr,
    store: Arc<InMemoryStore>,
    stop: CancellationToken,
    handle: JoinHandle<Result<(), tonic::transport::Error>>,
}

impl TestServer {
    async fn start() -> Self {
        let store = Arc::new(InMemoryStore::new());
        store.insert_app(App::new(WEB_APP, "web", "web-secret")).await;
        store.insert_app(App::new(MOBILE_APP, "mobile", "mobile-secret")).await;

        let service = AuthService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            AuthSettings {
                token_ttl: TOKEN_TTL,
                signing: SigningMode::PerApplication,
                bcrypt_cost: 4,
            },
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stop = CancellationToken::new();
        let handle = tokio::spawn(grpc::serve(
            listener,
            service,
            Duration::from_secs(10),
            stop.clone(),
        ));

        Self {
            addr,
            store,
            stop,
            handle,
        }
    }

    async fn client(&self) -> AuthClient<Channel> {
        AuthClient::connect(format!("http://{}", self.addr))
            .await
            .expect("connect to test server")
    }
}

async fn register(client: &mut AuthClient<Channel>, email: &str, password: &str) -> i64 {
    client
        .register(RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        })
        .await
        .expect("register")
        .into_inner()
        .user_id
}

fn login_request(email: &str, password: &str, app_id: i32) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
        app_id,
    }
}

/// Decode the claims segment without verifying, as an external consumer would inspect it.
fn raw_claims(token: &str) -> serde_json::Value {
    let payload = token.split('.').nth(1).expect("claims segment");
    let bytes = URL_SAFE_NO_PAD.decode(payload).expect("base64url claims");
    serde_json::from_slice(&bytes).expect("json claims")
}

#[tokio::test]
async fn register_then_login_issues_token_for_identity() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let user_id = register(&mut client, "a@x.com", "Secret123!").await;
    assert_eq!(user_id, 1);

    let login_time = chrono::Utc::now().timestamp();
    let token = client
        .login(login_request("a@x.com", "Secret123!", WEB_APP))
        .await
        .unwrap()
        .into_inner()
        .token;
    assert!(!token.is_empty());

    let claims = raw_claims(&token);
    assert_eq!(claims["user_id"], 1);
    assert_eq!(claims["email"], "a@x.com");
    assert_eq!(claims["app_id"], WEB_APP);

    let iat = claims["iat"].as_i64().unwrap();
    let exp = claims["exp"].as_i64().unwrap();
    assert_eq!(exp - iat, TOKEN_TTL.as_secs() as i64);
    assert!((exp - (login_time + TOKEN_TTL.as_secs() as i64)).abs() <= 2);

    assert!(token::decode(&token, "web-secret").is_ok());
}

#[tokio::test]
async fn token_does_not_verify_with_another_apps_secret() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    register(&mut client, "a@x.com", "pw").await;

    let token = client
        .login(login_request("a@x.com", "pw", MOBILE_APP))
        .await
        .unwrap()
        .into_inner()
        .token;

    assert!(token::decode(&token, "mobile-secret").is_ok());
    assert!(token::decode(&token, "web-secret").is_err());
}

#[tokio::test]
async fn duplicate_registration_is_already_exists() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    register(&mut client, "a@x.com", "Secret123!").await;

    let status = client
        .register(RegisterRequest {
            email: "a@x.com".to_string(),
            password: "Other!".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::AlreadyExists);
    assert_eq!(status.message(), "user already exists");
    assert_eq!(server.store.user_count().await, 1);
}

#[tokio::test]
async fn credential_failures_are_indistinguishable() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    register(&mut client, "a@x.com", "pw").await;

    let cases = [
        login_request("a@x.com", "wrong", WEB_APP),
        login_request("nobody@x.com", "pw", WEB_APP),
        login_request("a@x.com", "pw", 99),
    ];

    for req in cases {
        let status = client.login(req).await.unwrap_err();
        assert_eq!(status.code(), Code::Unauthenticated);
        assert_eq!(status.message(), "invalid credentials");
    }
}

#[tokio::test]
async fn malformed_requests_are_invalid_argument() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let status = client.login(login_request("", "pw", WEB_APP)).await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "email is required");

    let status = client.login(login_request("a@x.com", "", WEB_APP)).await.unwrap_err();
    assert_eq!(status.message(), "password is required");

    let status = client.login(login_request("a@x.com", "pw", 0)).await.unwrap_err();
    assert_eq!(status.message(), "app_id is required");

    let status = client
        .register(RegisterRequest {
            email: "a@x.com".to_string(),
            password: String::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "password is required");
    assert_eq!(server.store.user_count().await, 0);

    let status = client
        .is_admin(IsAdminRequest { user_id: 0 })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "user_id is required");
}

#[tokio::test]
async fn passwords_past_bcrypt_limit_never_authenticate() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    let prefix = "a".repeat(72);

    let status = client
        .register(RegisterRequest {
            email: "long@x.com".to_string(),
            password: format!("{prefix}CORRECT"),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "password must be at most 72 bytes");
    assert_eq!(server.store.user_count().await, 0);

    register(&mut client, "a@x.com", &prefix).await;
    let status = client
        .login(login_request("a@x.com", &format!("{prefix}totally-wrong"), WEB_APP))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
    assert_eq!(status.message(), "invalid credentials");
}

#[tokio::test]
async fn is_admin_tracks_store_changes() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    let user_id = register(&mut client, "a@x.com", "pw").await;

    let is_admin = client
        .is_admin(IsAdminRequest { user_id })
        .await
        .unwrap()
        .into_inner()
        .is_admin;
    assert!(!is_admin);

    server.store.set_admin(user_id, true).await.unwrap();

    let is_admin = client
        .is_admin(IsAdminRequest { user_id })
        .await
        .unwrap()
        .into_inner()
        .is_admin;
    assert!(is_admin);
}

#[tokio::test]
async fn is_admin_for_unknown_user_is_not_found() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let status = client
        .is_admin(IsAdminRequest { user_id: 404 })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
    assert_eq!(status.message(), "user not found");
}

#[tokio::test]
async fn concurrent_registrations_of_one_email_admit_exactly_one() {
    let server = TestServer::start().await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let mut client = server.client().await;
        tasks.push(tokio::spawn(async move {
            client
                .register(RegisterRequest {
                    email: "race@x.com".to_string(),
                    password: "pw".to_string(),
                })
                .await
        }));
    }

    let mut created = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(status) => assert_eq!(status.code(), Code::AlreadyExists),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(server.store.user_count().await, 1);
}

#[tokio::test]
async fn cancelling_stop_token_ends_the_server() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    register(&mut client, "a@x.com", "pw").await;
    drop(client);

    server.stop.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server drains")
        .expect("server task joins");
    assert!(result.is_ok());
}
