// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Auth - Credential & Session Token Service
//!
//! Registers users, authenticates them against bcrypt hashes, and issues
//! HS256 session tokens scoped to a client application over gRPC.
//!
//! ## Modules
//!
//! - `auth` - Credential policy, token issuance, the authentication service
//! - `storage` - Credential store contract (PostgreSQL, in-memory)
//! - `grpc` - tonic transport, request validation, status mapping
//! - `shutdown` - Signal handling and bounded drain
//! - `config` - Environment configuration

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod grpc;
pub mod logging;
pub mod models;
pub mod proto;
pub mod shutdown;
pub mod storage;
