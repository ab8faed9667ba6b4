// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! All settings come from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DB_HOST` | PostgreSQL host | `auth_db` |
//! | `DB_PORT` | PostgreSQL port | `5432` |
//! | `DB_USER` | PostgreSQL user | `auth` |
//! | `DB_PASSWORD` | PostgreSQL password | `authpass` |
//! | `DB_NAME` | Database name | `auth_db` |
//! | `DB_SSLMODE` | libpq `sslmode` | `disable` |
//! | `DB_MAX_CONNECTIONS` | Pool size | `25` |
//! | `DB_CONN_MAX_LIFETIME` | Pooled connection lifetime | `5m` |
//! | `DB_CONNECT_ATTEMPTS` | Startup connect attempts | `10` |
//! | `DB_CONNECT_TIMEOUT` | Overall startup connect deadline | `30s` |
//! | `GRPC_SERVER_HOST` | Listen address | `0.0.0.0` |
//! | `GRPC_SERVER_PORT` | Listen port | `50051` |
//! | `GRPC_SERVER_TIMEOUT` | Per-request deadline | `10s` |
//! | `TOKEN_TTL` | Session token lifetime | `1h` |
//! | `TOKEN_SECRET_MODE` | `per_app` or `shared` | `per_app` |
//! | `JWT_SECRET` | Signing secret for `shared` mode | Required in `shared` mode |
//! | `BCRYPT_COST` | bcrypt work factor (4-31) | `12` |
//! | `LOG_LEVEL` | `trace`, `debug`, `info`, `warn`, `error` | `info` |
//! | `ENV` | `local` (text logs), `dev` or `prod` (JSON logs) | `local` |
//! | `SHUTDOWN_TIMEOUT` | Graceful drain bound | `5s` |
//!
//! Durations accept an `s`, `m` or `h` suffix; a bare number is seconds.
//! `RUST_LOG`, when set, overrides `LOG_LEVEL`.

use std::net::SocketAddr;
use std::time::Duration;

use sqlx::postgres::PgSslMode;
use thiserror::Error;

use crate::auth::{AuthSettings, SigningMode};
use crate::storage::postgres::parse_ssl_mode;

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Deployment environment; selects the log format only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Local,
    Dev,
    Prod,
}

impl Environment {
    /// Unknown values fall back to `Local`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "dev" => Environment::Dev,
            "prod" => Environment::Prod,
            _ => Environment::Local,
        }
    }
}

#[derive(Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl_mode: PgSslMode,
    pub max_connections: u32,
    pub conn_max_lifetime: Duration,
    pub connect_attempts: u32,
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .field("conn_max_lifetime", &self.conn_max_lifetime)
            .field("connect_attempts", &self.connect_attempts)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrpcConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
}

impl GrpcConfig {
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse()
            .map_err(|_| ConfigError::invalid("GRPC_SERVER_HOST", &self.host, "not an IP address"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub env: Environment,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub grpc: GrpcConfig,
    pub log: LogConfig,
    pub auth: AuthSettings,
    pub shutdown_timeout: Duration,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let ssl_raw = env.string("DB_SSLMODE", "disable");
        let ssl_mode = parse_ssl_mode(&ssl_raw).ok_or_else(|| {
            ConfigError::invalid(
                "DB_SSLMODE",
                &ssl_raw,
                "expected disable, allow, prefer, require, verify-ca or verify-full",
            )
        })?;

        let db = DbConfig {
            host: env.string("DB_HOST", "auth_db"),
            port: env.parsed("DB_PORT", 5432)?,
            user: env.string("DB_USER", "auth"),
            password: env.string("DB_PASSWORD", "authpass"),
            name: env.string("DB_NAME", "auth_db"),
            ssl_mode,
            max_connections: env.parsed("DB_MAX_CONNECTIONS", 25)?,
            conn_max_lifetime: env.duration("DB_CONN_MAX_LIFETIME", "5m")?,
            connect_attempts: env.parsed("DB_CONNECT_ATTEMPTS", 10)?,
            connect_timeout: env.duration("DB_CONNECT_TIMEOUT", "30s")?,
        };
        if db.max_connections == 0 {
            return Err(ConfigError::invalid("DB_MAX_CONNECTIONS", "0", "must be at least 1"));
        }

        let grpc = GrpcConfig {
            host: env.string("GRPC_SERVER_HOST", "0.0.0.0"),
            port: env.parsed("GRPC_SERVER_PORT", 50051)?,
            request_timeout: env.duration("GRPC_SERVER_TIMEOUT", "10s")?,
        };
        grpc.addr()?;

        let log = LogConfig {
            level: env.string("LOG_LEVEL", "info"),
            env: Environment::parse(&env.string("ENV", "local")),
        };

        Ok(Self {
            db,
            grpc,
            log,
            auth: auth_settings(&env)?,
            shutdown_timeout: env.duration("SHUTDOWN_TIMEOUT", "5s")?,
        })
    }
}

fn auth_settings<F>(env: &Env<F>) -> Result<AuthSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let token_ttl = env.duration("TOKEN_TTL", "1h")?;
    if token_ttl.is_zero() {
        return Err(ConfigError::invalid("TOKEN_TTL", "0", "must be at least 1s"));
    }

    let mode_raw = env.string("TOKEN_SECRET_MODE", "per_app");
    let signing = match mode_raw.trim().to_lowercase().as_str() {
        "per_app" | "per-app" => SigningMode::PerApplication,
        "shared" => {
            let secret = env.get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
            if secret.is_empty() {
                return Err(ConfigError::invalid("JWT_SECRET", "", "must not be empty"));
            }
            SigningMode::Shared(secret)
        }
        _ => {
            return Err(ConfigError::invalid(
                "TOKEN_SECRET_MODE",
                &mode_raw,
                "expected per_app or shared",
            ))
        }
    };

    let bcrypt_cost: u32 = env.parsed("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
        return Err(ConfigError::invalid(
            "BCRYPT_COST",
            &bcrypt_cost.to_string(),
            format!("must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}"),
        ));
    }

    Ok(AuthSettings {
        token_ttl,
        signing,
        bcrypt_cost,
    })
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: std::str::FromStr>(
        &self,
        key: &'static str,
        default: T,
    ) -> Result<T, ConfigError> {
        match self.get(key).filter(|v| !v.trim().is_empty()) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid(key, &raw, "not a valid number")),
        }
    }

    fn duration(&self, key: &'static str, default: &str) -> Result<Duration, ConfigError> {
        let raw = self.string(key, default);
        parse_duration(&raw).ok_or_else(|| {
            ConfigError::invalid(key, &raw, "expected a whole number of seconds, e.g. 30s, 5m, 1h")
        })
    }
}

/// Parse a duration string like "30s", "5m" or "1h" (bare numbers are seconds).
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (num_str, unit) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        (s, 1)
    };

    let num: u64 = num_str.trim().parse().ok()?;
    num.checked_mul(unit).map(Duration::from_secs)
}
