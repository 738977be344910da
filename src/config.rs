// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! [`Config`] struct built from them at startup. The resulting values are
//! passed explicitly to the constructors that need them; nothing here is
//! global.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the redb database | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `ENCRYPTION_KEY` | Secret used for AES-256-GCM content encryption | Required |
//! | `SECRET_KEY` | HS256 key used to verify bearer tokens | Required |
//! | `SNAPSHOT_INTERVAL_SECONDS` | Max age of the latest version before a save snapshots | `60` |
//! | `SNAPSHOT_MAX_OPERATIONS` | Absorbed edits before a save snapshots | `10` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const ENCRYPTION_KEY_ENV: &str = "ENCRYPTION_KEY";
pub const SECRET_KEY_ENV: &str = "SECRET_KEY";
pub const SNAPSHOT_INTERVAL_ENV: &str = "SNAPSHOT_INTERVAL_SECONDS";
pub const SNAPSHOT_MAX_OPERATIONS_ENV: &str = "SNAPSHOT_MAX_OPERATIONS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SNAPSHOT_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_SNAPSHOT_MAX_OPERATIONS: u32 = 10;

/// File name of the database inside `DATA_DIR`.
pub const DATABASE_FILE: &str = "editor.redb";

/// Configuration loading errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Snapshot debounce settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotSettings {
    /// A save snapshots once the latest version is at least this old.
    pub interval: Duration,
    /// A save snapshots once the latest version has absorbed this many edits.
    pub max_operations: u32,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_SNAPSHOT_INTERVAL_SECS),
            max_operations: DEFAULT_SNAPSHOT_MAX_OPERATIONS,
        }
    }
}

/// Process configuration, loaded once at startup.
#[derive(Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub encryption_key: String,
    pub secret_key: String,
    pub snapshot: SnapshotSettings,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("data_dir", &self.data_dir)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("encryption_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("snapshot", &self.snapshot)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let data_dir = lookup(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(&lookup, PORT_ENV, DEFAULT_PORT)?;

        let interval_secs = parse_or(&lookup, SNAPSHOT_INTERVAL_ENV, DEFAULT_SNAPSHOT_INTERVAL_SECS)?;
        let max_operations = parse_or(
            &lookup,
            SNAPSHOT_MAX_OPERATIONS_ENV,
            DEFAULT_SNAPSHOT_MAX_OPERATIONS,
        )?;

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            data_dir,
            host,
            port,
            encryption_key: required(ENCRYPTION_KEY_ENV)?,
            secret_key: required(SECRET_KEY_ENV)?,
            snapshot: SnapshotSettings {
                interval: Duration::from_secs(interval_secs),
                max_operations,
            },
            log_format,
        })
    }

    /// Full path to the redb database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}
