// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Secure Editor - Encrypted File Versioning Service
//!
//! Backend for a private, single-tenant file editor. File contents are
//! encrypted at rest and every file carries a debounced version history.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer token authentication (HS256 JWT)
//! - `cipher` - AES-256-GCM content encryption
//! - `clock` - Injectable time source
//! - `snapshot_policy` - When a save becomes a new version
//! - `storage` - redb-backed file and version repositories

pub mod api;
pub mod auth;
pub mod cipher;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod snapshot_policy;
pub mod state;
pub mod storage;
