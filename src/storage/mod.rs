// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Editor Storage Module
//!
//! Persistent storage for files and their version history in a single redb
//! database under the configured data directory.
//!
//! ## Security Model
//!
//! - File content and every version snapshot are encrypted with
//!   [`crate::cipher::ContentCipher`] before they reach the database
//! - Names, paths and timestamps are stored in the clear
//! - Each snapshot decrypts on its own; no version depends on another
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   editor.redb
//!     files                 file_id -> StoredFile (JSON)
//!     file_versions         version_id -> StoredVersion (JSON)
//!     file_version_index    file_id|version_number -> version_id
//! ```

pub mod database;
pub mod repository;

pub use database::{EditorDatabase, EditorError, EditorResult};
pub use repository::{
    FileMetadataUpdate, FileRepository, ImportEntry, ImportReport, NewFile, SaveOutcome,
    StoredFile, StoredVersion, VersionStore, VersionSummary,
};
