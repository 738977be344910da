// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded editor database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `files`: file_id → serialized StoredFile
//! - `file_versions`: version_id → serialized StoredVersion
//! - `file_version_index`: composite key (file_id|version_number_be) → version_id
//!
//! The composite key doubles as the uniqueness constraint on
//! `(file_id, version_number)` and gives an ordered range per file.
//!
//! redb runs one write transaction at a time. Every mutation of a file and
//! its versions happens inside a single write transaction, so the
//! read-decide-append sequence of a save cannot interleave with another
//! save. Readers see MVCC snapshots and never block writers.

use std::path::Path;

use redb::{Database, ReadTransaction, TableDefinition, WriteTransaction};

use crate::cipher::CipherError;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: file_id → serialized StoredFile (JSON bytes).
pub(crate) const FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("files");

/// Version rows: version_id → serialized StoredVersion (JSON bytes).
pub(crate) const FILE_VERSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("file_versions");

/// Index: `file_id|version_number_be` → version_id.
pub(crate) const FILE_VERSION_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("file_version_index");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("version conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("corrupt store: {0}")]
    Corrupt(String),

    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl EditorError {
    pub(crate) fn file_not_found(file_id: &str) -> Self {
        EditorError::NotFound(format!("File {file_id}"))
    }

    pub(crate) fn version_not_found(version_id: &str) -> Self {
        EditorError::NotFound(format!("Version {version_id}"))
    }
}

pub type EditorResult<T> = Result<T, EditorError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the file_version_index table.
///
/// Format: `file_id | version_number_be_bytes`. Big-endian numbers keep
/// versions of one file in ascending order under a forward scan.
pub(crate) fn make_version_key(file_id: &str, version_number: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(file_id.len() + 1 + 4);
    key.extend_from_slice(file_id.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&version_number.to_be_bytes());
    key
}

/// Inclusive key bounds covering every version of a file.
pub(crate) fn version_key_bounds(file_id: &str) -> (Vec<u8>, Vec<u8>) {
    (
        make_version_key(file_id, 0),
        make_version_key(file_id, u32::MAX),
    )
}

// =============================================================================
// EditorDatabase
// =============================================================================

/// Embedded ACID store for files and their versions.
pub struct EditorDatabase {
    db: Database,
}

impl EditorDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> EditorResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(FILES)?;
            let _ = write_txn.open_table(FILE_VERSIONS)?;
            let _ = write_txn.open_table(FILE_VERSION_INDEX)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Editor database opened");
        Ok(Self { db })
    }

    pub(crate) fn begin_write(&self) -> EditorResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    pub(crate) fn begin_read(&self) -> EditorResult<ReadTransaction> {
        use redb::ReadableDatabase;
        Ok(self.db.begin_read()?)
    }
}
