// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize`, `Deserialize`, and `ToSchema`
//! for automatic JSON handling and OpenAPI documentation.
//!
//! Responses never carry ciphertext. File content is decrypted only for the
//! endpoints that return it.
//!
//! ## Model Categories
//!
//! - **Files**: create, update, save, reorder, import
//! - **History**: version content and restore

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{ImportEntry, StoredFile};

// =============================================================================
// File Models
// =============================================================================

/// File metadata as shown in listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FileListItem {
    /// Unique identifier (UUID).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Virtual path, e.g. `/notes/todo.md`.
    pub path: String,
    /// Language tag for syntax highlighting.
    pub language: String,
    /// Position in the user's ordering.
    pub sort_order: i64,
    /// Whether the file is in the trash.
    pub is_deleted: bool,
    /// When the file was trashed.
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&StoredFile> for FileListItem {
    fn from(file: &StoredFile) -> Self {
        Self {
            id: file.id.clone(),
            name: file.name.clone(),
            path: file.path.clone(),
            language: file.language.clone(),
            sort_order: file.sort_order,
            is_deleted: file.is_deleted,
            deleted_at: file.deleted_at,
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

/// A file with its decrypted content.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FileResponse {
    pub id: String,
    pub name: String,
    pub path: String,
    pub language: String,
    pub encoding: String,
    pub sort_order: i64,
    /// Current plaintext content.
    pub content: String,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileResponse {
    pub fn new(file: StoredFile, content: String) -> Self {
        Self {
            id: file.id,
            name: file.name,
            path: file.path,
            language: file.language,
            encoding: file.encoding,
            sort_order: file.sort_order,
            content,
            is_deleted: file.is_deleted,
            deleted_at: file.deleted_at,
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

/// Request to create a new file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateFileRequest {
    /// Display name (required).
    pub name: String,
    /// Virtual path (required).
    pub path: String,
    /// Initial content. Defaults to empty.
    #[serde(default)]
    pub content: String,
    /// Language tag. Defaults to `plaintext`.
    #[serde(default)]
    pub language: Option<String>,
}

/// Request to change a file's metadata. Omitted fields stay as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateFileRequest {
    pub name: Option<String>,
    pub path: Option<String>,
    pub language: Option<String>,
}

/// Request to save new content.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SaveFileRequest {
    /// Full new content of the file.
    pub content: String,
    /// Force a version snapshot regardless of the debounce policy.
    #[serde(default)]
    pub create_snapshot: bool,
}

/// Result of a save.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SaveFileResponse {
    pub file: FileListItem,
    /// Whether this save produced a new version.
    pub snapshot_created: bool,
    /// Number of the version created, if any.
    pub version_number: Option<u32>,
}

/// Request to reorder files.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReorderRequest {
    /// File ids in their new order. Unlisted files keep their position.
    pub file_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ReorderResponse {
    /// How many of the listed ids matched an existing file.
    pub updated: usize,
}

/// One file in an import batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImportFileEntry {
    pub name: Option<String>,
    /// Defaults to `/{name}`.
    pub path: Option<String>,
    pub content: Option<String>,
    pub language: Option<String>,
}

impl From<ImportFileEntry> for ImportEntry {
    fn from(entry: ImportFileEntry) -> Self {
        ImportEntry {
            name: entry.name,
            path: entry.path,
            content: entry.content,
            language: entry.language,
        }
    }
}

/// Request to import a batch of files.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportRequest {
    pub files: Vec<ImportFileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ImportResponse {
    pub imported: usize,
    /// Entries whose path was already taken or that failed to import.
    pub skipped: usize,
}

// =============================================================================
// History Models
// =============================================================================

/// Decrypted content of one version.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct VersionContentResponse {
    pub content: String,
}

/// Request to restore a file to an earlier version.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestoreVersionRequest {
    /// Version to restore. Must belong to the file in the path.
    pub version_id: String,
}
