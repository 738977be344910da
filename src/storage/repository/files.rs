// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File repository for the editor database.
//!
//! Owns file records (metadata, current encrypted content, soft-delete
//! state) and drives the cipher, the snapshot policy and the version store
//! on every mutation. Each mutating operation runs in one redb write
//! transaction; content is encrypted before the transaction opens.
//!
//! ## Deletion States
//!
//! ```text
//! Active --soft_delete--> Trashed --restore_from_trash--> Active
//! Active | Trashed --permanent_delete--> (gone)
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{ReadableTable, Table};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::versions::{StoredVersion, VersionStore, VersionSummary};
use crate::cipher::{ContentCipher, EncryptedContent};
use crate::clock::{Clock, SystemClock};
use crate::snapshot_policy::{SnapshotDecision, SnapshotPolicy};
use crate::storage::database::{EditorDatabase, EditorError, EditorResult, FILES};

pub const DEFAULT_LANGUAGE: &str = "plaintext";
pub const DEFAULT_ENCODING: &str = "utf-8";

/// File record as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredFile {
    /// Unique file identifier (UUID)
    pub id: String,
    pub name: String,
    /// Virtual hierarchical path, e.g. `/notes/todo.md`
    pub path: String,
    pub language: String,
    pub encoding: String,
    /// Explicit user ordering
    pub sort_order: i64,
    /// Current content; empty content is encrypted too
    pub content_encrypted: EncryptedContent,
    pub is_deleted: bool,
    /// Set iff `is_deleted`
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`FileRepository::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFile {
    pub name: String,
    pub path: String,
    pub content: String,
    pub language: String,
}

impl NewFile {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            content: content.into(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Metadata changes for [`FileRepository::update_metadata`].
///
/// `None` and empty strings leave the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadataUpdate {
    pub name: Option<String>,
    pub path: Option<String>,
    pub language: Option<String>,
}

/// One entry of an import batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportEntry {
    pub name: Option<String>,
    pub path: Option<String>,
    pub content: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Result of a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub file: StoredFile,
    /// The version created by this save, if the policy asked for one
    pub snapshot: Option<VersionSummary>,
}

/// Repository for files and their version history.
pub struct FileRepository {
    db: EditorDatabase,
    cipher: ContentCipher,
    policy: SnapshotPolicy,
    clock: Arc<dyn Clock>,
}

impl FileRepository {
    pub fn new(db: EditorDatabase, cipher: ContentCipher, policy: SnapshotPolicy) -> Self {
        Self::with_clock(db, cipher, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        db: EditorDatabase,
        cipher: ContentCipher,
        policy: SnapshotPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            cipher,
            policy,
            clock,
        }
    }

    // ========== Reads ==========

    /// Get an active (not trashed) file.
    pub fn get(&self, file_id: &str) -> EditorResult<StoredFile> {
        self.get_any(file_id)?
            .filter(|f| !f.is_deleted)
            .ok_or_else(|| EditorError::file_not_found(file_id))
    }

    /// Get a file regardless of deletion state.
    pub fn get_including_deleted(&self, file_id: &str) -> EditorResult<StoredFile> {
        self.get_any(file_id)?
            .ok_or_else(|| EditorError::file_not_found(file_id))
    }

    /// Find an active file by its virtual path.
    pub fn get_by_path(&self, path: &str) -> EditorResult<Option<StoredFile>> {
        Ok(self
            .scan(|f| !f.is_deleted && f.path == path)?
            .into_iter()
            .next())
    }

    /// Decrypt a file's current content.
    pub fn content(&self, file: &StoredFile) -> EditorResult<String> {
        Ok(self.cipher.decrypt_to_string(&file.content_encrypted)?)
    }

    /// List files ordered by `(sort_order, name)`.
    pub fn list(&self, include_deleted: bool) -> EditorResult<Vec<StoredFile>> {
        self.scan(|f| include_deleted || !f.is_deleted)
    }

    /// List trashed files.
    pub fn list_trash(&self) -> EditorResult<Vec<StoredFile>> {
        self.scan(|f| f.is_deleted)
    }

    /// Version summaries for a file, newest first.
    ///
    /// Trashed files keep their history, so this works for them too.
    pub fn list_versions(&self, file_id: &str) -> EditorResult<Vec<VersionSummary>> {
        self.get_including_deleted(file_id)?;
        let read_txn = self.db.begin_read()?;
        let versions = VersionStore::open_read(&read_txn)?;
        Ok(versions
            .list(file_id)?
            .iter()
            .map(StoredVersion::summary)
            .collect())
    }

    /// Decrypt a version's content by version id alone.
    pub fn read_version_content(&self, version_id: &str) -> EditorResult<String> {
        let version = self.load_version(version_id)?;
        Ok(self.cipher.decrypt_to_string(&version.content_encrypted)?)
    }

    /// Decrypt a version's content, requiring it to belong to `file_id`.
    pub fn read_file_version_content(
        &self,
        file_id: &str,
        version_id: &str,
    ) -> EditorResult<String> {
        let version = self.load_version(version_id)?;
        if version.file_id != file_id {
            return Err(EditorError::version_not_found(version_id));
        }
        Ok(self.cipher.decrypt_to_string(&version.content_encrypted)?)
    }

    // ========== Mutations ==========

    /// Create a file together with its first version.
    pub fn create(&self, new: NewFile) -> EditorResult<StoredFile> {
        let name = required_field("name", &new.name)?;
        let path = required_field("path", &new.path)?;
        let content_encrypted = self.cipher.encrypt_str(&new.content)?;
        let now = self.clock.now();

        let file = StoredFile {
            id: Uuid::new_v4().to_string(),
            name,
            path,
            language: new.language,
            encoding: DEFAULT_ENCODING.to_string(),
            sort_order: 0,
            content_encrypted,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        let write_txn = self.db.begin_write()?;
        {
            let mut files = write_txn.open_table(FILES)?;
            store_file(&mut files, &file)?;

            // First version bypasses the snapshot policy.
            let mut versions = VersionStore::open_write(&write_txn)?;
            versions.append(&file.id, file.content_encrypted.clone(), now)?;
        }
        write_txn.commit()?;

        info!(file_id = %file.id, path = %file.path, "File created");
        Ok(file)
    }

    /// Save new content, snapshotting when the policy says so.
    pub fn save(
        &self,
        file_id: &str,
        content: &str,
        force_snapshot: bool,
    ) -> EditorResult<SaveOutcome> {
        let content_encrypted = self.cipher.encrypt_str(content)?;

        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut files = write_txn.open_table(FILES)?;
            let mut file = load_file(&files, file_id)?
                .filter(|f| !f.is_deleted)
                .ok_or_else(|| EditorError::file_not_found(file_id))?;

            let now = self.clock.now();
            file.content_encrypted = content_encrypted;
            file.updated_at = now;

            let mut versions = VersionStore::open_write(&write_txn)?;
            let latest = versions.latest(file_id)?;
            let decision =
                self.policy
                    .decide(force_snapshot, latest.as_ref().map(StoredVersion::as_latest), now);

            let snapshot = match (decision, latest) {
                (SnapshotDecision::Absorb, Some(latest)) => {
                    let absorbed = versions.absorb(latest)?;
                    debug!(
                        file_id = %file_id,
                        version_number = absorbed.version_number,
                        operation_count = absorbed.operation_count,
                        "Save absorbed into latest version"
                    );
                    None
                }
                (SnapshotDecision::Create(reason), _) => {
                    let version =
                        versions.append(file_id, file.content_encrypted.clone(), now)?;
                    info!(
                        file_id = %file_id,
                        version_number = version.version_number,
                        reason = %reason,
                        "Version snapshot created"
                    );
                    Some(version.summary())
                }
                // The policy never absorbs without a latest version.
                (SnapshotDecision::Absorb, None) => {
                    Some(versions.append(file_id, file.content_encrypted.clone(), now)?.summary())
                }
            };

            store_file(&mut files, &file)?;
            SaveOutcome { file, snapshot }
        };
        write_txn.commit()?;

        Ok(outcome)
    }

    /// Restore an earlier version by saving its content as a new version.
    ///
    /// The version must belong to `file_id`. History is never rewritten:
    /// the restored content lands as a fresh, forced snapshot.
    pub fn restore_version(&self, file_id: &str, version_id: &str) -> EditorResult<SaveOutcome> {
        self.get(file_id)?;
        let content = self.read_file_version_content(file_id, version_id)?;
        let outcome = self.save(file_id, &content, true)?;
        info!(file_id = %file_id, version_id = %version_id, "Version restored");
        Ok(outcome)
    }

    /// Rename, move or relabel an active file. Content and history are untouched.
    pub fn update_metadata(
        &self,
        file_id: &str,
        update: FileMetadataUpdate,
    ) -> EditorResult<StoredFile> {
        self.mutate(file_id, false, |file, now| {
            if let Some(name) = update.name.filter(|n| !n.trim().is_empty()) {
                file.name = name;
            }
            if let Some(path) = update.path.filter(|p| !p.trim().is_empty()) {
                file.path = path;
            }
            if let Some(language) = update.language.filter(|l| !l.trim().is_empty()) {
                file.language = language;
            }
            file.updated_at = now;
        })
    }

    /// Copy an active file's content and language into a new file.
    pub fn duplicate(&self, file_id: &str) -> EditorResult<StoredFile> {
        let source = self.get(file_id)?;
        let content = self.content(&source)?;
        let name = copy_name(&source.name);
        let path = sibling_path(&source.path, &name);

        let copy = self.create(NewFile::new(name, path, content).with_language(source.language))?;
        info!(source_id = %file_id, file_id = %copy.id, "File duplicated");
        Ok(copy)
    }

    /// Move an active file to the trash. Versions are kept.
    pub fn soft_delete(&self, file_id: &str) -> EditorResult<StoredFile> {
        let file = self.mutate(file_id, false, |file, now| {
            file.is_deleted = true;
            file.deleted_at = Some(now);
        })?;
        info!(file_id = %file_id, "File moved to trash");
        Ok(file)
    }

    /// Bring a file back from the trash.
    pub fn restore_from_trash(&self, file_id: &str) -> EditorResult<StoredFile> {
        let file = self.mutate(file_id, true, |file, _| {
            file.is_deleted = false;
            file.deleted_at = None;
        })?;
        info!(file_id = %file_id, "File restored from trash");
        Ok(file)
    }

    /// Delete a file and all of its versions. Irreversible.
    pub fn permanent_delete(&self, file_id: &str) -> EditorResult<()> {
        let write_txn = self.db.begin_write()?;
        let removed_versions = {
            let mut files = write_txn.open_table(FILES)?;
            if files.remove(file_id)?.is_none() {
                return Err(EditorError::file_not_found(file_id));
            }
            let mut versions = VersionStore::open_write(&write_txn)?;
            versions.remove_all(file_id)?
        };
        write_txn.commit()?;

        info!(
            file_id = %file_id,
            versions = removed_versions,
            "File permanently deleted"
        );
        Ok(())
    }

    /// Assign `sort_order` by position in `ordered_ids`.
    ///
    /// Unknown ids are skipped. Files missing from the list keep their
    /// current `sort_order`. Returns the number of files updated.
    pub fn reorder(&self, ordered_ids: &[String]) -> EditorResult<usize> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut files = write_txn.open_table(FILES)?;
            let mut updated = 0;
            for (position, file_id) in ordered_ids.iter().enumerate() {
                if let Some(mut file) = load_file(&files, file_id)? {
                    file.sort_order = position as i64;
                    store_file(&mut files, &file)?;
                    updated += 1;
                }
            }
            updated
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Create files from an import batch, skipping paths already in use.
    pub fn import(&self, entries: Vec<ImportEntry>) -> EditorResult<ImportReport> {
        let mut report = ImportReport::default();

        for entry in entries {
            let name = entry
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "untitled".to_string());
            let path = entry
                .path
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| format!("/{name}"));

            if self.get_by_path(&path)?.is_some() {
                warn!(path = %path, "Import skipped existing path");
                report.skipped += 1;
                continue;
            }

            let new = NewFile::new(name, path.clone(), entry.content.unwrap_or_default())
                .with_language(
                    entry
                        .language
                        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
                );
            match self.create(new) {
                Ok(_) => report.imported += 1,
                Err(e) => {
                    warn!(path = %path, error = %e, "Import entry failed");
                    report.skipped += 1;
                }
            }
        }

        info!(
            imported = report.imported,
            skipped = report.skipped,
            "Import finished"
        );
        Ok(report)
    }

    /// Confirm the database answers a read transaction.
    pub fn check_health(&self) -> EditorResult<()> {
        let read_txn = self.db.begin_read()?;
        let _files = read_txn.open_table(FILES)?;
        Ok(())
    }

    // ========== Internals ==========

    fn get_any(&self, file_id: &str) -> EditorResult<Option<StoredFile>> {
        let read_txn = self.db.begin_read()?;
        let files = read_txn.open_table(FILES)?;
        load_file(&files, file_id)
    }

    fn load_version(&self, version_id: &str) -> EditorResult<StoredVersion> {
        let read_txn = self.db.begin_read()?;
        let versions = VersionStore::open_read(&read_txn)?;
        versions
            .get(version_id)?
            .ok_or_else(|| EditorError::version_not_found(version_id))
    }

    fn scan<F>(&self, keep: F) -> EditorResult<Vec<StoredFile>>
    where
        F: Fn(&StoredFile) -> bool,
    {
        let read_txn = self.db.begin_read()?;
        let files = read_txn.open_table(FILES)?;

        let mut result = Vec::new();
        for entry in files.iter()? {
            let (_, value) = entry?;
            let file: StoredFile = serde_json::from_slice(value.value())?;
            if keep(&file) {
                result.push(file);
            }
        }
        result.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(result)
    }

    /// Load, modify and store one file in a write transaction.
    fn mutate<F>(&self, file_id: &str, include_deleted: bool, apply: F) -> EditorResult<StoredFile>
    where
        F: FnOnce(&mut StoredFile, DateTime<Utc>),
    {
        let write_txn = self.db.begin_write()?;
        let file = {
            let mut files = write_txn.open_table(FILES)?;
            let mut file = load_file(&files, file_id)?
                .filter(|f| include_deleted || !f.is_deleted)
                .ok_or_else(|| EditorError::file_not_found(file_id))?;
            apply(&mut file, self.clock.now());
            store_file(&mut files, &file)?;
            file
        };
        write_txn.commit()?;
        Ok(file)
    }
}

fn load_file<T>(files: &T, file_id: &str) -> EditorResult<Option<StoredFile>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    match files.get(file_id)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

fn store_file(
    files: &mut Table<'_, &'static str, &'static [u8]>,
    file: &StoredFile,
) -> EditorResult<()> {
    let json = serde_json::to_vec(file)?;
    files.insert(file.id.as_str(), json.as_slice())?;
    Ok(())
}

fn required_field(field: &str, value: &str) -> EditorResult<String> {
    if value.trim().is_empty() {
        return Err(EditorError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

/// `notes.md` → `notes_copy.md`, `Makefile` → `Makefile_copy`.
fn copy_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_copy.{ext}"),
        None => format!("{name}_copy"),
    }
}

/// Replace the last path segment with `name`.
fn sibling_path(path: &str, name: &str) -> String {
    match path.rsplit_once('/') {
        Some((parent, _)) => format!("{parent}/{name}"),
        None => format!("/{name}"),
    }
}
