// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Version store: append-only ledger of content snapshots per file.
//!
//! A [`VersionStore`] wraps the version tables of one redb transaction.
//! Opened on a write transaction it can append and absorb; opened on a read
//! transaction it only reads. Either way it composes with whatever else the
//! caller does in the same transaction.
//!
//! Versions never change after creation, with one exception: the
//! `operation_count` of a file's latest version, which the snapshot policy
//! bumps when it absorbs an edit.

use chrono::{DateTime, Utc};
use redb::{ReadOnlyTable, ReadTransaction, ReadableTable, Table, WriteTransaction};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cipher::EncryptedContent;
use crate::snapshot_policy::LatestVersion;
use crate::storage::database::{
    make_version_key, version_key_bounds, EditorError, EditorResult, FILE_VERSIONS,
    FILE_VERSION_INDEX,
};

/// Immutable content snapshot of a file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredVersion {
    /// Unique version identifier (UUID)
    pub id: String,
    /// Owning file
    pub file_id: String,
    /// 1-based, strictly increasing per file
    pub version_number: u32,
    /// Independently decryptable snapshot
    pub content_encrypted: EncryptedContent,
    /// Edits absorbed into this version since it was created
    pub operation_count: u32,
    pub created_at: DateTime<Utc>,
}

impl StoredVersion {
    pub fn summary(&self) -> VersionSummary {
        VersionSummary {
            id: self.id.clone(),
            version_number: self.version_number,
            operation_count: self.operation_count,
            created_at: self.created_at,
        }
    }

    pub(crate) fn as_latest(&self) -> LatestVersion {
        LatestVersion {
            created_at: self.created_at,
            operation_count: self.operation_count,
        }
    }
}

/// Version metadata without content.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct VersionSummary {
    /// Version identifier (UUID)
    pub id: String,
    /// Position in the file's history, starting at 1
    pub version_number: u32,
    /// Number of saves coalesced into this version
    pub operation_count: u32,
    /// When the snapshot was taken
    pub created_at: DateTime<Utc>,
}

type VersionTable<'txn> = Table<'txn, &'static str, &'static [u8]>;
type IndexTable<'txn> = Table<'txn, &'static [u8], &'static str>;

/// Version tables of a single transaction.
pub struct VersionStore<V, I> {
    versions: V,
    index: I,
}

impl<'txn> VersionStore<VersionTable<'txn>, IndexTable<'txn>> {
    /// Open the version tables for writing.
    pub fn open_write(txn: &'txn WriteTransaction) -> EditorResult<Self> {
        Ok(Self {
            versions: txn.open_table(FILE_VERSIONS)?,
            index: txn.open_table(FILE_VERSION_INDEX)?,
        })
    }

    /// Append a new version after the file's current latest.
    pub fn append(
        &mut self,
        file_id: &str,
        content: EncryptedContent,
        created_at: DateTime<Utc>,
    ) -> EditorResult<StoredVersion> {
        let version_number = match self.latest(file_id)? {
            Some(latest) => latest.version_number.checked_add(1).ok_or_else(|| {
                EditorError::Conflict(format!("File {file_id} has exhausted version numbers"))
            })?,
            None => 1,
        };

        let key = make_version_key(file_id, version_number);
        if self.index.get(key.as_slice())?.is_some() {
            return Err(EditorError::Conflict(format!(
                "File {file_id} already has version {version_number}"
            )));
        }

        let version = StoredVersion {
            id: Uuid::new_v4().to_string(),
            file_id: file_id.to_string(),
            version_number,
            content_encrypted: content,
            operation_count: 0,
            created_at,
        };

        let json = serde_json::to_vec(&version)?;
        self.versions.insert(version.id.as_str(), json.as_slice())?;
        self.index.insert(key.as_slice(), version.id.as_str())?;
        Ok(version)
    }

    /// Count one more edit against the given (latest) version.
    pub fn absorb(&mut self, mut latest: StoredVersion) -> EditorResult<StoredVersion> {
        latest.operation_count = latest.operation_count.saturating_add(1);
        let json = serde_json::to_vec(&latest)?;
        self.versions.insert(latest.id.as_str(), json.as_slice())?;
        Ok(latest)
    }

    /// Delete every version of a file. Returns how many were removed.
    pub fn remove_all(&mut self, file_id: &str) -> EditorResult<usize> {
        let entries = self.index_entries(file_id)?;
        for (key, version_id) in &entries {
            self.index.remove(key.as_slice())?;
            self.versions.remove(version_id.as_str())?;
        }
        Ok(entries.len())
    }
}

impl VersionStore<ReadOnlyTable<&'static str, &'static [u8]>, ReadOnlyTable<&'static [u8], &'static str>> {
    /// Open the version tables for reading.
    pub fn open_read(txn: &ReadTransaction) -> EditorResult<Self> {
        Ok(Self {
            versions: txn.open_table(FILE_VERSIONS)?,
            index: txn.open_table(FILE_VERSION_INDEX)?,
        })
    }
}

impl<V, I> VersionStore<V, I>
where
    V: ReadableTable<&'static str, &'static [u8]>,
    I: ReadableTable<&'static [u8], &'static str>,
{
    /// Look up a version by id.
    pub fn get(&self, version_id: &str) -> EditorResult<Option<StoredVersion>> {
        match self.versions.get(version_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// The file's highest-numbered version.
    pub fn latest(&self, file_id: &str) -> EditorResult<Option<StoredVersion>> {
        let (start, end) = version_key_bounds(file_id);
        let version_id = {
            let mut range = self.index.range(start.as_slice()..=end.as_slice())?;
            match range.next_back().transpose()? {
                Some((_, id)) => id.value().to_string(),
                None => return Ok(None),
            }
        };
        self.get(&version_id)?
            .map(Some)
            .ok_or_else(|| missing_row(file_id, &version_id))
    }

    /// All versions of a file, newest first.
    pub fn list(&self, file_id: &str) -> EditorResult<Vec<StoredVersion>> {
        let mut versions = Vec::new();
        for (_, version_id) in self.index_entries(file_id)?.into_iter().rev() {
            let version = self
                .get(&version_id)?
                .ok_or_else(|| missing_row(file_id, &version_id))?;
            versions.push(version);
        }
        Ok(versions)
    }

    /// `(index_key, version_id)` pairs for a file, oldest first.
    fn index_entries(&self, file_id: &str) -> EditorResult<Vec<(Vec<u8>, String)>> {
        let (start, end) = version_key_bounds(file_id);
        let mut entries = Vec::new();
        for entry in self.index.range(start.as_slice()..=end.as_slice())? {
            let (key, id) = entry?;
            entries.push((key.value().to_vec(), id.value().to_string()));
        }
        Ok(entries)
    }
}

fn missing_row(file_id: &str, version_id: &str) -> EditorError {
    EditorError::Corrupt(format!(
        "version index of file {file_id} points at missing version {version_id}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::EditorDatabase;
    use chrono::Duration;

    fn temp_db() -> (EditorDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = EditorDatabase::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn token(s: &str) -> EncryptedContent {
        EncryptedContent::from_token(s)
    }

    #[test]
    fn append_numbers_versions_from_one() {
        let (db, _dir) = temp_db();
        let now = Utc::now();

        let txn = db.begin_write().unwrap();
        {
            let mut store = VersionStore::open_write(&txn).unwrap();
            let v1 = store.append("file-1", token("a"), now).unwrap();
            let v2 = store.append("file-1", token("b"), now).unwrap();
            let other = store.append("file-2", token("c"), now).unwrap();

            assert_eq!(v1.version_number, 1);
            assert_eq!(v2.version_number, 2);
            assert_eq!(other.version_number, 1);
            assert_eq!(v1.operation_count, 0);
        }
        txn.commit().unwrap();
    }

    #[test]
    fn list_is_newest_first_and_scoped_to_file() {
        let (db, _dir) = temp_db();
        let now = Utc::now();

        let txn = db.begin_write().unwrap();
        {
            let mut store = VersionStore::open_write(&txn).unwrap();
            for i in 0..12 {
                store
                    .append("file-1", token(&format!("t{i}")), now + Duration::seconds(i))
                    .unwrap();
            }
            store.append("file-2", token("x"), now).unwrap();
        }
        txn.commit().unwrap();

        let read = db.begin_read().unwrap();
        let store = VersionStore::open_read(&read).unwrap();
        let numbers: Vec<u32> = store
            .list("file-1")
            .unwrap()
            .iter()
            .map(|v| v.version_number)
            .collect();
        assert_eq!(numbers, (1..=12).rev().collect::<Vec<_>>());

        let latest = store.latest("file-1").unwrap().unwrap();
        assert_eq!(latest.version_number, 12);
        assert!(store.latest("file-3").unwrap().is_none());
    }

    #[test]
    fn absorb_increments_only_the_counter() {
        let (db, _dir) = temp_db();
        let now = Utc::now();

        let txn = db.begin_write().unwrap();
        {
            let mut store = VersionStore::open_write(&txn).unwrap();
            let v1 = store.append("file-1", token("a"), now).unwrap();
            let absorbed = store.absorb(v1.clone()).unwrap();
            assert_eq!(absorbed.operation_count, 1);

            let reloaded = store.get(&v1.id).unwrap().unwrap();
            assert_eq!(reloaded.operation_count, 1);
            assert_eq!(reloaded.content_encrypted, v1.content_encrypted);
            assert_eq!(reloaded.version_number, 1);
        }
        txn.commit().unwrap();
    }

    #[test]
    fn remove_all_clears_rows_and_index() {
        let (db, _dir) = temp_db();
        let now = Utc::now();

        let txn = db.begin_write().unwrap();
        let kept_id;
        {
            let mut store = VersionStore::open_write(&txn).unwrap();
            store.append("file-1", token("a"), now).unwrap();
            store.append("file-1", token("b"), now).unwrap();
            kept_id = store.append("file-2", token("c"), now).unwrap().id;

            assert_eq!(store.remove_all("file-1").unwrap(), 2);
            assert!(store.list("file-1").unwrap().is_empty());
            assert!(store.latest("file-1").unwrap().is_none());
        }
        txn.commit().unwrap();

        let read = db.begin_read().unwrap();
        let store = VersionStore::open_read(&read).unwrap();
        assert!(store.get(&kept_id).unwrap().is_some());
    }

    #[test]
    fn append_refuses_an_occupied_index_slot() {
        let (db, _dir) = temp_db();
        let now = Utc::now();

        let txn = db.begin_write().unwrap();
        {
            let mut store = VersionStore::open_write(&txn).unwrap();
            let v1 = store.append("file-1", token("a"), now).unwrap();

            // Slot 2 is already claimed, so the next append would collide.
            let taken = make_version_key("file-1", 2);
            store.index.insert(taken.as_slice(), v1.id.as_str()).unwrap();

            let err = store.append("file-1", token("b"), now).unwrap_err();
            assert!(matches!(err, EditorError::Conflict(_)), "got {err:?}");
        }
    }

    #[test]
    fn append_fails_when_version_numbers_run_out() {
        let (db, _dir) = temp_db();
        let now = Utc::now();

        let txn = db.begin_write().unwrap();
        {
            let mut store = VersionStore::open_write(&txn).unwrap();
            let last = StoredVersion {
                id: "last".to_string(),
                file_id: "file-1".to_string(),
                version_number: u32::MAX,
                content_encrypted: token("a"),
                operation_count: 0,
                created_at: now,
            };
            let json = serde_json::to_vec(&last).unwrap();
            store.versions.insert("last", json.as_slice()).unwrap();
            store
                .index
                .insert(make_version_key("file-1", u32::MAX).as_slice(), "last")
                .unwrap();

            let err = store.append("file-1", token("b"), now).unwrap_err();
            assert!(matches!(err, EditorError::Conflict(_)), "got {err:?}");
            assert_eq!(store.list("file-1").unwrap().len(), 1);
        }
    }

    #[test]
    fn list_reports_index_entries_without_rows() {
        let (db, _dir) = temp_db();

        let txn = db.begin_write().unwrap();
        {
            let mut store = VersionStore::open_write(&txn).unwrap();
            let v1 = store.append("file-1", token("a"), Utc::now()).unwrap();
            store.versions.remove(v1.id.as_str()).unwrap();

            let err = store.list("file-1").unwrap_err();
            assert!(matches!(err, EditorError::Corrupt(_)), "got {err:?}");
            assert!(matches!(
                store.latest("file-1"),
                Err(EditorError::Corrupt(_))
            ));
        }
    }

    #[test]
    fn uncommitted_appends_are_discarded() {
        let (db, _dir) = temp_db();

        {
            let txn = db.begin_write().unwrap();
            let mut store = VersionStore::open_write(&txn).unwrap();
            store.append("file-1", token("a"), Utc::now()).unwrap();
            // dropped without commit
        }

        let read = db.begin_read().unwrap();
        let store = VersionStore::open_read(&read).unwrap();
        assert!(store.latest("file-1").unwrap().is_none());
    }
}
