// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::AuthConfig;
use crate::storage::FileRepository;

#[derive(Clone)]
pub struct AppState {
    pub files: Arc<FileRepository>,
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(files: FileRepository, auth: AuthConfig) -> Self {
        Self {
            files: Arc::new(files),
            auth: Arc::new(auth),
        }
    }
}

#[cfg(test)]
pub(crate) const TEST_SECRET_KEY: &str = "test-secret-key";

/// State backed by a fresh database in a temp directory.
#[cfg(test)]
pub(crate) fn test_state() -> (AppState, tempfile::TempDir) {
    use crate::cipher::ContentCipher;
    use crate::snapshot_policy::SnapshotPolicy;
    use crate::storage::EditorDatabase;

    let dir = tempfile::tempdir().expect("temp dir");
    let db = EditorDatabase::open(&dir.path().join("editor.redb")).expect("open database");
    let cipher = ContentCipher::from_secret("test-encryption-key").expect("cipher");
    let files = FileRepository::new(db, cipher, SnapshotPolicy::default());
    let state = AppState::new(files, AuthConfig::hs256(TEST_SECRET_KEY));
    (state, dir)
}
