// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the editor database.
//!
//! [`FileRepository`] is the entry point for every file operation. It uses
//! [`VersionStore`] inside its own transactions; the version store is public
//! for callers that need to compose reads with other table access.

pub mod files;
pub mod versions;

pub use files::{
    FileMetadataUpdate, FileRepository, ImportEntry, ImportReport, NewFile, SaveOutcome,
    StoredFile, DEFAULT_ENCODING, DEFAULT_LANGUAGE,
};
pub use versions::{StoredVersion, VersionStore, VersionSummary};
