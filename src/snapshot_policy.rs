// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Snapshot Policy
//!
//! Decides, on every save, whether the new content becomes a new version or
//! is absorbed into the latest version's operation counter.
//!
//! A new version is created when the first of these holds:
//!
//! 1. the caller forces a snapshot (restores always do),
//! 2. the file has no version yet,
//! 3. the latest version is at least `interval` old,
//! 4. the latest version has absorbed `max_operations` edits.
//!
//! Otherwise the edit is absorbed. A snapshot is therefore never more than
//! `interval` or `max_operations` edits stale.
//!
//! The decision is a pure function. Applying it atomically with the file-row
//! update is the repository's job.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::SnapshotSettings;

/// Why a save produced a new version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotReason {
    Forced,
    NoPriorVersion,
    IntervalElapsed,
    OperationLimit,
}

impl std::fmt::Display for SnapshotReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SnapshotReason::Forced => "forced",
            SnapshotReason::NoPriorVersion => "no_prior_version",
            SnapshotReason::IntervalElapsed => "interval_elapsed",
            SnapshotReason::OperationLimit => "operation_limit",
        };
        f.write_str(s)
    }
}

/// Outcome of [`SnapshotPolicy::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotDecision {
    /// Append a new version holding the saved content.
    Create(SnapshotReason),
    /// Increment the latest version's operation count instead.
    Absorb,
}

/// The parts of the latest version the policy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestVersion {
    pub created_at: DateTime<Utc>,
    pub operation_count: u32,
}

/// Debounce policy for version snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotPolicy {
    interval: chrono::Duration,
    max_operations: u32,
}

impl SnapshotPolicy {
    pub fn new(settings: SnapshotSettings) -> Self {
        Self {
            interval: chrono::Duration::from_std(settings.interval)
                .unwrap_or(chrono::Duration::MAX),
            max_operations: settings.max_operations,
        }
    }

    pub fn decide(
        &self,
        force: bool,
        latest: Option<LatestVersion>,
        now: DateTime<Utc>,
    ) -> SnapshotDecision {
        if force {
            return SnapshotDecision::Create(SnapshotReason::Forced);
        }

        let Some(latest) = latest else {
            return SnapshotDecision::Create(SnapshotReason::NoPriorVersion);
        };

        if now - latest.created_at >= self.interval {
            return SnapshotDecision::Create(SnapshotReason::IntervalElapsed);
        }

        if latest.operation_count >= self.max_operations {
            return SnapshotDecision::Create(SnapshotReason::OperationLimit);
        }

        SnapshotDecision::Absorb
    }
}

impl Default for SnapshotPolicy {
    fn default() -> Self {
        Self::new(SnapshotSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn policy(interval_secs: u64, max_operations: u32) -> SnapshotPolicy {
        SnapshotPolicy::new(SnapshotSettings {
            interval: std::time::Duration::from_secs(interval_secs),
            max_operations,
        })
    }

    fn latest(age_secs: i64, operation_count: u32, now: DateTime<Utc>) -> Option<LatestVersion> {
        Some(LatestVersion {
            created_at: now - Duration::seconds(age_secs),
            operation_count,
        })
    }

    #[test]
    fn force_wins_over_everything() {
        let now = Utc::now();
        assert_eq!(
            policy(60, 10).decide(true, latest(0, 0, now), now),
            SnapshotDecision::Create(SnapshotReason::Forced)
        );
    }

    #[test]
    fn missing_latest_creates() {
        let now = Utc::now();
        assert_eq!(
            policy(60, 10).decide(false, None, now),
            SnapshotDecision::Create(SnapshotReason::NoPriorVersion)
        );
    }

    #[test]
    fn fresh_version_under_limit_absorbs() {
        let now = Utc::now();
        assert_eq!(
            policy(60, 10).decide(false, latest(5, 9, now), now),
            SnapshotDecision::Absorb
        );
    }

    #[test]
    fn interval_boundary_is_inclusive() {
        let now = Utc::now();
        let p = policy(60, 10);
        assert_eq!(p.decide(false, latest(59, 0, now), now), SnapshotDecision::Absorb);
        assert_eq!(
            p.decide(false, latest(60, 0, now), now),
            SnapshotDecision::Create(SnapshotReason::IntervalElapsed)
        );
    }

    #[test]
    fn operation_limit_boundary_is_inclusive() {
        let now = Utc::now();
        let p = policy(60, 3);
        assert_eq!(p.decide(false, latest(1, 2, now), now), SnapshotDecision::Absorb);
        assert_eq!(
            p.decide(false, latest(1, 3, now), now),
            SnapshotDecision::Create(SnapshotReason::OperationLimit)
        );
    }

    #[test]
    fn elapsed_interval_ignores_operation_count() {
        let now = Utc::now();
        assert_eq!(
            policy(60, 10).decide(false, latest(120, 0, now), now),
            SnapshotDecision::Create(SnapshotReason::IntervalElapsed)
        );
    }

    #[test]
    fn zero_max_operations_snapshots_every_save() {
        let now = Utc::now();
        assert_eq!(
            policy(60, 0).decide(false, latest(0, 0, now), now),
            SnapshotDecision::Create(SnapshotReason::OperationLimit)
        );
    }
}
