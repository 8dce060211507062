//! Lifecycle and status of a placement

use crate::remote::RemoteError;
use crate::sync::Channel;

use super::key::PlacementId;

/// Sync state of a loaded placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Memory matches what the durable tiers hold
    Clean,
    /// Memory holds edits not yet acknowledged by the remote
    Dirty,
    /// A remote write is in progress
    Saving,
}

/// Lifecycle phase of a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Loading,
    Ready(SyncState),
}

impl Phase {
    pub fn is_ready(&self) -> bool {
        matches!(self, Phase::Ready(_))
    }
}

/// Where a placement can be persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceMode {
    /// Local cache and remote service
    Remote,
    /// No canonical vendor product yet: local cache only
    LocalOnly,
}

/// Status indicator shown next to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncIndicator {
    Loading,
    Dirty,
    Saving,
    Synchronized,
    Error,
}

impl SyncIndicator {
    pub fn label(&self) -> &'static str {
        match self {
            SyncIndicator::Loading => "loading",
            SyncIndicator::Dirty => "dirty",
            SyncIndicator::Saving => "saving",
            SyncIndicator::Synchronized => "synchronized",
            SyncIndicator::Error => "error",
        }
    }
}

/// Snapshot of a placement's observable state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementStatus {
    pub phase: Phase,
    pub mode: PersistenceMode,
    /// Last error or warning, for display; the transforms stay usable
    pub error: Option<String>,
    /// Timestamp of the in-memory transforms
    pub last_modified: u64,
    /// Timestamp of the last state the remote acknowledged
    pub last_synced: Option<u64>,
    /// Whether a remote write is armed
    pub pending_write: bool,
}

impl PlacementStatus {
    pub fn indicator(&self) -> SyncIndicator {
        match self.phase {
            Phase::Uninitialized | Phase::Loading => SyncIndicator::Loading,
            _ if self.error.is_some() => SyncIndicator::Error,
            Phase::Ready(SyncState::Saving) => SyncIndicator::Saving,
            Phase::Ready(SyncState::Dirty) => SyncIndicator::Dirty,
            Phase::Ready(SyncState::Clean) => SyncIndicator::Synchronized,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.phase == Phase::Ready(SyncState::Clean)
    }

    pub fn is_dirty(&self) -> bool {
        self.phase == Phase::Ready(SyncState::Dirty)
    }
}

/// Result of one remote write attempt
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub placement: PlacementId,
    pub channel: Channel,
    /// Timestamp of the transforms that were sent
    pub sent: u64,
    pub outcome: Result<(), RemoteError>,
}

impl SyncReport {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}
