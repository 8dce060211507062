//! Which tier wins on load, and how long writes wait

use std::time::Duration;

use crate::config::PlacementConfig;

/// Remote write path for a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    /// Primary (index 0) position through the direct position endpoint
    Isolated,
    /// Every index through the batch transforms endpoint
    Batch,
}

/// Debounce delays per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncePolicy {
    pub batch: Duration,
    pub isolated: Duration,
}

impl DebouncePolicy {
    pub fn from_config(config: &PlacementConfig) -> Self {
        Self {
            batch: config.debounce,
            isolated: config.isolated_debounce,
        }
    }

    pub fn delay(&self, channel: Channel) -> Duration {
        match channel {
            Channel::Isolated => self.isolated,
            Channel::Batch => self.batch,
        }
    }

    /// Deadline for a write on `channel` scheduled at `now`
    pub fn due_at(&self, channel: Channel, now: u64) -> u64 {
        now + self.delay(channel).as_millis() as u64
    }
}

/// What one tier knows about a placement at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freshness {
    /// Last modification, when recorded
    pub last_modified: Option<u64>,
    /// Local edits not yet acknowledged by the remote
    pub dirty: bool,
}

impl Freshness {
    pub fn at(last_modified: u64) -> Self {
        Self {
            last_modified: Some(last_modified),
            dirty: false,
        }
    }

    pub fn dirty(mut self) -> Self {
        self.dirty = true;
        self
    }
}

/// Outcome of reconciling the local cache against the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Local,
    Remote,
    /// Neither tier has data; start from the default transform
    Neither,
}

/// Pick the tier whose data the placement starts from.
///
/// The newer timestamp wins; ties go to the remote. A remote record without
/// a timestamp wins unless the local copy holds unsaved edits.
pub fn reconcile(local: Option<Freshness>, remote: Option<Freshness>) -> Winner {
    match (local, remote) {
        (None, None) => Winner::Neither,
        (Some(_), None) => Winner::Local,
        (None, Some(_)) => Winner::Remote,
        (Some(local), Some(remote)) => match remote.last_modified {
            None if local.dirty => Winner::Local,
            None => Winner::Remote,
            Some(remote_ts) => {
                if local.last_modified.unwrap_or(0) > remote_ts {
                    Winner::Local
                } else {
                    Winner::Remote
                }
            }
        },
    }
}

/// A completed write for `sent` is stale when memory has moved past it
pub fn is_stale(sent: u64, current: u64) -> bool {
    current > sent
}
