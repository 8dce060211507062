//! Three-tier transform store
//!
//! Memory is authoritative for what is on screen. Every edit lands in memory
//! and in the local cache before the call returns; the remote write is
//! debounced and sent when the owner pumps [`TransformStore::poll`] (or asks
//! for [`TransformStore::save_now`]).
//!
//! Remote trouble never escapes as an `Err`: a 404 is "nothing saved yet", a
//! 403 goes through the identifier auto-fix and otherwise becomes a status
//! message, timeouts and network failures fall back to the local cache.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::config::PlacementConfig;
use crate::geometry::{constrain_transform, Size, Transform, TransformPatch};
use crate::migration::diagnostic::find_substitute;
use crate::remote::{RemoteError, TransformBackend, TransformBatch};
use crate::resolver::{IdMappingCache, IdPair, IdResolver};
use crate::storage::{
    read_json, write_json, CachedPosition, CachedTransforms, LocalStore, PositionRecord,
};
use crate::sync::{
    is_stale, reconcile, Channel, Clock, DebouncePolicy, Freshness, SystemClock, Winner,
    WriteQueue,
};

use super::error::StoreError;
use super::key::{PlacementId, PlacementKey};
use super::state::{Phase, PersistenceMode, PlacementStatus, SyncReport, SyncState};

/// In-memory state of one placement
#[derive(Debug, Clone)]
struct Placement {
    key: PlacementKey,
    phase: Phase,
    transforms: BTreeMap<usize, Transform>,
    modified_at: u64,
    synced_at: Option<u64>,
    error: Option<String>,
}

impl Placement {
    fn new(key: PlacementKey) -> Self {
        Self {
            key,
            phase: Phase::Uninitialized,
            transforms: BTreeMap::new(),
            modified_at: 0,
            synced_at: None,
            error: None,
        }
    }

    fn mode(&self) -> PersistenceMode {
        if self.key.is_remote() {
            PersistenceMode::Remote
        } else {
            PersistenceMode::LocalOnly
        }
    }

    /// Remote channels this placement can write through
    fn channels(&self) -> Vec<Channel> {
        let mut channels = Vec::new();
        if self.key.remote_pair().is_some() {
            channels.push(Channel::Isolated);
        }
        if self.key.vendor_product_id.is_some() && self.key.design_url.is_some() {
            channels.push(Channel::Batch);
        }
        channels
    }
}

/// Data read from one tier during loading
#[derive(Debug, Clone, Default)]
struct Snapshot {
    transforms: BTreeMap<usize, Transform>,
    last_modified: Option<u64>,
    dirty: bool,
}

impl Snapshot {
    fn freshness(&self) -> Freshness {
        Freshness {
            last_modified: self.last_modified,
            dirty: self.dirty,
        }
    }
}

/// How the remote answered during loading
enum RemoteLoad {
    /// The remote answered (possibly with nothing saved)
    Answered(Option<Snapshot>),
    /// The batch arrived but the position lookup failed
    Partial(Snapshot),
    /// The remote could not be consulted; local data is used instead
    Unavailable,
}

/// Transform store for one session.
///
/// Owns its identifier-mapping cache and write queue; dropping the store (or
/// calling [`TransformStore::clear`] on logout) discards both.
pub struct TransformStore<B, L, C = SystemClock> {
    config: PlacementConfig,
    resolver: IdResolver,
    debounce: DebouncePolicy,
    backend: B,
    local: L,
    clock: C,
    placements: BTreeMap<PlacementId, Placement>,
    queue: WriteQueue<(PlacementId, Channel)>,
    mappings: IdMappingCache,
}

impl<B: TransformBackend, L: LocalStore> TransformStore<B, L, SystemClock> {
    pub fn new(config: PlacementConfig, backend: B, local: L) -> Self {
        Self::with_clock(config, backend, local, SystemClock)
    }
}

impl<B: TransformBackend, L: LocalStore, C: Clock> TransformStore<B, L, C> {
    pub fn with_clock(config: PlacementConfig, backend: B, local: L, clock: C) -> Self {
        Self {
            resolver: IdResolver::new(config.vendor_id_threshold),
            debounce: DebouncePolicy::from_config(&config),
            config,
            backend,
            local,
            clock,
            placements: BTreeMap::new(),
            queue: WriteQueue::new(),
            mappings: IdMappingCache::new(),
        }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn resolver(&self) -> &IdResolver {
        &self.resolver
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut L {
        &mut self.local
    }

    pub fn mappings(&self) -> &IdMappingCache {
        &self.mappings
    }

    /// Earliest armed remote write deadline, for scheduling the next [`poll`](Self::poll)
    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.next_deadline()
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Open a placement and load it from the local cache and the remote.
    ///
    /// Opening an already loaded placement returns its handle unchanged.
    pub fn open(&mut self, key: PlacementKey) -> Result<PlacementId, StoreError> {
        let key = self.normalize_key(key);
        let id = key.id().ok_or_else(|| {
            StoreError::invalid_key(
                "need (vendor, base product, design) or (product, design url) to persist locally",
            )
        })?;

        if self
            .placements
            .get(&id)
            .is_some_and(|p| p.phase.is_ready())
        {
            return Ok(id);
        }

        self.placements.insert(id.clone(), Placement::new(key));
        self.hydrate(&id, false)?;
        Ok(id)
    }

    /// Discard memory and pending writes and load again.
    ///
    /// Whatever the remote answers replaces the local cache; only when the
    /// remote cannot be reached is the local cache used.
    pub fn reload(&mut self, id: &PlacementId) -> Result<(), StoreError> {
        self.placement(id)?;
        self.queue.cancel(&(id.clone(), Channel::Isolated));
        self.queue.cancel(&(id.clone(), Channel::Batch));
        self.hydrate(id, true)
    }

    /// A vendor product ID below the threshold is not usable remotely
    fn normalize_key(&self, mut key: PlacementKey) -> PlacementKey {
        if let Some(vp) = key.vendor_product_id {
            if !self.resolver.is_vendor_scoped(vp) {
                debug!(vendor_product_id = vp, "not vendor-scoped, using conception mode");
                key.vendor_product_id = None;
                key.base_product_id.get_or_insert(vp);
            }
        }
        key
    }

    fn hydrate(&mut self, id: &PlacementId, prefer_remote: bool) -> Result<(), StoreError> {
        let key = {
            let placement = self.placement_mut(id)?;
            placement.phase = Phase::Loading;
            placement.error = None;
            placement.key.clone()
        };
        debug!(placement = %id, "loading");

        let local = self.read_local(&key);
        let remote = if key.is_remote() {
            self.load_remote(id, &key)
        } else {
            RemoteLoad::Unavailable
        };

        let (answered, remote) = match remote {
            RemoteLoad::Answered(snapshot) => (true, snapshot),
            RemoteLoad::Partial(snapshot) => (false, Some(snapshot)),
            RemoteLoad::Unavailable => (false, None),
        };
        let winner = if prefer_remote && remote.is_some() {
            Winner::Remote
        } else {
            reconcile(
                local.as_ref().map(Snapshot::freshness),
                remote.as_ref().map(Snapshot::freshness),
            )
        };

        let now = self.clock.now_millis();
        let (snapshot, needs_upload) = match winner {
            Winner::Remote => (remote.unwrap_or_default(), false),
            Winner::Local => {
                let snapshot = local.unwrap_or_default();
                // The remote answered with nothing or something older
                let upload = key.is_remote() && (snapshot.dirty || answered);
                (snapshot, upload)
            }
            Winner::Neither => (Snapshot::default(), false),
        };
        debug!(placement = %id, ?winner, needs_upload, "loaded");

        let modified_at = match winner {
            Winner::Neither => 0,
            _ => snapshot.last_modified.unwrap_or(now),
        };
        let placement = self.placement_mut(id)?;
        placement.transforms = snapshot.transforms;
        placement.modified_at = modified_at;
        placement.synced_at = (answered && !needs_upload).then_some(modified_at);
        placement.phase = Phase::Ready(if needs_upload {
            SyncState::Dirty
        } else {
            SyncState::Clean
        });

        if winner == Winner::Remote {
            self.write_local(id, false)?;
        }
        if needs_upload {
            self.schedule_writes(id, now)?;
        }
        Ok(())
    }

    fn read_local(&mut self, key: &PlacementKey) -> Option<Snapshot> {
        let batch: Option<CachedTransforms> = key
            .transforms_key()
            .and_then(|k| read_json(&mut self.local, &k));
        let position: Option<CachedPosition> = key
            .position_key()
            .and_then(|k| read_json(&mut self.local, &k));

        let mut snapshot = match &batch {
            Some(cached) => Snapshot {
                transforms: cached.transforms.clone(),
                last_modified: Some(cached.last_modified),
                dirty: cached.is_dirty,
            },
            None if position.is_none() => return None,
            None => Snapshot::default(),
        };

        if let Some(position) = position {
            let batch_ts = batch.as_ref().map_or(0, |b| b.last_modified);
            if batch.is_none() || position.timestamp >= batch_ts {
                snapshot.transforms.insert(0, position.position);
                snapshot.last_modified = Some(position.timestamp.max(batch_ts));
            }
        }

        Some(snapshot)
    }

    fn load_remote(&mut self, id: &PlacementId, key: &PlacementKey) -> RemoteLoad {
        let mut snapshot: Option<Snapshot> = None;

        if let Some(vp) = key.vendor_product_id {
            let pair = IdPair::new(vp, key.design_id.unwrap_or_default());
            match self.call_remote(key, pair, |backend, pair| {
                backend.load_transforms(pair.vendor_product_id)
            }) {
                Ok(Some(batch))
                    if key
                        .design_url
                        .as_deref()
                        .is_some_and(|url| url != batch.design_url) =>
                {
                    debug!(placement = %id, "remote transforms belong to another design");
                }
                Ok(Some(batch)) => {
                    snapshot = Some(Snapshot {
                        transforms: batch.transforms,
                        last_modified: (batch.last_modified > 0).then_some(batch.last_modified),
                        dirty: false,
                    });
                }
                Ok(None) => {}
                Err(e) => return self.remote_unavailable(id, e),
            }
        }

        if let Some(pair) = key.remote_pair() {
            match self.call_remote(key, pair, |backend, pair| backend.load_position(pair)) {
                Ok(Some(record)) => {
                    let entry = snapshot.get_or_insert_with(Snapshot::default);
                    let batch_ts = entry.last_modified.unwrap_or(0);
                    let position_ts = record.timestamp.unwrap_or(0);
                    if record.timestamp.is_none() || position_ts >= batch_ts {
                        entry.transforms.insert(0, record.transform);
                    }
                    entry.last_modified = match (entry.last_modified, record.timestamp) {
                        (None, None) => None,
                        (a, b) => Some(a.unwrap_or(0).max(b.unwrap_or(0))),
                    };
                }
                Ok(None) => {}
                Err(e) => {
                    let unavailable = self.remote_unavailable(id, e);
                    return snapshot.map_or(unavailable, RemoteLoad::Partial);
                }
            }
        }

        RemoteLoad::Answered(snapshot)
    }

    fn remote_unavailable(&mut self, id: &PlacementId, error: RemoteError) -> RemoteLoad {
        match &error {
            RemoteError::Permission { .. } => {
                warn!(placement = %id, %error, "remote rejected identifiers, using local data");
                if let Some(placement) = self.placements.get_mut(id) {
                    placement.error = Some(error.to_string());
                }
            }
            _ if error.is_expected() => {
                debug!(placement = %id, %error, "remote unavailable, using local data");
            }
            _ => {
                warn!(placement = %id, %error, "remote load failed, using local data");
            }
        }
        RemoteLoad::Unavailable
    }

    // ========================================================================
    // Reading
    // ========================================================================

    pub fn status(&self, id: &PlacementId) -> Result<PlacementStatus, StoreError> {
        let placement = self.placement(id)?;
        Ok(PlacementStatus {
            phase: placement.phase,
            mode: placement.mode(),
            error: placement.error.clone(),
            last_modified: placement.modified_at,
            last_synced: placement.synced_at,
            pending_write: self.queue.is_pending(&(id.clone(), Channel::Isolated))
                || self.queue.is_pending(&(id.clone(), Channel::Batch)),
        })
    }

    /// Transform at `index`, or the default transform if none was set
    pub fn transform(&self, id: &PlacementId, index: usize) -> Result<Transform, StoreError> {
        Ok(self
            .placement(id)?
            .transforms
            .get(&index)
            .copied()
            .unwrap_or_default())
    }

    pub fn transforms(&self, id: &PlacementId) -> Result<&BTreeMap<usize, Transform>, StoreError> {
        Ok(&self.placement(id)?.transforms)
    }

    pub fn key(&self, id: &PlacementId) -> Result<&PlacementKey, StoreError> {
        Ok(&self.placement(id)?.key)
    }

    pub fn placement_ids(&self) -> impl Iterator<Item = &PlacementId> {
        self.placements.keys()
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Apply a partial update to the transform at `index`
    pub fn update_transform(
        &mut self,
        id: &PlacementId,
        index: usize,
        patch: TransformPatch,
    ) -> Result<Transform, StoreError> {
        let next = self.transform(id, index)?.apply(&patch);
        self.set_transform(id, index, next)?;
        Ok(next)
    }

    /// Apply a drag/resize update, clamped so the design stays in its zone.
    ///
    /// `zone` is the delimitation's on-screen size and `intrinsic` the design
    /// image's natural size, when known.
    pub fn drag(
        &mut self,
        id: &PlacementId,
        index: usize,
        patch: TransformPatch,
        zone: Size,
        intrinsic: Option<Size>,
    ) -> Result<Transform, StoreError> {
        let candidate = self.transform(id, index)?.apply(&patch);
        let accepted = constrain_transform(&candidate, zone, intrinsic);
        self.set_transform(id, index, accepted)?;
        Ok(accepted)
    }

    /// Replace the transform at `index`
    pub fn set_transform(
        &mut self,
        id: &PlacementId,
        index: usize,
        transform: Transform,
    ) -> Result<(), StoreError> {
        let now = self.clock.now_millis();
        let placement = self.placement_mut(id)?;
        placement.transforms.insert(index, transform);
        // Strictly increasing, so a later edit never loses a timestamp race
        placement.modified_at = now.max(placement.modified_at + 1);
        let remote = placement.key.is_remote();
        placement.phase = Phase::Ready(if remote {
            SyncState::Dirty
        } else {
            SyncState::Clean
        });

        if remote {
            self.schedule_writes(id, now)?;
        }
        self.persist_edit(id, remote)
    }

    /// Write a zeroed transform at `index` through every tier
    pub fn reset_transform(&mut self, id: &PlacementId, index: usize) -> Result<(), StoreError> {
        info!(placement = %id, index, "resetting transform");
        self.set_transform(id, index, Transform::default())
    }

    /// Promote a conception-mode placement once the vendor product exists.
    ///
    /// Every transform entered so far is written to the new vendor product.
    pub fn attach_vendor_product(
        &mut self,
        id: &PlacementId,
        vendor_product_id: u64,
    ) -> Result<(), StoreError> {
        if !self.resolver.is_vendor_scoped(vendor_product_id) {
            return Err(StoreError::NotVendorScoped {
                id: vendor_product_id,
                threshold: self.resolver.threshold(),
            });
        }

        let now = self.clock.now_millis();
        let placement = self.placement_mut(id)?;
        placement.key.vendor_product_id = Some(vendor_product_id);
        placement.modified_at = now.max(placement.modified_at + 1);
        placement.synced_at = None;
        placement.phase = Phase::Ready(SyncState::Dirty);
        info!(placement = %id, vendor_product_id, "attached vendor product");

        self.schedule_writes(id, now)?;
        self.persist_edit(id, true)
    }

    /// Cache an edit locally. A failure is surfaced on the status while the
    /// remote write, already armed, still goes out.
    fn persist_edit(&mut self, id: &PlacementId, dirty: bool) -> Result<(), StoreError> {
        let Err(error) = self.write_local(id, dirty) else {
            return Ok(());
        };
        warn!(placement = %id, %error, "could not cache edit locally");
        if let Some(placement) = self.placements.get_mut(id) {
            placement.error = Some(error.to_string());
        }
        Err(error)
    }

    // ========================================================================
    // Remote writes
    // ========================================================================

    fn schedule_writes(&mut self, id: &PlacementId, now: u64) -> Result<(), StoreError> {
        for channel in self.placement(id)?.channels() {
            self.queue
                .schedule((id.clone(), channel), self.debounce.due_at(channel, now));
        }
        Ok(())
    }

    /// Send every remote write whose debounce has elapsed
    pub fn poll(&mut self) -> Vec<SyncReport> {
        let now = self.clock.now_millis();
        self.queue
            .take_due(now)
            .into_iter()
            .map(|(id, channel)| self.run_write(id, channel))
            .collect()
    }

    /// Send the placement's state now, bypassing the debounce
    pub fn save_now(&mut self, id: &PlacementId) -> Result<Vec<SyncReport>, StoreError> {
        let now = self.clock.now_millis();
        let mut reports = Vec::new();
        for channel in self.placement(id)?.channels() {
            let slot = (id.clone(), channel);
            if self.queue.take_now(&slot, now) {
                reports.push(self.run_write(id.clone(), channel));
            }
        }
        Ok(reports)
    }

    /// Send everything that is armed, regardless of deadlines
    pub fn flush(&mut self) -> Vec<SyncReport> {
        let ids: Vec<PlacementId> = self
            .placements
            .iter()
            .filter(|(_, p)| p.phase == Phase::Ready(SyncState::Dirty))
            .map(|(id, _)| id.clone())
            .collect();
        ids.iter()
            .filter_map(|id| self.save_now(id).ok())
            .flatten()
            .collect()
    }

    fn run_write(&mut self, id: PlacementId, channel: Channel) -> SyncReport {
        let slot = (id.clone(), channel);
        let Some(placement) = self.placements.get_mut(&id) else {
            self.queue.complete(&slot);
            return SyncReport {
                placement: id.clone(),
                channel,
                sent: 0,
                outcome: Err(RemoteError::unresolved(format!("placement {id} is closed"))),
            };
        };

        placement.phase = Phase::Ready(SyncState::Saving);
        let key = placement.key.clone();
        let sent = placement.modified_at;
        let transforms = placement.transforms.clone();

        let outcome = match channel {
            Channel::Isolated => self.send_position(&key, &transforms, sent),
            Channel::Batch => self.send_batch(&key, transforms, sent),
        };
        let rearmed = self.queue.complete(&slot);

        let other = (id.clone(), other_channel(channel));
        let other_busy = self.queue.is_pending(&other) || self.queue.is_in_flight(&other);

        let Some(placement) = self.placements.get_mut(&id) else {
            return SyncReport {
                placement: id,
                channel,
                sent,
                outcome,
            };
        };
        match &outcome {
            Ok(()) => {
                debug!(placement = %id, ?channel, sent, "remote write acknowledged");
                if is_stale(sent, placement.modified_at) || rearmed || other_busy {
                    placement.phase = Phase::Ready(SyncState::Dirty);
                } else {
                    placement.phase = Phase::Ready(SyncState::Clean);
                    placement.synced_at = Some(sent);
                    placement.error = None;
                }
            }
            Err(error) => {
                warn!(placement = %id, ?channel, %error, "remote write failed");
                placement.phase = Phase::Ready(SyncState::Dirty);
                placement.error = Some(error.to_string());
            }
        }

        if placement.phase == Phase::Ready(SyncState::Clean) {
            if let Err(e) = self.write_local(&id, false) {
                warn!(placement = %id, error = %e, "could not clear dirty flag in local cache");
            }
        }

        SyncReport {
            placement: id,
            channel,
            sent,
            outcome,
        }
    }

    fn send_position(
        &mut self,
        key: &PlacementKey,
        transforms: &BTreeMap<usize, Transform>,
        sent: u64,
    ) -> Result<(), RemoteError> {
        let pair = key
            .remote_pair()
            .ok_or_else(|| RemoteError::unresolved("no vendor product or design id"))?;
        let record = PositionRecord::new(transforms.get(&0).copied().unwrap_or_default(), sent);
        self.call_remote(key, pair, |backend, pair| backend.save_position(pair, &record))
    }

    fn send_batch(
        &mut self,
        key: &PlacementKey,
        transforms: BTreeMap<usize, Transform>,
        sent: u64,
    ) -> Result<(), RemoteError> {
        let vp = key
            .vendor_product_id
            .ok_or_else(|| RemoteError::unresolved("no vendor product id"))?;
        let pair = IdPair::new(vp, key.design_id.unwrap_or_default());
        let design_url = key.design_url.clone().unwrap_or_default();
        self.call_remote(key, pair, |backend, pair| {
            backend.save_transforms(&TransformBatch {
                vendor_product_id: pair.vendor_product_id,
                design_url: design_url.clone(),
                transforms: transforms.clone(),
                last_modified: sent,
            })
        })
    }

    /// Run `op` against the session's mapping of `pair`; on a permission
    /// error, look for a substitute pair once and retry with it.
    fn call_remote<T>(
        &mut self,
        key: &PlacementKey,
        pair: IdPair,
        op: impl Fn(&B, IdPair) -> Result<T, RemoteError>,
    ) -> Result<T, RemoteError> {
        let mapped = self.mappings.resolve(pair);
        match op(&self.backend, mapped) {
            Err(RemoteError::Permission { resource }) => {
                let substitute =
                    match find_substitute(&self.backend, &self.resolver, key, mapped) {
                        Ok(Some(substitute)) => substitute,
                        Ok(None) => return Err(RemoteError::Permission { resource }),
                        Err(e) => {
                            debug!(error = %e, "auto-fix lookup failed");
                            return Err(RemoteError::Permission { resource });
                        }
                    };
                let result = op(&self.backend, substitute);
                if result.is_ok() {
                    info!(rejected = %pair, substitute = %substitute, "remembering identifier substitution");
                    self.mappings.remember(pair, substitute);
                }
                result
            }
            other => other,
        }
    }

    // ========================================================================
    // Local cache
    // ========================================================================

    fn write_local(&mut self, id: &PlacementId, dirty: bool) -> Result<(), StoreError> {
        let placement = self.placement(id)?;
        let position_key = placement.key.position_key();
        let transforms_key = placement.key.transforms_key();
        let cached = CachedTransforms {
            transforms: placement.transforms.clone(),
            last_modified: placement.modified_at,
            is_dirty: dirty,
            is_loading: false,
        };
        let position = CachedPosition {
            position: placement.transforms.get(&0).copied().unwrap_or_default(),
            timestamp: placement.modified_at,
        };

        if let Some(key) = transforms_key {
            write_json(&mut self.local, &key, &cached)?;
        }
        if let Some(key) = position_key {
            write_json(&mut self.local, &key, &position)?;
        }
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Forget a placement; armed writes for it are dropped
    pub fn close(&mut self, id: &PlacementId) {
        self.queue.retain(|(slot_id, _)| slot_id != id);
        self.placements.remove(id);
    }

    /// End the session: drop every placement, timer and identifier mapping
    pub fn clear(&mut self) {
        self.placements.clear();
        self.queue.clear();
        self.mappings.clear();
    }

    fn placement(&self, id: &PlacementId) -> Result<&Placement, StoreError> {
        self.placements
            .get(id)
            .ok_or_else(|| StoreError::unknown(id.as_str()))
    }

    fn placement_mut(&mut self, id: &PlacementId) -> Result<&mut Placement, StoreError> {
        self.placements
            .get_mut(id)
            .ok_or_else(|| StoreError::unknown(id.as_str()))
    }
}

fn other_channel(channel: Channel) -> Channel {
    match channel {
        Channel::Isolated => Channel::Batch,
        Channel::Batch => Channel::Isolated,
    }
}
