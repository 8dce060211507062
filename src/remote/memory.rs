//! In-process backend for offline sessions and tests

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use crate::resolver::{IdPair, VendorDesign, VendorProduct};
use crate::storage::PositionRecord;

use super::error::RemoteError;
use super::types::{Profile, TransformBatch};
use super::TransformBackend;

/// A request received by [`InMemoryBackend`], in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    LoadPosition(IdPair),
    SavePosition(IdPair, PositionRecord),
    LoadTransforms(u64),
    SaveTransforms(TransformBatch),
    VendorProducts,
    VendorDesigns,
    Profile,
}

#[derive(Debug, Default)]
struct State {
    positions: BTreeMap<(u64, u64), PositionRecord>,
    batches: BTreeMap<u64, TransformBatch>,
    calls: Vec<BackendCall>,
    failure: Option<RemoteError>,
    position_failure: Option<RemoteError>,
    denied: HashSet<u64>,
}

/// Backend holding everything in memory.
///
/// With ownership enforcement on, any position or batch request for a
/// product or design not in the vendor's lists is rejected with
/// [`RemoteError::Permission`], like the real service does.
#[derive(Debug)]
pub struct InMemoryBackend {
    profile: Profile,
    products: Vec<VendorProduct>,
    designs: Vec<VendorDesign>,
    enforce_ownership: bool,
    state: RefCell<State>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(Profile { id: 1, role: None })
    }
}

impl InMemoryBackend {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            products: Vec::new(),
            designs: Vec::new(),
            enforce_ownership: false,
            state: RefCell::new(State::default()),
        }
    }

    pub fn with_products(mut self, products: Vec<VendorProduct>) -> Self {
        self.products = products;
        self
    }

    pub fn with_designs(mut self, designs: Vec<VendorDesign>) -> Self {
        self.designs = designs;
        self
    }

    pub fn with_ownership_check(mut self) -> Self {
        self.enforce_ownership = true;
        self
    }

    /// Make every subsequent request fail with `error` (`None` to recover)
    pub fn set_failure(&self, error: Option<RemoteError>) {
        self.state.borrow_mut().failure = error;
    }

    /// Make position requests alone fail with `error`
    pub fn set_position_failure(&self, error: Option<RemoteError>) {
        self.state.borrow_mut().position_failure = error;
    }

    /// Reject requests for this vendor product with a permission error
    pub fn deny_product(&self, vendor_product_id: u64) {
        self.state.borrow_mut().denied.insert(vendor_product_id);
    }

    /// Seed a saved position
    pub fn insert_position(&self, pair: IdPair, record: PositionRecord) {
        self.state
            .borrow_mut()
            .positions
            .insert((pair.vendor_product_id, pair.design_id), record);
    }

    pub fn insert_batch(&self, batch: TransformBatch) {
        self.state
            .borrow_mut()
            .batches
            .insert(batch.vendor_product_id, batch);
    }

    pub fn position(&self, pair: IdPair) -> Option<PositionRecord> {
        self.state
            .borrow()
            .positions
            .get(&(pair.vendor_product_id, pair.design_id))
            .copied()
    }

    pub fn batch(&self, vendor_product_id: u64) -> Option<TransformBatch> {
        self.state.borrow().batches.get(&vendor_product_id).cloned()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.borrow().calls.clone()
    }

    /// Position saves received so far
    pub fn position_saves(&self) -> Vec<(IdPair, PositionRecord)> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::SavePosition(pair, record) => Some((*pair, *record)),
                _ => None,
            })
            .collect()
    }

    pub fn batch_saves(&self) -> Vec<TransformBatch> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::SaveTransforms(batch) => Some(batch.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    fn record(&self, call: BackendCall) -> Result<(), RemoteError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        match &state.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn check_product(&self, vendor_product_id: u64, resource: &str) -> Result<(), RemoteError> {
        let denied = self.state.borrow().denied.contains(&vendor_product_id);
        let foreign =
            self.enforce_ownership && !self.products.iter().any(|p| p.id == vendor_product_id);
        if denied || foreign {
            return Err(RemoteError::permission(resource));
        }
        Ok(())
    }

    fn check_pair(&self, pair: IdPair, resource: &str) -> Result<(), RemoteError> {
        self.check_product(pair.vendor_product_id, resource)?;
        if self.enforce_ownership && !self.designs.iter().any(|d| d.id == pair.design_id) {
            return Err(RemoteError::permission(resource));
        }
        Ok(())
    }
}

impl TransformBackend for InMemoryBackend {
    fn load_position(&self, pair: IdPair) -> Result<Option<PositionRecord>, RemoteError> {
        self.record(BackendCall::LoadPosition(pair))?;
        if let Some(err) = self.state.borrow().position_failure.clone() {
            return Err(err);
        }
        self.check_pair(pair, &format!("position {pair}"))?;
        Ok(self.position(pair))
    }

    fn save_position(&self, pair: IdPair, record: &PositionRecord) -> Result<(), RemoteError> {
        self.record(BackendCall::SavePosition(pair, *record))?;
        if let Some(err) = self.state.borrow().position_failure.clone() {
            return Err(err);
        }
        self.check_pair(pair, &format!("position {pair}"))?;
        self.insert_position(pair, *record);
        Ok(())
    }

    fn load_transforms(
        &self,
        vendor_product_id: u64,
    ) -> Result<Option<TransformBatch>, RemoteError> {
        self.record(BackendCall::LoadTransforms(vendor_product_id))?;
        self.check_product(vendor_product_id, &format!("transforms {vendor_product_id}"))?;
        Ok(self.batch(vendor_product_id))
    }

    fn save_transforms(&self, batch: &TransformBatch) -> Result<(), RemoteError> {
        self.record(BackendCall::SaveTransforms(batch.clone()))?;
        self.check_product(
            batch.vendor_product_id,
            &format!("transforms {}", batch.vendor_product_id),
        )?;
        self.insert_batch(batch.clone());
        Ok(())
    }

    fn vendor_products(&self) -> Result<Vec<VendorProduct>, RemoteError> {
        self.record(BackendCall::VendorProducts)?;
        Ok(self.products.clone())
    }

    fn vendor_designs(&self) -> Result<Vec<VendorDesign>, RemoteError> {
        self.record(BackendCall::VendorDesigns)?;
        Ok(self.designs.clone())
    }

    fn profile(&self) -> Result<Profile, RemoteError> {
        self.record(BackendCall::Profile)?;
        Ok(self.profile.clone())
    }
}
