//! Session-scoped identifier substitutions

use std::collections::HashMap;

/// A (vendor product, design) pair as used by the remote position endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdPair {
    pub vendor_product_id: u64,
    pub design_id: u64,
}

impl IdPair {
    pub fn new(vendor_product_id: u64, design_id: u64) -> Self {
        Self {
            vendor_product_id,
            design_id,
        }
    }
}

impl std::fmt::Display for IdPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.vendor_product_id, self.design_id)
    }
}

/// Remembers which pair to use instead of one the backend rejected.
///
/// Owned by a store instance and dropped with it; nothing is shared between
/// sessions.
#[derive(Debug, Default, Clone)]
pub struct IdMappingCache {
    substitutions: HashMap<IdPair, IdPair>,
}

impl IdMappingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pair to actually use for `pair`
    pub fn resolve(&self, pair: IdPair) -> IdPair {
        self.substitutions.get(&pair).copied().unwrap_or(pair)
    }

    pub fn remember(&mut self, rejected: IdPair, replacement: IdPair) {
        if rejected != replacement {
            self.substitutions.insert(rejected, replacement);
        }
    }

    pub fn len(&self) -> usize {
        self.substitutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }

    pub fn clear(&mut self) {
        self.substitutions.clear();
    }
}
