//! Error types for the transform store

use thiserror::Error;

use crate::storage::StorageError;

/// Errors returned by [`TransformStore`](super::TransformStore) operations.
///
/// Remote conditions (not found, permission, timeout) are never returned
/// here; they are recorded in the placement's status instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No local persistence key can be derived from the given identifiers
    #[error("invalid placement key: {reason}")]
    InvalidKey { reason: String },

    /// The placement was never opened, or has been closed
    #[error("unknown placement '{id}'")]
    UnknownPlacement { id: String },

    /// A vendor product ID below the vendor-scoped range
    #[error("{id} is not a vendor product id (must be >= {threshold})")]
    NotVendorScoped { id: u64, threshold: u64 },

    /// Local storage could not be written
    #[error("local storage error: {0}")]
    Storage(#[from] StorageError),
}

impl StoreError {
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    pub fn unknown(id: impl Into<String>) -> Self {
        Self::UnknownPlacement { id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = StoreError::NotVendorScoped {
            id: 45,
            threshold: 60,
        };
        assert_eq!(err.to_string(), "45 is not a vendor product id (must be >= 60)");
        assert!(StoreError::unknown("design_position_1_2_3")
            .to_string()
            .contains("design_position_1_2_3"));
    }
}
