//! Error types for the remote transform service

use thiserror::Error;

/// Failures talking to the remote service.
///
/// Only [`RemoteError::Decode`] and [`RemoteError::Status`] are unexpected;
/// the others are conditions the store degrades around.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// 404: nothing saved yet for this key
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// 401/403: the IDs do not belong to the authenticated vendor
    #[error("permission denied for {resource}")]
    Permission { resource: String },

    /// The identifiers could not be mapped onto vendor-scoped IDs
    #[error("unresolved identifier: {reason}")]
    Unresolved { reason: String },

    /// The request did not complete in time
    #[error("request timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// Connection or transport failure
    #[error("network error: {message}")]
    Network { message: String },

    /// Any other non-success status
    #[error("unexpected status {status} for {resource}")]
    Status { status: u16, resource: String },

    /// The response body did not have the expected shape
    #[error("invalid response body: {message}")]
    Decode { message: String },
}

impl RemoteError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn permission(resource: impl Into<String>) -> Self {
        Self::Permission {
            resource: resource.into(),
        }
    }

    pub fn unresolved(reason: impl Into<String>) -> Self {
        Self::Unresolved {
            reason: reason.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Classify an HTTP status for `resource`
    pub fn from_status(status: u16, resource: impl Into<String>) -> Self {
        let resource = resource.into();
        match status {
            404 => Self::NotFound { resource },
            401 | 403 => Self::Permission { resource },
            _ => Self::Status { status, resource },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Permission { .. })
    }

    /// Conditions that fall back to local data without surfacing as a failure
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Permission { .. }
                | Self::Unresolved { .. }
                | Self::Timeout { .. }
                | Self::Network { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(RemoteError::from_status(404, "x").is_not_found());
        assert!(RemoteError::from_status(403, "x").is_permission());
        assert!(RemoteError::from_status(401, "x").is_permission());
        assert!(matches!(
            RemoteError::from_status(500, "x"),
            RemoteError::Status { status: 500, .. }
        ));
    }

    #[test]
    fn test_display() {
        let err = RemoteError::Timeout { millis: 5000 };
        assert_eq!(err.to_string(), "request timed out after 5000ms");
    }
}
