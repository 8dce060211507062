//! Wire types of the remote transform service

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Transform;

/// Body of the batch save endpoint, and result of the batch load endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformBatch {
    pub vendor_product_id: u64,
    #[serde(default)]
    pub design_url: String,
    #[serde(default)]
    pub transforms: BTreeMap<usize, Transform>,
    #[serde(default)]
    pub last_modified: u64,
}

/// The authenticated user, from the auth profile endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: u64,
    #[serde(default)]
    pub role: Option<String>,
}

/// `{ "data": ... }` envelope used by most endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PositionRecord;

    #[test]
    fn test_batch_body_shape() {
        let mut transforms = BTreeMap::new();
        transforms.insert(0, Transform::default());
        let batch = TransformBatch {
            vendor_product_id: 61,
            design_url: "https://cdn/x.png".to_string(),
            transforms,
            last_modified: 10,
        };
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["vendorProductId"], 61);
        assert_eq!(json["designUrl"], "https://cdn/x.png");
        assert_eq!(json["transforms"]["0"]["scale"], 1.0);
        assert_eq!(json["lastModified"], 10);
    }

    #[test]
    fn test_null_envelope() {
        let env: Envelope<PositionRecord> = serde_json::from_str(r#"{"data":null}"#).unwrap();
        assert!(env.data.is_none());
    }
}
