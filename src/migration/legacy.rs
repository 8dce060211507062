//! One-shot migration of first-generation position records
//!
//! Two legacy layouts exist in local storage:
//!
//! - `designPositions`: one JSON object whose keys start with a product ID
//!   (`"45"`, `"45_3"`, `"45-front"`) and whose values are transforms, bare
//!   or wrapped as `{"position": {..}}`.
//! - `design-transforms-<productId>`: either `{"transforms": {"0": {..}}}` or
//!   the bare index map.
//!
//! Legacy records carry no design identity, so every entry is re-saved under
//! `(vendor, product, design 1)`. A legacy key is deleted only when all of
//! its entries were migrated.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::geometry::Transform;
use crate::remote::TransformBackend;
use crate::storage::keys::{
    legacy_transforms_product_id, LEGACY_POSITIONS_KEY, LEGACY_TRANSFORMS_PREFIX,
    MIGRATION_DONE_KEY,
};
use crate::storage::{LocalStore, StorageError};
use crate::store::{PlacementKey, StoreError, TransformStore};
use crate::sync::Clock;

/// Design ID assumed for legacy records
pub const LEGACY_DESIGN_ID: u64 = 1;

/// Outcome for one legacy storage key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyReport {
    pub key: String,
    pub migrated: usize,
    pub failed: usize,
    /// Whether the legacy key was deleted afterwards
    pub removed: bool,
}

/// Outcome of a migration run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// The done flag was already set; nothing was scanned
    pub skipped: bool,
    pub keys: Vec<KeyReport>,
}

impl MigrationReport {
    pub fn migrated(&self) -> usize {
        self.keys.iter().map(|k| k.migrated).sum()
    }

    pub fn failed(&self) -> usize {
        self.keys.iter().map(|k| k.failed).sum()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LegacyPosition {
    Wrapped { position: LegacyTransform },
    Bare(LegacyTransform),
}

impl LegacyPosition {
    fn into_transform(self) -> Transform {
        match self {
            LegacyPosition::Wrapped { position } => position.into(),
            LegacyPosition::Bare(transform) => transform.into(),
        }
    }
}

/// A legacy transform; an entry without both offsets is not one
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyTransform {
    x: f64,
    y: f64,
    scale: Option<f64>,
    rotation: Option<f64>,
    design_width: Option<f64>,
    design_height: Option<f64>,
    design_scale: Option<f64>,
}

impl From<LegacyTransform> for Transform {
    fn from(legacy: LegacyTransform) -> Self {
        Transform {
            x: legacy.x,
            y: legacy.y,
            scale: legacy.scale.unwrap_or(1.0),
            rotation: legacy.rotation.unwrap_or(0.0),
            design_width: legacy.design_width,
            design_height: legacy.design_height,
            design_scale: legacy.design_scale,
        }
    }
}

/// Moves legacy records into the current key layout
#[derive(Debug, Clone, Copy)]
pub struct LegacyMigrator {
    vendor_id: u64,
}

impl LegacyMigrator {
    pub fn new(vendor_id: u64) -> Self {
        Self { vendor_id }
    }

    pub fn is_done<L: LocalStore + ?Sized>(local: &L) -> bool {
        local.contains(MIGRATION_DONE_KEY)
    }

    /// Clear the done flag so the next [`run`](Self::run) scans again
    pub fn reset<L: LocalStore + ?Sized>(local: &mut L) -> Result<(), StorageError> {
        info!("resetting legacy migration flag");
        local.remove(MIGRATION_DONE_KEY)
    }

    /// Migrate every legacy key once per profile.
    ///
    /// Entries that cannot be read are counted and logged; only local
    /// storage failures abort the run.
    pub fn run<B, L, C>(
        &self,
        store: &mut TransformStore<B, L, C>,
    ) -> Result<MigrationReport, StoreError>
    where
        B: TransformBackend,
        L: LocalStore,
        C: Clock,
    {
        if Self::is_done(store.local()) {
            return Ok(MigrationReport {
                skipped: true,
                keys: Vec::new(),
            });
        }

        let legacy_keys: Vec<String> = store
            .local()
            .keys()
            .into_iter()
            .filter(|k| k == LEGACY_POSITIONS_KEY || k.starts_with(LEGACY_TRANSFORMS_PREFIX))
            .collect();

        let mut report = MigrationReport::default();
        for key in legacy_keys {
            let mut entry = KeyReport {
                key: key.clone(),
                migrated: 0,
                failed: 0,
                removed: false,
            };

            match self.collect(&key, store.local().get(&key)) {
                Some(records) => {
                    for (product_id, index, transform) in records {
                        match transform {
                            Some(transform) => {
                                self.save(store, product_id, index, transform)?;
                                entry.migrated += 1;
                            }
                            None => entry.failed += 1,
                        }
                    }
                }
                None => entry.failed += 1,
            }

            if entry.failed == 0 {
                store.local_mut().remove(&key)?;
                entry.removed = true;
            } else {
                warn!(key = %key, failed = entry.failed, "keeping legacy key with unreadable entries");
            }
            report.keys.push(entry);
        }

        store.local_mut().set(MIGRATION_DONE_KEY, "true".to_string())?;
        info!(
            migrated = report.migrated(),
            failed = report.failed(),
            "legacy migration finished"
        );
        Ok(report)
    }

    /// Decode one legacy key into `(product, index, transform)` records.
    ///
    /// `None` when the whole value is unreadable; a `None` transform marks
    /// a single unreadable entry.
    fn collect(
        &self,
        key: &str,
        raw: Option<String>,
    ) -> Option<Vec<(u64, usize, Option<Transform>)>> {
        let value: Value = match serde_json::from_str(&raw?) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "legacy key is not JSON");
                return None;
            }
        };

        if key == LEGACY_POSITIONS_KEY {
            let Value::Object(entries) = value else {
                warn!(key, "legacy positions are not an object");
                return None;
            };
            let records = entries
                .into_iter()
                .map(|(name, value)| match leading_id(&name) {
                    Some(product_id) => (product_id, 0, decode_position(key, &name, value)),
                    None => {
                        warn!(key, entry = %name, "legacy position has no product id");
                        (0, 0, None)
                    }
                })
                .collect();
            return Some(records);
        }

        let product_id = legacy_transforms_product_id(key)?;
        let map = match value {
            Value::Object(mut object) if object.contains_key("transforms") => {
                object.remove("transforms").unwrap_or(Value::Null)
            }
            other => other,
        };
        let Value::Object(entries) = map else {
            warn!(key, "legacy transforms are not an object");
            return None;
        };

        let records = entries
            .into_iter()
            .map(|(index, value)| match index.parse::<usize>() {
                Ok(index) => (product_id, index, decode_position(key, &index.to_string(), value)),
                Err(_) => {
                    warn!(key, entry = %index, "legacy transform index is not a number");
                    (product_id, 0, None)
                }
            })
            .collect();
        Some(records)
    }

    fn save<B, L, C>(
        &self,
        store: &mut TransformStore<B, L, C>,
        product_id: u64,
        index: usize,
        transform: Transform,
    ) -> Result<(), StoreError>
    where
        B: TransformBackend,
        L: LocalStore,
        C: Clock,
    {
        let key = PlacementKey::new()
            .with_vendor(self.vendor_id)
            .with_base_product(product_id)
            .with_design(LEGACY_DESIGN_ID);
        let id = store.open(key)?;
        let saved = store.set_transform(&id, index, transform);
        // Nothing is armed for a local-only placement
        store.close(&id);
        saved?;
        info!(placement = %id, index, "migrated legacy position");
        Ok(())
    }
}

fn decode_position(key: &str, entry: &str, value: Value) -> Option<Transform> {
    match serde_json::from_value::<LegacyPosition>(value) {
        Ok(position) => Some(position.into_transform()),
        Err(e) => {
            warn!(key, entry, error = %e, "unreadable legacy position");
            None
        }
    }
}

/// Product ID at the start of a legacy entry name (`"45_3"` -> 45)
fn leading_id(name: &str) -> Option<u64> {
    let end = name
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(name.len());
    name[..end].parse().ok()
}

/// Legacy keys with their entry counts, for inspection without migrating
pub fn scan_legacy<L: LocalStore + ?Sized>(local: &L) -> BTreeMap<String, usize> {
    local
        .keys()
        .into_iter()
        .filter(|k| k == LEGACY_POSITIONS_KEY || k.starts_with(LEGACY_TRANSFORMS_PREFIX))
        .map(|k| {
            let count = local
                .get(&k)
                .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
                .map_or(0, |value| match value {
                    Value::Object(mut object) if object.contains_key("transforms") => object
                        .remove("transforms")
                        .and_then(|t| t.as_object().map(|o| o.len()))
                        .unwrap_or(0),
                    Value::Object(object) => object.len(),
                    _ => 0,
                });
            (k, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_id() {
        assert_eq!(leading_id("45"), Some(45));
        assert_eq!(leading_id("45_3"), Some(45));
        assert_eq!(leading_id("45-front"), Some(45));
        assert_eq!(leading_id("front"), None);
    }

    #[test]
    fn test_collect_wrapped_transforms() {
        let migrator = LegacyMigrator::new(7);
        let raw = r#"{"transforms":{"0":{"x":10,"y":5,"scale":1,"rotation":0},"2":{"x":1,"y":2}}}"#;
        let records = migrator
            .collect("design-transforms-45", Some(raw.to_string()))
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, 45);
        assert_eq!(records[0].1, 0);
        assert_eq!(records[0].2.unwrap().x, 10.0);
        assert_eq!(records[1].1, 2);
    }

    #[test]
    fn test_collect_bare_positions() {
        let migrator = LegacyMigrator::new(7);
        let raw = r#"{"45_3":{"position":{"x":3,"y":4}},"46":{"x":1,"y":1},"bad":{"x":0}}"#;
        let records = migrator
            .collect(LEGACY_POSITIONS_KEY, Some(raw.to_string()))
            .unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().any(|r| r.0 == 45 && r.2.is_some_and(|t| t.x == 3.0)));
        assert!(records.iter().any(|r| r.2.is_none()));
    }

    #[test]
    fn test_non_transform_entries_are_unreadable() {
        let migrator = LegacyMigrator::new(7);
        let raw = r#"{"45":{"garbage":true},"46":{"position":{"scale":2}},"47":[1,2]}"#;
        let records = migrator
            .collect(LEGACY_POSITIONS_KEY, Some(raw.to_string()))
            .unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.2.is_none()));
    }

    #[test]
    fn test_legacy_defaults_fill_missing_fields() {
        let transform = decode_position("k", "45", serde_json::json!({"x": 4, "y": -2}))
            .expect("Should decode");
        assert_eq!(transform, Transform::at(4.0, -2.0));
    }

    #[test]
    fn test_unparsable_key_is_rejected() {
        let migrator = LegacyMigrator::new(7);
        assert!(migrator
            .collect("design-transforms-45", Some("not json".to_string()))
            .is_none());
    }
}
