#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use mesa_kernel_contracts::audit::{AuditEvent, AuditFilter};
use mesa_kernel_contracts::canonical::{
    CanonicalMenuItem, CanonicalOccupancySignal, RestaurantProfile,
};
use mesa_kernel_contracts::product::{DataProduct, ProductFilter};
use mesa_kernel_contracts::staging::{StagingRecord, StagingRecordInput};
use mesa_kernel_contracts::{ContractViolation, OrgId, RestaurantId, SourceKind, SpaceId, Validate};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("duplicate key in table {table}: {key}")]
    DuplicateKey { table: &'static str, key: String },
    #[error("append-only violation on table {table}")]
    AppendOnlyViolation { table: &'static str },
    // ContractViolation is a plain contract value, not a std error, so
    // it is carried by value rather than chained as a source.
    #[error("contract violation: {0:?}")]
    Contract(ContractViolation),
    #[error("i/o failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt snapshot {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<ContractViolation> for StorageError {
    fn from(violation: ContractViolation) -> Self {
        StorageError::Contract(violation)
    }
}

/// One published-product row, keyed by (space, product id) in memory
/// and flattened to a plain array in snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedRow {
    pub space: SpaceId,
    pub product: DataProduct,
}

/// Serde-facing snapshot of every logical collection, each a plain
/// JSON array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Collections {
    pub staging: Vec<StagingRecord>,
    pub canonical_menu: Vec<CanonicalMenuItem>,
    pub canonical_occupancy: Vec<CanonicalOccupancySignal>,
    pub profiles: Vec<RestaurantProfile>,
    pub products: Vec<DataProduct>,
    pub published: Vec<PublishedRow>,
    pub audit: Vec<AuditEvent>,
}

/// In-memory record store for the whole pipeline: append-only staging
/// and audit, upsert-by-natural-key canonical tables, upsert-by-id
/// products, and independent per-space published sets.
#[derive(Debug, Default)]
pub struct MesaStore {
    staging: Vec<StagingRecord>,
    canonical_menu: BTreeMap<(RestaurantId, String), CanonicalMenuItem>,
    canonical_occupancy: BTreeMap<(RestaurantId, DateTime<Utc>), CanonicalOccupancySignal>,
    profiles: BTreeMap<RestaurantId, RestaurantProfile>,
    products: BTreeMap<Uuid, DataProduct>,
    published: BTreeMap<SpaceId, BTreeMap<Uuid, DataProduct>>,
    audit: Vec<AuditEvent>,
}

fn payload_sha256_hex(payload: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

impl MesaStore {
    pub fn new_in_memory() -> Self {
        Self::default()
    }

    // ---- staging (append-only replay log) ----

    pub fn append_staging(
        &mut self,
        input: StagingRecordInput,
    ) -> Result<StagingRecord, StorageError> {
        let id = input.id.unwrap_or_else(Uuid::new_v4);
        if self.staging.iter().any(|r| r.id == id) {
            return Err(StorageError::DuplicateKey {
                table: "staging",
                key: id.to_string(),
            });
        }
        let record = StagingRecord {
            id,
            source: input.source,
            org_id: input.org_id,
            received_at: input.received_at.unwrap_or_else(Utc::now),
            payload_sha256: payload_sha256_hex(&input.payload),
            payload: input.payload,
        };
        record.validate()?;
        self.staging.push(record.clone());
        Ok(record)
    }

    pub fn staging_rows(&self) -> &[StagingRecord] {
        &self.staging
    }

    pub fn staging_by_source(
        &self,
        source: SourceKind,
        org_id: Option<&OrgId>,
    ) -> Vec<&StagingRecord> {
        self.staging
            .iter()
            .filter(|r| r.source == source)
            .filter(|r| match org_id {
                Some(org) => r.org_id.as_ref() == Some(org),
                None => true,
            })
            .collect()
    }

    /// Staging rows are immutable after append; there is no mutation
    /// path. Kept as an explicit probe for the append-only wiring tests.
    pub fn attempt_overwrite_staging_record(&mut self, _id: Uuid) -> Result<(), StorageError> {
        Err(StorageError::AppendOnlyViolation { table: "staging" })
    }

    // ---- canonical tables (upsert by natural key) ----

    pub fn upsert_menu_items(
        &mut self,
        items: Vec<CanonicalMenuItem>,
    ) -> Result<usize, StorageError> {
        let mut count = 0;
        for item in items {
            item.validate()?;
            self.canonical_menu.insert(item.natural_key(), item);
            count += 1;
        }
        Ok(count)
    }

    pub fn upsert_occupancy_signals(
        &mut self,
        signals: Vec<CanonicalOccupancySignal>,
    ) -> Result<usize, StorageError> {
        let mut count = 0;
        for signal in signals {
            signal.validate()?;
            self.canonical_occupancy
                .insert(signal.natural_key(), signal);
            count += 1;
        }
        Ok(count)
    }

    pub fn upsert_profiles(
        &mut self,
        profiles: Vec<RestaurantProfile>,
    ) -> Result<usize, StorageError> {
        let mut count = 0;
        for profile in profiles {
            profile.validate()?;
            self.profiles.insert(profile.restaurant_id.clone(), profile);
            count += 1;
        }
        Ok(count)
    }

    pub fn menu_items_for(&self, restaurant_id: &RestaurantId) -> Vec<CanonicalMenuItem> {
        self.canonical_menu
            .values()
            .filter(|i| &i.restaurant_id == restaurant_id)
            .cloned()
            .collect()
    }

    pub fn occupancy_signals_for(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Vec<CanonicalOccupancySignal> {
        self.canonical_occupancy
            .values()
            .filter(|s| &s.restaurant_id == restaurant_id)
            .cloned()
            .collect()
    }

    pub fn profile_for(&self, restaurant_id: &RestaurantId) -> Option<RestaurantProfile> {
        self.profiles.get(restaurant_id).cloned()
    }

    pub fn menu_row_count(&self) -> usize {
        self.canonical_menu.len()
    }

    pub fn occupancy_row_count(&self) -> usize {
        self.canonical_occupancy.len()
    }

    // ---- products (upsert by uuid) ----

    pub fn upsert_product(&mut self, product: DataProduct) -> Result<Uuid, StorageError> {
        product.validate()?;
        let id = product.id;
        self.products.insert(id, product);
        Ok(id)
    }

    pub fn product(&self, id: &Uuid) -> Option<DataProduct> {
        self.products.get(id).cloned()
    }

    pub fn products_filtered(&self, filter: &ProductFilter) -> Vec<DataProduct> {
        self.products
            .values()
            .filter(|p| match filter.product_type {
                Some(t) => p.product_type == t,
                None => true,
            })
            .filter(|p| match &filter.restaurant_id {
                Some(r) => p.metadata.restaurant_id.as_ref() == Some(r),
                None => true,
            })
            .cloned()
            .collect()
    }

    // ---- per-space published sets ----

    pub fn publish_product(
        &mut self,
        space: &SpaceId,
        product: DataProduct,
    ) -> Result<Uuid, StorageError> {
        product.validate()?;
        let id = product.id;
        self.published
            .entry(space.clone())
            .or_default()
            .insert(id, product);
        Ok(id)
    }

    pub fn published_product(&self, space: &SpaceId, id: &Uuid) -> Option<DataProduct> {
        self.published.get(space).and_then(|s| s.get(id)).cloned()
    }

    pub fn published_in_space(&self, space: &SpaceId) -> Vec<DataProduct> {
        self.published
            .get(space)
            .map(|s| s.values().cloned().collect())
            .unwrap_or_default()
    }

    // ---- audit ledger (append-only) ----

    pub fn append_audit_row(&mut self, event: AuditEvent) -> Result<u64, StorageError> {
        event.validate()?;
        self.audit.push(event);
        Ok(self.audit.len() as u64)
    }

    pub fn audit_rows(&self) -> &[AuditEvent] {
        &self.audit
    }

    pub fn audit_filtered(&self, filter: &AuditFilter) -> Vec<AuditEvent> {
        self.audit
            .iter()
            .filter(|e| match filter.action {
                Some(action) => e.action == action,
                None => true,
            })
            .filter(|e| match filter.product_id {
                Some(id) => e.product_id == Some(id),
                None => true,
            })
            .filter(|e| match &filter.space {
                Some(space) => e.space.as_ref() == Some(space),
                None => true,
            })
            .filter(|e| match filter.since {
                Some(since) => e.ts >= since,
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Ledger rows are never rewritten; explicit probe for the wiring
    /// tests, mirroring the staging one.
    pub fn attempt_overwrite_audit_row(&mut self, _index: u64) -> Result<(), StorageError> {
        Err(StorageError::AppendOnlyViolation { table: "audit" })
    }

    // ---- snapshot import/export ----

    pub(crate) fn to_collections(&self) -> Collections {
        Collections {
            staging: self.staging.clone(),
            canonical_menu: self.canonical_menu.values().cloned().collect(),
            canonical_occupancy: self.canonical_occupancy.values().cloned().collect(),
            profiles: self.profiles.values().cloned().collect(),
            products: self.products.values().cloned().collect(),
            published: self
                .published
                .iter()
                .flat_map(|(space, set)| {
                    set.values().map(|product| PublishedRow {
                        space: space.clone(),
                        product: product.clone(),
                    })
                })
                .collect(),
            audit: self.audit.clone(),
        }
    }

    pub(crate) fn from_collections(collections: Collections) -> Result<Self, StorageError> {
        let mut store = Self {
            staging: collections.staging,
            ..Self::default()
        };
        store.upsert_menu_items(collections.canonical_menu)?;
        store.upsert_occupancy_signals(collections.canonical_occupancy)?;
        store.upsert_profiles(collections.profiles)?;
        for product in collections.products {
            store.upsert_product(product)?;
        }
        for row in collections.published {
            store.publish_product(&row.space, row.product)?;
        }
        for event in collections.audit {
            store.append_audit_row(event)?;
        }
        Ok(store)
    }
}
