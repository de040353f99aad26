#![forbid(unsafe_code)]

use uuid::Uuid;

use mesa_kernel_contracts::audit::{AuditEvent, AuditFilter};
use mesa_kernel_contracts::canonical::{
    CanonicalMenuItem, CanonicalOccupancySignal, RestaurantProfile,
};
use mesa_kernel_contracts::product::{DataProduct, ProductFilter};
use mesa_kernel_contracts::staging::{StagingRecord, StagingRecordInput};
use mesa_kernel_contracts::{OrgId, RestaurantId, SourceKind, SpaceId};

use crate::store::{MesaStore, StorageError};

/// Typed repository interface for the append-only staging log.
pub trait StagingRepo {
    fn append_staging(&mut self, input: StagingRecordInput) -> Result<StagingRecord, StorageError>;
    fn staging_by_source(
        &self,
        source: SourceKind,
        org_id: Option<&OrgId>,
    ) -> Vec<&StagingRecord>;
}

/// Typed repository interface for the deduplicated canonical tables.
pub trait CanonicalRepo {
    fn upsert_menu_items(&mut self, items: Vec<CanonicalMenuItem>) -> Result<usize, StorageError>;
    fn upsert_occupancy_signals(
        &mut self,
        signals: Vec<CanonicalOccupancySignal>,
    ) -> Result<usize, StorageError>;
    fn upsert_profiles(
        &mut self,
        profiles: Vec<RestaurantProfile>,
    ) -> Result<usize, StorageError>;
    fn menu_items_for(&self, restaurant_id: &RestaurantId) -> Vec<CanonicalMenuItem>;
    fn occupancy_signals_for(&self, restaurant_id: &RestaurantId)
        -> Vec<CanonicalOccupancySignal>;
    fn profile_for(&self, restaurant_id: &RestaurantId) -> Option<RestaurantProfile>;
}

/// Typed repository interface for data-product persistence.
pub trait ProductRepo {
    fn upsert_product(&mut self, product: DataProduct) -> Result<Uuid, StorageError>;
    fn product(&self, id: &Uuid) -> Option<DataProduct>;
    fn products_filtered(&self, filter: &ProductFilter) -> Vec<DataProduct>;
}

/// Typed repository interface for per-space published sets. Spaces are
/// independent; publishing to one has no effect on another.
pub trait SpaceRepo {
    fn publish_product(&mut self, space: &SpaceId, product: DataProduct)
        -> Result<Uuid, StorageError>;
    fn published_product(&self, space: &SpaceId, id: &Uuid) -> Option<DataProduct>;
    fn published_in_space(&self, space: &SpaceId) -> Vec<DataProduct>;
}

/// Typed repository interface for append-only audit persistence.
pub trait AuditRepo {
    fn append_audit_row(&mut self, event: AuditEvent) -> Result<u64, StorageError>;
    fn audit_rows(&self) -> &[AuditEvent];
    fn audit_filtered(&self, filter: &AuditFilter) -> Vec<AuditEvent>;
}

impl StagingRepo for MesaStore {
    fn append_staging(&mut self, input: StagingRecordInput) -> Result<StagingRecord, StorageError> {
        MesaStore::append_staging(self, input)
    }

    fn staging_by_source(
        &self,
        source: SourceKind,
        org_id: Option<&OrgId>,
    ) -> Vec<&StagingRecord> {
        MesaStore::staging_by_source(self, source, org_id)
    }
}

impl CanonicalRepo for MesaStore {
    fn upsert_menu_items(&mut self, items: Vec<CanonicalMenuItem>) -> Result<usize, StorageError> {
        MesaStore::upsert_menu_items(self, items)
    }

    fn upsert_occupancy_signals(
        &mut self,
        signals: Vec<CanonicalOccupancySignal>,
    ) -> Result<usize, StorageError> {
        MesaStore::upsert_occupancy_signals(self, signals)
    }

    fn upsert_profiles(
        &mut self,
        profiles: Vec<RestaurantProfile>,
    ) -> Result<usize, StorageError> {
        MesaStore::upsert_profiles(self, profiles)
    }

    fn menu_items_for(&self, restaurant_id: &RestaurantId) -> Vec<CanonicalMenuItem> {
        MesaStore::menu_items_for(self, restaurant_id)
    }

    fn occupancy_signals_for(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Vec<CanonicalOccupancySignal> {
        MesaStore::occupancy_signals_for(self, restaurant_id)
    }

    fn profile_for(&self, restaurant_id: &RestaurantId) -> Option<RestaurantProfile> {
        MesaStore::profile_for(self, restaurant_id)
    }
}

impl ProductRepo for MesaStore {
    fn upsert_product(&mut self, product: DataProduct) -> Result<Uuid, StorageError> {
        MesaStore::upsert_product(self, product)
    }

    fn product(&self, id: &Uuid) -> Option<DataProduct> {
        MesaStore::product(self, id)
    }

    fn products_filtered(&self, filter: &ProductFilter) -> Vec<DataProduct> {
        MesaStore::products_filtered(self, filter)
    }
}

impl SpaceRepo for MesaStore {
    fn publish_product(
        &mut self,
        space: &SpaceId,
        product: DataProduct,
    ) -> Result<Uuid, StorageError> {
        MesaStore::publish_product(self, space, product)
    }

    fn published_product(&self, space: &SpaceId, id: &Uuid) -> Option<DataProduct> {
        MesaStore::published_product(self, space, id)
    }

    fn published_in_space(&self, space: &SpaceId) -> Vec<DataProduct> {
        MesaStore::published_in_space(self, space)
    }
}

impl AuditRepo for MesaStore {
    fn append_audit_row(&mut self, event: AuditEvent) -> Result<u64, StorageError> {
        MesaStore::append_audit_row(self, event)
    }

    fn audit_rows(&self) -> &[AuditEvent] {
        MesaStore::audit_rows(self)
    }

    fn audit_filtered(&self, filter: &AuditFilter) -> Vec<AuditEvent> {
        MesaStore::audit_filtered(self, filter)
    }
}
