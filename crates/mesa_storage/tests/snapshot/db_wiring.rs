#![forbid(unsafe_code)]

use std::fs;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use mesa_kernel_contracts::audit::{AuditAction, AuditDecision, AuditEvent};
use mesa_kernel_contracts::canonical::{CanonicalMenuItem, CanonicalOccupancySignal};
use mesa_kernel_contracts::policy::AccessPolicy;
use mesa_kernel_contracts::product::{
    DataProduct, PayloadRef, ProductFilter, ProductMetadata, ProductType,
};
use mesa_kernel_contracts::staging::StagingRecordInput;
use mesa_kernel_contracts::{OrgId, RestaurantId, SourceKind, SpaceId};
use mesa_storage::{JsonSnapshot, MesaStore};

struct TempDir(PathBuf);

impl TempDir {
    fn new(tag: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("mesa_{tag}_{}", Uuid::new_v4()));
        Self(dir)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn populated_store() -> MesaStore {
    let mut store = MesaStore::new_in_memory();
    store
        .append_staging(StagingRecordInput::v1(
            SourceKind::Menu,
            Some(OrgId::new("org_a").unwrap()),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()),
            json!({"restaurantId": "r1", "items": []}),
        ))
        .unwrap();
    store
        .upsert_menu_items(vec![CanonicalMenuItem {
            id: "i1".to_string(),
            restaurant_id: RestaurantId::new("r1").unwrap(),
            name: "Tortilla".to_string(),
            description: Some("classic".to_string()),
            price: Decimal::new(5, 0),
            currency: "EUR".to_string(),
            category: Some("mains".to_string()),
            allergens: vec!["gluten".to_string(), "egg".to_string()],
            gluten_free: Some(false),
            vegan: Some(false),
        }])
        .unwrap();
    store
        .upsert_occupancy_signals(vec![CanonicalOccupancySignal {
            restaurant_id: RestaurantId::new("r1").unwrap(),
            ts: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            occupancy_pct: 50.0,
        }])
        .unwrap();
    let product = DataProduct {
        id: Uuid::new_v4(),
        product_type: ProductType::Menu,
        version: 1,
        schema: json!({"type": "array", "itemSchema": "canonicalMenuItem", "recordCount": 1}),
        metadata: ProductMetadata {
            title: "Menu of r1".to_string(),
            granularity: "item".to_string(),
            latency: "batch".to_string(),
            restaurant_id: Some(RestaurantId::new("r1").unwrap()),
        },
        policy: AccessPolicy {
            allowed_purposes: vec!["analytics".to_string()],
            allowed_roles: vec!["consumer".to_string()],
            retention_days: 30,
            pii: false,
        },
        created_by_org: OrgId::new("org_a").unwrap(),
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        payload_ref: Some(PayloadRef::normalized(
            SourceKind::Menu,
            RestaurantId::new("r1").unwrap(),
        )),
    };
    store.upsert_product(product.clone()).unwrap();
    store
        .publish_product(&SpaceId::new("space_main").unwrap(), product)
        .unwrap();
    store
        .append_audit_row(AuditEvent {
            ts: Utc.with_ymd_and_hms(2025, 3, 1, 13, 0, 0).unwrap(),
            actor_org: OrgId::new("org_b").unwrap(),
            action: AuditAction::Consume,
            space: Some(SpaceId::new("space_main").unwrap()),
            product_id: Some(Uuid::new_v4()),
            purpose: Some("analytics".to_string()),
            decision: Some(AuditDecision::Allow),
            reason: Some("access granted".to_string()),
        })
        .unwrap();
    store
}

#[test]
fn at_snap_db_01_save_then_load_round_trips_every_collection() {
    let tmp = TempDir::new("snap_roundtrip");
    let store = populated_store();
    let snapshot = JsonSnapshot::new(&tmp.0);
    snapshot.save(&store).unwrap();

    let loaded = snapshot.load().unwrap();
    assert_eq!(loaded.staging_rows(), store.staging_rows());
    assert_eq!(
        loaded.menu_items_for(&RestaurantId::new("r1").unwrap()),
        store.menu_items_for(&RestaurantId::new("r1").unwrap())
    );
    assert_eq!(
        loaded.occupancy_signals_for(&RestaurantId::new("r1").unwrap()),
        store.occupancy_signals_for(&RestaurantId::new("r1").unwrap())
    );
    assert_eq!(
        loaded.products_filtered(&ProductFilter::default()),
        store.products_filtered(&ProductFilter::default())
    );
    let main = SpaceId::new("space_main").unwrap();
    assert_eq!(loaded.published_in_space(&main).len(), 1);
    assert_eq!(
        loaded.published_in_space(&main),
        store.published_in_space(&main)
    );
    assert_eq!(loaded.audit_rows(), store.audit_rows());
}

#[test]
fn at_snap_db_02_fresh_directory_loads_empty_store() {
    let tmp = TempDir::new("snap_fresh");
    let snapshot = JsonSnapshot::new(&tmp.0);
    let store = snapshot.load().unwrap();
    assert!(store.staging_rows().is_empty());
    assert!(store.audit_rows().is_empty());
}

#[test]
fn at_snap_db_03_save_leaves_no_temp_files() {
    let tmp = TempDir::new("snap_tmpfiles");
    let snapshot = JsonSnapshot::new(&tmp.0);
    snapshot.save(&populated_store()).unwrap();

    let leftovers: Vec<_> = fs::read_dir(&tmp.0)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().map(|ext| ext == "tmp").unwrap_or(false))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn at_snap_db_04_collections_persist_as_plain_json_arrays() {
    let tmp = TempDir::new("snap_shape");
    let snapshot = JsonSnapshot::new(&tmp.0);
    snapshot.save(&populated_store()).unwrap();

    let raw = fs::read_to_string(tmp.0.join("canonical-menu.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let rows = parsed.as_array().expect("array of rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["restaurantId"], "r1");
    assert_eq!(rows[0]["allergens"][0], "gluten");
}

#[test]
fn at_snap_db_05_second_save_overwrites_last_write_wins() {
    let tmp = TempDir::new("snap_lww");
    let snapshot = JsonSnapshot::new(&tmp.0);
    snapshot.save(&populated_store()).unwrap();

    // A later save of an empty store replaces the files wholesale.
    snapshot.save(&MesaStore::new_in_memory()).unwrap();
    let loaded = snapshot.load().unwrap();
    assert!(loaded.staging_rows().is_empty());
    assert!(loaded.audit_rows().is_empty());
}
