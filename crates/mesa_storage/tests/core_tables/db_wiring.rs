#![forbid(unsafe_code)]

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use mesa_kernel_contracts::audit::{AuditAction, AuditDecision, AuditEvent, AuditFilter};
use mesa_kernel_contracts::canonical::{CanonicalMenuItem, CanonicalOccupancySignal};
use mesa_kernel_contracts::staging::StagingRecordInput;
use mesa_kernel_contracts::{OrgId, RestaurantId, SourceKind, SpaceId};
use mesa_storage::{MesaStore, StorageError};

fn org(id: &str) -> OrgId {
    OrgId::new(id).unwrap()
}

fn restaurant(id: &str) -> RestaurantId {
    RestaurantId::new(id).unwrap()
}

fn menu_item(restaurant_id: &str, id: &str, name: &str) -> CanonicalMenuItem {
    CanonicalMenuItem {
        id: id.to_string(),
        restaurant_id: restaurant(restaurant_id),
        name: name.to_string(),
        description: None,
        price: Decimal::new(950, 2),
        currency: "EUR".to_string(),
        category: None,
        allergens: vec!["gluten".to_string()],
        gluten_free: Some(false),
        vegan: None,
    }
}

fn occupancy_signal(restaurant_id: &str, ts_hour: u32, pct: f64) -> CanonicalOccupancySignal {
    CanonicalOccupancySignal {
        restaurant_id: restaurant(restaurant_id),
        ts: Utc.with_ymd_and_hms(2025, 1, 1, ts_hour, 0, 0).unwrap(),
        occupancy_pct: pct,
    }
}

fn audit_event(action: AuditAction, decision: Option<AuditDecision>) -> AuditEvent {
    AuditEvent {
        ts: Utc::now(),
        actor_org: org("org_a"),
        action,
        space: Some(SpaceId::new("space_main").unwrap()),
        product_id: Some(Uuid::new_v4()),
        purpose: Some("analytics".to_string()),
        decision,
        reason: None,
    }
}

#[test]
fn at_core_db_01_staging_append_fills_id_ts_and_hash() {
    let mut store = MesaStore::new_in_memory();
    let record = store
        .append_staging(StagingRecordInput::v1(
            SourceKind::Menu,
            Some(org("org_a")),
            None,
            json!({"restaurantId": "r1", "items": []}),
        ))
        .unwrap();
    assert_eq!(record.payload_sha256.len(), 64);
    assert!(record.payload_sha256.bytes().all(|b| b.is_ascii_hexdigit()));
    assert_eq!(store.staging_rows().len(), 1);
}

#[test]
fn at_core_db_02_staging_duplicate_id_rejected() {
    let mut store = MesaStore::new_in_memory();
    let id = Uuid::new_v4();
    let mut input = StagingRecordInput::v1(SourceKind::Menu, Some(org("org_a")), None, json!({}));
    input.id = Some(id);
    store.append_staging(input.clone()).unwrap();
    assert!(matches!(
        store.append_staging(input),
        Err(StorageError::DuplicateKey { table: "staging", .. })
    ));
}

#[test]
fn at_core_db_03_staging_append_only_enforced() {
    let mut store = MesaStore::new_in_memory();
    let record = store
        .append_staging(StagingRecordInput::v1(
            SourceKind::Occupancy,
            None,
            None,
            json!({"restaurantId": "r1", "signals": []}),
        ))
        .unwrap();
    assert!(matches!(
        store.attempt_overwrite_staging_record(record.id),
        Err(StorageError::AppendOnlyViolation { table: "staging" })
    ));
}

#[test]
fn at_core_db_04_staging_filtered_by_source_and_org() {
    let mut store = MesaStore::new_in_memory();
    for (source, org_id) in [
        (SourceKind::Menu, "org_a"),
        (SourceKind::Menu, "org_b"),
        (SourceKind::Occupancy, "org_a"),
    ] {
        store
            .append_staging(StagingRecordInput::v1(
                source,
                Some(org(org_id)),
                None,
                json!({}),
            ))
            .unwrap();
    }
    assert_eq!(store.staging_by_source(SourceKind::Menu, None).len(), 2);
    let org_a = org("org_a");
    assert_eq!(
        store
            .staging_by_source(SourceKind::Menu, Some(&org_a))
            .len(),
        1
    );
}

#[test]
fn at_core_db_05_menu_upsert_idempotent_on_natural_key() {
    let mut store = MesaStore::new_in_memory();
    let first = store
        .upsert_menu_items(vec![menu_item("r1", "i1", "Tortilla")])
        .unwrap();
    let second = store
        .upsert_menu_items(vec![menu_item("r1", "i1", "Tortilla de patatas")])
        .unwrap();
    // Replace still counts as upserted; the stored row is the last write.
    assert_eq!(first, 1);
    assert_eq!(second, 1);
    assert_eq!(store.menu_row_count(), 1);
    let items = store.menu_items_for(&restaurant("r1"));
    assert_eq!(items[0].name, "Tortilla de patatas");
}

#[test]
fn at_core_db_06_menu_key_isolates_restaurants() {
    let mut store = MesaStore::new_in_memory();
    store
        .upsert_menu_items(vec![
            menu_item("r1", "i1", "Tortilla"),
            menu_item("r2", "i1", "Tortilla"),
        ])
        .unwrap();
    assert_eq!(store.menu_row_count(), 2);
    assert_eq!(store.menu_items_for(&restaurant("r1")).len(), 1);
}

#[test]
fn at_core_db_07_occupancy_upsert_idempotent_on_ts_key() {
    let mut store = MesaStore::new_in_memory();
    store
        .upsert_occupancy_signals(vec![occupancy_signal("r1", 12, 50.0)])
        .unwrap();
    store
        .upsert_occupancy_signals(vec![occupancy_signal("r1", 12, 75.0)])
        .unwrap();
    store
        .upsert_occupancy_signals(vec![occupancy_signal("r1", 13, 80.0)])
        .unwrap();
    assert_eq!(store.occupancy_row_count(), 2);
    let signals = store.occupancy_signals_for(&restaurant("r1"));
    assert_eq!(signals[0].occupancy_pct, 75.0);
}

#[test]
fn at_core_db_08_audit_is_append_only_and_filterable() {
    let mut store = MesaStore::new_in_memory();
    store
        .append_audit_row(audit_event(AuditAction::Publish, None))
        .unwrap();
    store
        .append_audit_row(audit_event(AuditAction::Consume, Some(AuditDecision::Deny)))
        .unwrap();
    store
        .append_audit_row(audit_event(
            AuditAction::Consume,
            Some(AuditDecision::Allow),
        ))
        .unwrap();

    assert_eq!(store.audit_rows().len(), 3);
    let consumes = store.audit_filtered(&AuditFilter {
        action: Some(AuditAction::Consume),
        ..AuditFilter::default()
    });
    assert_eq!(consumes.len(), 2);
    assert!(matches!(
        store.attempt_overwrite_audit_row(1),
        Err(StorageError::AppendOnlyViolation { table: "audit" })
    ));
}

#[test]
fn at_core_db_09_audit_since_filter_is_inclusive_lower_bound() {
    let mut store = MesaStore::new_in_memory();
    let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
    for offset in [0, 1, 2] {
        let mut event = audit_event(AuditAction::Consume, Some(AuditDecision::Allow));
        event.ts = t0 + Duration::minutes(offset);
        store.append_audit_row(event).unwrap();
    }
    let since = store.audit_filtered(&AuditFilter {
        since: Some(t0 + Duration::minutes(1)),
        ..AuditFilter::default()
    });
    assert_eq!(since.len(), 2);
}

#[test]
fn at_core_db_10_spaces_are_independent() {
    let mut store = MesaStore::new_in_memory();
    let space_a = SpaceId::new("space_a").unwrap();
    let space_b = SpaceId::new("space_b").unwrap();

    let product = sample_product();
    store.publish_product(&space_a, product.clone()).unwrap();

    assert!(store.published_product(&space_a, &product.id).is_some());
    assert!(store.published_product(&space_b, &product.id).is_none());
    assert_eq!(store.published_in_space(&space_b).len(), 0);
}

#[test]
fn at_core_db_11_product_upsert_by_id_overwrites() {
    let mut store = MesaStore::new_in_memory();
    let mut product = sample_product();
    store.upsert_product(product.clone()).unwrap();
    product.metadata.title = "Menu of r1 v2".to_string();
    store.upsert_product(product.clone()).unwrap();

    let stored = store.product(&product.id).unwrap();
    assert_eq!(stored.metadata.title, "Menu of r1 v2");
}

#[test]
fn at_core_db_12_contract_violation_surfaces_as_contract_error() {
    let mut store = MesaStore::new_in_memory();
    let mut item = menu_item("r1", "i1", "Tortilla");
    item.price = Decimal::new(-1, 0);
    assert!(matches!(
        store.upsert_menu_items(vec![item]),
        Err(StorageError::Contract(_))
    ));
    assert_eq!(store.menu_row_count(), 0);
}

fn sample_product() -> mesa_kernel_contracts::product::DataProduct {
    use mesa_kernel_contracts::policy::AccessPolicy;
    use mesa_kernel_contracts::product::{
        DataProduct, PayloadRef, ProductMetadata, ProductType,
    };

    DataProduct {
        id: Uuid::new_v4(),
        product_type: ProductType::Menu,
        version: 1,
        schema: json!({"type": "array"}),
        metadata: ProductMetadata {
            title: "Menu of r1".to_string(),
            granularity: "item".to_string(),
            latency: "batch".to_string(),
            restaurant_id: Some(restaurant("r1")),
        },
        policy: AccessPolicy {
            allowed_purposes: vec!["analytics".to_string()],
            allowed_roles: vec!["consumer".to_string()],
            retention_days: 30,
            pii: false,
        },
        created_by_org: org("org_a"),
        created_at: Utc::now(),
        payload_ref: Some(PayloadRef::normalized(SourceKind::Menu, restaurant("r1"))),
    }
}
