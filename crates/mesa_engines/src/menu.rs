#![forbid(unsafe_code)]

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use mesa_kernel_contracts::canonical::CanonicalMenuItem;
use mesa_kernel_contracts::pipeline::CanonicalBatch;
use mesa_kernel_contracts::staging::IngestContext;
use mesa_kernel_contracts::{ContractViolation, RestaurantId, SourceKind};

use crate::connector::{parse_payload, Connector};

const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMenuPayload {
    restaurant_id: String,
    #[serde(default)]
    currency: Option<String>,
    items: Vec<RawMenuItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMenuItem {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    price: Decimal,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    allergens: Vec<String>,
    #[serde(default)]
    gluten_free: Option<bool>,
    #[serde(default)]
    vegan: Option<bool>,
}

fn check_payload(payload: &RawMenuPayload) -> Result<(), ContractViolation> {
    if payload.restaurant_id.trim().is_empty() {
        return Err(ContractViolation::InvalidValue {
            field: "menu_payload.restaurant_id",
            reason: "must not be empty",
        });
    }
    for item in &payload.items {
        if item.id.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "menu_payload.items.id",
                reason: "must not be empty",
            });
        }
        if item.name.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "menu_payload.items.name",
                reason: "must not be empty",
            });
        }
        if item.price < Decimal::ZERO {
            return Err(ContractViolation::InvalidValue {
                field: "menu_payload.items.price",
                reason: "must be >= 0",
            });
        }
    }
    Ok(())
}

/// Lowercase, trim, and deduplicate by value, preserving first-seen
/// order. Empty tags are dropped.
fn canonical_allergens(raw: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for tag in raw {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() || seen.contains(&tag) {
            continue;
        }
        seen.push(tag);
    }
    seen
}

fn trimmed_opt(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub struct MenuConnector;

impl Connector for MenuConnector {
    fn id(&self) -> &'static str {
        "connector.menu.v1"
    }

    fn source(&self) -> SourceKind {
        SourceKind::Menu
    }

    fn validate(&self, raw: &Value) -> Result<(), ContractViolation> {
        let payload: RawMenuPayload = parse_payload("menu_payload", raw)?;
        check_payload(&payload)
    }

    fn to_canonical(
        &self,
        raw: &Value,
        _ctx: &IngestContext,
    ) -> Result<CanonicalBatch, ContractViolation> {
        let payload: RawMenuPayload = parse_payload("menu_payload", raw)?;
        check_payload(&payload)?;

        let restaurant_id = RestaurantId::new(payload.restaurant_id.trim())?;
        let payload_currency = trimmed_opt(&payload.currency);

        let mut batch = CanonicalBatch::default();
        for item in &payload.items {
            let currency = trimmed_opt(&item.currency)
                .or_else(|| payload_currency.clone())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
            batch.menu_items.push(CanonicalMenuItem {
                id: item.id.trim().to_string(),
                restaurant_id: restaurant_id.clone(),
                name: item.name.trim().to_string(),
                description: trimmed_opt(&item.description),
                price: item.price,
                currency,
                category: trimmed_opt(&item.category),
                allergens: canonical_allergens(&item.allergens),
                gluten_free: item.gluten_free,
                vegan: item.vegan,
            });
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mesa_kernel_contracts::OrgId;
    use serde_json::json;

    fn ctx() -> IngestContext {
        IngestContext::v1(OrgId::new("org_demo").unwrap(), Utc::now())
    }

    fn tortilla_payload() -> Value {
        json!({
            "restaurantId": "r1",
            "items": [{
                "id": "i1",
                "name": " Tortilla ",
                "allergens": ["GLUTEN"],
                "price": 5,
                "glutenFree": false
            }]
        })
    }

    #[test]
    fn at_menu_01_trims_name_and_lowercases_allergens() {
        let batch = MenuConnector
            .to_canonical(&tortilla_payload(), &ctx())
            .unwrap();
        assert_eq!(batch.menu_items.len(), 1);
        let item = &batch.menu_items[0];
        assert_eq!(item.name, "Tortilla");
        assert_eq!(item.allergens, vec!["gluten".to_string()]);
        assert_eq!(item.gluten_free, Some(false));
    }

    #[test]
    fn at_menu_02_currency_falls_back_to_payload_then_eur() {
        let payload = json!({
            "restaurantId": "r1",
            "currency": "CHF",
            "items": [
                {"id": "a", "name": "Rösti", "price": 12, "currency": "EUR"},
                {"id": "b", "name": "Fondue", "price": 24}
            ]
        });
        let batch = MenuConnector.to_canonical(&payload, &ctx()).unwrap();
        assert_eq!(batch.menu_items[0].currency, "EUR");
        assert_eq!(batch.menu_items[1].currency, "CHF");

        let bare = json!({
            "restaurantId": "r1",
            "items": [{"id": "c", "name": "Salad", "price": 7}]
        });
        let batch = MenuConnector.to_canonical(&bare, &ctx()).unwrap();
        assert_eq!(batch.menu_items[0].currency, "EUR");
    }

    #[test]
    fn at_menu_03_allergens_deduplicated_by_value() {
        let payload = json!({
            "restaurantId": "r1",
            "items": [{
                "id": "i1",
                "name": "Pasta",
                "price": 9,
                "allergens": ["Gluten", " gluten ", "EGG", "egg", ""]
            }]
        });
        let batch = MenuConnector.to_canonical(&payload, &ctx()).unwrap();
        assert_eq!(
            batch.menu_items[0].allergens,
            vec!["gluten".to_string(), "egg".to_string()]
        );
    }

    #[test]
    fn at_menu_04_negative_price_rejected() {
        let payload = json!({
            "restaurantId": "r1",
            "items": [{"id": "i1", "name": "Soup", "price": -1}]
        });
        assert!(matches!(
            MenuConnector.validate(&payload),
            Err(ContractViolation::InvalidValue { field, .. })
                if field == "menu_payload.items.price"
        ));
    }

    #[test]
    fn at_menu_05_malformed_shape_rejected() {
        let payload = json!({"restaurantId": "r1"});
        assert!(matches!(
            MenuConnector.validate(&payload),
            Err(ContractViolation::Malformed { .. })
        ));
    }

    #[test]
    fn at_menu_06_to_canonical_is_deterministic() {
        let payload = tortilla_payload();
        let first = MenuConnector.to_canonical(&payload, &ctx()).unwrap();
        let second = MenuConnector.to_canonical(&payload, &ctx()).unwrap();
        assert_eq!(first, second);
    }
}
