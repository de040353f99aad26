#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::{validate_token, ContractViolation, RestaurantId, Validate};

/// Normalized menu item. Natural key: (restaurant_id, id).
/// Last write wins on key collision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalMenuItem {
    pub id: String,
    pub restaurant_id: RestaurantId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Lowercased, trimmed, deduplicated by value.
    pub allergens: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gluten_free: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vegan: Option<bool>,
}

impl CanonicalMenuItem {
    pub fn natural_key(&self) -> (RestaurantId, String) {
        (self.restaurant_id.clone(), self.id.clone())
    }
}

impl Validate for CanonicalMenuItem {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_token("canonical_menu_item.id", &self.id, 128)?;
        self.restaurant_id.validate()?;
        validate_token("canonical_menu_item.name", &self.name, 256)?;
        if self.price < Decimal::ZERO {
            return Err(ContractViolation::InvalidValue {
                field: "canonical_menu_item.price",
                reason: "must be >= 0",
            });
        }
        validate_token("canonical_menu_item.currency", &self.currency, 8)?;
        for allergen in &self.allergens {
            if allergen.trim() != allergen || allergen.to_lowercase() != *allergen {
                return Err(ContractViolation::InvalidValue {
                    field: "canonical_menu_item.allergens",
                    reason: "must be trimmed and lowercase",
                });
            }
        }
        Ok(())
    }
}

/// Normalized occupancy reading. Natural key: (restaurant_id, ts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalOccupancySignal {
    pub restaurant_id: RestaurantId,
    pub ts: DateTime<Utc>,
    pub occupancy_pct: f64,
}

impl CanonicalOccupancySignal {
    pub fn natural_key(&self) -> (RestaurantId, DateTime<Utc>) {
        (self.restaurant_id.clone(), self.ts)
    }
}

impl Validate for CanonicalOccupancySignal {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.restaurant_id.validate()?;
        if !self.occupancy_pct.is_finite() {
            return Err(ContractViolation::NotFinite {
                field: "canonical_occupancy_signal.occupancy_pct",
            });
        }
        if !(0.0..=100.0).contains(&self.occupancy_pct) {
            return Err(ContractViolation::InvalidRange {
                field: "canonical_occupancy_signal.occupancy_pct",
                min: 0.0,
                max: 100.0,
                got: self.occupancy_pct,
            });
        }
        Ok(())
    }
}

/// Normalized restaurant profile. One row per restaurant; the most
/// recent upsert wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantProfile {
    pub restaurant_id: RestaurantId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
}

impl Validate for RestaurantProfile {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.restaurant_id.validate()?;
        validate_token("restaurant_profile.name", &self.name, 256)?;
        Ok(())
    }
}

/// Clamp a raw percentage into [0, 100] and round to the nearest integer.
/// This is the occupancy connector's rounding mode.
pub fn clamp_round_pct(raw: f64) -> f64 {
    raw.clamp(0.0, 100.0).round()
}

/// Clamp a raw percentage into [0, 100] and round to two decimals.
/// Generic domain helper; the occupancy connector does not use it and
/// rounds to whole integers instead.
pub fn round_pct_two_decimals(raw: f64) -> f64 {
    (raw.clamp(0.0, 100.0) * 100.0).round() / 100.0
}
