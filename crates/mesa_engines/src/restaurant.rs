#![forbid(unsafe_code)]

use serde::Deserialize;
use serde_json::Value;

use mesa_kernel_contracts::canonical::RestaurantProfile;
use mesa_kernel_contracts::pipeline::CanonicalBatch;
use mesa_kernel_contracts::staging::IngestContext;
use mesa_kernel_contracts::{ContractViolation, RestaurantId, SourceKind};

use crate::connector::{parse_payload, Connector};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRestaurantPayload {
    restaurant_id: String,
    name: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    cuisine: Option<String>,
}

fn check_payload(payload: &RawRestaurantPayload) -> Result<(), ContractViolation> {
    if payload.restaurant_id.trim().is_empty() {
        return Err(ContractViolation::InvalidValue {
            field: "restaurant_payload.restaurant_id",
            reason: "must not be empty",
        });
    }
    if payload.name.trim().is_empty() {
        return Err(ContractViolation::InvalidValue {
            field: "restaurant_payload.name",
            reason: "must not be empty",
        });
    }
    Ok(())
}

fn trimmed_opt(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub struct RestaurantConnector;

impl Connector for RestaurantConnector {
    fn id(&self) -> &'static str {
        "connector.restaurant.v1"
    }

    fn source(&self) -> SourceKind {
        SourceKind::Restaurant
    }

    fn validate(&self, raw: &Value) -> Result<(), ContractViolation> {
        let payload: RawRestaurantPayload = parse_payload("restaurant_payload", raw)?;
        check_payload(&payload)
    }

    fn to_canonical(
        &self,
        raw: &Value,
        _ctx: &IngestContext,
    ) -> Result<CanonicalBatch, ContractViolation> {
        let payload: RawRestaurantPayload = parse_payload("restaurant_payload", raw)?;
        check_payload(&payload)?;

        let mut batch = CanonicalBatch::default();
        batch.profiles.push(RestaurantProfile {
            restaurant_id: RestaurantId::new(payload.restaurant_id.trim())?,
            name: payload.name.trim().to_string(),
            address: trimmed_opt(&payload.address),
            cuisine: trimmed_opt(&payload.cuisine),
        });
        Ok(batch)
    }
}
