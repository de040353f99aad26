#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{validate_token, ContractViolation, OrgId, RestaurantId, SourceKind, Validate};
use crate::policy::{AccessPolicy, Identity, PolicyOverrides};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Menu,
    Occupancy,
    Restaurant,
}

impl ProductType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductType::Menu => "menu",
            ProductType::Occupancy => "occupancy",
            ProductType::Restaurant => "restaurant",
        }
    }

    /// Canonical source backing this product type's payload.
    pub fn payload_source(self) -> SourceKind {
        match self {
            ProductType::Menu => SourceKind::Menu,
            ProductType::Occupancy => SourceKind::Occupancy,
            ProductType::Restaurant => SourceKind::Restaurant,
        }
    }
}

/// Pointer back into the canonical store. The product never embeds a
/// payload snapshot; consumers get the canonical data as of consume time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadRef {
    pub kind: String,
    pub source: SourceKind,
    pub restaurant_id: RestaurantId,
}

impl PayloadRef {
    pub fn normalized(source: SourceKind, restaurant_id: RestaurantId) -> Self {
        Self {
            kind: "normalized".to_string(),
            source,
            restaurant_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMetadata {
    pub title: String,
    pub granularity: String,
    pub latency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<RestaurantId>,
}

/// Governed, versioned packaging of canonical data. Identity is the
/// uuid; rebuilding with the same id overwrites (upsert, not append).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProduct {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub version: u32,
    pub schema: serde_json::Value,
    pub metadata: ProductMetadata,
    pub policy: AccessPolicy,
    pub created_by_org: OrgId,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_ref: Option<PayloadRef>,
}

impl Validate for DataProduct {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.version == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "data_product.version",
                reason: "must be > 0",
            });
        }
        validate_token("data_product.metadata.title", &self.metadata.title, 256)?;
        self.policy.validate()?;
        self.created_by_org.validate()?;
        if let Some(r) = &self.payload_ref {
            if r.kind != "normalized" {
                return Err(ContractViolation::InvalidValue {
                    field: "data_product.payload_ref.kind",
                    reason: "must be 'normalized'",
                });
            }
            r.restaurant_id.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildProductRequest {
    pub product_type: ProductType,
    pub restaurant_id: RestaurantId,
    pub identity: Identity,
    pub policy_overrides: Option<PolicyOverrides>,
}

impl BuildProductRequest {
    pub fn v1(
        product_type: ProductType,
        restaurant_id: RestaurantId,
        identity: Identity,
        policy_overrides: Option<PolicyOverrides>,
    ) -> Result<Self, ContractViolation> {
        let req = Self {
            product_type,
            restaurant_id,
            identity,
            policy_overrides,
        };
        req.validate()?;
        Ok(req)
    }
}

impl Validate for BuildProductRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.restaurant_id.validate()?;
        self.identity.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub product_type: Option<ProductType>,
    pub restaurant_id: Option<RestaurantId>,
}
