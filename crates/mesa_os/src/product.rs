#![forbid(unsafe_code)]

use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use mesa_kernel_contracts::product::{
    BuildProductRequest, DataProduct, PayloadRef, ProductFilter, ProductMetadata, ProductType,
};
use mesa_kernel_contracts::{RestaurantId, Validate};

use crate::error::CoreError;
use crate::{Pipeline, PipelineStore};

impl<S: PipelineStore> Pipeline<S> {
    /// Assemble a governed product over the restaurant's canonical
    /// data. The canonical extent is read to describe the product, not
    /// to embed it: the payload stays a reference and is re-resolved at
    /// consume time.
    pub fn build_product(&mut self, req: BuildProductRequest) -> Result<DataProduct, CoreError> {
        req.validate().map_err(CoreError::Validation)?;

        let policy = self.config.merged_policy(req.policy_overrides.as_ref());
        // A bad override (for example retention_days 0) is a caller
        // error, caught here before anything is persisted.
        policy.validate().map_err(CoreError::Validation)?;
        let (schema, metadata) = self.describe(req.product_type, &req.restaurant_id);
        let product = DataProduct {
            id: Uuid::new_v4(),
            product_type: req.product_type,
            version: self.config.product_version,
            schema,
            metadata,
            policy,
            created_by_org: req.identity.org_id.clone(),
            created_at: Utc::now(),
            payload_ref: Some(PayloadRef::normalized(
                req.product_type.payload_source(),
                req.restaurant_id.clone(),
            )),
        };
        self.store.upsert_product(product.clone())?;
        info!(
            product_id = %product.id,
            product_type = req.product_type.as_str(),
            restaurant = req.restaurant_id.as_str(),
            org = req.identity.org_id.as_str(),
            "built data product"
        );
        Ok(product)
    }

    pub fn list_products(&self, filter: &ProductFilter) -> Vec<DataProduct> {
        self.store.products_filtered(filter)
    }

    fn describe(
        &self,
        product_type: ProductType,
        restaurant_id: &RestaurantId,
    ) -> (Value, ProductMetadata) {
        match product_type {
            ProductType::Menu => {
                let record_count = self.store.menu_items_for(restaurant_id).len();
                (
                    json!({
                        "type": "array",
                        "itemSchema": "canonicalMenuItem",
                        "recordCount": record_count,
                    }),
                    ProductMetadata {
                        title: format!("Menu of {}", restaurant_id.as_str()),
                        granularity: "item".to_string(),
                        latency: "batch".to_string(),
                        restaurant_id: Some(restaurant_id.clone()),
                    },
                )
            }
            ProductType::Occupancy => {
                let record_count = self.store.occupancy_signals_for(restaurant_id).len();
                (
                    json!({
                        "type": "array",
                        "itemSchema": "canonicalOccupancySignal",
                        "recordCount": record_count,
                    }),
                    ProductMetadata {
                        title: format!("Occupancy of {}", restaurant_id.as_str()),
                        granularity: "signal".to_string(),
                        latency: "near-real-time".to_string(),
                        restaurant_id: Some(restaurant_id.clone()),
                    },
                )
            }
            ProductType::Restaurant => {
                let record_count = usize::from(self.store.profile_for(restaurant_id).is_some());
                (
                    json!({
                        "type": "object",
                        "itemSchema": "restaurantProfile",
                        "recordCount": record_count,
                    }),
                    ProductMetadata {
                        title: format!("Profile of {}", restaurant_id.as_str()),
                        granularity: "profile".to_string(),
                        latency: "batch".to_string(),
                        restaurant_id: Some(restaurant_id.clone()),
                    },
                )
            }
        }
    }
}
