#![forbid(unsafe_code)]

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use mesa_engines::evaluate;
use mesa_kernel_contracts::audit::{AuditAction, AuditDecision, AuditEvent, AuditFilter};
use mesa_kernel_contracts::pipeline::{ConsumeOutcome, ProductPayload, PublishReceipt};
use mesa_kernel_contracts::policy::Identity;
use mesa_kernel_contracts::product::{DataProduct, ProductType};
use mesa_kernel_contracts::{SourceKind, SpaceId};

use crate::error::CoreError;
use crate::{Pipeline, PipelineStore};

const REASON_PRODUCT_NOT_FOUND: &str = "product not found";

impl<S: PipelineStore> Pipeline<S> {
    /// Publish a product into a space's published set. Idempotent:
    /// republishing overwrites. Appends one PUBLISH audit event.
    pub fn publish(
        &mut self,
        space: &SpaceId,
        product_id: &Uuid,
        actor: &Identity,
    ) -> Result<PublishReceipt, CoreError> {
        let product = self
            .store
            .product(product_id)
            .ok_or_else(|| CoreError::NotFound {
                kind: "product",
                key: product_id.to_string(),
            })?;
        let id = self.store.publish_product(space, product)?;
        self.store.append_audit_row(AuditEvent {
            ts: Utc::now(),
            actor_org: actor.org_id.clone(),
            action: AuditAction::Publish,
            space: Some(space.clone()),
            product_id: Some(id),
            purpose: None,
            decision: None,
            reason: None,
        })?;
        info!(space = space.as_str(), product_id = %id, org = actor.org_id.as_str(), "published product");
        Ok(PublishReceipt { id })
    }

    /// Consume a published product. Every attempt appends exactly one
    /// CONSUME audit event: policy allow/deny with the decision, a miss
    /// with the decision absent. On allow the payload is re-resolved
    /// from the canonical store through the product's payload ref.
    pub fn consume(
        &mut self,
        space: &SpaceId,
        product_id: &Uuid,
        actor: &Identity,
        purpose: &str,
    ) -> Result<ConsumeOutcome, CoreError> {
        let Some(product) = self.store.published_product(space, product_id) else {
            self.append_consume_audit(space, *product_id, actor, purpose, None, REASON_PRODUCT_NOT_FOUND)?;
            warn!(space = space.as_str(), product_id = %product_id, "consume miss: product not published");
            return Ok(ConsumeOutcome::Denied {
                reason: REASON_PRODUCT_NOT_FOUND.to_string(),
            });
        };

        let decision = evaluate(&product.policy, actor, purpose);
        let audit_decision = if decision.allow {
            AuditDecision::Allow
        } else {
            AuditDecision::Deny
        };
        self.append_consume_audit(
            space,
            product.id,
            actor,
            purpose,
            Some(audit_decision),
            &decision.reason,
        )?;

        if !decision.allow {
            warn!(
                space = space.as_str(),
                product_id = %product.id,
                org = actor.org_id.as_str(),
                purpose,
                reason = decision.reason.as_str(),
                "consume denied"
            );
            return Ok(ConsumeOutcome::Denied {
                reason: decision.reason,
            });
        }

        let payload = self.resolve_payload(&product);
        info!(
            space = space.as_str(),
            product_id = %product.id,
            org = actor.org_id.as_str(),
            purpose,
            "consume allowed"
        );
        Ok(ConsumeOutcome::Allowed { product, payload })
    }

    pub fn list_audit(&self, filter: &AuditFilter) -> Vec<AuditEvent> {
        self.store.audit_filtered(filter)
    }

    fn append_consume_audit(
        &mut self,
        space: &SpaceId,
        product_id: Uuid,
        actor: &Identity,
        purpose: &str,
        decision: Option<AuditDecision>,
        reason: &str,
    ) -> Result<(), CoreError> {
        self.store.append_audit_row(AuditEvent {
            ts: Utc::now(),
            actor_org: actor.org_id.clone(),
            action: AuditAction::Consume,
            space: Some(space.clone()),
            product_id: Some(product_id),
            purpose: Some(purpose.to_string()),
            decision,
            reason: Some(reason.to_string()),
        })?;
        Ok(())
    }

    fn resolve_payload(&self, product: &DataProduct) -> ProductPayload {
        let Some(payload_ref) = &product.payload_ref else {
            // No reference to follow; an empty payload of the product's
            // shape, not an error.
            return match product.product_type {
                ProductType::Menu => ProductPayload::MenuItems { items: Vec::new() },
                ProductType::Occupancy => ProductPayload::OccupancySignals {
                    signals: Vec::new(),
                },
                ProductType::Restaurant => ProductPayload::Profile { profile: None },
            };
        };
        match payload_ref.source {
            SourceKind::Menu => ProductPayload::MenuItems {
                items: self.store.menu_items_for(&payload_ref.restaurant_id),
            },
            SourceKind::Occupancy => ProductPayload::OccupancySignals {
                signals: self
                    .store
                    .occupancy_signals_for(&payload_ref.restaurant_id),
            },
            SourceKind::Restaurant => ProductPayload::Profile {
                profile: self.store.profile_for(&payload_ref.restaurant_id),
            },
        }
    }
}
