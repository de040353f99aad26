#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{ContractViolation, OrgId, SpaceId, Validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Publish,
    Consume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditDecision {
    Allow,
    Deny,
}

/// One row in the append-only access ledger. Never mutated, never
/// deleted; the sole source of truth for who accessed what and why.
///
/// A consume against an unpublished product is logged with `decision`
/// absent, distinguishing a miss from a policy denial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub ts: DateTime<Utc>,
    pub actor_org: OrgId,
    pub action: AuditAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space: Option<SpaceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<AuditDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Validate for AuditEvent {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.actor_org.validate()?;
        if let Some(space) = &self.space {
            space.validate()?;
        }
        if let Some(purpose) = &self.purpose {
            if purpose.trim().is_empty() {
                return Err(ContractViolation::InvalidValue {
                    field: "audit_event.purpose",
                    reason: "must not be empty when provided",
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditFilter {
    pub action: Option<AuditAction>,
    pub product_id: Option<Uuid>,
    pub space: Option<SpaceId>,
    /// Inclusive lower bound on event ts.
    pub since: Option<DateTime<Utc>>,
}
