#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::common::{ContractViolation, OrgId, Validate};

/// Access policy attached to every data product.
///
/// Invariant: `pii` is always false on a stored product. The product
/// builder force-sets it; `validate` rejects any policy where it leaked
/// through as true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicy {
    pub allowed_purposes: Vec<String>,
    pub allowed_roles: Vec<String>,
    pub retention_days: u32,
    pub pii: bool,
}

impl Validate for AccessPolicy {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.pii {
            return Err(ContractViolation::InvalidValue {
                field: "access_policy.pii",
                reason: "must be false",
            });
        }
        if self.retention_days == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "access_policy.retention_days",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

/// Caller-supplied partial policy; merged over the configured default
/// by the product builder. A `pii` override is accepted syntactically
/// and then discarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_purposes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pii: Option<bool>,
}

/// Validated consumer identity, as handed over by the request gatekeeper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub org_id: OrgId,
    pub roles: Vec<String>,
}

impl Identity {
    pub fn v1(org_id: OrgId, roles: Vec<String>) -> Self {
        Self { org_id, roles }
    }
}

impl Validate for Identity {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.org_id.validate()
    }
}

/// Outcome of a policy evaluation. A negative decision is a business
/// result carrying its reason, not a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub allow: bool,
    pub reason: String,
}

impl PolicyDecision {
    pub fn allow() -> Self {
        Self {
            allow: true,
            reason: "access granted".to_string(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allow: false,
            reason: reason.into(),
        }
    }
}
