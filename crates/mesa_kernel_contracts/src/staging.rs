#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{ContractViolation, OrgId, SourceKind, Validate};

/// Raw payload as received from a producer, prior to normalization.
/// Immutable once appended; the staging table is the pipeline's replay log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagingRecord {
    pub id: Uuid,
    pub source: SourceKind,
    pub org_id: Option<OrgId>,
    pub received_at: DateTime<Utc>,
    pub payload: serde_json::Value,
    /// Integrity tag over the serialized payload, computed at append time.
    pub payload_sha256: String,
}

impl Validate for StagingRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if let Some(org) = &self.org_id {
            org.validate()?;
        }
        if self.payload_sha256.len() != 64
            || !self.payload_sha256.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(ContractViolation::InvalidValue {
                field: "staging_record.payload_sha256",
                reason: "must be 64 hex chars",
            });
        }
        Ok(())
    }
}

/// Append input; the staging store fills in id and received_at when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct StagingRecordInput {
    pub id: Option<Uuid>,
    pub source: SourceKind,
    pub org_id: Option<OrgId>,
    pub received_at: Option<DateTime<Utc>>,
    pub payload: serde_json::Value,
}

impl StagingRecordInput {
    pub fn v1(
        source: SourceKind,
        org_id: Option<OrgId>,
        received_at: Option<DateTime<Utc>>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: None,
            source,
            org_id,
            received_at,
            payload,
        }
    }
}

/// Context handed to the core by the request gatekeeper: a validated
/// caller identity scope plus the wall-clock instant of the request.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestContext {
    pub org_id: OrgId,
    pub requested_at: DateTime<Utc>,
}

impl IngestContext {
    pub fn v1(org_id: OrgId, requested_at: DateTime<Utc>) -> Self {
        Self {
            org_id,
            requested_at,
        }
    }
}

/// Receipt returned to the producer after a successful ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReceipt {
    pub staging_record_id: Uuid,
    pub received_at: DateTime<Utc>,
}
