#![forbid(unsafe_code)]

use serde::de::DeserializeOwned;
use serde_json::Value;

use mesa_kernel_contracts::pipeline::CanonicalBatch;
use mesa_kernel_contracts::staging::IngestContext;
use mesa_kernel_contracts::{ContractViolation, SourceKind};

use crate::menu::MenuConnector;
use crate::occupancy::OccupancyConnector;
use crate::restaurant::RestaurantConnector;

/// Per-source contract. The set of connectors is closed and known at
/// build time; the registry owns one instance per source.
///
/// `to_canonical` is a pure mapping with no side effects. Normalization
/// re-derives canonical data from staging on every run, so it must be
/// safe to call repeatedly on the same input.
pub trait Connector {
    fn id(&self) -> &'static str;

    fn source(&self) -> SourceKind;

    /// Schema-check the source-specific shape without mapping it.
    fn validate(&self, raw: &Value) -> Result<(), ContractViolation>;

    /// Map a validated raw payload to canonical domain objects.
    fn to_canonical(
        &self,
        raw: &Value,
        ctx: &IngestContext,
    ) -> Result<CanonicalBatch, ContractViolation>;
}

pub(crate) fn parse_payload<T: DeserializeOwned>(
    field: &'static str,
    raw: &Value,
) -> Result<T, ContractViolation> {
    serde_json::from_value(raw.clone()).map_err(|e| ContractViolation::Malformed {
        field,
        detail: e.to_string(),
    })
}

/// Resolves connector-by-source. Constructor-built; no process-wide
/// registration.
pub struct ConnectorRegistry {
    connectors: Vec<Box<dyn Connector + Send + Sync>>,
}

impl ConnectorRegistry {
    pub fn new(connectors: Vec<Box<dyn Connector + Send + Sync>>) -> Self {
        Self { connectors }
    }

    pub fn mvp_v1() -> Self {
        Self::new(vec![
            Box::new(MenuConnector),
            Box::new(OccupancyConnector),
            Box::new(RestaurantConnector),
        ])
    }

    pub fn resolve(&self, source: SourceKind) -> Option<&(dyn Connector + Send + Sync)> {
        self.connectors
            .iter()
            .find(|c| c.source() == source)
            .map(|c| c.as_ref())
    }

    pub fn sources(&self) -> Vec<SourceKind> {
        self.connectors.iter().map(|c| c.source()).collect()
    }
}
