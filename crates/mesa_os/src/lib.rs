#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod ingress;
pub mod product;
pub mod space;

pub use config::PipelineConfig;
pub use error::CoreError;

use mesa_engines::ConnectorRegistry;
use mesa_storage::{AuditRepo, CanonicalRepo, ProductRepo, SpaceRepo, StagingRepo};

/// Everything the pipeline needs from its record store. Implemented by
/// `mesa_storage::MesaStore`; substitutable by any store preserving
/// append / upsert-by-key / filtered-list semantics.
pub trait PipelineStore:
    StagingRepo + CanonicalRepo + ProductRepo + SpaceRepo + AuditRepo
{
}

impl<T> PipelineStore for T where
    T: StagingRepo + CanonicalRepo + ProductRepo + SpaceRepo + AuditRepo
{
}

/// The ingestion-to-consumption core. Holds the connector registry,
/// the record store, and the pipeline configuration; all collaborators
/// are constructor-injected, nothing is process-wide.
pub struct Pipeline<S> {
    registry: ConnectorRegistry,
    config: PipelineConfig,
    store: S,
}

impl<S: PipelineStore> Pipeline<S> {
    pub fn new(registry: ConnectorRegistry, config: PipelineConfig, store: S) -> Self {
        Self {
            registry,
            config,
            store,
        }
    }

    pub fn mvp_v1(store: S) -> Self {
        Self::new(ConnectorRegistry::mvp_v1(), PipelineConfig::mvp_v1(), store)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
