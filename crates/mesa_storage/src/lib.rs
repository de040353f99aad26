#![forbid(unsafe_code)]

pub mod repo;
pub mod snapshot;
pub mod store;

pub use repo::{AuditRepo, CanonicalRepo, ProductRepo, SpaceRepo, StagingRepo};
pub use snapshot::JsonSnapshot;
pub use store::{MesaStore, StorageError};
