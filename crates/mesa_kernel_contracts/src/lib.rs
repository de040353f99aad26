#![forbid(unsafe_code)]

pub mod audit;
pub mod canonical;
pub mod common;
pub mod pipeline;
pub mod policy;
pub mod product;
pub mod staging;

pub use common::{ContractViolation, OrgId, RestaurantId, SourceKind, SpaceId, Validate};
