#![forbid(unsafe_code)]

pub mod connector;
pub mod menu;
pub mod occupancy;
pub mod policy_eval;
pub mod restaurant;

pub use connector::{Connector, ConnectorRegistry};
pub use policy_eval::evaluate;
