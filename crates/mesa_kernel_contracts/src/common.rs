#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum ContractViolation {
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
    InvalidRange {
        field: &'static str,
        min: f64,
        max: f64,
        got: f64,
    },
    NotFinite {
        field: &'static str,
    },
    Malformed {
        field: &'static str,
        detail: String,
    },
}

pub trait Validate {
    fn validate(&self) -> Result<(), ContractViolation>;
}

pub(crate) fn validate_token(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<(), ContractViolation> {
    if value.trim().is_empty() {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must not be empty",
        });
    }
    if value.len() > max_len {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "exceeds max length",
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(String);

impl OrgId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContractViolation> {
        let id = id.into();
        validate_token("org_id", &id, 128)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for OrgId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_token("org_id", &self.0, 128)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantId(String);

impl RestaurantId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContractViolation> {
        let id = id.into();
        validate_token("restaurant_id", &id, 128)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for RestaurantId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_token("restaurant_id", &self.0, 128)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(String);

impl SpaceId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContractViolation> {
        let id = id.into();
        validate_token("space_id", &id, 128)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for SpaceId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_token("space_id", &self.0, 128)
    }
}

/// Closed set of producer-facing source contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Menu,
    Occupancy,
    Restaurant,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Menu => "menu",
            SourceKind::Occupancy => "occupancy",
            SourceKind::Restaurant => "restaurant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "menu" => Some(SourceKind::Menu),
            "occupancy" => Some(SourceKind::Occupancy),
            "restaurant" => Some(SourceKind::Restaurant),
            _ => None,
        }
    }

    pub const ALL: [SourceKind; 3] = [
        SourceKind::Menu,
        SourceKind::Occupancy,
        SourceKind::Restaurant,
    ];
}
