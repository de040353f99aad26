#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canonical::{CanonicalMenuItem, CanonicalOccupancySignal, RestaurantProfile};
use crate::product::DataProduct;

/// Output of a connector's canonical mapping. Exactly one of the
/// collections is populated per source kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalBatch {
    pub menu_items: Vec<CanonicalMenuItem>,
    pub occupancy_signals: Vec<CanonicalOccupancySignal>,
    pub profiles: Vec<RestaurantProfile>,
}

impl CanonicalBatch {
    pub fn is_empty(&self) -> bool {
        self.menu_items.is_empty() && self.occupancy_signals.is_empty() && self.profiles.is_empty()
    }
}

/// Counts returned by a normalization run. Upsert counts conflate
/// insert and replace: an item landing on an existing natural key
/// still counts as upserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeReport {
    pub processed: usize,
    pub menu_items_upserted: usize,
    pub occupancy_signals_upserted: usize,
    pub profiles_upserted: usize,
    /// Staging records whose payload no longer passes canonicalization.
    /// Skipped rather than blocking the run; the replay log keeps them.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReceipt {
    pub id: Uuid,
}

/// Payload resolved from the canonical store at consume time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ProductPayload {
    MenuItems { items: Vec<CanonicalMenuItem> },
    OccupancySignals { signals: Vec<CanonicalOccupancySignal> },
    Profile { profile: Option<RestaurantProfile> },
}

/// Result of a consume attempt. A denial is a first-class outcome, not
/// an error; both arms are always audited.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumeOutcome {
    Allowed {
        product: DataProduct,
        payload: ProductPayload,
    },
    Denied {
        reason: String,
    },
}

impl ConsumeOutcome {
    pub fn is_denied(&self) -> bool {
        matches!(self, ConsumeOutcome::Denied { .. })
    }
}
