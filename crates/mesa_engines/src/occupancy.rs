#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use mesa_kernel_contracts::canonical::{clamp_round_pct, CanonicalOccupancySignal};
use mesa_kernel_contracts::pipeline::CanonicalBatch;
use mesa_kernel_contracts::staging::IngestContext;
use mesa_kernel_contracts::{ContractViolation, RestaurantId, SourceKind};

use crate::connector::{parse_payload, Connector};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOccupancyPayload {
    restaurant_id: String,
    signals: Vec<RawOccupancySignal>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOccupancySignal {
    ts: DateTime<Utc>,
    #[serde(default)]
    occupancy_pct: Option<f64>,
    #[serde(default)]
    occupied_seats: Option<u32>,
    #[serde(default)]
    capacity_seats: Option<u32>,
}

fn check_signal(signal: &RawOccupancySignal) -> Result<(), ContractViolation> {
    match (
        signal.occupancy_pct,
        signal.occupied_seats,
        signal.capacity_seats,
    ) {
        (Some(pct), _, _) => {
            if !pct.is_finite() {
                return Err(ContractViolation::NotFinite {
                    field: "occupancy_payload.signals.occupancy_pct",
                });
            }
            Ok(())
        }
        (None, Some(occupied), Some(capacity)) => {
            if capacity == 0 {
                return Err(ContractViolation::InvalidValue {
                    field: "occupancy_payload.signals.capacity_seats",
                    reason: "must be > 0",
                });
            }
            if occupied > capacity {
                return Err(ContractViolation::InvalidValue {
                    field: "occupancy_payload.signals.occupied_seats",
                    reason: "must not exceed capacity_seats",
                });
            }
            Ok(())
        }
        (None, Some(_), None) | (None, None, Some(_)) => Err(ContractViolation::InvalidValue {
            field: "occupancy_payload.signals",
            reason: "occupied_seats and capacity_seats must be provided together",
        }),
        (None, None, None) => Err(ContractViolation::InvalidValue {
            field: "occupancy_payload.signals",
            reason: "requires occupancy_pct or a complete seats pair",
        }),
    }
}

fn check_payload(payload: &RawOccupancyPayload) -> Result<(), ContractViolation> {
    if payload.restaurant_id.trim().is_empty() {
        return Err(ContractViolation::InvalidValue {
            field: "occupancy_payload.restaurant_id",
            reason: "must not be empty",
        });
    }
    for signal in &payload.signals {
        check_signal(signal)?;
    }
    Ok(())
}

pub struct OccupancyConnector;

impl Connector for OccupancyConnector {
    fn id(&self) -> &'static str {
        "connector.occupancy.v1"
    }

    fn source(&self) -> SourceKind {
        SourceKind::Occupancy
    }

    fn validate(&self, raw: &Value) -> Result<(), ContractViolation> {
        let payload: RawOccupancyPayload = parse_payload("occupancy_payload", raw)?;
        check_payload(&payload)
    }

    fn to_canonical(
        &self,
        raw: &Value,
        _ctx: &IngestContext,
    ) -> Result<CanonicalBatch, ContractViolation> {
        let payload: RawOccupancyPayload = parse_payload("occupancy_payload", raw)?;
        check_payload(&payload)?;

        let restaurant_id = RestaurantId::new(payload.restaurant_id.trim())?;

        let mut batch = CanonicalBatch::default();
        for signal in &payload.signals {
            // check_payload guarantees either an explicit pct or a
            // complete seats pair with capacity > 0.
            let raw_pct = match (signal.occupancy_pct, signal.occupied_seats) {
                (Some(pct), _) => pct,
                (None, Some(occupied)) => {
                    let capacity = signal.capacity_seats.unwrap_or(1);
                    f64::from(occupied) / f64::from(capacity) * 100.0
                }
                (None, None) => continue,
            };
            batch.occupancy_signals.push(CanonicalOccupancySignal {
                restaurant_id: restaurant_id.clone(),
                ts: signal.ts,
                occupancy_pct: clamp_round_pct(raw_pct),
            });
        }
        Ok(batch)
    }
}
