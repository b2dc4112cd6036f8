//! Planning data model: request inputs, derived tasks, and plan output.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::closure::EdgeMap;

/// Risk classification reported by the forecasting collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    High,
    Medium,
    Low,
}

impl RiskTier {
    /// Higher rank means more urgent.
    pub fn rank(self) -> u8 {
        match self {
            RiskTier::High => 3,
            RiskTier::Medium => 2,
            RiskTier::Low => 1,
        }
    }

    /// Classify by time until overflow: under 4 hours is high, under 8 medium.
    pub fn from_time_until_overflow(minutes: f64) -> Self {
        if minutes < 240.0 {
            RiskTier::High
        } else if minutes < 480.0 {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

/// Point-in-time telemetry for one reservoir.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservoirSnapshot {
    #[serde(alias = "cauldronId")]
    pub id: String,
    pub current_level: f64,
    pub max_volume: f64,
    /// Volume per minute.
    pub fill_rate: f64,
    /// Minutes until the reservoir overflows if left alone.
    pub time_until_overflow: f64,
    #[serde(alias = "riskLevel")]
    pub risk: RiskTier,
}

impl ReservoirSnapshot {
    pub fn fullness(&self) -> f64 {
        if self.max_volume > 0.0 {
            self.current_level / self.max_volume
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Courier {
    #[serde(alias = "courier_id", alias = "courierId")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Courier {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// One bounded pickup derived from a reservoir's demand.
#[derive(Debug, Clone, PartialEq)]
pub struct PickupTask {
    /// Index into the snapshot list the task was generated from.
    pub reservoir: usize,
    pub reservoir_id: String,
    pub amount: f64,
    pub min_pickup: f64,
    pub max_pickup: f64,
    /// Latest permissible arrival, minutes from plan start.
    pub deadline: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TravelTimeEntry {
    pub to: String,
    pub time: f64,
}

/// Outgoing travel times of one location, in the list wire format.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TravelTimeRow {
    pub from: String,
    #[serde(default)]
    pub to: Vec<TravelTimeEntry>,
}

fn default_horizon() -> f64 {
    480.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningRequest {
    #[serde(alias = "cauldrons")]
    pub reservoirs: Vec<ReservoirSnapshot>,
    pub couriers: Vec<Courier>,
    pub depot: String,
    #[serde(alias = "distanceMatrix")]
    pub travel_times: Vec<TravelTimeRow>,
    #[serde(default = "default_horizon")]
    pub prediction_horizon_minutes: f64,
    #[serde(default, alias = "maxVehicles")]
    pub max_couriers: Option<usize>,
}

impl PlanningRequest {
    /// Collapse the wire rows into an edge map. Duplicate pairs keep the
    /// shortest time.
    pub fn edge_map(&self) -> EdgeMap {
        let mut edges: EdgeMap = HashMap::new();
        for row in &self.travel_times {
            let targets = edges.entry(row.from.clone()).or_default();
            for entry in &row.to {
                let minutes = entry.time.round() as i64;
                targets
                    .entry(entry.to.clone())
                    .and_modify(|existing| *existing = (*existing).min(minutes))
                    .or_insert(minutes);
            }
        }
        edges
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub reservoir_id: String,
    /// Minutes from plan start.
    pub arrival_time: i64,
    /// Total collected at this reservoir, all chunks included.
    pub pickup_volume: f64,
    /// Running sum of `pickup_volume` over the route's stops in arrival
    /// order. A merged stop counts every chunk of its reservoir here, even
    /// chunks collected after later arrivals elsewhere, so this is a
    /// reporting total and not the exact load at `arrival_time`. The load
    /// itself is checked against capacity visit by visit before merging.
    pub cumulative_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierRoute {
    pub courier_id: String,
    pub courier_name: String,
    pub stops: Vec<Stop>,
    pub total_volume: f64,
    /// Includes the return leg and unloading at the depot.
    pub total_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlan {
    #[serde(rename = "numCouriers")]
    pub fleet_size: usize,
    pub routes: Vec<CourierRoute>,
    pub total_time: i64,
}

impl RoutePlan {
    pub fn empty() -> Self {
        Self {
            fleet_size: 0,
            routes: Vec::new(),
            total_time: 0,
        }
    }
}
