//! Test fixtures for cauldron-planner.
//!
//! Builders for reservoir snapshots and planning requests. Every reservoir
//! is connected to the depot in both directions; extra edges between
//! reservoirs are opt-in.

#![allow(dead_code)]

use cauldron_planner::model::{Courier, PlanningRequest, ReservoirSnapshot, RiskTier, TravelTimeEntry, TravelTimeRow};

pub const DEPOT: &str = "market";

/// Builder for reservoir snapshots. Risk follows time until overflow unless
/// set explicitly.
#[derive(Clone, Debug)]
pub struct TestReservoir {
    id: String,
    level: f64,
    max_volume: f64,
    fill_rate: f64,
    overflow_in: f64,
    risk: Option<RiskTier>,
}

impl TestReservoir {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            level: 50.0,
            max_volume: 100.0,
            fill_rate: 0.0,
            overflow_in: 300.0,
            risk: None,
        }
    }

    pub fn level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    pub fn max_volume(mut self, max_volume: f64) -> Self {
        self.max_volume = max_volume;
        self
    }

    pub fn fill_rate(mut self, per_minute: f64) -> Self {
        self.fill_rate = per_minute;
        self
    }

    pub fn overflow_in(mut self, minutes: f64) -> Self {
        self.overflow_in = minutes;
        self
    }

    pub fn risk(mut self, risk: RiskTier) -> Self {
        self.risk = Some(risk);
        self
    }

    pub fn build(&self) -> ReservoirSnapshot {
        ReservoirSnapshot {
            id: self.id.clone(),
            current_level: self.level,
            max_volume: self.max_volume,
            fill_rate: self.fill_rate,
            time_until_overflow: self.overflow_in,
            risk: self
                .risk
                .unwrap_or_else(|| RiskTier::from_time_until_overflow(self.overflow_in)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TestRequest {
    reservoirs: Vec<(TestReservoir, f64)>,
    edges: Vec<(String, String, f64)>,
    couriers: usize,
    horizon: f64,
    max_couriers: Option<usize>,
}

impl TestRequest {
    pub fn new() -> Self {
        Self {
            reservoirs: Vec::new(),
            edges: Vec::new(),
            couriers: 1,
            horizon: 480.0,
            max_couriers: None,
        }
    }

    /// Add a reservoir reachable from the depot in `minutes`, both ways.
    pub fn reservoir(mut self, reservoir: TestReservoir, minutes: f64) -> Self {
        self.reservoirs.push((reservoir, minutes));
        self
    }

    /// Directed edge between two locations.
    pub fn edge(mut self, from: &str, to: &str, minutes: f64) -> Self {
        self.edges.push((from.to_string(), to.to_string(), minutes));
        self
    }

    pub fn couriers(mut self, count: usize) -> Self {
        self.couriers = count;
        self
    }

    pub fn horizon(mut self, minutes: f64) -> Self {
        self.horizon = minutes;
        self
    }

    pub fn max_couriers(mut self, limit: usize) -> Self {
        self.max_couriers = Some(limit);
        self
    }

    pub fn build(&self) -> PlanningRequest {
        let mut travel_times = vec![TravelTimeRow {
            from: DEPOT.to_string(),
            to: self
                .reservoirs
                .iter()
                .map(|(r, minutes)| TravelTimeEntry {
                    to: r.id.clone(),
                    time: *minutes,
                })
                .collect(),
        }];
        for (r, minutes) in &self.reservoirs {
            travel_times.push(TravelTimeRow {
                from: r.id.clone(),
                to: vec![TravelTimeEntry {
                    to: DEPOT.to_string(),
                    time: *minutes,
                }],
            });
        }
        for (from, to, minutes) in &self.edges {
            travel_times.push(TravelTimeRow {
                from: from.clone(),
                to: vec![TravelTimeEntry {
                    to: to.clone(),
                    time: *minutes,
                }],
            });
        }

        PlanningRequest {
            reservoirs: self.reservoirs.iter().map(|(r, _)| r.build()).collect(),
            couriers: (1..=self.couriers)
                .map(|i| Courier::new(format!("courier_{:02}", i)))
                .collect(),
            depot: DEPOT.to_string(),
            travel_times,
            prediction_horizon_minutes: self.horizon,
            max_couriers: self.max_couriers,
        }
    }
}

/// Deadline the task generator assigns with default settings.
pub fn default_deadline(snapshot: &ReservoirSnapshot) -> i64 {
    ((snapshot.time_until_overflow - 60.0).floor() as i64).clamp(0, 10_080)
}
