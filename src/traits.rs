//! Collaborator interfaces for the planner.
//!
//! These are intentionally narrow. The planner ships one implementation of
//! each, but alternate solver backends or forecasting services should only
//! need to implement the trait.

use serde::{Deserialize, Serialize};

use crate::config::SearchBudget;
use crate::instance::ProblemInstance;
use crate::model::{ReservoirSnapshot, RiskTier};

/// Arc cost over instance node indices, consulted for every directed pair.
pub trait TransitCost: Sync {
    fn transit_cost(&self, from: usize, to: usize) -> i64;
}

/// Everything a routing solver needs for one fleet-size attempt.
///
/// The capacity dimension is `instance.demands` against
/// `instance.vehicle_capacity`, cumulative from zero on every route. The time
/// dimension is `instance.transit_minutes`, bounded by `instance.time_windows`
/// at every node, starting from zero at the depot.
pub struct SolverInput<'a> {
    pub instance: &'a ProblemInstance,
    pub cost: &'a dyn TransitCost,
    pub vehicle_count: usize,
    /// Charged once per vehicle that leaves the depot.
    pub fixed_vehicle_cost: i64,
    pub budget: SearchBudget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverOutcome {
    /// One node sequence per vehicle slot, depot excluded. Empty sequences
    /// are unused vehicles.
    Routes(Vec<Vec<usize>>),
    /// Infeasible, or the budget ran out before a feasible assignment was
    /// found. Callers do not distinguish the two.
    Infeasible,
}

/// A combinatorial search backend.
pub trait RoutingSolver: Sync {
    fn solve(&self, input: &SolverInput<'_>) -> SolverOutcome;
}

/// One observed level reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSample {
    /// ISO-8601 timestamp.
    pub timestamp: String,
    pub value: f64,
}

/// Level history of one reservoir, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservoirHistory {
    pub id: String,
    pub max_volume: f64,
    pub samples: Vec<LevelSample>,
}

/// Forecast-derived state of one reservoir.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub id: String,
    pub max_volume: f64,
    pub current_level: f64,
    /// Volume per minute.
    pub fill_rate: f64,
    pub time_until_overflow: f64,
    pub risk: RiskTier,
}

impl Forecast {
    pub fn into_snapshot(self) -> ReservoirSnapshot {
        ReservoirSnapshot {
            id: self.id,
            current_level: self.current_level,
            max_volume: self.max_volume,
            fill_rate: self.fill_rate,
            time_until_overflow: self.time_until_overflow,
            risk: self.risk,
        }
    }
}

/// Forecasts fill rate, time until overflow and risk from level histories.
/// Accuracy and staleness are the provider's concern.
pub trait ForecastProvider {
    type Error;

    fn forecasts_for(&self, reservoirs: &[ReservoirHistory]) -> Result<Vec<Forecast>, Self::Error>;
}
