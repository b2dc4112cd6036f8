//! Planner tuning.
//!
//! None of these constants are load-bearing for correctness, only for plan
//! quality. Every field has a default so a partial JSON document is enough
//! to override a single knob.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub tasks: TaskConfig,
    pub cost: CostConfig,
    pub routing: RoutingConfig,
    pub search: SearchConfig,
}

impl PlannerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One rung of the chunk-size ladder.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChunkTier {
    /// Lowest fullness ratio this tier applies to.
    pub min_fullness: f64,
    /// Preferred chunk sizes, largest first.
    pub sizes: Vec<f64>,
    /// Cap used when the remainder is smaller than every preferred size.
    pub fallback_cap: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub optimal_level_ratio: f64,
    pub safety_margin_minutes: f64,
    /// Upper clamp on task deadlines (one week).
    pub max_deadline_minutes: i64,
    /// Beyond this time-until-overflow a reservoir only gets a token pickup.
    pub low_risk_threshold_minutes: f64,
    pub low_risk_demand_ratio: f64,
    pub min_demand: f64,
    pub min_pickup: f64,
    pub residual: f64,
    /// Tiers must be ordered by descending `min_fullness`; the last one
    /// should start at 0.
    pub chunk_ladder: Vec<ChunkTier>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            optimal_level_ratio: 0.75,
            safety_margin_minutes: 60.0,
            max_deadline_minutes: 10_080,
            low_risk_threshold_minutes: 480.0,
            low_risk_demand_ratio: 0.1,
            min_demand: 5.0,
            min_pickup: 10.0,
            residual: 0.1,
            chunk_ladder: vec![
                ChunkTier {
                    min_fullness: 0.9,
                    sizes: vec![50.0, 40.0, 30.0, 20.0],
                    fallback_cap: 40.0,
                },
                ChunkTier {
                    min_fullness: 0.75,
                    sizes: vec![40.0, 30.0, 25.0, 20.0],
                    fallback_cap: 40.0,
                },
                ChunkTier {
                    min_fullness: 0.0,
                    sizes: vec![30.0, 25.0, 20.0, 15.0],
                    fallback_cap: 30.0,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub depot_return_surcharge: i64,
    pub very_full_ratio: f64,
    pub full_ratio: f64,
    pub half_full_ratio: f64,
    pub very_full_bonus: i64,
    pub full_bonus: i64,
    pub half_full_bonus: i64,
    pub low_fill_penalty: i64,
    pub high_risk_bonus: i64,
    pub medium_risk_bonus: i64,
    pub low_risk_penalty: i64,
    pub critical_minutes: f64,
    pub urgent_minutes: f64,
    pub critical_bonus: i64,
    pub urgent_bonus: i64,
    /// Slack beyond `urgent_minutes` is charged one unit per this many minutes.
    pub slack_unit_minutes: f64,
    pub max_slack_penalty: i64,
    /// Full reservoirs: cost reduction per unit of pickup is 1 / divisor.
    pub large_pickup_divisor: f64,
    /// Less-full reservoirs: pickups below this size earn a reduction.
    pub small_pickup_reference: f64,
    pub small_pickup_divisor: f64,
    pub min_arc_cost: i64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            depot_return_surcharge: 1000,
            very_full_ratio: 0.9,
            full_ratio: 0.75,
            half_full_ratio: 0.5,
            very_full_bonus: -200,
            full_bonus: -150,
            half_full_bonus: -50,
            low_fill_penalty: 50,
            high_risk_bonus: -100,
            medium_risk_bonus: -25,
            low_risk_penalty: 50,
            critical_minutes: 240.0,
            urgent_minutes: 480.0,
            critical_bonus: -150,
            urgent_bonus: -75,
            slack_unit_minutes: 60.0,
            max_slack_penalty: 168,
            large_pickup_divisor: 5.0,
            small_pickup_reference: 30.0,
            small_pickup_divisor: 10.0,
            min_arc_cost: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub vehicle_capacity: f64,
    pub service_minutes: i64,
    pub unload_minutes: i64,
    /// Travel times at or above the closure sentinel are capped here.
    pub max_travel_minutes: i64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            vehicle_capacity: 100.0,
            service_minutes: 5,
            unload_minutes: 15,
            max_travel_minutes: 1440,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub fixed_vehicle_cost: i64,
    /// Attempts with at most this many vehicles get the constrained budget.
    pub constrained_fleet_size: usize,
    pub constrained_budget: SearchBudget,
    pub default_budget: SearchBudget,
    /// Number of fleet sizes tried concurrently. 1 means strictly sequential.
    pub parallel_attempts: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fixed_vehicle_cost: 10_000_000,
            constrained_fleet_size: 4,
            constrained_budget: SearchBudget {
                time_limit_secs: 45,
                solution_limit: 300,
            },
            default_budget: SearchBudget {
                time_limit_secs: 30,
                solution_limit: 200,
            },
            parallel_attempts: 1,
        }
    }
}

impl SearchConfig {
    pub fn budget_for(&self, vehicles: usize) -> SearchBudget {
        if vehicles <= self.constrained_fleet_size {
            self.constrained_budget
        } else {
            self.default_budget
        }
    }
}

/// Per-attempt limit handed to the routing solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SearchBudget {
    pub time_limit_secs: u64,
    /// Maximum number of improving solutions the solver may accept.
    pub solution_limit: usize,
}
