//! Priority-weighted transit cost.
//!
//! The adjustments bias which nodes a solver visits early; they never
//! replace travel time in the time dimension. Arc costs stay strictly
//! positive so the metric remains distance-like.

use crate::config::CostConfig;
use crate::instance::ProblemInstance;
use crate::model::{PickupTask, ReservoirSnapshot, RiskTier};
use crate::traits::TransitCost;

/// Per-reservoir cost adjustments, each additive. Negative means "visit
/// sooner".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservoirWeights {
    pub fullness: i64,
    pub risk: i64,
    pub urgency: i64,
}

impl ReservoirWeights {
    pub fn for_snapshot(snapshot: &ReservoirSnapshot, config: &CostConfig) -> Self {
        let fullness_ratio = snapshot.fullness();
        let fullness = if fullness_ratio >= config.very_full_ratio {
            config.very_full_bonus
        } else if fullness_ratio >= config.full_ratio {
            config.full_bonus
        } else if fullness_ratio >= config.half_full_ratio {
            config.half_full_bonus
        } else {
            config.low_fill_penalty
        };

        let risk = match snapshot.risk {
            RiskTier::High => config.high_risk_bonus,
            RiskTier::Medium => config.medium_risk_bonus,
            RiskTier::Low => config.low_risk_penalty,
        };

        let tuo = snapshot.time_until_overflow;
        let urgency = if tuo <= config.critical_minutes {
            config.critical_bonus
        } else if tuo <= config.urgent_minutes {
            config.urgent_bonus
        } else {
            let slack_units = ((tuo - config.urgent_minutes) / config.slack_unit_minutes).floor();
            slack_units.min(config.max_slack_penalty as f64) as i64
        };

        Self {
            fullness,
            risk,
            urgency,
        }
    }

    pub fn total(&self) -> i64 {
        self.fullness + self.risk + self.urgency
    }
}

/// Full reservoirs reward large pickups; less-full ones reward small
/// pickups, more gently.
pub fn size_bonus(fullness_ratio: f64, pickup: f64, config: &CostConfig) -> f64 {
    if fullness_ratio >= config.full_ratio {
        -pickup / config.large_pickup_divisor
    } else {
        -(config.small_pickup_reference - pickup).max(0.0) / config.small_pickup_divisor
    }
}

/// Arc cost over an instance: travel time, a surcharge for returning to the
/// depot, and per-task priority adjustments on arrival.
#[derive(Debug, Clone)]
pub struct PriorityCost {
    travel: Vec<i64>,
    size: usize,
    depot: usize,
    depot_surcharge: i64,
    min_cost: i64,
    arrival_adjustment: Vec<f64>,
}

impl PriorityCost {
    pub fn new(
        instance: &ProblemInstance,
        tasks: &[PickupTask],
        snapshots: &[ReservoirSnapshot],
        config: &CostConfig,
    ) -> Self {
        let size = instance.node_count();
        let mut travel = Vec::with_capacity(size * size);
        for from in 0..size {
            for to in 0..size {
                travel.push(instance.travel(from, to));
            }
        }

        let mut arrival_adjustment = vec![0.0; size];
        for (i, task) in tasks.iter().enumerate() {
            let snapshot = &snapshots[task.reservoir];
            let weights = ReservoirWeights::for_snapshot(snapshot, config);
            arrival_adjustment[i + 1] =
                weights.total() as f64 + size_bonus(snapshot.fullness(), task.amount, config);
        }

        Self {
            travel,
            size,
            depot: instance.depot,
            depot_surcharge: config.depot_return_surcharge,
            min_cost: config.min_arc_cost,
            arrival_adjustment,
        }
    }

    pub fn arrival_adjustment(&self, node: usize) -> f64 {
        self.arrival_adjustment[node]
    }
}

impl TransitCost for PriorityCost {
    fn transit_cost(&self, from: usize, to: usize) -> i64 {
        let base = self.travel[from * self.size + to];
        if to == self.depot {
            return base + self.depot_surcharge;
        }
        let adjusted = (base as f64 + self.arrival_adjustment[to]).round() as i64;
        adjusted.max(self.min_cost)
    }
}
