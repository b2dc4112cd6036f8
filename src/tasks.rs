//! Turns reservoir snapshots into bounded pickup tasks.
//!
//! Demand looks ahead over the prediction horizon so a reservoir is drained
//! far enough to absorb the inflow it will accumulate, not only what it
//! holds now. Large demands are split into chunks so the routing solver can
//! combine partial pickups across stops.

use std::cmp::Ordering;

use tracing::{debug, info};

use crate::config::{ChunkTier, TaskConfig};
use crate::model::{PickupTask, ReservoirSnapshot, RiskTier};

/// Processing priority of a reservoir. Compared lexicographically, larger
/// first: fullness dominates, then risk, then urgency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityKey {
    pub fullness: f64,
    pub risk: u8,
    pub urgency: f64,
}

impl PriorityKey {
    pub fn for_snapshot(snapshot: &ReservoirSnapshot) -> Self {
        Self {
            fullness: snapshot.fullness() * 10.0,
            risk: snapshot.risk.rank(),
            urgency: -snapshot.time_until_overflow,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.fullness
            .total_cmp(&other.fullness)
            .then(self.risk.cmp(&other.risk))
            .then(self.urgency.total_cmp(&other.urgency))
    }
}

/// Snapshot indices in processing order. Equal keys keep input order.
pub fn processing_order(snapshots: &[ReservoirSnapshot]) -> Vec<usize> {
    let keys: Vec<PriorityKey> = snapshots.iter().map(PriorityKey::for_snapshot).collect();
    let mut order: Vec<usize> = (0..snapshots.len()).collect();
    order.sort_by(|&a, &b| keys[b].compare(&keys[a]));
    order
}

/// Reservoirs outside the horizon that are not risk-flagged need no visit.
pub fn should_skip(snapshot: &ReservoirSnapshot, horizon_minutes: f64) -> bool {
    snapshot.time_until_overflow > horizon_minutes && snapshot.risk == RiskTier::Low
}

/// Volume to collect, before the minimum-demand filter.
pub fn target_demand(snapshot: &ReservoirSnapshot, horizon_minutes: f64, config: &TaskConfig) -> f64 {
    let optimal = snapshot.max_volume * config.optimal_level_ratio;

    let current_excess = (snapshot.current_level - optimal).max(0.0);
    let projected_excess = if snapshot.fill_rate > 0.0 {
        let projected = (snapshot.current_level + snapshot.fill_rate * horizon_minutes)
            .min(snapshot.max_volume);
        (projected - optimal).max(0.0)
    } else {
        0.0
    };

    let mut demand = current_excess.max(projected_excess).min(snapshot.current_level);
    if snapshot.time_until_overflow > config.low_risk_threshold_minutes {
        demand = demand.min(snapshot.max_volume * config.low_risk_demand_ratio);
    }
    demand
}

pub fn deadline_for(snapshot: &ReservoirSnapshot, config: &TaskConfig) -> i64 {
    (snapshot.time_until_overflow - config.safety_margin_minutes)
        .floor()
        .clamp(0.0, config.max_deadline_minutes as f64) as i64
}

fn tier_for<'a>(fullness: f64, ladder: &'a [ChunkTier]) -> Option<&'a ChunkTier> {
    ladder
        .iter()
        .find(|tier| fullness >= tier.min_fullness)
        .or_else(|| ladder.last())
}

/// Split `demand` into pickup amounts using the ladder tier for `fullness`.
pub fn chunk_demand(demand: f64, fullness: f64, config: &TaskConfig) -> Vec<f64> {
    let Some(tier) = tier_for(fullness, &config.chunk_ladder) else {
        return vec![demand];
    };

    let mut chunks = Vec::new();
    let mut remaining = demand;
    while remaining > config.residual {
        let preferred = tier
            .sizes
            .iter()
            .copied()
            .filter(|&size| size > 0.0 && size <= remaining)
            .fold(None, |best: Option<f64>, size| Some(best.map_or(size, |b| b.max(size))));
        let amount = preferred.unwrap_or_else(|| remaining.min(tier.fallback_cap));
        if amount <= 0.0 {
            break;
        }
        chunks.push(amount);
        remaining -= amount;
    }
    chunks
}

/// Generate tasks for every reservoir that needs attention, in priority order.
pub fn generate_tasks(
    snapshots: &[ReservoirSnapshot],
    horizon_minutes: f64,
    config: &TaskConfig,
) -> Vec<PickupTask> {
    info!(
        high = snapshots.iter().filter(|s| s.risk == RiskTier::High).count(),
        medium = snapshots.iter().filter(|s| s.risk == RiskTier::Medium).count(),
        low = snapshots.iter().filter(|s| s.risk == RiskTier::Low).count(),
        "prioritizing reservoirs"
    );

    let mut tasks = Vec::new();
    for index in processing_order(snapshots) {
        let snapshot = &snapshots[index];

        if should_skip(snapshot, horizon_minutes) {
            debug!(reservoir = %snapshot.id, "outside horizon and low risk, skipped");
            continue;
        }

        let demand = target_demand(snapshot, horizon_minutes, config);
        if demand < config.min_demand {
            debug!(reservoir = %snapshot.id, demand, "demand below minimum, skipped");
            continue;
        }

        let deadline = deadline_for(snapshot, config);
        for amount in chunk_demand(demand, snapshot.fullness(), config) {
            tasks.push(PickupTask {
                reservoir: index,
                reservoir_id: snapshot.id.clone(),
                amount,
                min_pickup: config.min_pickup.min(amount),
                max_pickup: amount,
                deadline,
            });
        }
    }

    debug!(tasks = tasks.len(), "pickup tasks generated");
    tasks
}
