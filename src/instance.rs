//! Solver-ready problem instance.
//!
//! Node 0 is the depot; node `i + 1` is task `i`. Chunks of one reservoir
//! get distinct nodes at zero travel time from each other.

use std::collections::HashMap;

use crate::closure::{self, DistanceMatrix, EdgeMap, UNREACHABLE_MINUTES};
use crate::config::RoutingConfig;
use crate::model::PickupTask;

pub const DEPOT: usize = 0;

/// Latest arrival at the depot.
pub const UNBOUNDED: i64 = i64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub earliest: i64,
    pub latest: i64,
}

impl TimeWindow {
    pub fn contains(&self, minute: i64) -> bool {
        minute >= self.earliest && minute <= self.latest
    }
}

#[derive(Debug, Clone)]
pub struct ProblemInstance {
    pub matrix: DistanceMatrix,
    pub demands: Vec<f64>,
    pub time_windows: Vec<TimeWindow>,
    pub service_minutes: Vec<i64>,
    pub depot: usize,
    pub vehicle_capacity: f64,
    /// Upper bound for the fleet-size search, never a target.
    pub vehicle_count: usize,
    pub unload_minutes: i64,
}

impl ProblemInstance {
    pub fn node_count(&self) -> usize {
        self.demands.len()
    }

    pub fn task_count(&self) -> usize {
        self.node_count().saturating_sub(1)
    }

    pub fn travel(&self, from: usize, to: usize) -> i64 {
        self.matrix.get(from, to)
    }

    /// Time-dimension transit: travel plus service at the origin, plus
    /// unloading when the leg ends at the depot.
    pub fn transit_minutes(&self, from: usize, to: usize) -> i64 {
        let unload = if to == self.depot { self.unload_minutes } else { 0 };
        self.travel(from, to) + self.service_minutes[from] + unload
    }
}

pub fn build_instance(
    depot_id: &str,
    tasks: &[PickupTask],
    edges: &EdgeMap,
    courier_count: usize,
    config: &RoutingConfig,
) -> ProblemInstance {
    let mut locations = vec![depot_id.to_string()];
    let mut location_index: HashMap<&str, usize> = HashMap::new();
    location_index.insert(depot_id, 0);

    let mut node_location = Vec::with_capacity(tasks.len() + 1);
    node_location.push(0);
    for task in tasks {
        let next = locations.len();
        let index = *location_index.entry(task.reservoir_id.as_str()).or_insert(next);
        if index == next {
            locations.push(task.reservoir_id.clone());
        }
        node_location.push(index);
    }

    let closed = closure::close(edges, &locations);

    let n = node_location.len();
    let mut matrix = DistanceMatrix::unreachable(n);
    for (i, &from) in node_location.iter().enumerate() {
        for (j, &to) in node_location.iter().enumerate() {
            let minutes = if i == j {
                0
            } else {
                let travel = closed.get(from, to);
                if travel >= UNREACHABLE_MINUTES {
                    config.max_travel_minutes
                } else {
                    travel
                }
            };
            matrix.set(i, j, minutes);
        }
    }

    let mut demands = vec![0.0];
    let mut time_windows = vec![TimeWindow {
        earliest: 0,
        latest: UNBOUNDED,
    }];
    let mut service_minutes = vec![0];
    for task in tasks {
        demands.push(task.amount);
        time_windows.push(TimeWindow {
            earliest: 0,
            latest: task.deadline,
        });
        service_minutes.push(config.service_minutes);
    }

    ProblemInstance {
        matrix,
        demands,
        time_windows,
        service_minutes,
        depot: DEPOT,
        vehicle_capacity: config.vehicle_capacity,
        vehicle_count: courier_count.min(tasks.len()),
        unload_minutes: config.unload_minutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(reservoir: usize, id: &str, amount: f64, deadline: i64) -> PickupTask {
        PickupTask {
            reservoir,
            reservoir_id: id.to_string(),
            amount,
            min_pickup: amount.min(10.0),
            max_pickup: amount,
            deadline,
        }
    }

    fn edges(list: &[(&str, &str, i64)]) -> EdgeMap {
        let mut map: EdgeMap = HashMap::new();
        for (from, to, minutes) in list {
            map.entry(from.to_string())
                .or_default()
                .insert(to.to_string(), *minutes);
        }
        map
    }

    #[test]
    fn test_depot_first_and_chunks_share_location() {
        let tasks = vec![task(0, "a", 50.0, 100), task(0, "a", 20.0, 100), task(1, "b", 15.0, 300)];
        let edges = edges(&[("m", "a", 10), ("a", "m", 10), ("a", "b", 4), ("b", "m", 7), ("m", "b", 12)]);
        let instance = build_instance("m", &tasks, &edges, 5, &RoutingConfig::default());

        assert_eq!(instance.node_count(), 4);
        assert_eq!(instance.depot, 0);
        assert_eq!(instance.travel(0, 1), 10);
        assert_eq!(instance.travel(0, 2), 10);
        assert_eq!(instance.travel(1, 2), 0);
        assert_eq!(instance.travel(2, 3), 4);
        assert_eq!(instance.travel(3, 0), 7);
        assert_eq!(instance.demands, vec![0.0, 50.0, 20.0, 15.0]);
        assert_eq!(instance.service_minutes, vec![0, 5, 5, 5]);
    }

    #[test]
    fn test_depot_window_unbounded_and_task_windows_deadlines() {
        let tasks = vec![task(0, "a", 20.0, 0), task(1, "b", 20.0, 240)];
        let edges = edges(&[("m", "a", 1), ("m", "b", 1)]);
        let instance = build_instance("m", &tasks, &edges, 2, &RoutingConfig::default());

        assert_eq!(instance.demands[0], 0.0);
        assert_eq!(instance.time_windows[0], TimeWindow { earliest: 0, latest: UNBOUNDED });
        assert_eq!(instance.time_windows[1].latest, 0);
        assert_eq!(instance.time_windows[2].latest, 240);
    }

    #[test]
    fn test_vehicle_count_is_upper_bound() {
        let tasks = vec![task(0, "a", 20.0, 100), task(1, "b", 20.0, 100)];
        let few = build_instance("m", &tasks, &EdgeMap::new(), 1, &RoutingConfig::default());
        let many = build_instance("m", &tasks, &EdgeMap::new(), 9, &RoutingConfig::default());
        assert_eq!(few.vehicle_count, 1);
        assert_eq!(many.vehicle_count, 2);
    }

    #[test]
    fn test_unreachable_capped() {
        let tasks = vec![task(0, "a", 20.0, 100)];
        let instance = build_instance("m", &tasks, &EdgeMap::new(), 1, &RoutingConfig::default());
        assert_eq!(instance.travel(0, 1), 1440);
        assert_eq!(instance.travel(1, 1), 0);
    }

    #[test]
    fn test_transit_adds_service_and_unload() {
        let tasks = vec![task(0, "a", 20.0, 100)];
        let edges = edges(&[("m", "a", 10), ("a", "m", 8)]);
        let instance = build_instance("m", &tasks, &edges, 1, &RoutingConfig::default());
        assert_eq!(instance.transit_minutes(0, 1), 10);
        assert_eq!(instance.transit_minutes(1, 0), 8 + 5 + 15);
    }
}
