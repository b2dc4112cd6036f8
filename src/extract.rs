//! Rebuilds courier timelines from raw solver sequences and re-validates
//! them.
//!
//! Arrival times and volumes are recomputed from the instance, never taken
//! from the solver. A capacity or deadline breach here means a solver broke
//! its contract; the request is aborted instead of returning an unsafe plan.

use std::collections::HashMap;

use tracing::error;

use crate::error::PlanError;
use crate::instance::ProblemInstance;
use crate::model::{Courier, CourierRoute, PickupTask, RoutePlan, Stop};
use crate::search::FleetSolution;

/// Slack for floating-point volume accumulation.
const VOLUME_EPSILON: f64 = 1e-9;

fn violation(detail: String) -> PlanError {
    error!(%detail, "plan invariant violated");
    PlanError::InvariantViolation(detail)
}

/// Merge visits to the same reservoir: volumes add up and the earliest
/// arrival wins. Cumulative volume is recomputed as a running sum over the
/// merged stops in arrival order (see [`Stop::cumulative_volume`]).
pub fn merge_stops(visits: Vec<Stop>) -> Vec<Stop> {
    let mut merged: Vec<Stop> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for visit in visits {
        match index.get(&visit.reservoir_id) {
            Some(&i) => {
                let stop = &mut merged[i];
                stop.pickup_volume += visit.pickup_volume;
                stop.arrival_time = stop.arrival_time.min(visit.arrival_time);
            }
            None => {
                index.insert(visit.reservoir_id.clone(), merged.len());
                merged.push(visit);
            }
        }
    }

    merged.sort_by_key(|stop| stop.arrival_time);
    let mut cumulative = 0.0;
    for stop in &mut merged {
        cumulative += stop.pickup_volume;
        stop.cumulative_volume = cumulative;
    }
    merged
}

pub fn extract_plan(
    instance: &ProblemInstance,
    tasks: &[PickupTask],
    couriers: &[Courier],
    solution: &FleetSolution,
) -> Result<RoutePlan, PlanError> {
    if couriers.is_empty() {
        return Err(PlanError::input("no couriers to assign routes to"));
    }
    if solution.routes.len() > solution.vehicles {
        return Err(violation(format!(
            "solver returned {} routes for {} vehicles",
            solution.routes.len(),
            solution.vehicles
        )));
    }

    let depot = instance.depot;
    let mut visited = vec![false; instance.node_count()];
    visited[depot] = true;

    let mut routes = Vec::new();
    for (slot, sequence) in solution.routes.iter().enumerate() {
        let nodes: Vec<usize> = sequence.iter().copied().filter(|&node| node != depot).collect();
        if nodes.is_empty() {
            continue;
        }

        let mut time = 0;
        let mut volume = 0.0;
        let mut previous = depot;
        let mut visits = Vec::with_capacity(nodes.len());

        for node in nodes {
            if node >= instance.node_count() {
                return Err(violation(format!("vehicle {} visits unknown node {}", slot, node)));
            }
            if visited[node] {
                return Err(violation(format!("node {} visited more than once", node)));
            }
            visited[node] = true;

            let task = &tasks[node - 1];
            let arrival = time + instance.travel(previous, node);
            volume += task.amount;

            if volume > instance.vehicle_capacity + VOLUME_EPSILON {
                return Err(violation(format!(
                    "vehicle {} carries {} at reservoir {}, capacity is {}",
                    slot, volume, task.reservoir_id, instance.vehicle_capacity
                )));
            }
            if arrival > task.deadline {
                return Err(violation(format!(
                    "reservoir {} reached at minute {}, deadline is minute {}",
                    task.reservoir_id, arrival, task.deadline
                )));
            }

            visits.push(Stop {
                reservoir_id: task.reservoir_id.clone(),
                arrival_time: arrival,
                pickup_volume: task.amount,
                cumulative_volume: volume,
            });

            time = arrival + instance.service_minutes[node];
            previous = node;
        }

        let total_time = time + instance.travel(previous, depot) + instance.unload_minutes;
        let courier = &couriers[slot % couriers.len()];

        routes.push(CourierRoute {
            courier_id: courier.id.clone(),
            courier_name: courier
                .name
                .clone()
                .unwrap_or_else(|| format!("Courier {}", slot + 1)),
            stops: merge_stops(visits),
            total_volume: volume,
            total_time,
        });
    }

    if let Some(missed) = visited.iter().position(|&seen| !seen) {
        return Err(violation(format!(
            "task for reservoir {} was not routed",
            tasks[missed - 1].reservoir_id
        )));
    }

    routes.sort_by(|a, b| a.courier_id.cmp(&b.courier_id));
    let total_time = routes.iter().map(|route| route.total_time).max().unwrap_or(0);

    Ok(RoutePlan {
        fleet_size: solution.vehicles,
        routes,
        total_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closure::DistanceMatrix;
    use crate::error::ErrorKind;
    use crate::instance::{TimeWindow, UNBOUNDED};

    fn task(id: &str, amount: f64, deadline: i64) -> PickupTask {
        PickupTask {
            reservoir: 0,
            reservoir_id: id.to_string(),
            amount,
            min_pickup: amount.min(10.0),
            max_pickup: amount,
            deadline,
        }
    }

    /// Depot 10 minutes from every task; chunks of the same reservoir are 0
    /// apart, different reservoirs 3 apart.
    fn fixture(tasks: &[PickupTask]) -> ProblemInstance {
        let n = tasks.len() + 1;
        let mut rows = vec![vec![0; n]; n];
        for i in 0..n {
            for j in 0..n {
                rows[i][j] = match (i, j) {
                    _ if i == j => 0,
                    (0, _) | (_, 0) => 10,
                    _ if tasks[i - 1].reservoir_id == tasks[j - 1].reservoir_id => 0,
                    _ => 3,
                };
            }
        }
        let mut time_windows = vec![TimeWindow { earliest: 0, latest: UNBOUNDED }];
        time_windows.extend(tasks.iter().map(|t| TimeWindow { earliest: 0, latest: t.deadline }));
        ProblemInstance {
            matrix: DistanceMatrix::from_rows(rows).unwrap(),
            demands: std::iter::once(0.0).chain(tasks.iter().map(|t| t.amount)).collect(),
            time_windows,
            service_minutes: std::iter::once(0).chain(tasks.iter().map(|_| 5)).collect(),
            depot: 0,
            vehicle_capacity: 100.0,
            vehicle_count: tasks.len(),
            unload_minutes: 15,
        }
    }

    fn couriers(ids: &[&str]) -> Vec<Courier> {
        ids.iter().map(|id| Courier::new(*id)).collect()
    }

    #[test]
    fn test_recomputes_times_and_volumes() {
        let tasks = vec![task("a", 40.0, 500), task("b", 30.0, 500)];
        let instance = fixture(&tasks);
        let solution = FleetSolution {
            vehicles: 1,
            routes: vec![vec![1, 2]],
        };
        let plan = extract_plan(&instance, &tasks, &couriers(&["w1"]), &solution).unwrap();

        assert_eq!(plan.fleet_size, 1);
        let route = &plan.routes[0];
        assert_eq!(route.courier_id, "w1");
        assert_eq!(route.courier_name, "Courier 1");
        // a at 10, depart 15, b at 18, depart 23, back 33, unloaded 48
        assert_eq!(route.stops[0].arrival_time, 10);
        assert_eq!(route.stops[1].arrival_time, 18);
        assert_eq!(route.stops[1].cumulative_volume, 70.0);
        assert_eq!(route.total_volume, 70.0);
        assert_eq!(route.total_time, 48);
        assert_eq!(plan.total_time, 48);
    }

    #[test]
    fn test_chunks_merged_into_one_stop() {
        let tasks = vec![task("a", 50.0, 500), task("b", 10.0, 500), task("a", 20.0, 500)];
        let instance = fixture(&tasks);
        let solution = FleetSolution {
            vehicles: 1,
            routes: vec![vec![1, 2, 3]],
        };
        let plan = extract_plan(&instance, &tasks, &couriers(&["w1"]), &solution).unwrap();
        let stops = &plan.routes[0].stops;

        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].reservoir_id, "a");
        assert_eq!(stops[0].pickup_volume, 70.0);
        assert_eq!(stops[0].arrival_time, 10);
        assert_eq!(stops[1].cumulative_volume, 80.0);
    }

    #[test]
    fn test_unused_vehicles_dropped_and_couriers_round_robin() {
        let tasks = vec![task("a", 60.0, 500), task("b", 60.0, 500)];
        let instance = fixture(&tasks);
        let solution = FleetSolution {
            vehicles: 3,
            routes: vec![vec![1], vec![], vec![2]],
        };
        let plan = extract_plan(&instance, &tasks, &couriers(&["w1", "w2"]), &solution).unwrap();

        assert_eq!(plan.fleet_size, 3);
        assert_eq!(plan.routes.len(), 2);
        // slot 2 wraps around to the first courier
        assert!(plan.routes.iter().all(|r| r.courier_id == "w1"));
    }

    #[test]
    fn test_capacity_breach_is_internal_error() {
        let tasks = vec![task("a", 60.0, 500), task("b", 50.0, 500)];
        let instance = fixture(&tasks);
        let solution = FleetSolution {
            vehicles: 1,
            routes: vec![vec![1, 2]],
        };
        let err = extract_plan(&instance, &tasks, &couriers(&["w1"]), &solution).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn test_deadline_breach_is_internal_error() {
        let tasks = vec![task("a", 20.0, 500), task("b", 20.0, 12)];
        let instance = fixture(&tasks);
        let solution = FleetSolution {
            vehicles: 1,
            routes: vec![vec![1, 2]],
        };
        let err = extract_plan(&instance, &tasks, &couriers(&["w1"]), &solution).unwrap_err();
        assert!(matches!(err, PlanError::InvariantViolation(ref d) if d.contains("deadline")));
    }

    #[test]
    fn test_unrouted_task_rejected() {
        let tasks = vec![task("a", 20.0, 500), task("b", 20.0, 500)];
        let instance = fixture(&tasks);
        let solution = FleetSolution {
            vehicles: 1,
            routes: vec![vec![2]],
        };
        let err = extract_plan(&instance, &tasks, &couriers(&["w1"]), &solution).unwrap_err();
        assert!(err.to_string().contains("reservoir a was not routed"));
    }

    #[test]
    fn test_depot_entries_ignored_and_duplicates_rejected() {
        let tasks = vec![task("a", 20.0, 500)];
        let instance = fixture(&tasks);
        let ok = FleetSolution {
            vehicles: 1,
            routes: vec![vec![0, 1, 0]],
        };
        assert!(extract_plan(&instance, &tasks, &couriers(&["w1"]), &ok).is_ok());

        let twice = FleetSolution {
            vehicles: 2,
            routes: vec![vec![1], vec![1]],
        };
        let err = extract_plan(&instance, &tasks, &couriers(&["w1"]), &twice).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_merge_orders_by_arrival() {
        let stop = |id: &str, arrival, volume| Stop {
            reservoir_id: id.to_string(),
            arrival_time: arrival,
            pickup_volume: volume,
            cumulative_volume: 0.0,
        };
        let merged = merge_stops(vec![stop("b", 30, 5.0), stop("a", 10, 10.0), stop("b", 40, 5.0)]);
        assert_eq!(merged[0].reservoir_id, "a");
        assert_eq!(merged[1].arrival_time, 30);
        assert_eq!(merged[1].pickup_volume, 10.0);
        assert_eq!(merged[1].cumulative_volume, 20.0);
    }

    #[test]
    fn test_merged_stop_reports_all_chunks_at_first_arrival() {
        let stop = |id: &str, arrival, volume, load| Stop {
            reservoir_id: id.to_string(),
            arrival_time: arrival,
            pickup_volume: volume,
            cumulative_volume: load,
        };
        // The courier held 50 at minute 10; the merged stop reports all 70.
        let merged = merge_stops(vec![
            stop("a", 10, 50.0, 50.0),
            stop("b", 18, 10.0, 60.0),
            stop("a", 18, 20.0, 80.0),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].reservoir_id, "a");
        assert_eq!(merged[0].arrival_time, 10);
        assert_eq!(merged[0].cumulative_volume, 70.0);
        assert_eq!(merged[1].cumulative_volume, 80.0);
    }
}
