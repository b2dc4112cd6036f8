//! Built-in routing solver (baseline implementation).
//!
//! Cheapest feasible insertion over a fixed number of vehicles, followed by
//! 2-opt and relocate local search. Every candidate route is checked against
//! the capacity and time dimensions before it is accepted, so whatever this
//! returns is feasible.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::traits::{RoutingSolver, SolverInput, SolverOutcome};

/// Slack for floating-point load accumulation.
const LOAD_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Maximum passes of local search improvement.
    pub local_search_iterations: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            local_search_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InsertionSolver {
    pub options: SolveOptions,
}

impl InsertionSolver {
    pub fn new(options: SolveOptions) -> Self {
        Self { options }
    }
}

#[derive(Debug, Clone, Default)]
struct RouteState {
    nodes: Vec<usize>,
    cost: i64,
}

/// Tracks the per-attempt budget: wall clock and accepted improvements.
struct Budget {
    deadline: Instant,
    solutions_left: usize,
}

impl Budget {
    fn exhausted(&self) -> bool {
        self.solutions_left == 0 || Instant::now() >= self.deadline
    }
}

impl RoutingSolver for InsertionSolver {
    fn solve(&self, input: &SolverInput<'_>) -> SolverOutcome {
        let instance = input.instance;
        let mut budget = Budget {
            deadline: Instant::now() + Duration::from_secs(input.budget.time_limit_secs),
            solutions_left: input.budget.solution_limit,
        };

        let mut pending: Vec<usize> = (0..instance.node_count())
            .filter(|&node| node != instance.depot)
            .collect();
        if pending.is_empty() {
            return SolverOutcome::Routes(vec![Vec::new(); input.vehicle_count]);
        }
        if input.vehicle_count == 0 {
            return SolverOutcome::Infeasible;
        }

        // Tightest deadlines first, then the nodes the cost model favours.
        pending.sort_by_key(|&node| {
            (
                instance.time_windows[node].latest,
                input.cost.transit_cost(instance.depot, node),
                node,
            )
        });

        let mut routes = vec![RouteState::default(); input.vehicle_count];
        for node in pending {
            let mut best: Option<(usize, usize, i64)> = None;

            for (route_index, route) in routes.iter().enumerate() {
                for position in 0..=route.nodes.len() {
                    let mut candidate = route.nodes.clone();
                    candidate.insert(position, node);

                    if let Some(cost) = compute_schedule(&candidate, input) {
                        let delta = cost - route.cost;
                        if best.is_none_or(|(_, _, best_delta)| delta < best_delta) {
                            best = Some((route_index, position, delta));
                        }
                    }
                }
            }

            let Some((route_index, position, delta)) = best else {
                debug!(node, vehicles = input.vehicle_count, "no feasible insertion");
                return SolverOutcome::Infeasible;
            };
            let route = &mut routes[route_index];
            route.nodes.insert(position, node);
            route.cost += delta;

            if Instant::now() >= budget.deadline {
                debug!(vehicles = input.vehicle_count, "time budget exhausted during construction");
                return SolverOutcome::Infeasible;
            }
        }

        local_search(&mut routes, input, &self.options, &mut budget);

        SolverOutcome::Routes(routes.into_iter().map(|route| route.nodes).collect())
    }
}

/// Cost of a route if it satisfies capacity and every time window,
/// including the fixed vehicle cost for a non-empty route.
fn compute_schedule(nodes: &[usize], input: &SolverInput<'_>) -> Option<i64> {
    if nodes.is_empty() {
        return Some(0);
    }

    let instance = input.instance;
    let depot = instance.depot;
    let mut time = 0;
    let mut load = 0.0;
    let mut cost = input.fixed_vehicle_cost;
    let mut previous = depot;

    for &node in nodes {
        time += instance.transit_minutes(previous, node);
        if !instance.time_windows[node].contains(time) {
            return None;
        }
        load += instance.demands[node];
        if load > instance.vehicle_capacity + LOAD_EPSILON {
            return None;
        }
        cost += input.cost.transit_cost(previous, node);
        previous = node;
    }

    time += instance.transit_minutes(previous, depot);
    if !instance.time_windows[depot].contains(time) {
        return None;
    }
    cost += input.cost.transit_cost(previous, depot);

    Some(cost)
}

// ============================================================================
// Local Search Operators
// ============================================================================

/// 2-opt: Reverse a segment within a route.
/// Returns true if an improvement was made.
fn two_opt_improve(route: &mut RouteState, input: &SolverInput<'_>) -> bool {
    let n = route.nodes.len();
    if n < 2 {
        return false;
    }

    for i in 0..n - 1 {
        for j in i + 1..n {
            let mut candidate = route.nodes.clone();
            candidate[i..=j].reverse();

            if let Some(cost) = compute_schedule(&candidate, input) {
                if cost < route.cost {
                    route.nodes = candidate;
                    route.cost = cost;
                    return true;
                }
            }
        }
    }

    false
}

/// Relocate: Move a node to another position in its own route or into
/// another route. Emptying a route saves its fixed vehicle cost.
/// Returns true if an improvement was made.
fn relocate_improve(routes: &mut [RouteState], input: &SolverInput<'_>) -> bool {
    for from_route in 0..routes.len() {
        for node_index in 0..routes[from_route].nodes.len() {
            let node = routes[from_route].nodes[node_index];
            let mut without = routes[from_route].nodes.clone();
            without.remove(node_index);

            for to_route in 0..routes.len() {
                if from_route == to_route {
                    for position in 0..=without.len() {
                        if position == node_index {
                            continue;
                        }
                        let mut candidate = without.clone();
                        candidate.insert(position, node);
                        if let Some(cost) = compute_schedule(&candidate, input) {
                            if cost < routes[from_route].cost {
                                routes[from_route].nodes = candidate;
                                routes[from_route].cost = cost;
                                return true;
                            }
                        }
                    }
                    continue;
                }

                let Some(from_cost) = compute_schedule(&without, input) else {
                    continue;
                };
                let current = routes[from_route].cost + routes[to_route].cost;

                for position in 0..=routes[to_route].nodes.len() {
                    let mut candidate = routes[to_route].nodes.clone();
                    candidate.insert(position, node);
                    let Some(to_cost) = compute_schedule(&candidate, input) else {
                        continue;
                    };
                    if from_cost + to_cost < current {
                        routes[from_route].nodes = without;
                        routes[from_route].cost = from_cost;
                        routes[to_route].nodes = candidate;
                        routes[to_route].cost = to_cost;
                        return true;
                    }
                }
            }
        }
    }

    false
}

/// Run local search until no improvement, the iteration cap, or the budget.
fn local_search(
    routes: &mut [RouteState],
    input: &SolverInput<'_>,
    options: &SolveOptions,
    budget: &mut Budget,
) {
    for _ in 0..options.local_search_iterations {
        let mut improved = false;

        for route in routes.iter_mut() {
            if budget.exhausted() {
                return;
            }
            if two_opt_improve(route, input) {
                budget.solutions_left -= 1;
                improved = true;
            }
        }

        if budget.exhausted() {
            return;
        }
        if relocate_improve(routes, input) {
            budget.solutions_left -= 1;
            improved = true;
        }

        if !improved {
            break;
        }
    }
}
