//! Minimum fleet-size search.
//!
//! Fleet sizes are scanned from one upward, one solver invocation each, so
//! the first feasible size is the minimum. With `parallel_attempts > 1` a
//! window of consecutive sizes runs on the rayon pool; the smallest feasible
//! size in the first successful window is still the minimum because every
//! smaller size already failed.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::error::PlanError;
use crate::instance::ProblemInstance;
use crate::traits::{RoutingSolver, SolverInput, SolverOutcome, TransitCost};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetSolution {
    /// Smallest fleet size the solver found feasible.
    pub vehicles: usize,
    /// Raw per-vehicle node sequences from the solver.
    pub routes: Vec<Vec<usize>>,
}

/// Largest fleet size the search may try.
pub fn fleet_cap(instance: &ProblemInstance, max_couriers: Option<usize>) -> usize {
    match max_couriers {
        Some(limit) => instance.vehicle_count.min(limit),
        None => instance.vehicle_count,
    }
}

fn attempt<S>(
    instance: &ProblemInstance,
    cost: &dyn TransitCost,
    solver: &S,
    vehicles: usize,
    config: &SearchConfig,
) -> SolverOutcome
where
    S: RoutingSolver + ?Sized,
{
    let input = SolverInput {
        instance,
        cost,
        vehicle_count: vehicles,
        fixed_vehicle_cost: config.fixed_vehicle_cost,
        budget: config.budget_for(vehicles),
    };
    solver.solve(&input)
}

pub fn search_fleet_size<S>(
    instance: &ProblemInstance,
    cost: &dyn TransitCost,
    solver: &S,
    max_couriers: Option<usize>,
    config: &SearchConfig,
) -> Result<FleetSolution, PlanError>
where
    S: RoutingSolver + ?Sized,
{
    let cap = fleet_cap(instance, max_couriers);
    info!(cap, tasks = instance.task_count(), "searching for minimum fleet size");

    let sizes: Vec<usize> = (1..=cap).collect();
    let window = config.parallel_attempts.max(1);

    for batch in sizes.chunks(window) {
        let outcomes: Vec<(usize, SolverOutcome)> = if batch.len() == 1 {
            let vehicles = batch[0];
            info!(vehicles, "trying fleet size");
            vec![(vehicles, attempt(instance, cost, solver, vehicles, config))]
        } else {
            info!(from = batch[0], to = batch[batch.len() - 1], "trying fleet sizes concurrently");
            batch
                .par_iter()
                .map(|&vehicles| (vehicles, attempt(instance, cost, solver, vehicles, config)))
                .collect()
        };

        for (vehicles, outcome) in outcomes {
            match outcome {
                SolverOutcome::Routes(routes) => {
                    info!(vehicles, "feasible plan found");
                    return Ok(FleetSolution { vehicles, routes });
                }
                SolverOutcome::Infeasible => {
                    debug!(vehicles, "no solution at this fleet size");
                }
            }
        }
    }

    warn!(cap, "no feasible fleet size");
    Err(PlanError::Infeasible { max_couriers: cap })
}
