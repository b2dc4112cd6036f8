//! Request validation and the planning pipeline.

use std::collections::HashSet;

use tracing::info;

use crate::config::PlannerConfig;
use crate::cost::PriorityCost;
use crate::error::PlanError;
use crate::extract::extract_plan;
use crate::instance::build_instance;
use crate::model::{PlanningRequest, RoutePlan};
use crate::search::search_fleet_size;
use crate::tasks::generate_tasks;
use crate::traits::RoutingSolver;

/// Reject requests the pipeline cannot plan for. Nothing is repaired or
/// defaulted here.
pub fn validate(request: &PlanningRequest) -> Result<(), PlanError> {
    if request.reservoirs.is_empty() {
        return Err(PlanError::input("no reservoirs given"));
    }
    if request.couriers.is_empty() {
        return Err(PlanError::input("no couriers given"));
    }
    if request.depot.trim().is_empty() {
        return Err(PlanError::input("depot id is empty"));
    }
    if !request.prediction_horizon_minutes.is_finite() || request.prediction_horizon_minutes < 0.0 {
        return Err(PlanError::input(format!(
            "prediction horizon must be a non-negative number of minutes, got {}",
            request.prediction_horizon_minutes
        )));
    }
    if request.max_couriers == Some(0) {
        return Err(PlanError::input("courier limit must be at least 1"));
    }

    for row in &request.travel_times {
        if let Some(entry) = row.to.iter().find(|e| !e.time.is_finite() || e.time < 0.0) {
            return Err(PlanError::input(format!(
                "travel time {} -> {} is {}",
                row.from, entry.to, entry.time
            )));
        }
    }

    let mut courier_ids = HashSet::new();
    for courier in &request.couriers {
        if courier.id.trim().is_empty() {
            return Err(PlanError::input("courier with empty id"));
        }
        if !courier_ids.insert(courier.id.as_str()) {
            return Err(PlanError::input(format!("duplicate courier id {}", courier.id)));
        }
    }

    let edges = request.edge_map();
    let from_depot = edges.get(&request.depot);
    let mut seen = HashSet::new();

    for reservoir in &request.reservoirs {
        let id = &reservoir.id;
        if id.trim().is_empty() {
            return Err(PlanError::input("reservoir with empty id"));
        }
        if !seen.insert(id.as_str()) {
            return Err(PlanError::input(format!("duplicate reservoir id {}", id)));
        }
        if !reservoir.current_level.is_finite() || reservoir.current_level < 0.0 {
            return Err(PlanError::input(format!(
                "reservoir {} has level {}",
                id, reservoir.current_level
            )));
        }
        if !reservoir.max_volume.is_finite() || reservoir.max_volume <= 0.0 {
            return Err(PlanError::input(format!(
                "reservoir {} has max volume {}",
                id, reservoir.max_volume
            )));
        }
        if !reservoir.fill_rate.is_finite() {
            return Err(PlanError::input(format!(
                "reservoir {} has fill rate {}",
                id, reservoir.fill_rate
            )));
        }
        if reservoir.time_until_overflow.is_nan() || reservoir.time_until_overflow < 0.0 {
            return Err(PlanError::input(format!(
                "reservoir {} has time until overflow {}",
                id, reservoir.time_until_overflow
            )));
        }
        if !from_depot.is_some_and(|targets| targets.contains_key(id)) {
            return Err(PlanError::input(format!(
                "no travel time from depot {} to reservoir {}",
                request.depot, id
            )));
        }
    }

    Ok(())
}

/// Plan pickups for every reservoir that needs one with the fewest couriers.
pub fn plan<S>(request: &PlanningRequest, solver: &S, config: &PlannerConfig) -> Result<RoutePlan, PlanError>
where
    S: RoutingSolver + ?Sized,
{
    validate(request)?;

    let edges = request.edge_map();
    let tasks = generate_tasks(
        &request.reservoirs,
        request.prediction_horizon_minutes,
        &config.tasks,
    );
    if tasks.is_empty() {
        info!("no reservoir needs a pickup");
        return Ok(RoutePlan::empty());
    }
    info!(tasks = tasks.len(), reservoirs = request.reservoirs.len(), "generated pickup tasks");

    let instance = build_instance(
        &request.depot,
        &tasks,
        &edges,
        request.couriers.len(),
        &config.routing,
    );
    let cost = PriorityCost::new(&instance, &tasks, &request.reservoirs, &config.cost);

    let solution = search_fleet_size(&instance, &cost, solver, request.max_couriers, &config.search)?;
    let plan = extract_plan(&instance, &tasks, &request.couriers, &solution)?;

    info!(
        couriers = plan.fleet_size,
        routes = plan.routes.len(),
        total_time = plan.total_time,
        "plan complete"
    );
    Ok(plan)
}
