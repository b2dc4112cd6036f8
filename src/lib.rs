//! cauldron-planner core
//!
//! Turns reservoir level snapshots into courier pickup routes that use as
//! few couriers as possible while respecting vehicle capacity and overflow
//! deadlines.

pub mod closure;
pub mod config;
pub mod cost;
pub mod error;
pub mod extract;
pub mod forecast;
pub mod instance;
pub mod model;
pub mod planner;
pub mod search;
pub mod solver;
pub mod tasks;
pub mod traits;

pub use config::PlannerConfig;
pub use error::{ErrorKind, ErrorResponse, PlanError};
pub use model::{Courier, CourierRoute, PlanningRequest, ReservoirSnapshot, RiskTier, RoutePlan, Stop};
pub use planner::plan;
pub use solver::InsertionSolver;
