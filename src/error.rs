//! Planning errors.
//!
//! Input and infeasibility errors are expected operational outcomes. An
//! invariant violation means the cost model or a solver backend broke its
//! contract and the plan must not reach the caller.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error(
        "no feasible plan with {max_couriers} or fewer couriers; \
         raise the courier limit or shorten the prediction horizon"
    )]
    Infeasible { max_couriers: usize },

    #[error("planner invariant violated: {0}")]
    InvariantViolation(String),
}

impl PlanError {
    pub fn input(detail: impl Into<String>) -> Self {
        PlanError::Input(detail.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PlanError::Input(_) => ErrorKind::Input,
            PlanError::Infeasible { .. } => ErrorKind::Infeasible,
            PlanError::InvariantViolation(_) => ErrorKind::Internal,
        }
    }
}

/// Error classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Input,
    Infeasible,
    Internal,
}

/// Wire form of a failed planning request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub detail: String,
}

impl From<&PlanError> for ErrorResponse {
    fn from(err: &PlanError) -> Self {
        Self {
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}
