use jiff::SignedDuration;
use thiserror::Error;

use crate::model::linear_model::ConstraintClass;

/// Errors raised while turning loader input into an [`AllocationProblem`].
///
/// [`AllocationProblem`]: crate::problem::allocation_problem::AllocationProblem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataValidationError {
    #[error("duplicate courier id `{0}`")]
    DuplicateCourierId(String),
    #[error("duplicate order id `{0}`")]
    DuplicateOrderId(String),
    #[error("duplicate restaurant id `{0}`")]
    DuplicateRestaurantId(String),
    #[error("courier `{0}` must have a positive capacity")]
    ZeroCapacity(String),
    #[error("priority {0} is not one of 1 (normal), 2 (priority), 3 (express)")]
    InvalidPriority(u8),
    #[error("order `{order}` references unknown restaurant `{restaurant}`")]
    UnknownRestaurant { order: String, restaurant: String },
    #[error("field `{field}` of `{id}` must be a finite non-negative number, got {value}")]
    InvalidNumber {
        id: String,
        field: &'static str,
        value: f64,
    },
    #[error("cost matrix is {rows}x{columns}, expected {couriers}x{orders}")]
    CostMatrixShape {
        rows: usize,
        columns: usize,
        couriers: usize,
        orders: usize,
    },
    #[error("priority weight for {priority} must be positive and finite, got {weight}")]
    InvalidWeight { priority: u8, weight: f64 },
    #[error("courier `{0}` has an availability window ending before it starts")]
    InvalidAvailabilityWindow(String),
    #[error("{0}")]
    Malformed(String),
}

/// Failure taxonomy of the build → solve → extract pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error(transparent)]
    DataValidation(#[from] DataValidationError),

    /// Cheap pre-check: active couriers cannot absorb the demand.
    #[error("total courier capacity {capacity} is below the demand of {demand}")]
    InfeasibleDemand { capacity: u64, demand: u64 },

    #[error("solver proved the model infeasible ({}): {detail}", .binding.map_or("unknown", |c| c.as_str()))]
    SolverInfeasible {
        binding: Option<ConstraintClass>,
        detail: String,
    },

    /// The time budget ran out before any feasible assignment was found.
    #[error("time budget of {budget} exhausted after {elapsed} without a feasible assignment")]
    SolverTimeout {
        budget: SignedDuration,
        elapsed: SignedDuration,
    },

    #[error("solver backend `{backend}` is unavailable: {reason}")]
    SolverUnavailable { backend: String, reason: String },

    #[error("internal consistency violation: {0}")]
    InternalConsistency(String),
}

impl DispatchError {
    /// Short machine-friendly name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::DataValidation(_) => "data_validation",
            DispatchError::InfeasibleDemand { .. } => "infeasible_demand",
            DispatchError::SolverInfeasible { .. } => "solver_infeasible",
            DispatchError::SolverTimeout { .. } => "solver_timeout",
            DispatchError::SolverUnavailable { .. } => "solver_unavailable",
            DispatchError::InternalConsistency(_) => "internal_consistency",
        }
    }
}

pub type Result<T, E = DispatchError> = std::result::Result<T, E>;
