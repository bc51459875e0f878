use crate::{model::linear_model::LinearModel, utils::time::Deadline};

use super::raw_solution::{RawSolution, SolveStatistics, SolveStatus};

#[derive(Debug, Clone, Copy)]
pub struct SolveLimits {
    pub deadline: Deadline,
    pub relative_gap: Option<f64>,
}

/// An exact MILP engine. Backends only see the solver-neutral
/// [`LinearModel`] and always answer with a status, never a panic or an
/// error type of their own.
pub trait SolverBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, model: &LinearModel, limits: &SolveLimits) -> RawSolution;
}

/// A model without variables needs no engine: it is feasible iff every row
/// holds at zero.
pub(crate) fn solve_without_variables(model: &LinearModel, backend: &'static str) -> RawSolution {
    let statistics = SolveStatistics {
        backend,
        ..SolveStatistics::default()
    };

    match model.first_violation(&[], 1e-9) {
        None => RawSolution::with_point(SolveStatus::Optimal, 0.0, Vec::new(), statistics),
        Some(violation) => {
            RawSolution::without_point(SolveStatus::Infeasible, statistics).with_message(violation)
        }
    }
}
