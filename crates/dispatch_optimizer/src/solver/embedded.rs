use tracing::{debug, instrument};

use crate::model::linear_model::LinearModel;

use super::{
    branch_and_bound::branch_and_bound,
    raw_solution::RawSolution,
    solver_backend::{SolveLimits, SolverBackend, solve_without_variables},
};

/// In-process simplex + branch-and-bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedBackend;

impl SolverBackend for EmbeddedBackend {
    fn name(&self) -> &'static str {
        "embedded"
    }

    #[instrument(skip_all, level = "debug")]
    fn solve(&self, model: &LinearModel, limits: &SolveLimits) -> RawSolution {
        if model.num_variables() == 0 {
            return solve_without_variables(model, self.name());
        }

        let solution = branch_and_bound(model, limits, self.name());
        debug!(
            status = ?solution.status,
            objective = ?solution.objective_value,
            nodes = solution.statistics.nodes,
            lp_iterations = solution.statistics.lp_iterations,
            "embedded solve finished"
        );
        solution
    }
}
