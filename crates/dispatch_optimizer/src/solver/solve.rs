use tracing::{info, instrument, warn};

use crate::{
    error::{DispatchError, Result},
    model::allocation_model::AllocationModel,
    utils::time::Deadline,
};

use super::{
    raw_solution::{RawSolution, SolveStatus},
    solve_params::{SolveParams, TieBreak},
    solver_backend::{SolveLimits, SolverBackend},
    tie_break::polish_lexicographic,
};

/// Runs `backend` on the model and turns terminal statuses into errors.
///
/// `Ok` always carries a feasible point. Its status tells how much to trust
/// it: [`SolveStatus::TimeoutWithIncumbent`] marks a best-effort answer.
#[instrument(skip_all, level = "debug", fields(backend = backend.name()))]
pub fn solve_model(
    model: &AllocationModel,
    backend: &dyn SolverBackend,
    params: &SolveParams,
) -> Result<RawSolution> {
    let limits = SolveLimits {
        deadline: Deadline::start(params.time_budget),
        relative_gap: params.relative_gap,
    };

    let mut solution = backend.solve(model.linear_model(), &limits);

    info!(
        status = ?solution.status,
        objective = ?solution.objective_value,
        elapsed = %solution.statistics.elapsed,
        nodes = solution.statistics.nodes,
        "solver finished"
    );

    match solution.status {
        SolveStatus::Optimal => {
            if params.tie_break == TieBreak::Lexicographic && model.num_orders() > 0 {
                solution = polish_lexicographic(model, backend, solution, &limits);
            }
            Ok(solution)
        }
        SolveStatus::SuboptimalWithinGap => Ok(solution),
        SolveStatus::TimeoutWithIncumbent => {
            warn!("time budget exhausted, returning the best incumbent");
            Ok(solution)
        }
        SolveStatus::Infeasible => Err(DispatchError::SolverInfeasible {
            binding: Some(model.diagnose_infeasibility()),
            detail: solution
                .message
                .unwrap_or_else(|| "no assignment satisfies every constraint".to_owned()),
        }),
        SolveStatus::Unbounded => Err(DispatchError::InternalConsistency(
            "solver reported an unbounded objective on a bounded model".to_owned(),
        )),
        SolveStatus::TimeoutNoIncumbent => Err(DispatchError::SolverTimeout {
            budget: params.time_budget,
            elapsed: limits.deadline.elapsed(),
        }),
        SolveStatus::Unavailable => Err(DispatchError::SolverUnavailable {
            backend: backend.name().to_owned(),
            reason: solution
                .message
                .unwrap_or_else(|| "backend did not report a reason".to_owned()),
        }),
    }
}
