use tracing::{debug, instrument};

use crate::{
    model::allocation_model::AllocationModel,
    problem::order::OrderIdx,
};

use super::{
    raw_solution::{RawSolution, SolveStatus, TieBreakOutcome},
    solver_backend::{SolveLimits, SolverBackend},
};

/// Objective slack allowed for a solution to count as "still optimal".
fn objective_slack(objective: f64) -> f64 {
    1e-9 * objective.abs().max(1.0)
}

/// Rewrites a proven optimum into the lexicographically smallest one: for
/// each order by ascending id, the lowest-id courier that can take it
/// without losing optimality, given the choices already made.
///
/// Every trial is a full solve under an objective cut, so the result does
/// not depend on which optimum the backend happened to return first. The
/// trials share `limits`; when the budget runs out the current optimum is
/// kept and the outcome is [`TieBreakOutcome::Incomplete`].
#[instrument(skip_all, level = "debug")]
pub(crate) fn polish_lexicographic(
    model: &AllocationModel,
    backend: &dyn SolverBackend,
    optimum: RawSolution,
    limits: &SolveLimits,
) -> RawSolution {
    let Some(objective) = optimum.objective_value else {
        return optimum;
    };

    let mut working = model.linear_model().clone();
    working.add_objective_cut(objective + objective_slack(objective));

    let trial_limits = SolveLimits {
        deadline: limits.deadline,
        relative_gap: None,
    };

    let mut best = optimum;
    let mut outcome = TieBreakOutcome::Complete;
    let mut statistics = best.statistics.clone();

    'orders: for order in OrderIdx::range(model.num_orders()) {
        let candidates = model.candidates(order);
        let Some(mut assigned) = candidates.iter().copied().find(|&courier| {
            model
                .variable(courier, order)
                .is_some_and(|variable| best.values[variable.get()] > 0.5)
        }) else {
            continue;
        };

        let current = assigned;
        for &candidate in candidates.iter().take_while(|&&courier| courier < current) {
            if limits.deadline.is_expired() {
                outcome = TieBreakOutcome::Incomplete;
                break 'orders;
            }
            let Some(variable) = model.variable(candidate, order) else {
                continue;
            };

            let mut trial = working.clone();
            trial.fix(variable, 1.0);
            let result = backend.solve(&trial, &trial_limits);
            statistics.absorb(&result.statistics);

            if result.status.has_solution() {
                debug!(%order, from = %assigned, to = %candidate, "reassigned order");
                assigned = candidate;
                statistics.reassigned_orders += 1;
                best.values = result.values;
            }

            match result.status {
                SolveStatus::TimeoutWithIncumbent | SolveStatus::TimeoutNoIncumbent => {
                    outcome = TieBreakOutcome::Incomplete;
                    break 'orders;
                }
                _ if assigned == candidate => break,
                _ => {}
            }
        }

        if let Some(variable) = model.variable(assigned, order) {
            working.fix(variable, 1.0);
        }
    }

    // Values from trials satisfy the original rows plus the cut.
    let objective_value = model.linear_model().objective_value(&best.values);
    statistics.elapsed = limits.deadline.elapsed();
    statistics.tie_break = outcome;

    debug!(
        ?outcome,
        reassigned = statistics.reassigned_orders,
        "tie-break polishing finished"
    );

    RawSolution {
        status: SolveStatus::Optimal,
        objective_value: Some(objective_value),
        statistics,
        ..best
    }
}
