use tracing::debug;

use crate::model::linear_model::LinearModel;

use super::{
    raw_solution::{RawSolution, SolveStatistics, SolveStatus},
    simplex::{LpOutcome, solve_relaxation},
    solver_backend::SolveLimits,
};

const INTEGRALITY_TOLERANCE: f64 = 1e-6;

struct Incumbent {
    objective: f64,
    values: Vec<f64>,
}

fn improvement_tolerance(objective: f64) -> f64 {
    1e-9 * objective.abs().max(1.0)
}

/// Depth-first branch-and-bound over the simplex relaxation.
///
/// Branches on the lowest-index fractional integer variable and explores the
/// up branch first, which for assignment rows reaches an incumbent quickly.
pub(crate) fn branch_and_bound(
    model: &LinearModel,
    limits: &SolveLimits,
    backend: &'static str,
) -> RawSolution {
    let mut statistics = SolveStatistics {
        backend,
        ..SolveStatistics::default()
    };

    let root = model
        .variables()
        .iter()
        .map(|variable| (variable.lower(), variable.upper()))
        .collect::<Vec<_>>();

    let mut stack = vec![root];
    let mut incumbent: Option<Incumbent> = None;
    let mut pruned_by_gap = false;
    let mut timed_out = false;

    while let Some(bounds) = stack.pop() {
        if limits.deadline.is_expired() {
            timed_out = true;
            break;
        }
        statistics.nodes += 1;

        let relaxation = solve_relaxation(model, &bounds, &limits.deadline);
        statistics.lp_iterations += relaxation.iterations;

        let (values, objective) = match relaxation.outcome {
            LpOutcome::Optimal { values, objective } => (values, objective),
            LpOutcome::Infeasible => continue,
            LpOutcome::Interrupted => {
                timed_out = true;
                break;
            }
            LpOutcome::Unbounded => {
                statistics.elapsed = limits.deadline.elapsed();
                return RawSolution::without_point(SolveStatus::Unbounded, statistics);
            }
        };

        if let Some(incumbent) = &incumbent {
            let tolerance = improvement_tolerance(incumbent.objective);
            if objective >= incumbent.objective - tolerance {
                continue;
            }
            let within_gap = limits.relative_gap.is_some_and(|gap| {
                objective >= incumbent.objective - gap * incumbent.objective.abs()
            });
            if within_gap {
                pruned_by_gap = true;
                continue;
            }
        }

        let fractional = model
            .variables()
            .iter()
            .zip(&values)
            .position(|(variable, value)| {
                variable.is_integer() && (value - value.round()).abs() > INTEGRALITY_TOLERANCE
            });

        match fractional {
            None => {
                let values = model
                    .variables()
                    .iter()
                    .zip(values)
                    .map(|(variable, value)| {
                        if variable.is_integer() {
                            value.round()
                        } else {
                            value
                        }
                    })
                    .collect::<Vec<_>>();
                let objective = model.objective_value(&values);

                debug!(objective, nodes = statistics.nodes, "new incumbent");
                incumbent = Some(Incumbent { objective, values });
            }
            Some(variable) => {
                let value = values[variable];
                let (lower, upper) = bounds[variable];

                let mut down = bounds.clone();
                down[variable] = (lower, value.floor());
                let mut up = bounds;
                up[variable] = (value.ceil(), upper);

                stack.push(down);
                stack.push(up);
            }
        }
    }

    statistics.elapsed = limits.deadline.elapsed();

    match (incumbent, timed_out) {
        (Some(incumbent), timed_out) => {
            let status = if timed_out {
                SolveStatus::TimeoutWithIncumbent
            } else if pruned_by_gap {
                SolveStatus::SuboptimalWithinGap
            } else {
                SolveStatus::Optimal
            };
            RawSolution::with_point(status, incumbent.objective, incumbent.values, statistics)
        }
        (None, true) => RawSolution::without_point(SolveStatus::TimeoutNoIncumbent, statistics),
        (None, false) => RawSolution::without_point(SolveStatus::Infeasible, statistics),
    }
}
