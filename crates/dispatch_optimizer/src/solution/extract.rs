use tracing::{debug, instrument};

use crate::{
    error::{DispatchError, Result},
    model::allocation_model::AllocationModel,
    problem::{allocation_problem::AllocationProblem, courier::CourierIdx, priority::Priority},
    solver::raw_solution::RawSolution,
};

use super::allocation_solution::{
    AllocationSolution, Assignment, CourierLoad, Metrics, PriorityBreakdown,
};

const FEASIBILITY_TOLERANCE: f64 = 1e-6;
const OBJECTIVE_RELATIVE_TOLERANCE: f64 = 1e-6;

fn inconsistency(message: String) -> DispatchError {
    DispatchError::InternalConsistency(message)
}

/// Decodes a backend's point into assignments and re-checks every
/// invariant against the problem itself, not the solver's word.
#[instrument(skip_all, level = "debug")]
pub fn extract_solution(
    problem: &AllocationProblem,
    model: &AllocationModel,
    raw: RawSolution,
) -> Result<AllocationSolution> {
    if !raw.status.has_solution() {
        return Err(inconsistency(format!(
            "cannot extract assignments from a {:?} result",
            raw.status
        )));
    }

    if let Some(violation) = model
        .linear_model()
        .first_violation(&raw.values, FEASIBILITY_TOLERANCE)
    {
        return Err(inconsistency(format!("solver point is infeasible: {violation}")));
    }

    let mut assignments = model
        .assignment_variables()
        .iter()
        .filter(|entry| raw.values[entry.variable.get()] > 0.5)
        .map(|entry| {
            let order = problem.order(entry.order);
            Assignment {
                courier: entry.courier,
                order: entry.order,
                courier_id: problem.courier(entry.courier).external_id().to_owned(),
                order_id: order.external_id().to_owned(),
                priority: order.priority(),
                time: problem.cost(entry.courier, entry.order),
            }
        })
        .collect::<Vec<_>>();
    assignments.sort_by_key(|assignment| (assignment.order, assignment.courier));

    validate(problem, model, &assignments)?;

    let metrics = compute_metrics(problem, model, &assignments);

    let reported = raw.objective_value.unwrap_or(f64::NAN);
    let tolerance = OBJECTIVE_RELATIVE_TOLERANCE * reported.abs().max(1.0);
    if !((metrics.objective_value - reported).abs() <= tolerance) {
        return Err(inconsistency(format!(
            "objective {} recomputed from assignments differs from reported {reported}",
            metrics.objective_value
        )));
    }

    debug!(
        assignments = assignments.len(),
        objective = metrics.objective_value,
        "extracted solution"
    );

    Ok(AllocationSolution {
        status: raw.status,
        assignments,
        metrics,
        statistics: raw.statistics,
    })
}

fn validate(
    problem: &AllocationProblem,
    model: &AllocationModel,
    assignments: &[Assignment],
) -> Result<()> {
    let mut per_order = vec![0usize; problem.orders().len()];
    let mut per_courier = vec![0u64; problem.couriers().len()];

    for assignment in assignments {
        per_order[assignment.order.get()] += 1;
        per_courier[assignment.courier.get()] += model.order_load(assignment.order);

        if !model.is_courier_active(assignment.courier) {
            return Err(inconsistency(format!(
                "order `{}` assigned to unavailable courier `{}`",
                assignment.order_id, assignment.courier_id
            )));
        }
    }

    if let Some((order, count)) = per_order.iter().enumerate().find(|(_, count)| **count != 1) {
        return Err(inconsistency(format!(
            "order `{}` is assigned {count} times",
            problem.orders()[order].external_id()
        )));
    }

    for (courier, &load) in per_courier.iter().enumerate() {
        let courier = CourierIdx::new(courier);
        let capacity = model
            .capacity(courier)
            .unwrap_or_else(|| u64::from(problem.courier(courier).capacity()));
        if load > capacity {
            return Err(inconsistency(format!(
                "courier `{}` carries {load} over a capacity of {capacity}",
                problem.courier(courier).external_id()
            )));
        }
    }

    Ok(())
}

pub(crate) fn compute_metrics(
    problem: &AllocationProblem,
    model: &AllocationModel,
    assignments: &[Assignment],
) -> Metrics {
    let total_time = assignments.iter().map(|a| a.time).sum::<f64>();
    let objective_value = assignments
        .iter()
        .map(|a| a.time * model.order_weight(a.order))
        .sum::<f64>();

    let per_priority = Priority::ALL
        .iter()
        .map(|&priority| {
            let matching = assignments.iter().filter(|a| a.priority == priority);
            PriorityBreakdown {
                priority,
                count: matching.clone().count(),
                total_time: matching.map(|a| a.time).sum(),
            }
        })
        .collect();

    let mut loads = vec![0usize; problem.couriers().len()];
    for assignment in assignments {
        loads[assignment.courier.get()] += 1;
    }
    let per_courier_load = problem
        .couriers()
        .iter()
        .zip(&loads)
        .map(|(courier, &orders)| CourierLoad {
            courier_id: courier.external_id().to_owned(),
            orders,
        })
        .collect();

    let used = loads.iter().filter(|&&orders| orders > 0).count();
    let available = problem.active_courier_count();
    let courier_utilization = if available == 0 {
        0.0
    } else {
        used as f64 / available as f64
    };

    let submitted = problem.orders().len();
    let order_coverage = if submitted == 0 {
        1.0
    } else {
        assignments.len() as f64 / submitted as f64
    };

    Metrics {
        objective_value,
        total_time,
        average_time: if assignments.is_empty() {
            0.0
        } else {
            total_time / assignments.len() as f64
        },
        per_priority,
        per_courier_load,
        courier_utilization,
        order_coverage,
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{build_model::build_model, model_params::ModelParams},
        problem::order::OrderIdx,
        solver::raw_solution::{SolveStatistics, SolveStatus},
        test_utils::fixed_problem,
    };

    use super::*;

    fn setup() -> (AllocationProblem, AllocationModel) {
        let problem = fixed_problem(
            &[2, 2],
            &[Priority::Normal, Priority::High, Priority::Express],
            vec![vec![10.0, 20.0, 30.0], vec![15.0, 12.0, 25.0]],
        );
        let model = build_model(&problem, &ModelParams::default()).unwrap();
        (problem, model)
    }

    fn raw(model: &AllocationModel, pairs: &[(usize, usize)], objective: f64) -> RawSolution {
        let mut values = vec![0.0; model.linear_model().num_variables()];
        for &(courier, order) in pairs {
            let variable = model
                .variable(CourierIdx::new(courier), OrderIdx::new(order))
                .unwrap();
            values[variable.get()] = 1.0;
        }
        RawSolution::with_point(
            SolveStatus::Optimal,
            objective,
            values,
            SolveStatistics::default(),
        )
    }

    #[test]
    fn test_extract_valid_solution() {
        let (problem, model) = setup();
        // 10 * 1 + 12 * 2 + 25 * 3
        let solution =
            extract_solution(&problem, &model, raw(&model, &[(0, 0), (1, 1), (1, 2)], 109.0))
                .unwrap();

        let orders = solution
            .assignments
            .iter()
            .map(|a| a.order_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(orders, vec!["o00", "o01", "o02"]);
        assert_eq!(solution.metrics.total_time, 47.0);
        assert_eq!(solution.metrics.objective_value, 109.0);
        assert_eq!(solution.metrics.courier_utilization, 1.0);
        assert_eq!(solution.metrics.order_coverage, 1.0);
        assert_eq!(solution.metrics.per_courier_load[1].orders, 2);

        let express = solution.metrics.priority(Priority::Express).unwrap();
        assert_eq!(express.count, 1);
        assert_eq!(express.total_time, 25.0);
    }

    #[test]
    fn test_wrong_objective_is_rejected() {
        let (problem, model) = setup();
        let result =
            extract_solution(&problem, &model, raw(&model, &[(0, 0), (1, 1), (1, 2)], 108.0));

        assert!(matches!(result, Err(DispatchError::InternalConsistency(_))));
    }

    #[test]
    fn test_uncovered_order_is_rejected() {
        let (problem, model) = setup();
        let result = extract_solution(&problem, &model, raw(&model, &[(0, 0), (1, 1)], 34.0));

        assert!(matches!(result, Err(DispatchError::InternalConsistency(_))));
    }

    #[test]
    fn test_overloaded_courier_is_rejected() {
        let (problem, model) = setup();
        let result = extract_solution(
            &problem,
            &model,
            raw(&model, &[(0, 0), (0, 1), (0, 2)], 140.0),
        );

        assert!(matches!(result, Err(DispatchError::InternalConsistency(_))));
    }

    #[test]
    fn test_objective_tolerance_is_relative() {
        let (problem, model) = setup();
        let result = extract_solution(
            &problem,
            &model,
            raw(&model, &[(0, 0), (1, 1), (1, 2)], 109.0 * (1.0 + 1e-8)),
        );

        assert!(result.is_ok());
    }
}
