use fxhash::FxHashMap;
use tracing::{debug, instrument};

use crate::{
    error::{DispatchError, Result},
    problem::{allocation_problem::AllocationProblem, courier::CourierIdx},
};

use super::{
    allocation_model::{AllocationModel, AssignmentVariable},
    linear_model::{Constraint, ConstraintClass, LinearModel, Sense, Variable, VariableIdx},
    model_params::{CapacityMeasure, ModelParams, ObjectiveStyle},
};

/// Turns a problem snapshot into an [`AllocationModel`].
///
/// Fails fast with [`DispatchError::InfeasibleDemand`] when the active
/// couriers cannot absorb the demand, before any variable is created.
#[instrument(skip_all, level = "debug")]
pub fn build_model(problem: &AllocationProblem, params: &ModelParams) -> Result<AllocationModel> {
    params.weights.validate()?;
    params.ceilings.validate()?;

    let order_loads = problem
        .orders()
        .iter()
        .map(|order| match params.capacity_measure {
            CapacityMeasure::OrderCount => 1,
            CapacityMeasure::OrderSize => u64::from(order.size()),
        })
        .collect::<Vec<_>>();

    let demand = order_loads.iter().sum::<u64>();
    let capacity = problem.total_active_capacity();
    if capacity < demand {
        return Err(DispatchError::InfeasibleDemand { capacity, demand });
    }

    let num_couriers = problem.couriers().len();
    let num_orders = problem.orders().len();

    let active = problem
        .courier_ids()
        .map(|courier| problem.is_courier_active(courier))
        .collect::<Vec<_>>();
    let order_weights = problem
        .orders()
        .iter()
        .map(|order| params.weights.weight(order.priority()))
        .collect::<Vec<_>>();

    let mut linear = LinearModel::default();
    let mut assignment_variables = Vec::new();
    let mut pair_lookup = FxHashMap::default();
    let mut candidates = vec![Vec::new(); num_orders];
    let mut pruned_pairs = 0;

    for courier in problem.courier_ids() {
        for order in problem.order_ids() {
            let cost = problem.cost(courier, order);
            let priority = problem.order(order).priority();

            if !active[courier.get()] || !params.ceilings.allows(priority, cost) {
                pruned_pairs += 1;
                continue;
            }

            let objective = match params.objective_style {
                ObjectiveStyle::DirectCost => cost * order_weights[order.get()],
                ObjectiveStyle::BigM => 0.0,
            };
            let variable = linear.add_variable(Variable::binary(
                format!("x_{}_{}", courier.get(), order.get()),
                objective,
            ));

            assignment_variables.push(AssignmentVariable {
                courier,
                order,
                variable,
            });
            pair_lookup.insert((courier, order), variable);
            candidates[order.get()].push(courier);
        }
    }

    let mut variable_pairs = assignment_variables
        .iter()
        .map(|entry| Some((entry.courier, entry.order)))
        .collect::<Vec<_>>();

    for order in problem.order_ids() {
        let terms = candidates[order.get()]
            .iter()
            .map(|&courier| (pair_lookup[&(courier, order)], 1.0))
            .collect();
        linear.add_constraint(Constraint::new(
            format!("assign_{}", order.get()),
            ConstraintClass::Assignment,
            terms,
            Sense::Equal,
            1.0,
        ));
    }

    let mut capacity_rows = vec![None; num_couriers];
    for courier in problem.courier_ids().filter(|c| active[c.get()]) {
        let terms = assignment_variables
            .iter()
            .filter(|entry| entry.courier == courier)
            .map(|entry| (entry.variable, order_loads[entry.order.get()] as f64))
            .collect();
        capacity_rows[courier.get()] = Some(linear.add_constraint(Constraint::new(
            format!("cap_{}", courier.get()),
            ConstraintClass::Capacity,
            terms,
            Sense::LessEqual,
            f64::from(problem.courier(courier).capacity()),
        )));
    }

    if params.objective_style == ObjectiveStyle::BigM {
        add_delivery_time_links(
            problem,
            &mut linear,
            &assignment_variables,
            &candidates,
            &order_weights,
        );
        variable_pairs.resize(linear.num_variables(), None);
    }

    debug!(
        variables = linear.num_variables(),
        constraints = linear.num_constraints(),
        pruned_pairs,
        "built allocation model"
    );

    Ok(AllocationModel {
        linear,
        params: params.clone(),
        assignment_variables,
        pair_lookup,
        variable_pairs,
        candidates,
        capacity_rows,
        active,
        order_weights,
        order_loads,
        pruned_pairs,
    })
}

/// `T[j] >= 0` per order, charged `weight(j)` in the objective, and
/// `T[j] - M[j] x[i,j] >= cost[i,j] - M[j]` per eligible pair, where `M[j]`
/// is the largest eligible cost of the order.
fn add_delivery_time_links(
    problem: &AllocationProblem,
    linear: &mut LinearModel,
    assignment_variables: &[AssignmentVariable],
    candidates: &[Vec<CourierIdx>],
    order_weights: &[f64],
) {
    let mut by_pair = FxHashMap::default();
    for entry in assignment_variables {
        by_pair.insert((entry.courier, entry.order), entry.variable);
    }

    let time_variables = problem
        .order_ids()
        .map(|order| {
            linear.add_variable(Variable::non_negative(
                format!("t_{}", order.get()),
                order_weights[order.get()],
            ))
        })
        .collect::<Vec<VariableIdx>>();

    for order in problem.order_ids() {
        let big_m = candidates[order.get()]
            .iter()
            .map(|&courier| problem.cost(courier, order))
            .fold(0.0, f64::max);

        for &courier in &candidates[order.get()] {
            let cost = problem.cost(courier, order);
            linear.add_constraint(Constraint::new(
                format!("link_{}_{}", courier.get(), order.get()),
                ConstraintClass::DeliveryTimeLink,
                vec![
                    (time_variables[order.get()], 1.0),
                    (by_pair[&(courier, order)], -big_m),
                ],
                Sense::GreaterEqual,
                cost - big_m,
            ));
        }
    }
}
