#![allow(dead_code)]

use dispatch_optimizer::{
    model::model_params::{CapacityMeasure, ModelParams},
    pipeline::AllocationSolver,
    problem::{
        allocation_problem::{AllocationProblem, AllocationProblemBuilder},
        availability::Availability,
        courier::{CourierBuilder, CourierIdx},
        order::{OrderBuilder, OrderIdx},
        priority::Priority,
    },
    solution::allocation_solution::AllocationSolution,
    solver::solve_params::{SolveParams, SolverBackendKind},
};
use rand::{Rng, rngs::StdRng};

pub fn priority(code: u8) -> Priority {
    Priority::try_from(code).unwrap()
}

/// Couriers `c0`, `c1`, ... and orders `o0`, `o1`, ... with an explicit cost
/// matrix indexed `[courier][order]`.
pub fn create_problem(capacities: &[u32], priorities: &[u8], costs: Vec<Vec<f64>>) -> AllocationProblem {
    create_problem_with_availability(
        &capacities
            .iter()
            .map(|&capacity| (capacity, true))
            .collect::<Vec<_>>(),
        priorities,
        costs,
    )
}

pub fn create_problem_with_availability(
    couriers: &[(u32, bool)],
    priorities: &[u8],
    costs: Vec<Vec<f64>>,
) -> AllocationProblem {
    let couriers = couriers
        .iter()
        .enumerate()
        .map(|(index, &(capacity, available))| {
            let mut builder = CourierBuilder::default();
            builder
                .set_courier_id(format!("c{index}"))
                .set_capacity(capacity);
            if !available {
                builder.set_availability(Availability::Never);
            }
            builder.build().unwrap()
        })
        .collect();

    let orders = priorities
        .iter()
        .enumerate()
        .map(|(index, &code)| {
            let mut builder = OrderBuilder::default();
            builder
                .set_order_id(format!("o{index}"))
                .set_priority(priority(code));
            builder.build().unwrap()
        })
        .collect();

    let mut builder = AllocationProblemBuilder::default();
    builder
        .set_couriers(couriers)
        .set_orders(orders)
        .set_cost_matrix(costs);
    builder.build().unwrap()
}

/// Small random instance that always has enough active capacity.
pub fn create_random_problem(rng: &mut StdRng, couriers: usize, orders: usize) -> AllocationProblem {
    let mut specs = (0..couriers)
        .map(|_| (rng.random_range(1..=3), rng.random_bool(0.85)))
        .collect::<Vec<(u32, bool)>>();
    specs[0].1 = true;
    specs[0].0 = specs[0].0.max(orders as u32);

    let priorities = (0..orders)
        .map(|_| rng.random_range(1..=3))
        .collect::<Vec<u8>>();

    let costs = (0..couriers)
        .map(|_| {
            (0..orders)
                .map(|_| f64::from(rng.random_range(5..=60u32)))
                .collect()
        })
        .collect();

    create_problem_with_availability(&specs, &priorities, costs)
}

pub fn create_solver(model_params: ModelParams, solve_params: SolveParams) -> AllocationSolver {
    AllocationSolver::new(&SolverBackendKind::Embedded, model_params, solve_params)
}

pub fn default_solver() -> AllocationSolver {
    create_solver(ModelParams::default(), SolveParams::default())
}

/// Best weighted objective over every feasible assignment, by enumeration.
pub fn brute_force_objective(problem: &AllocationProblem, params: &ModelParams) -> Option<f64> {
    let num_couriers = problem.couriers().len();
    let num_orders = problem.orders().len();
    let mut choice = vec![0usize; num_orders];
    let mut best: Option<f64> = None;

    loop {
        if let Some(objective) = evaluate(problem, params, &choice) {
            best = Some(best.map_or(objective, |b: f64| b.min(objective)));
        }

        // odometer over courier choices
        let mut position = 0;
        loop {
            if position == num_orders {
                return best;
            }
            choice[position] += 1;
            if choice[position] < num_couriers {
                break;
            }
            choice[position] = 0;
            position += 1;
        }
    }
}

fn evaluate(problem: &AllocationProblem, params: &ModelParams, choice: &[usize]) -> Option<f64> {
    let mut loads = vec![0u64; problem.couriers().len()];
    let mut objective = 0.0;

    for (order_index, &courier_index) in choice.iter().enumerate() {
        let courier = CourierIdx::new(courier_index);
        let order = OrderIdx::new(order_index);
        let priority = problem.order(order).priority();
        let cost = problem.cost(courier, order);

        if !problem.is_courier_active(courier) || !params.ceilings.allows(priority, cost) {
            return None;
        }

        loads[courier_index] += match params.capacity_measure {
            CapacityMeasure::OrderCount => 1,
            CapacityMeasure::OrderSize => u64::from(problem.order(order).size()),
        };
        objective += cost * params.weights.weight(priority);
    }

    let fits = loads
        .iter()
        .zip(problem.couriers())
        .all(|(&load, courier)| load <= u64::from(courier.capacity()));

    fits.then_some(objective)
}

/// Coverage, capacity and exact objective of an accepted solution.
pub fn assert_solution_invariants(
    problem: &AllocationProblem,
    params: &ModelParams,
    solution: &AllocationSolution,
) {
    assert_eq!(solution.assignments.len(), problem.orders().len());
    for order in problem.orders() {
        let count = solution
            .assignments
            .iter()
            .filter(|a| a.order_id == order.external_id())
            .count();
        assert_eq!(count, 1, "order {} assigned {count} times", order.external_id());
    }

    for courier in problem.couriers() {
        let count = solution.assignments_of(courier.external_id()).count();
        assert!(count as u32 <= courier.capacity());
    }

    let mut objective = 0.0;
    for assignment in &solution.assignments {
        assert_eq!(assignment.time, problem.cost(assignment.courier, assignment.order));
        objective += assignment.time * params.weights.weight(assignment.priority);
    }
    let tolerance = 1e-6 * objective.abs().max(1.0);
    assert!((solution.metrics.objective_value - objective).abs() <= tolerance);
}
