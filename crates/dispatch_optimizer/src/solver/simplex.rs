//! Dense two-phase primal simplex for the LP relaxation of a
//! [`LinearModel`] under per-node variable bounds.
//!
//! Variables are shifted to their lower bound, fixed variables are folded
//! into the right-hand sides and finite upper bounds become rows unless an
//! existing row already implies them. Pricing is Dantzig's rule, falling
//! back to Bland's rule after a streak of degenerate pivots so the method
//! cannot cycle.

use crate::{
    model::linear_model::{LinearModel, Sense},
    utils::time::Deadline,
};

const PIVOT_EPSILON: f64 = 1e-9;
const COST_EPSILON: f64 = 1e-9;
const FEASIBILITY_EPSILON: f64 = 1e-7;
const DEGENERATE_STREAK_BEFORE_BLAND: usize = 50;
const DEADLINE_CHECK_INTERVAL: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LpOutcome {
    Optimal { values: Vec<f64>, objective: f64 },
    Infeasible,
    Unbounded,
    Interrupted,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LpResult {
    pub outcome: LpOutcome,
    pub iterations: usize,
}

struct Row {
    coefficients: Vec<f64>,
    sense: Sense,
    rhs: f64,
}

struct Tableau {
    /// `rows + 1` rows (objective last) of `width` entries, rhs last.
    cells: Vec<f64>,
    width: usize,
    rows: usize,
    basis: Vec<usize>,
}

impl Tableau {
    fn at(&self, row: usize, column: usize) -> f64 {
        self.cells[row * self.width + column]
    }

    fn rhs(&self, row: usize) -> f64 {
        self.at(row, self.width - 1)
    }

    fn objective_row(&self) -> usize {
        self.rows
    }

    fn pivot(&mut self, pivot_row: usize, pivot_column: usize) {
        let width = self.width;
        let pivot = self.at(pivot_row, pivot_column);

        let start = pivot_row * width;
        for cell in &mut self.cells[start..start + width] {
            *cell /= pivot;
        }

        let pivot_values = self.cells[start..start + width].to_vec();
        for row in 0..=self.rows {
            if row == pivot_row {
                continue;
            }
            let factor = self.at(row, pivot_column);
            if factor == 0.0 {
                continue;
            }
            let offset = row * width;
            for (column, &value) in pivot_values.iter().enumerate() {
                if value != 0.0 {
                    self.cells[offset + column] -= factor * value;
                }
            }
            self.cells[offset + pivot_column] = 0.0;
        }

        self.basis[pivot_row] = pivot_column;
    }

    /// Rewrites the objective row as reduced costs of `costs` for the
    /// current basis.
    fn price(&mut self, costs: &[f64]) {
        let width = self.width;
        let objective = self.objective_row() * width;

        for column in 0..width {
            self.cells[objective + column] = if column < costs.len() {
                costs[column]
            } else {
                0.0
            };
        }

        for row in 0..self.rows {
            let basic_cost = costs[self.basis[row]];
            if basic_cost == 0.0 {
                continue;
            }
            for column in 0..width {
                let value = self.cells[row * width + column];
                self.cells[objective + column] -= basic_cost * value;
            }
        }
    }

    /// Current value of the objective being priced.
    fn objective_value(&self) -> f64 {
        -self.rhs(self.objective_row())
    }
}

enum Phase {
    Optimal,
    Unbounded,
    Interrupted,
}

fn run_phase(
    tableau: &mut Tableau,
    enterable: &[bool],
    deadline: &Deadline,
    iterations: &mut usize,
) -> Phase {
    let objective_row = tableau.objective_row();
    let mut degenerate_streak = 0;

    loop {
        if *iterations % DEADLINE_CHECK_INTERVAL == 0 && deadline.is_expired() {
            return Phase::Interrupted;
        }

        let use_bland = degenerate_streak >= DEGENERATE_STREAK_BEFORE_BLAND;
        let mut entering = None;
        let mut most_negative = -COST_EPSILON;
        for (column, _) in enterable.iter().enumerate().filter(|(_, e)| **e) {
            let reduced_cost = tableau.at(objective_row, column);
            if reduced_cost < most_negative {
                entering = Some(column);
                if use_bland {
                    break;
                }
                most_negative = reduced_cost;
            }
        }

        let Some(entering) = entering else {
            return Phase::Optimal;
        };

        let mut leaving: Option<(usize, f64)> = None;
        for row in 0..tableau.rows {
            let coefficient = tableau.at(row, entering);
            if coefficient <= PIVOT_EPSILON {
                continue;
            }
            let ratio = tableau.rhs(row) / coefficient;
            leaving = match leaving {
                None => Some((row, ratio)),
                Some((best_row, best_ratio)) => {
                    if ratio < best_ratio - PIVOT_EPSILON
                        || (ratio <= best_ratio + PIVOT_EPSILON
                            && tableau.basis[row] < tableau.basis[best_row])
                    {
                        Some((row, ratio))
                    } else {
                        Some((best_row, best_ratio))
                    }
                }
            };
        }

        let Some((leaving, ratio)) = leaving else {
            return Phase::Unbounded;
        };

        if ratio.abs() <= PIVOT_EPSILON {
            degenerate_streak += 1;
        } else {
            degenerate_streak = 0;
        }

        tableau.pivot(leaving, entering);
        *iterations += 1;
    }
}

/// Solves `min c'x` over the rows of `model` with `bounds` replacing the
/// model's own variable bounds.
pub(crate) fn solve_relaxation(
    model: &LinearModel,
    bounds: &[(f64, f64)],
    deadline: &Deadline,
) -> LpResult {
    let infeasible = LpResult {
        outcome: LpOutcome::Infeasible,
        iterations: 0,
    };

    if bounds
        .iter()
        .any(|&(lower, upper)| lower > upper + FEASIBILITY_EPSILON)
    {
        return infeasible;
    }

    // Free columns after fixing and shifting.
    let mut column_of = vec![None; bounds.len()];
    let mut structural = Vec::new();
    for (variable, &(lower, upper)) in bounds.iter().enumerate() {
        if upper - lower > FEASIBILITY_EPSILON {
            column_of[variable] = Some(structural.len());
            structural.push(variable);
        }
    }

    let mut rows = Vec::with_capacity(model.num_constraints());
    for constraint in model.constraints() {
        let mut coefficients = vec![0.0; structural.len()];
        let mut rhs = constraint.rhs();
        for &(variable, coefficient) in constraint.terms() {
            let (lower, _) = bounds[variable.get()];
            rhs -= coefficient * lower;
            if let Some(column) = column_of[variable.get()] {
                coefficients[column] += coefficient;
            }
        }

        if coefficients.iter().all(|&c| c == 0.0) {
            if constraint
                .sense()
                .is_satisfied(0.0, rhs, FEASIBILITY_EPSILON)
            {
                continue;
            }
            return infeasible;
        }

        rows.push(Row {
            coefficients,
            sense: constraint.sense(),
            rhs,
        });
    }

    let implied = implied_upper_bounds(&rows, structural.len());
    for (column, &variable) in structural.iter().enumerate() {
        let (lower, upper) = bounds[variable];
        let range = upper - lower;
        if range.is_finite() && implied[column] > range + FEASIBILITY_EPSILON {
            let mut coefficients = vec![0.0; structural.len()];
            coefficients[column] = 1.0;
            rows.push(Row {
                coefficients,
                sense: Sense::LessEqual,
                rhs: range,
            });
        }
    }

    for row in &mut rows {
        if row.rhs < 0.0 {
            row.rhs = -row.rhs;
            for coefficient in &mut row.coefficients {
                *coefficient = -*coefficient;
            }
            row.sense = match row.sense {
                Sense::LessEqual => Sense::GreaterEqual,
                Sense::GreaterEqual => Sense::LessEqual,
                Sense::Equal => Sense::Equal,
            };
        }
    }

    let num_structural = structural.len();
    let num_slacks = rows.iter().filter(|r| r.sense != Sense::Equal).count();
    let num_artificials = rows.iter().filter(|r| r.sense != Sense::LessEqual).count();
    let first_slack = num_structural;
    let first_artificial = num_structural + num_slacks;
    let num_columns = first_artificial + num_artificials;
    let width = num_columns + 1;

    let mut tableau = Tableau {
        cells: vec![0.0; (rows.len() + 1) * width],
        width,
        rows: rows.len(),
        basis: vec![0; rows.len()],
    };

    let mut next_slack = first_slack;
    let mut next_artificial = first_artificial;
    for (index, row) in rows.iter().enumerate() {
        let offset = index * width;
        tableau.cells[offset..offset + num_structural].copy_from_slice(&row.coefficients);
        tableau.cells[offset + width - 1] = row.rhs;

        match row.sense {
            Sense::LessEqual => {
                tableau.cells[offset + next_slack] = 1.0;
                tableau.basis[index] = next_slack;
                next_slack += 1;
            }
            Sense::GreaterEqual => {
                tableau.cells[offset + next_slack] = -1.0;
                next_slack += 1;
                tableau.cells[offset + next_artificial] = 1.0;
                tableau.basis[index] = next_artificial;
                next_artificial += 1;
            }
            Sense::Equal => {
                tableau.cells[offset + next_artificial] = 1.0;
                tableau.basis[index] = next_artificial;
                next_artificial += 1;
            }
        }
    }

    let mut iterations = 0;

    if num_artificials > 0 {
        let mut phase_one_costs = vec![0.0; num_columns];
        for cost in &mut phase_one_costs[first_artificial..] {
            *cost = 1.0;
        }
        tableau.price(&phase_one_costs);

        let enterable = vec![true; num_columns];
        match run_phase(&mut tableau, &enterable, deadline, &mut iterations) {
            Phase::Interrupted => {
                return LpResult {
                    outcome: LpOutcome::Interrupted,
                    iterations,
                };
            }
            // Bounded below by zero.
            Phase::Unbounded | Phase::Optimal => {}
        }

        let scale = rows.iter().map(|r| r.rhs).fold(1.0, f64::max);
        if tableau.objective_value() > FEASIBILITY_EPSILON * scale {
            return LpResult {
                outcome: LpOutcome::Infeasible,
                iterations,
            };
        }

        // Drive zero-valued artificials out of the basis. Rows where no
        // other column can enter are redundant and keep their artificial.
        for row in 0..tableau.rows {
            if tableau.basis[row] < first_artificial {
                continue;
            }
            if let Some(column) =
                (0..first_artificial).find(|&c| tableau.at(row, c).abs() > PIVOT_EPSILON)
            {
                tableau.pivot(row, column);
                iterations += 1;
            }
        }
    }

    let mut costs = vec![0.0; num_columns];
    for (column, &variable) in structural.iter().enumerate() {
        costs[column] = model.variable(variable.into()).objective();
    }
    tableau.price(&costs);

    let mut enterable = vec![true; num_columns];
    for flag in &mut enterable[first_artificial..] {
        *flag = false;
    }

    match run_phase(&mut tableau, &enterable, deadline, &mut iterations) {
        Phase::Interrupted => {
            return LpResult {
                outcome: LpOutcome::Interrupted,
                iterations,
            };
        }
        Phase::Unbounded => {
            return LpResult {
                outcome: LpOutcome::Unbounded,
                iterations,
            };
        }
        Phase::Optimal => {}
    }

    let mut shifted = vec![0.0; num_columns];
    for row in 0..tableau.rows {
        shifted[tableau.basis[row]] = tableau.rhs(row);
    }

    let values = bounds
        .iter()
        .enumerate()
        .map(|(variable, &(lower, _))| match column_of[variable] {
            Some(column) => lower + shifted[column].max(0.0),
            None => lower,
        })
        .collect::<Vec<_>>();

    LpResult {
        outcome: LpOutcome::Optimal {
            objective: model.objective_value(&values),
            values,
        },
        iterations,
    }
}

/// Upper bound each column gets for free from rows `sum a_k y_k (<=|=) b`
/// whose coefficients are all non-negative.
fn implied_upper_bounds(rows: &[Row], num_columns: usize) -> Vec<f64> {
    let mut implied = vec![f64::INFINITY; num_columns];

    for row in rows {
        if row.sense == Sense::GreaterEqual || row.rhs < 0.0 {
            continue;
        }
        if row.coefficients.iter().any(|&c| c < 0.0) {
            continue;
        }
        for (column, &coefficient) in row.coefficients.iter().enumerate() {
            if coefficient > 0.0 {
                implied[column] = implied[column].min(row.rhs / coefficient);
            }
        }
    }

    implied
}
