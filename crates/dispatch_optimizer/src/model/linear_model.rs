use serde::Serialize;

use crate::define_index_newtype;

define_index_newtype!(VariableIdx, Variable);
define_index_newtype!(ConstraintIdx, Constraint);

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Binary,
    Continuous,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    kind: VariableKind,
    lower: f64,
    upper: f64,
    objective: f64,
}

impl Variable {
    pub fn binary(name: impl Into<String>, objective: f64) -> Self {
        Variable {
            name: name.into(),
            kind: VariableKind::Binary,
            lower: 0.0,
            upper: 1.0,
            objective,
        }
    }

    /// Continuous variable in `[0, +inf)`.
    pub fn non_negative(name: impl Into<String>, objective: f64) -> Self {
        Variable {
            name: name.into(),
            kind: VariableKind::Continuous,
            lower: 0.0,
            upper: f64::INFINITY,
            objective,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn is_integer(&self) -> bool {
        self.kind == VariableKind::Binary
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn is_fixed(&self) -> bool {
        self.lower == self.upper
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    LessEqual,
    GreaterEqual,
    Equal,
}

impl Sense {
    pub fn is_satisfied(&self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            Sense::LessEqual => lhs <= rhs + tolerance,
            Sense::GreaterEqual => lhs >= rhs - tolerance,
            Sense::Equal => (lhs - rhs).abs() <= tolerance,
        }
    }
}

/// Family a constraint belongs to, used to explain infeasibility.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintClass {
    Assignment,
    Capacity,
    DeliveryTimeLink,
    ObjectiveCut,
}

impl ConstraintClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintClass::Assignment => "assignment",
            ConstraintClass::Capacity => "capacity",
            ConstraintClass::DeliveryTimeLink => "delivery_time_link",
            ConstraintClass::ObjectiveCut => "objective_cut",
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Constraint {
    name: String,
    class: ConstraintClass,
    terms: Vec<(VariableIdx, f64)>,
    sense: Sense,
    rhs: f64,
}

impl Constraint {
    pub fn new(
        name: impl Into<String>,
        class: ConstraintClass,
        terms: Vec<(VariableIdx, f64)>,
        sense: Sense,
        rhs: f64,
    ) -> Self {
        Constraint {
            name: name.into(),
            class,
            terms,
            sense,
            rhs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> ConstraintClass {
        self.class
    }

    pub fn terms(&self) -> &[(VariableIdx, f64)] {
        &self.terms
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(variable, coefficient)| coefficient * values[variable.get()])
            .sum()
    }
}

/// Solver-neutral minimization MILP: variables with bounds and objective
/// coefficients, plus linear rows.
///
/// This is the only thing a [`SolverBackend`] ever sees.
///
/// [`SolverBackend`]: crate::solver::solver_backend::SolverBackend
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct LinearModel {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
}

impl LinearModel {
    pub fn add_variable(&mut self, variable: Variable) -> VariableIdx {
        self.variables.push(variable);
        VariableIdx::new(self.variables.len() - 1)
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> ConstraintIdx {
        self.constraints.push(constraint);
        ConstraintIdx::new(self.constraints.len() - 1)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, variable: VariableIdx) -> &Variable {
        &self.variables[variable]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint(&self, constraint: ConstraintIdx) -> &Constraint {
        &self.constraints[constraint]
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn set_rhs(&mut self, constraint: ConstraintIdx, rhs: f64) {
        self.constraints[constraint].rhs = rhs;
    }

    pub fn set_bounds(&mut self, variable: VariableIdx, lower: f64, upper: f64) {
        let variable = &mut self.variables[variable];
        variable.lower = lower;
        variable.upper = upper;
    }

    pub fn fix(&mut self, variable: VariableIdx, value: f64) {
        self.set_bounds(variable, value, value);
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.variables
            .iter()
            .zip(values)
            .map(|(variable, value)| variable.objective * value)
            .sum()
    }

    /// Adds `objective <= bound`.
    pub fn add_objective_cut(&mut self, bound: f64) -> ConstraintIdx {
        let terms = self
            .variables
            .iter()
            .enumerate()
            .filter(|(_, variable)| variable.objective != 0.0)
            .map(|(idx, variable)| (VariableIdx::new(idx), variable.objective))
            .collect();

        self.add_constraint(Constraint::new(
            "objective_cut",
            ConstraintClass::ObjectiveCut,
            terms,
            Sense::LessEqual,
            bound,
        ))
    }

    /// Describes the first bound, integrality or row violated by `values`.
    pub fn first_violation(&self, values: &[f64], tolerance: f64) -> Option<String> {
        if values.len() != self.variables.len() {
            return Some(format!(
                "expected {} values, got {}",
                self.variables.len(),
                values.len()
            ));
        }

        for (variable, &value) in self.variables.iter().zip(values) {
            if value < variable.lower - tolerance || value > variable.upper + tolerance {
                return Some(format!(
                    "variable `{}` = {value} outside [{}, {}]",
                    variable.name, variable.lower, variable.upper
                ));
            }
            if variable.is_integer() && (value - value.round()).abs() > tolerance {
                return Some(format!("variable `{}` = {value} is not integral", variable.name));
            }
        }

        self.constraints
            .iter()
            .find(|constraint| {
                !constraint
                    .sense
                    .is_satisfied(constraint.activity(values), constraint.rhs, tolerance)
            })
            .map(|constraint| format!("constraint `{}` is violated", constraint.name))
    }
}
