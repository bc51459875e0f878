//! CPLEX LP writer.
//!
//! Every variable is listed in the objective, in index order, so external
//! solvers number columns exactly like [`LinearModel`] does.

use std::io::{self, Write};

use crate::model::linear_model::{LinearModel, Sense, VariableIdx};

const TERMS_PER_LINE: usize = 8;

pub fn write_lp<W: Write>(model: &LinearModel, out: &mut W) -> io::Result<()> {
    writeln!(out, "\\* dispatch allocation model *\\")?;
    writeln!(out, "Minimize")?;
    write!(out, " obj:")?;
    let objective = model
        .variables()
        .iter()
        .enumerate()
        .map(|(index, variable)| (VariableIdx::new(index), variable.objective()))
        .collect::<Vec<_>>();
    write_terms(model, &objective, out)?;
    writeln!(out)?;

    writeln!(out, "Subject To")?;
    for constraint in model.constraints() {
        write!(out, " {}:", constraint.name())?;
        if constraint.terms().is_empty() {
            write!(out, " 0 {}", model.variable(VariableIdx::new(0)).name())?;
        } else {
            write_terms(model, constraint.terms(), out)?;
        }
        let sense = match constraint.sense() {
            Sense::LessEqual => "<=",
            Sense::GreaterEqual => ">=",
            Sense::Equal => "=",
        };
        writeln!(out, " {sense} {}", constraint.rhs())?;
    }

    writeln!(out, "Bounds")?;
    for variable in model.variables() {
        if variable.is_fixed() {
            writeln!(out, " {} = {}", variable.name(), variable.lower())?;
        } else if variable.upper().is_finite() {
            writeln!(
                out,
                " {} <= {} <= {}",
                variable.lower(),
                variable.name(),
                variable.upper()
            )?;
        } else {
            writeln!(out, " {} >= {}", variable.name(), variable.lower())?;
        }
    }

    let integers = model
        .variables()
        .iter()
        .filter(|variable| variable.is_integer())
        .collect::<Vec<_>>();
    if !integers.is_empty() {
        // Declared general so the explicit bounds above stay in force.
        writeln!(out, "Generals")?;
        for chunk in integers.chunks(TERMS_PER_LINE) {
            let names = chunk.iter().map(|v| v.name()).collect::<Vec<_>>();
            writeln!(out, " {}", names.join(" "))?;
        }
    }

    writeln!(out, "End")
}

fn write_terms<W: Write>(
    model: &LinearModel,
    terms: &[(VariableIdx, f64)],
    out: &mut W,
) -> io::Result<()> {
    for (position, &(variable, coefficient)) in terms.iter().enumerate() {
        if position > 0 && position % TERMS_PER_LINE == 0 {
            write!(out, "\n   ")?;
        }
        let sign = if coefficient < 0.0 { '-' } else { '+' };
        write!(
            out,
            " {sign} {} {}",
            coefficient.abs(),
            model.variable(variable).name()
        )?;
    }
    Ok(())
}
