use std::path::PathBuf;

use jiff::SignedDuration;

use super::{embedded::EmbeddedBackend, glpk::GlpkBackend, solver_backend::SolverBackend};

#[derive(Clone, Debug)]
pub struct SolveParams {
    pub time_budget: SignedDuration,
    /// Stop once the incumbent is proven within this relative distance of
    /// the optimum. `None` asks for a proven optimum.
    pub relative_gap: Option<f64>,
    pub tie_break: TieBreak,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            time_budget: SignedDuration::from_mins(5),
            relative_gap: None,
            tie_break: TieBreak::Lexicographic,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TieBreak {
    /// Among optimal assignments, give each order (by ascending id) the
    /// lowest-id courier possible.
    Lexicographic,
    /// Keep whatever optimum the backend returns.
    None,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SolverBackendKind {
    #[default]
    Embedded,
    Glpk {
        binary: PathBuf,
    },
}

impl SolverBackendKind {
    pub fn glpk() -> Self {
        SolverBackendKind::Glpk {
            binary: PathBuf::from("glpsol"),
        }
    }

    pub fn create_backend(&self) -> Box<dyn SolverBackend> {
        match self {
            SolverBackendKind::Embedded => Box::new(EmbeddedBackend),
            SolverBackendKind::Glpk { binary } => Box::new(GlpkBackend::new(binary.clone())),
        }
    }
}
