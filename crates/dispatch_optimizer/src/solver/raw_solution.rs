use jiff::SignedDuration;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    SuboptimalWithinGap,
    Infeasible,
    Unbounded,
    TimeoutWithIncumbent,
    TimeoutNoIncumbent,
    Unavailable,
}

impl SolveStatus {
    /// Whether the status comes with a feasible point.
    pub fn has_solution(&self) -> bool {
        matches!(
            self,
            SolveStatus::Optimal
                | SolveStatus::SuboptimalWithinGap
                | SolveStatus::TimeoutWithIncumbent
        )
    }

    pub fn is_proven_optimal(&self) -> bool {
        *self == SolveStatus::Optimal
    }
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakOutcome {
    #[default]
    Skipped,
    Complete,
    /// Budget ran out while polishing, the returned optimum may not be the
    /// lexicographically smallest one.
    Incomplete,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct SolveStatistics {
    pub backend: &'static str,
    pub elapsed: SignedDuration,
    pub nodes: usize,
    pub lp_iterations: usize,
    pub tie_break: TieBreakOutcome,
    pub reassigned_orders: usize,
}

impl SolveStatistics {
    pub fn absorb(&mut self, other: &SolveStatistics) {
        self.nodes += other.nodes;
        self.lp_iterations += other.lp_iterations;
    }
}

/// What a backend hands back: one value per model variable (empty when
/// there is no point to report).
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RawSolution {
    pub status: SolveStatus,
    pub objective_value: Option<f64>,
    pub values: Vec<f64>,
    pub statistics: SolveStatistics,
    pub message: Option<String>,
}

impl RawSolution {
    pub fn without_point(status: SolveStatus, statistics: SolveStatistics) -> Self {
        RawSolution {
            status,
            objective_value: None,
            values: Vec::new(),
            statistics,
            message: None,
        }
    }

    pub fn with_point(
        status: SolveStatus,
        objective_value: f64,
        values: Vec<f64>,
        statistics: SolveStatistics,
    ) -> Self {
        RawSolution {
            status,
            objective_value: Some(objective_value),
            values,
            statistics,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
