use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Whether a courier may receive orders in a given solve.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Availability {
    #[default]
    Always,
    Never,
    /// Available when the dispatch time falls inside `[start, end]`.
    Window { start: Timestamp, end: Timestamp },
}

impl Availability {
    pub fn window(start: Timestamp, end: Timestamp) -> Self {
        Availability::Window { start, end }
    }

    /// A window without a reference dispatch time counts as available.
    pub fn is_available_at(&self, dispatch_time: Option<Timestamp>) -> bool {
        match self {
            Availability::Always => true,
            Availability::Never => false,
            Availability::Window { start, end } => match dispatch_time {
                Some(at) => *start <= at && at <= *end,
                None => true,
            },
        }
    }

    pub fn is_well_formed(&self) -> bool {
        match self {
            Availability::Window { start, end } => start <= end,
            _ => true,
        }
    }
}
