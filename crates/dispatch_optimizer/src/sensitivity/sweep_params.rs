use jiff::SignedDuration;

#[derive(Clone, Debug)]
pub struct SweepParams {
    pub threads: Threads,
    /// Budget of each point's solve, replacing the solver's own.
    pub time_budget: SignedDuration,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            threads: Threads::Auto,
            time_budget: SignedDuration::from_mins(5),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Threads {
    Single,
    Auto,
    Multi(usize),
}

impl Threads {
    pub fn number_of_threads(&self) -> usize {
        match self {
            Threads::Single => 1,
            Threads::Multi(num) => (*num).max(1),
            Threads::Auto => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_of_threads() {
        assert_eq!(Threads::Single.number_of_threads(), 1);
        assert_eq!(Threads::Multi(3).number_of_threads(), 3);
        assert_eq!(Threads::Multi(0).number_of_threads(), 1);
        assert!(Threads::Auto.number_of_threads() >= 1);
    }
}
