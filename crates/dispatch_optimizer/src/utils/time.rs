use jiff::{SignedDuration, Timestamp};

#[macro_export]
macro_rules! timer_debug {
    ($msg:literal,$block:expr) => {{
        let now = jiff::Timestamp::now();
        let result = $block;
        let elapsed = jiff::Timestamp::now().duration_since(now);

        tracing::debug!("{}: Took {:?}", $msg, elapsed);

        result
    }};
}

/// Wall-clock budget shared by every stage of one solve.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Timestamp,
    budget: SignedDuration,
}

impl Deadline {
    pub fn start(budget: SignedDuration) -> Self {
        Deadline {
            start: Timestamp::now(),
            budget,
        }
    }

    pub fn budget(&self) -> SignedDuration {
        self.budget
    }

    pub fn elapsed(&self) -> SignedDuration {
        Timestamp::now().duration_since(self.start)
    }

    /// Never negative.
    pub fn remaining(&self) -> SignedDuration {
        (self.budget - self.elapsed()).max(SignedDuration::ZERO)
    }

    pub fn is_expired(&self) -> bool {
        self.budget <= SignedDuration::ZERO || self.elapsed() >= self.budget
    }
}
