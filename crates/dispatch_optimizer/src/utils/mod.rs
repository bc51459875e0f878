pub mod max_flow;
pub mod newtype_index;
pub mod stats;
pub mod time;
