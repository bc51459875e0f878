mod branch_and_bound;
pub mod embedded;
pub mod glpk;
pub mod lp_format;
pub mod raw_solution;
mod simplex;
pub mod solve;
pub mod solve_params;
pub mod solver_backend;
mod tie_break;
