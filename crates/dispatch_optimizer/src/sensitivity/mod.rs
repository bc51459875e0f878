pub mod cancellation;
pub mod scenarios;
pub mod sweep;
pub mod sweep_parameter;
pub mod sweep_params;
