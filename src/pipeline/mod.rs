//! Computation pipeline.
//!
//! [`dispatch`] resolves a component's assignment for one data source and
//! runs the strategy, isolating its failures. [`job`] fans computations out
//! over the tree on worker threads and reports the results back.

mod dispatch;
mod job;

pub use dispatch::{compute_information, resolve_strategy, ComputeContext};
pub use job::{
    run, ComputationFailure, ComputationJob, ComputationPlan, ComputationReport,
    ComputationSnapshot, ComputedInformation,
};

/// Exit codes for CI integration
pub mod exit_codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// Some computations were rejected or stored error content
    pub const COMPUTATION_ERRORS: i32 = 1;
    /// A runtime failure occurred
    pub const RUNTIME_FAILURE: i32 = 2;
    /// An error occurred
    pub const ERROR: i32 = 3;
}
