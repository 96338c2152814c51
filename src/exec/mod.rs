//! Recipe execution: staleness checks, shell dispatch, and the bounded
//! parallel job scheduler.

pub mod executor;
pub mod parallel;

pub use executor::{ExecOptions, Executor};
pub use parallel::ParallelExecutor;
