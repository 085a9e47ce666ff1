//! Test execution engine
//!
//! Provides local and distributed (partitioned, concurrent) execution of a
//! registered suite.

mod parallel;
mod partition;
mod runner;

pub use partition::{effective_workers, partition};
pub use runner::{local_origin_id, RunState, TestRunner};
