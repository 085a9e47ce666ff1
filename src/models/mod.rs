//! Data models for test results
//!
//! Method outcomes, mergeable result sets and their summaries.

mod outcome;
mod result_set;

pub use outcome::MethodOutcome;
pub use result_set::{ResultSet, Summary};
