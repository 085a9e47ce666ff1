//! Output formatting module
//!
//! Provides various output formats for test results.

mod formatter;

pub use formatter::{progress_bar, OutputFormat, ResultFormatter};
