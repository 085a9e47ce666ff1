//! disttest - test execution engine
//!
//! Test-case definitions are registered with a [`TestRunner`], which runs the
//! suite either locally as one execution context or split by definition
//! across concurrent workers. Results from every context are merged into a
//! single [`ResultSet`]; lifecycle events are delivered to [`Plugin`]s.
//!
//! ```no_run
//! use disttest::{ConsoleReporter, TestDefinition, TestRunner};
//! use disttest::samples::MathTests;
//! use std::time::Duration;
//!
//! # async fn demo() -> disttest::Result<()> {
//! let mut runner = TestRunner::new();
//! runner.add_definition(TestDefinition::of::<MathTests>())?;
//! runner.add_plugin(ConsoleReporter::new(false));
//!
//! let result = runner.run_distributed(3, Duration::from_secs(60)).await?;
//! std::process::exit(result.summary().exit_code());
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod framework;
pub mod models;
pub mod output;
pub mod plugins;
pub mod samples;
pub mod utils;

pub use config::{JsonLogConfig, RunMode, RunnerConfig};
pub use error::{DisttestError, Result};
pub use executor::{RunState, TestRunner};
pub use framework::{
    assert_equal, assert_false, assert_raises, assert_true, fail, Check, CheckExt, ClassHooks,
    DefinitionBuilder, Failure, TestCase, TestDefinition, TestSuite,
};
pub use models::{MethodOutcome, ResultSet, Summary};
pub use plugins::{ConsoleReporter, JsonLogger, Plugin, PluginSet};
