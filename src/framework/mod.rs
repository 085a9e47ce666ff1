//! Test-case framework
//!
//! Definitions, assertion helpers, the per-method execution wrapper and the
//! suite that runs definitions in order.

mod assertions;
mod definition;
mod failure;
mod method;
mod suite;

pub use assertions::{
    assert_equal, assert_false, assert_raises, assert_true, fail, BoxError, CheckExt,
};
pub use definition::{ClassHooks, DefinitionBuilder, TestCase, TestDefinition, TEST_METHOD_PREFIX};
pub use failure::{Check, Failure};
pub use suite::TestSuite;
