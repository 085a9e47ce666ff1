//! Assertion helpers for test methods
//!
//! Each helper returns a [`Check`] so it composes with `?` inside a test
//! method. A failed assertion is an expectation failure.

use std::error::Error;
use std::fmt::Debug;

use super::failure::{Check, Failure};

/// Boxed error returned by closures passed to [`assert_raises`]
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Assert that two values are equal
pub fn assert_equal<A, B>(actual: A, expected: B) -> Check
where
    A: PartialEq<B> + Debug,
    B: Debug,
{
    if actual == expected {
        Ok(())
    } else {
        Err(Failure::expectation(format!(
            "Assertion failed: {actual:?} != {expected:?}"
        )))
    }
}

/// Assert that a condition holds
pub fn assert_true(condition: bool) -> Check {
    if condition {
        Ok(())
    } else {
        Err(Failure::expectation("Assertion failed: condition is false"))
    }
}

/// Assert that a condition does not hold
pub fn assert_false(condition: bool) -> Check {
    if condition {
        Err(Failure::expectation("Assertion failed: condition is true"))
    } else {
        Ok(())
    }
}

/// Assert that `f` fails with an error of type `E`
pub fn assert_raises<E, T, F>(f: F) -> Check
where
    E: Error + 'static,
    F: FnOnce() -> std::result::Result<T, BoxError>,
{
    let expected = short_type_name::<E>();
    match f() {
        Ok(_) => Err(Failure::expectation(format!(
            "Assertion failed: expected error {expected} was not raised"
        ))),
        Err(err) if err.is::<E>() => Ok(()),
        Err(err) => Err(Failure::expectation(format!(
            "Assertion failed: raised a different error than {expected}: {err}"
        ))),
    }
}

/// Fail unconditionally with an expectation failure
pub fn fail(message: impl Into<String>) -> Check {
    Err(Failure::expectation(message))
}

/// Extension for replacing the default assertion message
pub trait CheckExt {
    /// Replace the message of an expectation failure; other failures pass through
    fn with_message(self, message: impl Into<String>) -> Check;
}

impl CheckExt for Check {
    fn with_message(self, message: impl Into<String>) -> Check {
        match self {
            Err(Failure::Expectation { .. }) => Err(Failure::expectation(message)),
            other => other,
        }
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
