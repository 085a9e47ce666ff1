//! Built-in sample definitions
//!
//! Run by the `disttest` binary. `StringTests::test_failure_example` fails on
//! purpose so a demo run shows a failure report.

use rand::Rng;
use std::thread;
use std::time::Duration;
use tracing::debug;

use crate::framework::{assert_equal, assert_true, Check, ClassHooks, TestCase, TestDefinition};

/// Upper bound for the simulated work per test method, in milliseconds
const MAX_JITTER_MS: u64 = 40;

fn simulate_work() {
    let ms = rand::rng().random_range(5..=MAX_JITTER_MS);
    thread::sleep(Duration::from_millis(ms));
}

/// Arithmetic checks with class-level hooks
#[derive(Debug, Default)]
pub struct MathTests {
    value: Option<i64>,
}

impl MathTests {
    fn value(&self) -> i64 {
        self.value.unwrap_or_default()
    }

    fn test_addition(&mut self) -> Check {
        simulate_work();
        assert_equal(self.value() + 5, 15)
    }

    fn test_subtraction(&mut self) -> Check {
        simulate_work();
        assert_equal(self.value() - 5, 5)
    }

    fn test_multiplication(&mut self) -> Check {
        simulate_work();
        assert_equal(self.value() * 2, 20)
    }

    fn test_division(&mut self) -> Check {
        simulate_work();
        assert_equal(self.value() / 2, 5)
    }
}

impl TestCase for MathTests {
    const NAME: &'static str = "MathTests";

    fn test_methods() -> Vec<(&'static str, fn(&mut Self) -> Check)> {
        vec![
            ("test_addition", Self::test_addition),
            ("test_subtraction", Self::test_subtraction),
            ("test_multiplication", Self::test_multiplication),
            ("test_division", Self::test_division),
        ]
    }

    fn class_hooks() -> ClassHooks {
        ClassHooks::BOTH
    }

    fn setup_class() -> Check {
        debug!("MathTests class setup");
        Ok(())
    }

    fn teardown_class() -> Check {
        debug!("MathTests class teardown");
        Ok(())
    }

    fn setup(&mut self) -> Check {
        self.value = Some(10);
        Ok(())
    }

    fn teardown(&mut self) -> Check {
        self.value = None;
        Ok(())
    }
}

/// String manipulation checks
#[derive(Debug, Default)]
pub struct StringTests {
    text: String,
}

impl StringTests {
    fn test_length(&mut self) -> Check {
        simulate_work();
        assert_equal(self.text.len(), 13)
    }

    fn test_uppercase(&mut self) -> Check {
        simulate_work();
        assert_equal(self.text.to_uppercase(), "HELLO, WORLD!")
    }

    fn test_lowercase(&mut self) -> Check {
        simulate_work();
        assert_equal(self.text.to_lowercase(), "hello, world!")
    }

    fn test_split(&mut self) -> Check {
        simulate_work();
        let parts: Vec<&str> = self.text.split(", ").collect();
        assert_equal(parts, vec!["Hello", "World!"])
    }

    fn test_replace(&mut self) -> Check {
        simulate_work();
        assert_equal(self.text.replace("Hello", "Hi"), "Hi, World!")
    }

    fn test_contains(&mut self) -> Check {
        simulate_work();
        assert_true(self.text.contains("World"))
    }

    fn test_startswith(&mut self) -> Check {
        simulate_work();
        assert_true(self.text.starts_with("Hello"))
    }

    fn test_endswith(&mut self) -> Check {
        simulate_work();
        assert_true(self.text.ends_with('!'))
    }

    fn test_failure_example(&mut self) -> Check {
        simulate_work();
        assert_equal(self.text.as_str(), "Wrong value")
    }
}

impl TestCase for StringTests {
    const NAME: &'static str = "StringTests";

    fn test_methods() -> Vec<(&'static str, fn(&mut Self) -> Check)> {
        vec![
            ("test_length", Self::test_length),
            ("test_uppercase", Self::test_uppercase),
            ("test_lowercase", Self::test_lowercase),
            ("test_split", Self::test_split),
            ("test_replace", Self::test_replace),
            ("test_contains", Self::test_contains),
            ("test_startswith", Self::test_startswith),
            ("test_endswith", Self::test_endswith),
            ("test_failure_example", Self::test_failure_example),
        ]
    }

    fn setup(&mut self) -> Check {
        self.text = "Hello, World!".to_string();
        Ok(())
    }
}

/// Every sample definition, in registration order
pub fn all() -> Vec<TestDefinition> {
    vec![TestDefinition::of::<MathTests>(), TestDefinition::of::<StringTests>()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::TestSuite;

    #[test]
    fn test_samples_are_valid() {
        let mut suite = TestSuite::new("samples");
        suite.add_definitions(all()).unwrap();
        assert_eq!(suite.total_definition_count(), 2);
        assert_eq!(suite.total_method_count(), 13);
    }

    #[test]
    fn test_sample_run_has_one_failure() {
        let mut suite = TestSuite::new("samples");
        suite.add_definitions(all()).unwrap();

        let result = suite.run("local");
        let summary = result.summary();
        assert_eq!(summary.total, 13);
        assert_eq!(summary.failed, 1);
        assert_eq!(
            result.failures().map(|o| o.method_name()).collect::<Vec<_>>(),
            vec!["StringTests.test_failure_example"]
        );
        assert_eq!(summary.exit_code(), 1);
    }
}
