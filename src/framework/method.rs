//! Per-method execution wrapper
//!
//! Runs instance setup, the method, then instance teardown. Teardown always
//! runs; a setup failure short-circuits the method. Panics are caught at this
//! boundary and turned into failures.

use chrono::Utc;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

use super::definition::Instance;
use super::failure::{Check, Failure};
use crate::models::MethodOutcome;
use crate::utils::Timer;

/// Call a hook or method, converting a panic into a [`Failure`]
pub(crate) fn guarded(f: impl FnOnce() -> Check) -> Check {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(check) => check,
        Err(payload) => Err(Failure::from_panic(payload)),
    }
}

/// Execute one test method on `instance`, recording it under `outcome_name`
pub(crate) fn execute_method(
    instance: &mut dyn Instance,
    outcome_name: String,
    method: &str,
) -> MethodOutcome {
    let start_time = Utc::now();
    let timer = Timer::start(outcome_name.as_str());

    let primary = match guarded(|| instance.setup()) {
        Ok(()) => guarded(|| instance.invoke(method)),
        Err(failure) => Err(failure.with_note("(setup failed, test method not run)")),
    };
    let teardown = guarded(|| instance.teardown());

    let duration = timer.stop();

    let verdict = match (primary, teardown) {
        (Ok(()), Ok(())) => Ok(()),
        (Ok(()), Err(failure)) => Err(failure.with_note("(raised in teardown)")),
        (Err(failure), Ok(())) => Err(failure),
        (Err(failure), Err(teardown_failure)) => {
            Err(failure.with_note(format!("teardown also failed: {teardown_failure}")))
        }
    };

    match verdict {
        Ok(()) => {
            debug!("{} passed", outcome_name);
            MethodOutcome::passed(outcome_name, duration, start_time)
        }
        Err(failure) => {
            debug!("{} failed: {}", outcome_name, failure);
            let kind = if failure.is_expectation() {
                "expectation"
            } else {
                "unexpected"
            };
            MethodOutcome::failed(outcome_name, failure.detail(), duration, start_time)
                .with_data("failure_kind", kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{assert_equal, DefinitionBuilder};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Probe {
        value: i32,
    }

    fn counted_definition(
        setup_fails: bool,
        teardown_fails: bool,
        teardowns: Arc<AtomicUsize>,
        bodies: Arc<AtomicUsize>,
    ) -> crate::framework::TestDefinition {
        DefinitionBuilder::<Probe>::with_default("Probe")
            .setup(move |p| {
                if setup_fails {
                    return Err(Failure::unexpected("SetupError", "no fixture"));
                }
                p.value = 10;
                Ok(())
            })
            .teardown(move |_| {
                teardowns.fetch_add(1, Ordering::SeqCst);
                if teardown_fails {
                    Err(Failure::unexpected("TeardownError", "cleanup failed"))
                } else {
                    Ok(())
                }
            })
            .method("test_pass", {
                let bodies = bodies.clone();
                move |p| {
                    bodies.fetch_add(1, Ordering::SeqCst);
                    assert_equal(p.value, 10)
                }
            })
            .method("test_expectation", {
                let bodies = bodies.clone();
                move |p| {
                    bodies.fetch_add(1, Ordering::SeqCst);
                    assert_equal(p.value, 11)
                }
            })
            .method("test_panics", move |_| {
                bodies.fetch_add(1, Ordering::SeqCst);
                panic!("unexpected state")
            })
            .build()
    }

    #[test]
    fn test_outcomes_by_kind() {
        let teardowns = Arc::new(AtomicUsize::new(0));
        let bodies = Arc::new(AtomicUsize::new(0));
        let def = counted_definition(false, false, teardowns.clone(), bodies.clone());
        let mut instance = def.instantiate();

        let ok = execute_method(instance.as_mut(), "Probe.test_pass".into(), "test_pass");
        assert!(ok.success());

        let exp = execute_method(
            instance.as_mut(),
            "Probe.test_expectation".into(),
            "test_expectation",
        );
        assert!(!exp.success());
        assert!(exp.error_detail().unwrap().starts_with("AssertionError"));
        assert_eq!(exp.additional_data()["failure_kind"], "expectation");

        let boom = execute_method(instance.as_mut(), "Probe.test_panics".into(), "test_panics");
        assert!(!boom.success());
        assert!(boom.error_detail().unwrap().starts_with("panic: unexpected state"));
        assert_eq!(boom.additional_data()["failure_kind"], "unexpected");

        assert_eq!(teardowns.load(Ordering::SeqCst), 3);
        assert_eq!(bodies.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_setup_failure_skips_method_but_runs_teardown() {
        let teardowns = Arc::new(AtomicUsize::new(0));
        let bodies = Arc::new(AtomicUsize::new(0));
        let def = counted_definition(true, false, teardowns.clone(), bodies.clone());
        let mut instance = def.instantiate();

        let outcome = execute_method(instance.as_mut(), "Probe.test_pass".into(), "test_pass");
        assert!(!outcome.success());
        assert!(outcome.error_detail().unwrap().starts_with("SetupError: no fixture"));
        assert_eq!(bodies.load(Ordering::SeqCst), 0);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_teardown_failure_fails_passing_method() {
        let teardowns = Arc::new(AtomicUsize::new(0));
        let bodies = Arc::new(AtomicUsize::new(0));
        let def = counted_definition(false, true, teardowns.clone(), bodies);
        let mut instance = def.instantiate();

        let outcome = execute_method(instance.as_mut(), "Probe.test_pass".into(), "test_pass");
        assert!(!outcome.success());
        assert!(outcome.error_detail().unwrap().starts_with("TeardownError"));

        let outcome = execute_method(
            instance.as_mut(),
            "Probe.test_expectation".into(),
            "test_expectation",
        );
        let detail = outcome.error_detail().unwrap();
        assert!(detail.starts_with("AssertionError"));
        assert!(detail.contains("teardown also failed"));
        assert_eq!(teardowns.load(Ordering::SeqCst), 2);
    }
}
