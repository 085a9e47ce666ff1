//! Test suite
//!
//! An ordered collection of definitions. Running a suite produces a fresh
//! result set for the given origin id; the suite itself owns no results.

use serde_json::Value;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

use super::definition::TestDefinition;
use super::failure::Failure;
use super::method::{execute_method, guarded};
use crate::error::{DisttestError, Result};
use crate::models::{MethodOutcome, ResultSet};

/// Named, ordered collection of test definitions
#[derive(Clone, Debug)]
pub struct TestSuite {
    name: String,
    definitions: Vec<TestDefinition>,
    metadata: BTreeMap<String, Value>,
}

impl TestSuite {
    pub const DEFAULT_NAME: &'static str = "default-suite";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definitions: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Sub-suite over an already validated slice of definitions
    pub(crate) fn from_partition(name: impl Into<String>, definitions: Vec<TestDefinition>) -> Self {
        Self {
            name: name.into(),
            definitions,
            metadata: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn definitions(&self) -> &[TestDefinition] {
        &self.definitions
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Register a definition, rejecting any that break the test-case contract
    pub fn add_definition(&mut self, definition: TestDefinition) -> Result<()> {
        definition.validate()?;

        if self
            .definitions
            .iter()
            .any(|d| d.name() == definition.name())
        {
            return Err(DisttestError::DuplicateDefinition(
                definition.name().to_string(),
            ));
        }

        debug!(
            "Registered {} ({} methods)",
            definition.name(),
            definition.method_count()
        );
        self.definitions.push(definition);
        Ok(())
    }

    /// Register several definitions, stopping at the first rejected one
    pub fn add_definitions(
        &mut self,
        definitions: impl IntoIterator<Item = TestDefinition>,
    ) -> Result<()> {
        for definition in definitions {
            self.add_definition(definition)?;
        }
        Ok(())
    }

    pub fn total_definition_count(&self) -> usize {
        self.definitions.len()
    }

    pub fn total_method_count(&self) -> usize {
        self.definitions.iter().map(|d| d.method_count()).sum()
    }

    /// Run every definition in insertion order
    pub fn run(&self, origin_id: &str) -> ResultSet {
        let mut merged = ResultSet::new(&self.name, origin_id);
        for (key, value) in &self.metadata {
            merged.insert_metadata(key.clone(), value.clone());
        }

        for definition in &self.definitions {
            let partial = run_definition(definition, origin_id);
            merged.merge(&partial);
        }

        merged.mark_complete();
        merged
    }
}

impl Default for TestSuite {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME)
    }
}

/// Class setup, one instance, every method, class teardown
fn run_definition(definition: &TestDefinition, origin_id: &str) -> ResultSet {
    let mut result = ResultSet::new(definition.name(), origin_id);
    debug!("[{}] running {}", origin_id, definition.name());

    let prepared = guarded(|| definition.run_class_setup()).and_then(|()| {
        panic::catch_unwind(AssertUnwindSafe(|| definition.instantiate()))
            .map_err(Failure::from_panic)
    });

    match prepared {
        Ok(mut instance) => {
            for method in definition.method_names() {
                let outcome =
                    execute_method(instance.as_mut(), definition.qualified_name(method), method);
                result.add_outcome(outcome);
            }
        }
        Err(failure) => {
            warn!(
                "[{}] {} could not be prepared: {}",
                origin_id,
                definition.name(),
                failure
            );
            let detail = failure
                .with_note("(class setup or instantiation failed, test method not run)")
                .detail();
            for method in definition.method_names() {
                result.add_outcome(
                    MethodOutcome::failed(
                        definition.qualified_name(method),
                        detail.clone(),
                        std::time::Duration::ZERO,
                        chrono::Utc::now(),
                    )
                    .with_data("failure_kind", "unexpected"),
                );
            }
        }
    }

    if let Err(failure) = guarded(|| definition.run_class_teardown()) {
        warn!(
            "[{}] class teardown of {} failed: {}",
            origin_id,
            definition.name(),
            failure
        );
        result.insert_metadata(
            format!("{}.class_teardown_error", definition.name()),
            failure.detail(),
        );
    }

    result.mark_complete();
    result
}
