//! Test runner
//!
//! Single point of configuration: registered definitions and plugins. Runs
//! the suite locally as one execution context, or sharded across concurrent
//! workers (see `parallel.rs`).

use std::fmt;
use tracing::{error, info};

use crate::config::{RunMode, RunnerConfig};
use crate::error::Result;
use crate::framework::{TestDefinition, TestSuite};
use crate::models::ResultSet;
use crate::plugins::{Plugin, PluginSet};

/// Lifecycle state of a single run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Idle,
    NotifyingStart,
    Executing,
    Merging,
    NotifyingComplete,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::NotifyingStart => "notifying-start",
            RunState::Executing => "executing",
            RunState::Merging => "merging",
            RunState::NotifyingComplete => "notifying-complete",
        };
        f.write_str(s)
    }
}

/// Origin id of the current process: `{hostname}-{pid}`
pub fn local_origin_id() -> String {
    let host = std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| "localhost".to_string());
    format!("{}-{}", host, std::process::id())
}

/// Orchestrates runs of the registered suite and notifies plugins
pub struct TestRunner {
    pub(super) suite: TestSuite,
    pub(super) plugins: PluginSet,
    pub(super) origin_id: String,
    pub(super) aggregate: ResultSet,
    pub(super) state: RunState,
}

impl TestRunner {
    pub fn new() -> Self {
        let origin_id = local_origin_id();
        Self {
            suite: TestSuite::default(),
            plugins: PluginSet::new(),
            aggregate: ResultSet::new(TestSuite::DEFAULT_NAME, &origin_id),
            origin_id,
            state: RunState::Idle,
        }
    }

    pub fn with_suite_name(mut self, name: impl Into<String>) -> Self {
        self.suite.set_name(name);
        self
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new().with_suite_name(&config.suite_name)
    }

    pub fn origin_id(&self) -> &str {
        &self.origin_id
    }

    pub fn suite(&self) -> &TestSuite {
        &self.suite
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Aggregate of the most recent run
    pub fn last_result(&self) -> &ResultSet {
        &self.aggregate
    }

    /// Register a test-case definition
    pub fn add_definition(&mut self, definition: TestDefinition) -> Result<()> {
        self.suite.add_definition(definition)
    }

    /// Register several definitions, stopping at the first rejected one
    pub fn add_definitions(
        &mut self,
        definitions: impl IntoIterator<Item = TestDefinition>,
    ) -> Result<()> {
        self.suite.add_definitions(definitions)
    }

    /// Register a plugin; its `setup` hook receives this runner
    pub fn add_plugin(&mut self, plugin: impl Plugin + 'static) {
        self.add_boxed_plugin(Box::new(plugin));
    }

    pub fn add_boxed_plugin(&mut self, mut plugin: Box<dyn Plugin>) {
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| plugin.setup(self)));
        let name = plugin.name().to_string();
        self.plugins.push(plugin);

        let reason = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(err)) => format!("{err:#}"),
            Err(_) => "panicked".to_string(),
        };
        self.plugins.report_hook_failure(&name, "setup", &reason);
    }

    pub fn add_plugins(&mut self, plugins: impl IntoIterator<Item = Box<dyn Plugin>>) {
        for plugin in plugins {
            self.add_boxed_plugin(plugin);
        }
    }

    /// Start a run from a clean aggregate
    pub(super) fn begin_run(&mut self) {
        self.aggregate = ResultSet::new(self.suite.name(), &self.origin_id);
        self.state = RunState::NotifyingStart;
        self.plugins.on_test_run_start(&self.suite);
        self.state = RunState::Executing;
    }

    /// Stamp the aggregate and notify completion
    pub(super) fn finish_run(&mut self) -> ResultSet {
        self.state = RunState::NotifyingComplete;
        self.aggregate.mark_complete();
        self.plugins.on_test_run_complete(&self.aggregate);
        self.state = RunState::Idle;
        self.aggregate.clone()
    }

    /// Run the whole suite as a single execution context
    pub async fn run_local(&mut self) -> ResultSet {
        info!(
            "Running {} locally on {} ({} definitions, {} tests)",
            self.suite.name(),
            self.origin_id,
            self.suite.total_definition_count(),
            self.suite.total_method_count()
        );

        self.begin_run();

        let suite = self.suite.clone();
        let origin_id = self.origin_id.clone();
        let joined = tokio::task::spawn_blocking(move || suite.run(&origin_id)).await;

        self.state = RunState::Merging;
        match joined {
            Ok(result) => self.aggregate.merge(&result),
            Err(e) => {
                error!("Local execution on {} crashed: {}", self.origin_id, e);
                let context = serde_json::json!({
                    "origin_id": self.origin_id,
                    "reason": "crashed",
                });
                self.plugins
                    .on_error(&format!("local execution crashed: {e}"), &context);
            }
        }

        let result = self.finish_run();
        let summary = result.summary();
        info!(
            "Local run completed - Total: {}, Pass: {}, Fail: {}",
            summary.total, summary.passed, summary.failed
        );
        result
    }

    /// Run according to `config.mode`
    pub async fn run_configured(&mut self, config: &RunnerConfig) -> Result<ResultSet> {
        match config.mode {
            RunMode::Local => Ok(self.run_local().await),
            RunMode::Distributed => self.run_distributed(config.nodes, config.timeout()).await,
        }
    }

    /// Call every plugin's `cleanup` hook
    pub fn cleanup(&mut self) {
        self.plugins.cleanup();
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{assert_equal, assert_true, DefinitionBuilder};
    use crate::plugins::testing::{Event, Recorder};

    #[derive(Default)]
    struct Sample;

    fn sample_definition() -> TestDefinition {
        DefinitionBuilder::<Sample>::with_default("Sample")
            .method("test_a", |_| assert_true(true))
            .method("test_b", |_| assert_equal(1, 2))
            .build()
    }

    #[test]
    fn test_runner_creation() {
        let runner = TestRunner::new().with_suite_name("nightly");
        assert_eq!(runner.suite().name(), "nightly");
        assert_eq!(runner.state(), RunState::Idle);
        assert!(runner.origin_id().ends_with(&std::process::id().to_string()));
    }

    #[test]
    fn test_plugin_setup_receives_runner() {
        let recorder = Recorder::default();
        let mut runner = TestRunner::new();
        runner.add_plugin(recorder.clone());

        assert_eq!(runner.plugin_count(), 1);
        assert_eq!(recorder.events(), vec![Event::Setup]);
    }

    #[test]
    fn test_failing_plugin_setup_is_reported() {
        struct BrokenSetup;
        impl Plugin for BrokenSetup {
            fn name(&self) -> &str {
                "broken"
            }
            fn setup(&mut self, _runner: &TestRunner) -> anyhow::Result<()> {
                anyhow::bail!("no terminal")
            }
        }

        let recorder = Recorder::default();
        let mut runner = TestRunner::new();
        runner.add_plugin(recorder.clone());
        runner.add_plugin(BrokenSetup);

        assert_eq!(runner.plugin_count(), 2);
        let events = recorder.events();
        assert!(
            matches!(&events[1], Event::Error(msg, ctx) if msg.contains("no terminal") && ctx["hook"] == "setup")
        );
    }

    #[tokio::test]
    async fn test_run_local_scenario() {
        let recorder = Recorder::default();
        let mut runner = TestRunner::new().with_suite_name("scenario");
        runner.add_definition(sample_definition()).unwrap();
        runner.add_plugin(recorder.clone());

        let result = runner.run_local().await;
        let summary = result.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert!((summary.pass_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(result.origin_id(), runner.origin_id());
        assert!(result.is_complete());

        assert_eq!(
            recorder.events(),
            vec![
                Event::Setup,
                Event::RunStart("scenario".into()),
                Event::RunComplete(2),
            ]
        );
        assert_eq!(runner.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_runner_is_reusable() {
        let mut runner = TestRunner::new();
        runner.add_definition(sample_definition()).unwrap();

        let first = runner.run_local().await;
        let second = runner.run_local().await;
        assert_eq!(first.summary().total, 2);
        assert_eq!(second.summary().total, 2);
        assert_eq!(runner.last_result().len(), 2);
    }

    #[tokio::test]
    async fn test_run_configured_dispatches_on_mode() {
        let mut runner = TestRunner::new();
        runner.add_definition(sample_definition()).unwrap();

        let local = runner.run_configured(&RunnerConfig::default()).await.unwrap();
        assert_eq!(local.origin_id(), runner.origin_id());

        let config = RunnerConfig {
            mode: RunMode::Distributed,
            nodes: 2,
            timeout_secs: 30,
            ..RunnerConfig::default()
        };
        let distributed = runner.run_configured(&config).await.unwrap();
        assert_eq!(distributed.summary().total, 2);
    }

    #[test]
    fn test_cleanup_reaches_plugins() {
        let recorder = Recorder::default();
        let mut runner = TestRunner::new();
        runner.add_plugin(recorder.clone());
        runner.cleanup();

        assert_eq!(recorder.events(), vec![Event::Setup, Event::Cleanup]);
    }
}
