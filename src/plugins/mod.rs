//! Notification layer
//!
//! Observers ("plugins") receive lifecycle events from the runner. All hooks
//! are called synchronously in registration order. Every call is isolated: an
//! error or panic from one plugin is routed to the `on_error` hook of every
//! plugin and logged, and never reaches the runner.

mod console;
mod json_log;

pub use console::ConsoleReporter;
pub use json_log::JsonLogger;

use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

use crate::executor::TestRunner;
use crate::framework::TestSuite;
use crate::models::ResultSet;

/// Lifecycle observer.
///
/// Every hook has a no-op default; implement only what you need.
pub trait Plugin: Send {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called once when the plugin is registered
    fn setup(&mut self, _runner: &TestRunner) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_test_run_start(&mut self, _suite: &TestSuite) -> anyhow::Result<()> {
        Ok(())
    }

    /// Aggregate after a partition result has been merged
    fn on_test_progress_update(&mut self, _aggregate: &ResultSet) -> anyhow::Result<()> {
        Ok(())
    }

    /// Delivered in completion order, right before `on_node_complete`.
    /// Node timing belongs to the partition result (`start_time`/`end_time`).
    fn on_node_start(&mut self, _origin_id: &str, _partition: &TestSuite) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_node_complete(&mut self, _origin_id: &str, _result: &ResultSet) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_test_run_complete(&mut self, _result: &ResultSet) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_error(&mut self, _message: &str, _context: &Value) -> anyhow::Result<()> {
        Ok(())
    }

    fn cleanup(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Ordered set of plugins with isolated dispatch
#[derive(Default)]
pub struct PluginSet {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    pub(crate) fn push(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn on_test_run_start(&mut self, suite: &TestSuite) {
        self.dispatch("on_test_run_start", |p| p.on_test_run_start(suite));
    }

    pub fn on_test_progress_update(&mut self, aggregate: &ResultSet) {
        self.dispatch("on_test_progress_update", |p| {
            p.on_test_progress_update(aggregate)
        });
    }

    pub fn on_node_start(&mut self, origin_id: &str, partition: &TestSuite) {
        self.dispatch("on_node_start", |p| p.on_node_start(origin_id, partition));
    }

    pub fn on_node_complete(&mut self, origin_id: &str, result: &ResultSet) {
        self.dispatch("on_node_complete", |p| p.on_node_complete(origin_id, result));
    }

    pub fn on_test_run_complete(&mut self, result: &ResultSet) {
        self.dispatch("on_test_run_complete", |p| p.on_test_run_complete(result));
    }

    pub fn cleanup(&mut self) {
        self.dispatch("cleanup", |p| p.cleanup());
    }

    /// Deliver an error to every plugin's `on_error` hook.
    ///
    /// Failures inside `on_error` are only logged.
    pub fn on_error(&mut self, message: &str, context: &Value) {
        for plugin in &mut self.plugins {
            if let Err(reason) = call_isolated(|| plugin.on_error(message, context)) {
                warn!("Plugin {} failed in on_error: {}", plugin.name(), reason);
            }
        }
    }

    fn dispatch<F>(&mut self, hook: &'static str, mut call: F)
    where
        F: FnMut(&mut dyn Plugin) -> anyhow::Result<()>,
    {
        let mut failures = Vec::new();
        for plugin in &mut self.plugins {
            if let Err(reason) = call_isolated(|| call(plugin.as_mut())) {
                failures.push((plugin.name().to_string(), reason));
            }
        }

        for (plugin, reason) in failures {
            self.report_hook_failure(&plugin, hook, &reason);
        }
    }

    pub(crate) fn report_hook_failure(&mut self, plugin: &str, hook: &str, reason: &str) {
        warn!("Plugin {} failed in {}: {}", plugin, hook, reason);
        let context = serde_json::json!({
            "plugin": plugin,
            "hook": hook,
        });
        self.on_error(&format!("plugin {plugin} failed in {hook}: {reason}"), &context);
    }
}

/// Run a hook, flattening both errors and panics into a message
fn call_isolated(f: impl FnOnce() -> anyhow::Result<()>) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(payload) => Err(if let Some(s) = payload.downcast_ref::<&'static str>() {
            format!("panicked: {s}")
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("panicked: {s}")
        } else {
            "panicked".to_string()
        }),
    }
}
