//! JSON run log
//!
//! Keeps a JSON document describing the run and rewrites it to disk on every
//! event, so the file reflects progress even if the process dies mid-run.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::Plugin;
use crate::executor::TestRunner;
use crate::framework::TestSuite;
use crate::models::{MethodOutcome, ResultSet, Summary};

#[derive(Clone, Debug, Default, Serialize)]
struct RunSection {
    name: Option<String>,
    test_count: usize,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    summary: Option<Summary>,
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum NodeStatus {
    Running,
    Completed,
}

#[derive(Clone, Debug, Serialize)]
struct NodeEntry {
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    test_count: usize,
    status: NodeStatus,
    summary: Option<Summary>,
}

#[derive(Clone, Debug, Serialize)]
struct ErrorEntry {
    timestamp: DateTime<Utc>,
    message: String,
    context: Value,
}

#[derive(Clone, Debug, Default, Serialize)]
struct RunLog {
    test_run: RunSection,
    nodes: BTreeMap<String, NodeEntry>,
    test_results: Vec<MethodOutcome>,
    errors: Vec<ErrorEntry>,
}

/// Plugin writing a JSON log of the run
pub struct JsonLogger {
    log_dir: PathBuf,
    log_name: String,
    log: RunLog,
}

impl JsonLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            log_name: format!("test_log_{}.json", Utc::now().timestamp()),
            log: RunLog::default(),
        }
    }

    pub fn with_log_name(mut self, name: impl Into<String>) -> Self {
        self.log_name = name.into();
        self
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_name)
    }

    fn write_log(&self) -> anyhow::Result<()> {
        let path = self.log_path();
        let content = serde_json::to_string_pretty(&self.log)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write JSON log {}", path.display()))?;
        Ok(())
    }
}

impl Plugin for JsonLogger {
    fn name(&self) -> &str {
        "json-log"
    }

    fn setup(&mut self, _runner: &TestRunner) -> anyhow::Result<()> {
        if !Path::new(&self.log_dir).exists() {
            fs::create_dir_all(&self.log_dir).with_context(|| {
                format!("Failed to create log directory {}", self.log_dir.display())
            })?;
        }
        Ok(())
    }

    fn on_test_run_start(&mut self, suite: &TestSuite) -> anyhow::Result<()> {
        self.log = RunLog::default();
        self.log.test_run.name = Some(suite.name().to_string());
        self.log.test_run.test_count = suite.total_method_count();
        self.log.test_run.start_time = Some(Utc::now());
        self.write_log()
    }

    fn on_test_progress_update(&mut self, aggregate: &ResultSet) -> anyhow::Result<()> {
        self.log.test_run.summary = Some(aggregate.summary());
        self.write_log()
    }

    fn on_node_start(&mut self, origin_id: &str, partition: &TestSuite) -> anyhow::Result<()> {
        self.log.nodes.insert(
            origin_id.to_string(),
            NodeEntry {
                start_time: Utc::now(),
                end_time: None,
                test_count: partition.total_method_count(),
                status: NodeStatus::Running,
                summary: None,
            },
        );
        self.write_log()
    }

    fn on_node_complete(&mut self, origin_id: &str, result: &ResultSet) -> anyhow::Result<()> {
        if let Some(node) = self.log.nodes.get_mut(origin_id) {
            node.start_time = result.start_time();
            node.end_time = Some(result.end_time().unwrap_or_else(Utc::now));
            node.status = NodeStatus::Completed;
            node.summary = Some(result.summary());
            self.write_log()?;
        }
        Ok(())
    }

    fn on_test_run_complete(&mut self, result: &ResultSet) -> anyhow::Result<()> {
        self.log.test_run.end_time = Some(Utc::now());
        self.log.test_run.summary = Some(result.summary());
        self.log.test_results = result.outcomes().to_vec();
        self.write_log()?;

        info!("JSON test log written to {}", self.log_path().display());
        Ok(())
    }

    fn on_error(&mut self, message: &str, context: &Value) -> anyhow::Result<()> {
        self.log.errors.push(ErrorEntry {
            timestamp: Utc::now(),
            message: message.to_string(),
            context: context.clone(),
        });
        self.write_log()
    }

    fn cleanup(&mut self) -> anyhow::Result<()> {
        self.write_log()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::DefinitionBuilder;
    use std::time::Duration;
    use tempfile::tempdir;

    fn read(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_node_span_covers_partition_work() {
        #[derive(Default)]
        struct Sleeper;

        let dir = tempdir().unwrap();
        let logger = JsonLogger::new(dir.path()).with_log_name("span.json");
        let path = logger.log_path();

        let mut runner = TestRunner::new();
        runner
            .add_definition(
                DefinitionBuilder::<Sleeper>::with_default("Sleeper")
                    .method("test_nap", |_| {
                        std::thread::sleep(Duration::from_millis(250));
                        Ok(())
                    })
                    .build(),
            )
            .unwrap();
        runner.add_plugin(logger);
        runner
            .run_distributed(1, Duration::from_secs(30))
            .await
            .unwrap();

        let log = read(&path);
        let nodes = log["nodes"].as_object().unwrap();
        assert_eq!(nodes.len(), 1);
        let node = nodes.values().next().unwrap();
        let start: DateTime<Utc> = serde_json::from_value(node["start_time"].clone()).unwrap();
        let end: DateTime<Utc> = serde_json::from_value(node["end_time"].clone()).unwrap();
        assert!(end - start >= chrono::Duration::milliseconds(250));
        assert_eq!(node["status"], "completed");
    }

    #[test]
    fn test_setup_creates_directory() {
        let dir = tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("logs");
        let mut logger = JsonLogger::new(&log_dir);

        logger.setup(&TestRunner::new()).unwrap();
        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_log_lifecycle() {
        let dir = tempdir().unwrap();
        let mut logger = JsonLogger::new(dir.path()).with_log_name("run.json");
        let suite = TestSuite::new("json-suite");

        logger.on_test_run_start(&suite).unwrap();
        let path = logger.log_path();
        assert_eq!(read(&path)["test_run"]["name"], "json-suite");

        logger.on_node_start("node-1-aaaa", &suite).unwrap();
        assert_eq!(read(&path)["nodes"]["node-1-aaaa"]["status"], "running");

        let mut result = ResultSet::new("json-suite", "node-1-aaaa");
        result.add_outcome(MethodOutcome::passed(
            "A.test_a",
            Duration::from_millis(5),
            Utc::now(),
        ));
        result.mark_complete();
        logger.on_node_complete("node-1-aaaa", &result).unwrap();
        logger
            .on_error("node-2 timed out", &serde_json::json!({"origin_id": "node-2"}))
            .unwrap();
        logger.on_test_run_complete(&result).unwrap();

        let log = read(&path);
        assert_eq!(log["nodes"]["node-1-aaaa"]["status"], "completed");
        assert_eq!(log["nodes"]["node-1-aaaa"]["summary"]["total"], 1);
        assert_eq!(log["test_run"]["summary"]["passed"], 1);
        assert_eq!(log["test_results"][0]["method_name"], "A.test_a");
        assert_eq!(log["errors"][0]["context"]["origin_id"], "node-2");
    }
}
