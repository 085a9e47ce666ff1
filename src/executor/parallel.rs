//! Distributed execution
//!
//! Shards the suite by definition and runs every partition on its own
//! blocking worker. Results come back to the runner task in completion order;
//! the runner is the only writer of the aggregate.

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::partition::partition;
use super::runner::{RunState, TestRunner};
use crate::error::{DisttestError, Result};
use crate::framework::TestSuite;
use crate::models::ResultSet;

/// Fresh, unique origin id for worker `index`
fn node_id(index: usize) -> String {
    format!("node-{}-{:08x}", index + 1, rand::random::<u32>())
}

/// Partition still being waited on
struct Pending {
    origin_id: String,
    suite: TestSuite,
}

impl Pending {
    fn context(&self, reason: &str) -> serde_json::Value {
        json!({
            "origin_id": self.origin_id,
            "definitions": self
                .suite
                .definitions()
                .iter()
                .map(|d| d.name())
                .collect::<Vec<_>>(),
            "reason": reason,
        })
    }
}

impl TestRunner {
    /// Run the suite split across `workers` concurrent partitions.
    ///
    /// `timeout` bounds the whole run. Partitions that have not reported by
    /// then are left running; each is reported through `on_error` and its
    /// tests are absent from the returned aggregate.
    pub async fn run_distributed(&mut self, workers: usize, timeout: Duration) -> Result<ResultSet> {
        if workers == 0 {
            return Err(DisttestError::InvalidWorkerCount(workers));
        }
        if timeout.is_zero() {
            return Err(DisttestError::InvalidTimeout);
        }

        let deadline = Instant::now() + timeout;
        self.begin_run();

        let parts = partition(self.suite.definitions(), workers);
        info!(
            "Distributing {} definitions across {} workers on {} (timeout {:?})",
            self.suite.total_definition_count(),
            parts.len(),
            self.origin_id,
            timeout
        );

        let mut outstanding = BTreeMap::new();
        let mut running = FuturesUnordered::new();

        for (index, definitions) in parts.into_iter().enumerate() {
            let origin_id = node_id(index);
            let suite = TestSuite::from_partition(
                format!("{}-{}", self.suite.name(), origin_id),
                definitions,
            );
            debug!(
                "Partition {} -> {} ({} definitions)",
                index,
                origin_id,
                suite.total_definition_count()
            );

            let worker_suite = suite.clone();
            let worker_origin = origin_id.clone();
            running.push(
                tokio::task::spawn_blocking(move || worker_suite.run(&worker_origin))
                    .map(move |joined| (index, joined)),
            );
            outstanding.insert(index, Pending { origin_id, suite });
        }

        loop {
            let next = match tokio::time::timeout_at(deadline, running.next()).await {
                Ok(Some(next)) => next,
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        "Distributed run hit its timeout with {} partitions outstanding",
                        outstanding.len()
                    );
                    break;
                }
            };

            let (index, joined) = next;
            let Some(pending) = outstanding.remove(&index) else {
                continue;
            };

            match joined {
                Ok(result) => {
                    self.plugins.on_node_start(&pending.origin_id, &pending.suite);
                    self.plugins.on_node_complete(&pending.origin_id, &result);

                    self.state = RunState::Merging;
                    self.aggregate.merge(&result);
                    self.plugins.on_test_progress_update(&self.aggregate);
                    self.state = RunState::Executing;
                }
                Err(e) => {
                    error!("Worker {} crashed: {}", pending.origin_id, e);
                    self.plugins.on_error(
                        &format!("worker {} crashed: {}", pending.origin_id, e),
                        &pending.context("panic"),
                    );
                }
            }
        }

        // Late results are dropped with the stream; their tests stay absent.
        drop(running);
        for pending in outstanding.into_values() {
            self.plugins.on_error(
                &format!(
                    "worker {} did not complete within {:?}",
                    pending.origin_id, timeout
                ),
                &pending.context("timeout"),
            );
        }

        let result = self.finish_run();
        let summary = result.summary();
        info!(
            "Distributed run completed - Total: {}, Pass: {}, Fail: {}",
            summary.total, summary.passed, summary.failed
        );
        Ok(result)
    }
}
