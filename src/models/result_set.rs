//! Result set model
//!
//! An ordered, deduplicated collection of method outcomes for one execution
//! context, plus the summary derived from it.
//!
//! Invariants:
//! - no two outcomes share a method name; the first one recorded wins
//! - merging is idempotent: re-merging outcomes already present is a no-op
//! - on merge the end time becomes the later of the two, and metadata keys
//!   already present are never overwritten

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::Duration;

use super::outcome::{duration_secs, MethodOutcome};

/// Mergeable collection of outcomes produced by one execution context
#[derive(Clone, Debug, Serialize)]
pub struct ResultSet {
    owner_name: String,
    origin_id: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    outcomes: Vec<MethodOutcome>,
    metadata: BTreeMap<String, serde_json::Value>,
    #[serde(skip)]
    seen: HashSet<String>,
}

impl ResultSet {
    pub fn new(owner_name: impl Into<String>, origin_id: impl Into<String>) -> Self {
        Self {
            owner_name: owner_name.into(),
            origin_id: origin_id.into(),
            start_time: Utc::now(),
            end_time: None,
            outcomes: Vec::new(),
            metadata: BTreeMap::new(),
            seen: HashSet::new(),
        }
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    pub fn origin_id(&self) -> &str {
        &self.origin_id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn outcomes(&self) -> &[MethodOutcome] {
        &self.outcomes
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn contains(&self, method_name: &str) -> bool {
        self.seen.contains(method_name)
    }

    pub fn get(&self, method_name: &str) -> Option<&MethodOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.method_name() == method_name)
    }

    pub fn failures(&self) -> impl Iterator<Item = &MethodOutcome> {
        self.outcomes.iter().filter(|o| !o.success())
    }

    /// Record an outcome unless one with the same method name exists.
    ///
    /// Returns whether the outcome was recorded.
    pub fn add_outcome(&mut self, outcome: MethodOutcome) -> bool {
        if self.seen.contains(outcome.method_name()) {
            return false;
        }
        self.seen.insert(outcome.method_name().to_string());
        self.outcomes.push(outcome);
        true
    }

    /// Set a metadata entry owned by this result set
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Fold another result set into this one
    pub fn merge(&mut self, other: &ResultSet) {
        for outcome in &other.outcomes {
            self.add_outcome(outcome.clone());
        }

        if let Some(other_end) = other.end_time {
            if self.end_time.map_or(true, |end| other_end > end) {
                self.end_time = Some(other_end);
            }
        }

        for (key, value) in &other.metadata {
            self.metadata
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Stamp the end time; called once by the owning context after its merges
    pub fn mark_complete(&mut self) {
        self.end_time = Some(Utc::now());
    }

    /// Wall-clock span from creation to completion (or now, while open)
    pub fn elapsed(&self) -> Duration {
        let end = self.end_time.unwrap_or_else(Utc::now);
        (end - self.start_time).to_std().unwrap_or_default()
    }

    pub fn summary(&self) -> Summary {
        let total = self.outcomes.len();
        let passed = self.outcomes.iter().filter(|o| o.success()).count();
        let total_time = self.outcomes.iter().map(|o| o.duration()).sum();

        Summary {
            owner_name: self.owner_name.clone(),
            origin_id: self.origin_id.clone(),
            total,
            passed,
            failed: total - passed,
            pass_rate: if total == 0 {
                0.0
            } else {
                passed as f64 / total as f64
            },
            total_time,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// Summary statistics of a result set.
///
/// This is the stable contract consumed by reporters and by the exit-code
/// decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub owner_name: String,
    pub origin_id: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Fraction of passed outcomes (0.0 - 1.0), 0 when empty
    pub pass_rate: f64,
    #[serde(with = "duration_secs")]
    pub total_time: Duration,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Process exit code: non-zero iff any outcome failed
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn pass_percentage(&self) -> f64 {
        self.pass_rate * 100.0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} @ {}", self.owner_name, self.origin_id)?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {}",
            self.total, self.passed, self.failed
        )?;
        write!(
            f,
            "Pass Rate: {:.2}% | Duration: {:.3}s",
            self.pass_percentage(),
            self.total_time.as_secs_f64()
        )
    }
}
