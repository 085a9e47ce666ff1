//! Method outcome model
//!
//! The recorded result of running one test method once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Result of a single test method execution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodOutcome {
    method_name: String,
    success: bool,
    error_detail: Option<String>,
    #[serde(with = "duration_secs")]
    duration: Duration,
    start_time: DateTime<Utc>,
    additional_data: BTreeMap<String, serde_json::Value>,
}

impl MethodOutcome {
    pub fn passed(
        method_name: impl Into<String>,
        duration: Duration,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            method_name: method_name.into(),
            success: true,
            error_detail: None,
            duration,
            start_time,
            additional_data: BTreeMap::new(),
        }
    }

    pub fn failed(
        method_name: impl Into<String>,
        error_detail: impl Into<String>,
        duration: Duration,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            method_name: method_name.into(),
            success: false,
            error_detail: Some(error_detail.into()),
            duration,
            start_time,
            additional_data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.additional_data.insert(key.into(), value.into());
        self
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn additional_data(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.additional_data
    }

    pub fn symbol(&self) -> &'static str {
        if self.success {
            "✓"
        } else {
            "✗"
        }
    }
}

impl fmt::Display for MethodOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.symbol(),
            self.method_name,
            self.duration.as_millis()
        )?;
        if let Some(detail) = &self.error_detail {
            let first_line = detail.lines().next().unwrap_or_default();
            write!(f, " - {first_line}")?;
        }
        Ok(())
    }
}

/// Serialize a `Duration` as fractional seconds
pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if secs.is_finite() && secs >= 0.0 {
            Ok(Duration::from_secs_f64(secs))
        } else {
            Err(serde::de::Error::custom("duration must be a non-negative number"))
        }
    }
}
