//! Test failure values
//!
//! A [`Failure`] is what a hook or test method hands back when it does not
//! succeed. It is deliberately not a `std::error::Error`, so that any error
//! type can be lifted into it with `?`.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

/// Outcome of a single hook or method call
pub type Check = std::result::Result<(), Failure>;

/// Why a hook or test method did not succeed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Failure {
    /// A declared expectation did not hold
    Expectation { message: String },

    /// Any other error raised during setup, the method body or teardown
    Unexpected {
        kind: String,
        message: String,
        trace: Option<String>,
    },
}

impl Failure {
    pub fn expectation(message: impl Into<String>) -> Self {
        Failure::Expectation {
            message: message.into(),
        }
    }

    pub fn unexpected(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Failure::Unexpected {
            kind: kind.into(),
            message: message.into(),
            trace: None,
        }
    }

    pub fn with_trace(self, trace: impl Into<String>) -> Self {
        match self {
            Failure::Unexpected { kind, message, .. } => Failure::Unexpected {
                kind,
                message,
                trace: Some(trace.into()),
            },
            other => other,
        }
    }

    pub fn is_expectation(&self) -> bool {
        matches!(self, Failure::Expectation { .. })
    }

    pub fn kind(&self) -> &str {
        match self {
            Failure::Expectation { .. } => "AssertionError",
            Failure::Unexpected { kind, .. } => kind,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Failure::Expectation { message } | Failure::Unexpected { message, .. } => message,
        }
    }

    pub fn trace(&self) -> Option<&str> {
        match self {
            Failure::Expectation { .. } => None,
            Failure::Unexpected { trace, .. } => trace.as_deref(),
        }
    }

    /// Full error detail: `kind: message`, followed by the trace when present
    pub fn detail(&self) -> String {
        match self.trace() {
            Some(trace) if !trace.is_empty() => {
                format!("{}: {}\n{}", self.kind(), self.message(), trace)
            }
            _ => format!("{}: {}", self.kind(), self.message()),
        }
    }

    /// Attach a secondary failure (e.g. from teardown) without losing the first
    pub(crate) fn with_note(self, note: impl fmt::Display) -> Self {
        match self {
            Failure::Expectation { message } => Failure::Expectation {
                message: format!("{message}\n{note}"),
            },
            Failure::Unexpected {
                kind,
                message,
                trace,
            } => Failure::Unexpected {
                kind,
                message: format!("{message}\n{note}"),
                trace,
            },
        }
    }

    /// Convert a caught panic payload.
    ///
    /// Panics raised by the `assert!` family of macros count as expectation
    /// failures, everything else is unexpected.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with a non-string payload".to_string()
        };

        if message.starts_with("assertion") {
            Failure::expectation(message)
        } else {
            Failure::unexpected("panic", message)
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}

impl<E> From<E> for Failure
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        let kind = std::any::type_name::<E>()
            .rsplit("::")
            .next()
            .unwrap_or("Error")
            .to_string();

        let mut trace = String::new();
        let mut source = err.source();
        while let Some(cause) = source {
            trace.push_str(&format!("caused by: {cause}\n"));
            source = cause.source();
        }

        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            trace.push_str(&backtrace.to_string());
        }

        let failure = Failure::unexpected(kind, err.to_string());
        if trace.is_empty() {
            failure
        } else {
            failure.with_trace(trace.trim_end())
        }
    }
}
