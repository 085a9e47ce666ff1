//! Output formatters for test results
//!
//! Provides table, JSON, CSV and one-line summary output formats.

use crate::models::{MethodOutcome, ResultSet, Summary};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

const CSV_HEADER: [&str; 4] = ["method", "status", "duration_ms", "error"];

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.colorize {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    /// Format a single method outcome
    pub fn format_outcome(&self, outcome: &MethodOutcome) -> String {
        match self.format {
            OutputFormat::Table => self.format_outcome_table(outcome),
            OutputFormat::Json => serde_json::to_string(outcome).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(outcome).unwrap_or_default(),
            OutputFormat::Csv => {
                Self::write_csv(std::iter::once(outcome), false).unwrap_or_default()
            }
            OutputFormat::Summary => outcome.to_string(),
        }
    }

    fn format_outcome_table(&self, outcome: &MethodOutcome) -> String {
        let status = if outcome.success() {
            self.paint("✓ PASS", "32")
        } else {
            self.paint("✗ FAIL", "31")
        };

        format!(
            "{:48} {} [{:>6}ms]",
            outcome.method_name(),
            status,
            outcome.duration().as_millis()
        )
    }

    fn csv_record(outcome: &MethodOutcome) -> [String; 4] {
        [
            outcome.method_name().to_string(),
            if outcome.success() { "PASS" } else { "FAIL" }.to_string(),
            outcome.duration().as_millis().to_string(),
            outcome
                .error_detail()
                .and_then(|d| d.lines().next())
                .unwrap_or("")
                .to_string(),
        ]
    }

    fn write_csv<'a>(
        outcomes: impl IntoIterator<Item = &'a MethodOutcome>,
        header: bool,
    ) -> anyhow::Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        if header {
            writer.write_record(CSV_HEADER)?;
        }
        for outcome in outcomes {
            writer.write_record(Self::csv_record(outcome))?;
        }

        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(bytes)?.trim_end_matches('\n').to_string())
    }

    /// Format a summary
    pub fn format_summary(&self, summary: &Summary) -> String {
        match self.format {
            OutputFormat::Table => self.format_summary_table(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Csv => format!(
                "total,passed,failed,pass_rate,total_time_secs\n{},{},{},{:.4},{:.3}",
                summary.total,
                summary.passed,
                summary.failed,
                summary.pass_rate,
                summary.total_time.as_secs_f64()
            ),
            OutputFormat::Summary => self.format_summary_brief(summary),
        }
    }

    fn format_summary_table(&self, summary: &Summary) -> String {
        let mut out = String::new();
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!(
            "Total: {} | Pass: {} | Fail: {}\n",
            summary.total,
            self.paint(&summary.passed.to_string(), "32"),
            self.paint(&summary.failed.to_string(), "31"),
        ));
        out.push_str(&format!(
            "Pass Rate: {} | Duration: {:.3}s\n",
            self.paint(&format!("{:.2}%", summary.pass_percentage()), "33"),
            summary.total_time.as_secs_f64()
        ));
        out.push_str(RULE);
        out
    }

    fn format_summary_brief(&self, summary: &Summary) -> String {
        let verdict = if summary.is_success() {
            self.paint("PASSED", "32")
        } else {
            self.paint("FAILED", "31")
        };
        format!(
            "{} {}/{} passed ({:.1}%) in {:.3}s",
            verdict,
            summary.passed,
            summary.total,
            summary.pass_percentage(),
            summary.total_time.as_secs_f64()
        )
    }

    /// Format a whole result set: every outcome followed by the summary
    pub fn format_result_set(&self, result: &ResultSet) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string(result).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Csv => Self::write_csv(result.outcomes(), true).unwrap_or_default(),
            OutputFormat::Table | OutputFormat::Summary => {
                let mut out = format!("{} @ {}\n", result.owner_name(), result.origin_id());
                if self.format == OutputFormat::Table {
                    out.push_str(RULE);
                    out.push('\n');
                    for outcome in result.outcomes() {
                        out.push_str(&self.format_outcome(outcome));
                        out.push('\n');
                    }
                }
                out.push_str(&self.format_summary(&result.summary()));
                out
            }
        }
    }

    /// Render failed outcomes with their full error detail
    pub fn format_failures(&self, result: &ResultSet) -> String {
        let mut out = String::new();
        for outcome in result.failures() {
            out.push_str(&self.paint(&format!("Test: {}", outcome.method_name()), "31"));
            out.push('\n');
            out.push_str(&format!(
                "Duration: {:.3}s\n",
                outcome.duration().as_secs_f64()
            ));
            out.push_str(&format!(
                "Error:\n{}\n",
                outcome.error_detail().unwrap_or_default()
            ));
            out.push_str(&"-".repeat(80));
            out.push('\n');
        }
        out
    }
}

/// Render a textual progress bar such as `[█████░░░░░] 50%`
pub fn progress_bar(completed: usize, total: usize, width: usize) -> String {
    let percent = if total > 0 {
        (completed * 100 / total).min(100)
    } else {
        0
    };
    let filled = width * percent / 100;
    format!(
        "[{}{}] {}%",
        "█".repeat(filled),
        "░".repeat(width - filled),
        percent
    )
}
