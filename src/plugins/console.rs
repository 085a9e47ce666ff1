//! Console reporter
//!
//! Prints a banner when a run starts, a progress bar as partitions finish,
//! per-node statistics and failure details in verbose mode, and a final
//! summary.

use chrono::Local;
use std::collections::HashMap;
use std::io::{self, Write};
use std::time::Instant;

use super::Plugin;
use crate::framework::TestSuite;
use crate::models::ResultSet;
use crate::output::{progress_bar, OutputFormat, ResultFormatter};

const BANNER: &str = "==========================================";
const BAR_WIDTH: usize = 50;

/// Plugin writing human-readable progress to a terminal
pub struct ConsoleReporter<W: Write + Send = io::Stdout> {
    out: W,
    show_progress: bool,
    verbose: bool,
    formatter: ResultFormatter,
    started: Option<Instant>,
    total_tests: usize,
    progress_drawn: bool,
    active_nodes: HashMap<String, usize>,
}

impl ConsoleReporter<io::Stdout> {
    pub fn new(verbose: bool) -> Self {
        Self::with_writer(io::stdout(), verbose)
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn with_writer(out: W, verbose: bool) -> Self {
        Self {
            out,
            show_progress: true,
            verbose,
            formatter: ResultFormatter::new(OutputFormat::Table),
            started: None,
            total_tests: 0,
            progress_drawn: false,
            active_nodes: HashMap::new(),
        }
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn no_color(mut self) -> Self {
        self.formatter = self.formatter.no_color();
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Plugin for ConsoleReporter<W> {
    fn name(&self) -> &str {
        "console"
    }

    fn on_test_run_start(&mut self, suite: &TestSuite) -> anyhow::Result<()> {
        self.started = Some(Instant::now());
        self.total_tests = suite.total_method_count();
        self.progress_drawn = false;

        writeln!(self.out, "\n{BANNER}")?;
        writeln!(self.out, "    Running suite: {}", suite.name())?;
        writeln!(self.out, "    Test methods: {}", self.total_tests)?;
        writeln!(
            self.out,
            "    Started at: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(self.out, "{BANNER}\n")?;
        Ok(())
    }

    fn on_test_progress_update(&mut self, aggregate: &ResultSet) -> anyhow::Result<()> {
        if !self.show_progress {
            return Ok(());
        }

        let summary = aggregate.summary();
        write!(
            self.out,
            "\rProgress: {} ({}/{}) passed: {} failed: {}",
            progress_bar(summary.total, self.total_tests, BAR_WIDTH),
            summary.total,
            self.total_tests,
            summary.passed,
            summary.failed
        )?;
        self.out.flush()?;
        self.progress_drawn = true;
        Ok(())
    }

    fn on_node_start(&mut self, origin_id: &str, partition: &TestSuite) -> anyhow::Result<()> {
        let count = partition.total_method_count();
        self.active_nodes.insert(origin_id.to_string(), count);

        if self.verbose {
            writeln!(self.out, "Node {origin_id} running {count} tests...")?;
        }
        Ok(())
    }

    fn on_node_complete(&mut self, origin_id: &str, result: &ResultSet) -> anyhow::Result<()> {
        if self.active_nodes.remove(origin_id).is_none() {
            return Ok(());
        }

        if self.verbose {
            let summary = result.summary();
            writeln!(self.out, "\nNode {origin_id} finished:")?;
            writeln!(self.out, "  Elapsed: {:.2}s", result.elapsed().as_secs_f64())?;
            writeln!(self.out, "  Tests: {}", summary.total)?;
            writeln!(self.out, "  Passed: {}", summary.passed)?;
            writeln!(self.out, "  Failed: {}", summary.failed)?;
            writeln!(self.out, "  Pass rate: {:.2}%", summary.pass_percentage())?;
        }
        Ok(())
    }

    fn on_test_run_complete(&mut self, result: &ResultSet) -> anyhow::Result<()> {
        if self.progress_drawn {
            writeln!(self.out, "\n")?;
        }

        let elapsed = self
            .started
            .map(|s| s.elapsed().as_secs_f64())
            .unwrap_or_default();
        let summary = result.summary();

        writeln!(self.out, "\n{BANNER}")?;
        writeln!(self.out, "    Run complete in {elapsed:.2}s")?;
        writeln!(self.out, "{}", self.formatter.format_summary(&summary))?;
        writeln!(self.out, "{BANNER}\n")?;

        if summary.failed > 0 && self.verbose {
            writeln!(self.out, "Failed tests:")?;
            write!(self.out, "{}", self.formatter.format_failures(result))?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn on_error(&mut self, message: &str, _context: &serde_json::Value) -> anyhow::Result<()> {
        writeln!(self.out, "\nError: {message}")?;
        Ok(())
    }
}
