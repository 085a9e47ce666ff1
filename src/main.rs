//! disttest - sample runner
//!
//! Runs the built-in sample definitions through the test execution engine,
//! either in-process or sharded across concurrent workers.
//!
//! ## Usage
//!
//! ```bash
//! # Run locally with verbose console output
//! disttest run --verbose
//!
//! # Shard across 3 workers with a 60s bound and a JSON run log
//! disttest run --mode distributed --nodes 3 --timeout 60 --json-log
//!
//! # Load settings from a file, print the final result as JSON
//! disttest run --config runner.yaml --format json-pretty
//!
//! # List registered definitions
//! disttest list
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

mod cli;

use cli::Args;
use disttest::config::{JsonLogConfig, RunMode, RunnerConfig};
use disttest::output::{OutputFormat, ResultFormatter};
use disttest::utils::{init_logger, LogLevel};
use disttest::{samples, ConsoleReporter, JsonLogger, TestRunner};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        cli::Command::Run(ref run_args) => {
            let config = build_config(&args, run_args)?;
            init_logger(config.log_level.parse::<LogLevel>()?);

            let code = run(&config, run_args.format.as_deref()).await?;
            std::process::exit(code);
        }
        cli::Command::List => {
            list_definitions();
        }
    }

    Ok(())
}

/// Merge the config file (if any) with command-line overrides
fn build_config(args: &Args, run_args: &cli::RunArgs) -> Result<RunnerConfig> {
    let mut config = match &run_args.config {
        Some(path) => RunnerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RunnerConfig::default(),
    };

    if let Some(mode) = &run_args.mode {
        config.mode =
            RunMode::from_str(mode).ok_or_else(|| anyhow::anyhow!("Unknown mode: {mode}"))?;
    }
    if let Some(nodes) = run_args.nodes {
        config.nodes = nodes;
    }
    if let Some(timeout) = run_args.timeout {
        config.timeout_secs = timeout;
    }
    if run_args.json_log {
        config.json_log = Some(JsonLogConfig {
            log_dir: run_args.log_dir.clone(),
            ..JsonLogConfig::default()
        });
    }
    if run_args.no_progress {
        config.show_progress = false;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    config.verbose |= args.verbose;

    config.validate()?;
    Ok(config)
}

async fn run(config: &RunnerConfig, format: Option<&str>) -> Result<i32> {
    let mut runner = TestRunner::from_config(config);
    runner.add_definitions(samples::all())?;
    runner.add_plugin(ConsoleReporter::new(config.verbose).show_progress(config.show_progress));

    if let Some(json_log) = &config.json_log {
        let mut logger = JsonLogger::new(&json_log.log_dir);
        if let Some(name) = &json_log.log_name {
            logger = logger.with_log_name(name);
        }
        runner.add_plugin(logger);
    }

    info!(
        "Running {} in {:?} mode ({} plugins)",
        config.suite_name,
        config.mode,
        runner.plugin_count()
    );

    let result = runner.run_configured(config).await?;

    if let Some(format) = format {
        let format = OutputFormat::from_str(format)
            .ok_or_else(|| anyhow::anyhow!("Unknown output format: {format}"))?;
        println!("{}", ResultFormatter::new(format).format_result_set(&result));
    }

    runner.cleanup();
    Ok(result.summary().exit_code())
}

fn list_definitions() {
    println!("\nRegistered test definitions\n");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let definitions = samples::all();
    let total: usize = definitions.iter().map(|d| d.method_count()).sum();

    for definition in &definitions {
        let hooks = definition.class_hooks();
        let marker = if hooks.has_class_setup || hooks.has_class_teardown {
            " [class hooks]"
        } else {
            ""
        };
        println!("\n{}{}:", definition.name(), marker);
        for method in definition.method_names() {
            println!("  - {method}");
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{} definitions, {} test methods\n", definitions.len(), total);
}
