use std::path::PathBuf;
use std::sync::Once;

use anyhow::Context;
use clap::{Parser, Subcommand};
use qjbench_core::{
    harness::{BenchmarkHarness, SystemRunner, TestSuite},
    manifest::{assemble, write_manifest},
    matrix::Matrix,
    settings::{CONFIG_ENV, Settings},
};


static TRACE_INIT: Once = Once::new();
const TRACE_ENV: &str = "QJBENCH_TRACE";
const DEFAULT_TRACE_FILTER: &str = "qjbench_core=info,qjbench=info";

#[derive(Debug, Parser)]
#[command(
    name = "qjbench",
    author,
    version,
    about = "Build-graph generator and harness for the JSON benchmark suite",
    long_about = None,
    arg_required_else_help = true,
    after_help = "Settings are read from $QJBENCH_CONFIG or ./qjbench.toml"
)]
struct CliArgs {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Commands {
    /// Regenerate the ninja build manifest.
    Configure,
    /// Run the unit test binaries and the conformance fixtures.
    RunTests,
    /// Run check, speed and memory stages for every library and scenario.
    RunBenchmarks,
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off"))
}

fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("1")
        || trimmed.eq_ignore_ascii_case("true")
        || trimmed.eq_ignore_ascii_case("on")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn maybe_init_tracing() {
    let raw = match std::env::var(TRACE_ENV) {
        Ok(value) => value,
        Err(_) => return,
    };

    if !env_toggle_enabled(&raw) {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let filter_expr = filter_expr_from(&raw).or_else(|| std::env::var("RUST_LOG").ok());

        // stdout carries harness output; diagnostics go to stderr.
        let builder = fmt().with_writer(std::io::stderr);

        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

fn load_settings() -> anyhow::Result<Settings> {
    let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let cwd = std::env::current_dir().context("resolve working directory")?;
    Settings::discover(explicit.as_deref(), &cwd)
}

fn configure(settings: &Settings) -> anyhow::Result<()> {
    let manifest = assemble(&Matrix::standard()).context("assemble build manifest")?;
    let path = &settings.manifest.path;
    write_manifest(&manifest, path)?;
    println!("Build rules written to {}", path.display());
    Ok(())
}

fn run_tests(settings: &Settings) -> anyhow::Result<()> {
    let mut runner = SystemRunner::with_timeout(settings.process.timeout());
    let report = TestSuite::new(&settings.tests).run(&mut runner);
    println!("{}", report);
    if !report.is_success() {
        anyhow::bail!("{} test step(s) failed", report.failure_count());
    }
    Ok(())
}

fn run_benchmarks(settings: &Settings) -> anyhow::Result<()> {
    let matrix = Matrix::standard();
    let mut runner = SystemRunner::with_timeout(settings.process.timeout());
    let outputs = BenchmarkHarness::new(&matrix, &settings.benchmarks).run(&mut runner)?;
    for output in &outputs {
        println!("{}", output);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    maybe_init_tracing();

    let CliArgs { command } = CliArgs::parse();
    let settings = load_settings()?;
    tracing::debug!(?settings, "settings loaded");

    match command {
        Commands::Configure => configure(&settings),
        Commands::RunTests => run_tests(&settings),
        Commands::RunBenchmarks => run_benchmarks(&settings),
    }
}
