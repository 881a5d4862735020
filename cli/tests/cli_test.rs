use assert_cmd::prelude::*;
use predicates::prelude::*;
use qjbench_core::{matrix::Matrix, report::ReportLayout};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn qjbench(dir: &Path) -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("qjbench")?;
    cmd.current_dir(dir).env_remove("QJBENCH_CONFIG").env_remove("QJBENCH_TRACE");
    Ok(cmd)
}

fn standard_results() -> String {
    let layout = ReportLayout::from_matrix(&Matrix::standard());
    layout
        .keys()
        .iter()
        .enumerate()
        .map(|(i, key)| format!("{}\t{}\t{}\t{}\n", key.scenario, key.library, key.mode, i + 1))
        .collect()
}

#[test]
fn configure_writes_manifest_and_reports_path() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    qjbench(dir.path())?
        .arg("configure")
        .assert()
        .success()
        .stdout(predicate::str::contains("Build rules written to build.ninja"));

    let manifest = fs::read_to_string(dir.path().join("build.ninja"))?;
    assert!(manifest.contains("rule compile"));
    assert!(manifest.contains("build out/benchmark/bin_boost_pt_scenario4_memory: link"));

    // A second run regenerates identical text.
    qjbench(dir.path())?.arg("configure").assert().success();
    assert_eq!(fs::read_to_string(dir.path().join("build.ninja"))?, manifest);
    Ok(())
}

#[test]
fn configure_honors_settings_file() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("qjbench.toml"), "[manifest]\npath = \"gen/build.ninja\"\n")?;
    qjbench(dir.path())?
        .arg("configure")
        .assert()
        .success()
        .stdout(predicate::str::contains("gen/build.ninja"));
    assert!(dir.path().join("gen/build.ninja").is_file());

    let other = dir.path().join("other.toml");
    fs::write(&other, "[manifest]\nbogus = 1\n")?;
    qjbench(dir.path())?
        .env("QJBENCH_CONFIG", &other)
        .arg("configure")
        .assert()
        .failure()
        .stderr(predicate::str::contains("other.toml"));
    Ok(())
}

#[test]
fn missing_or_unknown_subcommand_prints_usage() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    qjbench(dir.path())?
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
    qjbench(dir.path())?
        .arg("benchmark")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
    Ok(())
}

#[test]
fn run_benchmarks_without_binaries_emits_nothing() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    qjbench(dir.path())?
        .arg("run-benchmarks")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Correctness stage"));
    Ok(())
}

#[test]
fn run_tests_without_binaries_fails_every_step() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    qjbench(dir.path())?
        .arg("run-tests")
        .assert()
        .failure()
        .stdout(predicate::str::contains("51 steps, 0 passed, 51 failed"));
    Ok(())
}

#[test]
fn render_complete_results() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tsv = dir.path().join("results.tsv");
    fs::write(&tsv, standard_results())?;

    Command::cargo_bin("qjbench-render")?
        .args(["--render-target", "md", "--input-tsv"])
        .arg(&tsv)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Benchmarks"))
        .stdout(predicate::str::contains("| quantumjson |"));

    Command::cargo_bin("qjbench-render")?
        .args(["--render-target", "html", "--input-tsv"])
        .arg(&tsv)
        .assert()
        .success()
        .stdout(predicate::str::contains("background-color: #0000FF;"));
    Ok(())
}

#[test]
fn render_rejects_incomplete_results() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tsv = dir.path().join("results.tsv");
    let complete = standard_results();
    let truncated: String = complete.lines().skip(1).map(|l| format!("{}\n", l)).collect();
    fs::write(&tsv, truncated)?;

    Command::cargo_bin("qjbench-render")?
        .args(["--render-target", "md", "--input-tsv"])
        .arg(&tsv)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());

    Command::cargo_bin("qjbench-render")?
        .args(["--render-target", "pdf", "--input-tsv"])
        .arg(&tsv)
        .assert()
        .failure();
    Ok(())
}
