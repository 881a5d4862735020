use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use super::{Invocation, PRELOAD_VAR, ProcessRunner};
use crate::matrix::{BenchmarkMode, Matrix, Task};
use crate::settings::BenchmarkSettings;

/// Captured output of one benchmark stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedOutput {
    pub mode: BenchmarkMode,
    pub library: String,
    pub scenario: String,
    pub stdout: String,
}

impl fmt::Display for TaggedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.mode.label(),
            self.library,
            self.scenario,
            self.stdout.trim_end()
        )
    }
}

/// Walks the matrix library by library, running check, speed and memory for
/// each scenario. The first failing stage aborts the whole run.
#[derive(Debug, Clone)]
pub struct BenchmarkHarness<'m> {
    matrix: &'m Matrix,
    data_dir: PathBuf,
    preload_module: PathBuf,
}

impl<'m> BenchmarkHarness<'m> {
    pub fn new(matrix: &'m Matrix, settings: &BenchmarkSettings) -> Self {
        Self {
            matrix,
            data_dir: settings.data_dir.clone(),
            preload_module: settings.preload_module.clone(),
        }
    }

    /// The invocation for a single stage. Only the memory stage sees the
    /// preload variable; the others have it stripped from the environment.
    pub fn invocation(&self, task: &Task<'_>) -> Invocation {
        let base = Invocation::new(task.binary_path())
            .arg(task.stage_argument().to_string())
            .stdin_file(self.data_dir.join(task.scenario.input))
            .capture_stdout();
        match task.mode {
            BenchmarkMode::Memory => base.env(PRELOAD_VAR, self.preload_module.clone().into_os_string()),
            BenchmarkMode::Check | BenchmarkMode::Speed => base.env_remove(PRELOAD_VAR),
        }
    }

    /// Every invocation of a full run, in execution order.
    pub fn plan(&self) -> Vec<(Task<'m>, Invocation)> {
        let matrix: &'m Matrix = self.matrix;
        matrix
            .pairs_by_library()
            .flat_map(|(library, scenario)| {
                BenchmarkMode::ALL
                    .into_iter()
                    .map(move |mode| Task::new(library, scenario, mode))
            })
            .map(|task| {
                let invocation = self.invocation(&task);
                (task, invocation)
            })
            .collect()
    }

    /// Runs the full matrix. Output is only handed back once every stage has
    /// succeeded, so a failed run yields no partial result set.
    pub fn run<R: ProcessRunner>(&self, runner: &mut R) -> Result<Vec<TaggedOutput>> {
        let plan = self.plan();
        let total = plan.len();
        let mut outputs = Vec::with_capacity(total);

        for (index, (task, invocation)) in plan.into_iter().enumerate() {
            tracing::info!(
                stage = task.mode.label(),
                library = task.library.id,
                scenario = task.scenario.id,
                "[{}/{}] running",
                index + 1,
                total
            );
            let outcome = runner
                .run(&invocation)
                .with_context(|| format!("{} stage for {}", task.mode.label(), task))?;
            if !outcome.success() {
                tracing::warn!(command = %invocation, "stage failed; aborting benchmark run");
                bail!(
                    "{} stage for {} failed with {}",
                    task.mode.label(),
                    task,
                    outcome.describe_status()
                );
            }
            let stdout = match String::from_utf8(outcome.stdout) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(command = %invocation, "stage output is not UTF-8; aborting benchmark run");
                    bail!(
                        "{} stage for {} produced output that is not valid UTF-8 ({})",
                        task.mode.label(),
                        task,
                        err.utf8_error()
                    );
                }
            };
            outputs.push(TaggedOutput {
                mode: task.mode,
                library: task.library.id.to_string(),
                scenario: task.scenario.id.to_string(),
                stdout,
            });
        }
        Ok(outputs)
    }
}
