//! Sequential drivers for the compiled test and benchmark binaries.
//!
//! Every external call goes through a [`ProcessRunner`] and blocks until the
//! child exits; nothing here runs two processes at once. Both runners share
//! [`StageOutcome`] as their per-invocation result so exit statuses are
//! checked the same way everywhere.

mod bench;
mod process;
mod suite;

#[cfg(test)]
mod harness_test;

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use anyhow::Result;

pub use bench::{BenchmarkHarness, TaggedOutput};
pub use process::SystemRunner;
pub use suite::{FixtureExpectation, TestEntry, TestReport, TestSuite};

/// Environment variable used to inject the allocation tracker.
pub const PRELOAD_VAR: &str = "LD_PRELOAD";

/// One blocking process call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// File fed to the child's standard input.
    pub stdin: Option<PathBuf>,
    pub env: Vec<(String, OsString)>,
    pub env_remove: Vec<String>,
    /// Capture standard output instead of streaming it to ours.
    pub capture: bool,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            env: Vec::new(),
            env_remove: Vec::new(),
            capture: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn stdin_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Some(path.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }

    pub fn capture_stdout(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn sets_env(&self, key: &str) -> bool {
        self.env.iter().any(|(k, _)| k == key)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, value.to_string_lossy())?;
        }
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        if let Some(stdin) = &self.stdin {
            write!(f, " < {}", stdin.display())?;
        }
        Ok(())
    }
}

/// Result of a process that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageOutcome {
    /// Exit code, `None` when the child was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
}

impl StageOutcome {
    pub fn exited(code: i32) -> Self {
        Self {
            code: Some(code),
            stdout: Vec::new(),
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<Vec<u8>>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn describe_status(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "termination by signal".to_string(),
        }
    }
}

/// Executes invocations; `Err` means the process could not be run to
/// completion (spawn failure, timeout), not that it exited non-zero.
pub trait ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<StageOutcome>;
}
