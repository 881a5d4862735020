use std::fmt;
use std::path::{Path, PathBuf};

use super::{Invocation, ProcessRunner};
use crate::manifest::{CONFORMANCE_CHECKER, TEST_BINARIES};
use crate::settings::TestSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureExpectation {
    /// Fixture is valid JSON and must be accepted.
    Accept,
    /// Fixture is malformed and must be rejected.
    Reject,
}

impl FixtureExpectation {
    pub fn flag(self) -> &'static str {
        match self {
            FixtureExpectation::Accept => "--pass",
            FixtureExpectation::Reject => "--fail",
        }
    }

    fn file_prefix(self) -> &'static str {
        match self {
            FixtureExpectation::Accept => "pass",
            FixtureExpectation::Reject => "fail",
        }
    }
}

/// Outcome of one step of `run-tests`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestEntry {
    pub name: String,
    pub expectation: Option<FixtureExpectation>,
    /// `None` when the step passed, otherwise what went wrong.
    pub failure: Option<String>,
}

impl TestEntry {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestReport {
    pub entries: Vec<TestEntry>,
}

impl TestReport {
    pub fn failures(&self) -> impl Iterator<Item = &TestEntry> {
        self.entries.iter().filter(|entry| !entry.passed())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.failures() {
            writeln!(f, "FAILED {}: {}", entry.name, entry.failure.as_deref().unwrap_or_default())?;
        }
        write!(
            f,
            "{} steps, {} passed, {} failed",
            self.entries.len(),
            self.entries.len() - self.failure_count(),
            self.failure_count()
        )
    }
}

/// Fixed test sequence followed by the JSON conformance fixtures.
#[derive(Debug, Clone)]
pub struct TestSuite {
    binaries: Vec<PathBuf>,
    checker: PathBuf,
    fixture_dir: PathBuf,
    pass_fixtures: u32,
    fail_fixtures: u32,
}

impl TestSuite {
    pub fn new(settings: &TestSettings) -> Self {
        Self {
            binaries: TEST_BINARIES.iter().map(PathBuf::from).collect(),
            checker: PathBuf::from(CONFORMANCE_CHECKER),
            fixture_dir: settings.fixture_dir.clone(),
            pass_fixtures: settings.pass_fixtures,
            fail_fixtures: settings.fail_fixtures,
        }
    }

    pub fn with_binaries(mut self, binaries: Vec<PathBuf>) -> Self {
        self.binaries = binaries;
        self
    }

    pub fn with_checker(mut self, checker: impl Into<PathBuf>) -> Self {
        self.checker = checker.into();
        self
    }

    /// Every invocation of the run, in order, paired with the fixture
    /// expectation for conformance checks.
    pub fn plan(&self) -> Vec<(Invocation, Option<FixtureExpectation>)> {
        let mut plan: Vec<_> = self
            .binaries
            .iter()
            .map(|binary| (Invocation::new(binary), None))
            .collect();
        for (expectation, count) in [
            (FixtureExpectation::Accept, self.pass_fixtures),
            (FixtureExpectation::Reject, self.fail_fixtures),
        ] {
            for i in 1..=count {
                let fixture = fixture_path(&self.fixture_dir, expectation, i);
                let invocation = Invocation::new(&self.checker)
                    .arg(expectation.flag())
                    .arg(fixture.into_os_string());
                plan.push((invocation, Some(expectation)));
            }
        }
        plan
    }

    /// Runs the whole sequence. Failures are recorded, never short-circuit.
    pub fn run<R: ProcessRunner>(&self, runner: &mut R) -> TestReport {
        let mut report = TestReport::default();
        for (invocation, expectation) in self.plan() {
            let name = invocation.to_string();
            let failure = match runner.run(&invocation) {
                Ok(outcome) if outcome.success() => None,
                Ok(outcome) => Some(match expectation {
                    Some(FixtureExpectation::Accept) => {
                        format!("valid fixture rejected ({})", outcome.describe_status())
                    }
                    Some(FixtureExpectation::Reject) => {
                        format!("malformed fixture accepted ({})", outcome.describe_status())
                    }
                    None => format!("test binary failed with {}", outcome.describe_status()),
                }),
                Err(err) => Some(format!("{:#}", err)),
            };
            if let Some(reason) = &failure {
                tracing::warn!(step = %name, %reason, "test step failed");
            }
            report.entries.push(TestEntry {
                name,
                expectation,
                failure,
            });
        }
        tracing::info!(
            steps = report.entries.len(),
            failed = report.failure_count(),
            "test run finished"
        );
        report
    }
}

fn fixture_path(dir: &Path, expectation: FixtureExpectation, index: u32) -> PathBuf {
    dir.join(format!("{}{}.json", expectation.file_prefix(), index))
}
