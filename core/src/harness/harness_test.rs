#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::path::PathBuf;

    use anyhow::{Result, anyhow};

    use crate::harness::*;
    use crate::matrix::{BenchmarkMode, Library, Matrix, Scenario};
    use crate::settings::{BenchmarkSettings, TestSettings};

    /// Records invocations and replays canned outcomes (success when empty).
    #[derive(Default)]
    struct ScriptedRunner {
        seen: Vec<Invocation>,
        outcomes: VecDeque<Result<StageOutcome>>,
    }

    impl ScriptedRunner {
        fn failing_at(index: usize, code: i32) -> Self {
            let mut outcomes: VecDeque<Result<StageOutcome>> =
                (0..index).map(|_| Ok(StageOutcome::exited(0))).collect();
            outcomes.push_back(Ok(StageOutcome::exited(code)));
            Self {
                seen: Vec::new(),
                outcomes,
            }
        }
    }

    impl ProcessRunner for ScriptedRunner {
        fn run(&mut self, invocation: &Invocation) -> Result<StageOutcome> {
            self.seen.push(invocation.clone());
            self.outcomes
                .pop_front()
                .unwrap_or_else(|| Ok(StageOutcome::exited(0).with_stdout(format!("{}\n", self.seen.len()))))
        }
    }

    fn small_matrix() -> Matrix {
        let scenario = |id, repeat_count| Scenario {
            id,
            input: "data/in.json",
            repeat_count,
            title: id,
            description: "",
        };
        let library = |id| Library {
            id,
            extra_objects: &[],
            generated_headers: &[],
            url: "",
            highlight: false,
        };
        Matrix::new(
            vec![scenario("s1", 5000), scenario("s2", 15)],
            vec![library("liba"), library("libb")],
        )
    }

    #[test]
    fn benchmark_plan_runs_stages_in_order_per_pair() {
        let matrix = small_matrix();
        let harness = BenchmarkHarness::new(&matrix, &BenchmarkSettings::default());
        let plan = harness.plan();
        assert_eq!(plan.len(), 2 * 2 * 3);

        let order: Vec<_> = plan
            .iter()
            .map(|(task, _)| (task.library.id, task.scenario.id, task.mode))
            .collect();
        assert_eq!(order[0], ("liba", "s1", BenchmarkMode::Check));
        assert_eq!(order[1], ("liba", "s1", BenchmarkMode::Speed));
        assert_eq!(order[2], ("liba", "s1", BenchmarkMode::Memory));
        assert_eq!(order[3], ("liba", "s2", BenchmarkMode::Check));
        assert_eq!(order[6], ("libb", "s1", BenchmarkMode::Check));
    }

    #[test]
    fn stage_invocations_carry_argument_input_and_preload_isolation() {
        let matrix = small_matrix();
        let settings = BenchmarkSettings::default();
        let harness = BenchmarkHarness::new(&matrix, &settings);
        let plan = harness.plan();

        let (_, check) = &plan[0];
        let (_, speed) = &plan[1];
        let (_, memory) = &plan[2];

        assert_eq!(check.program, PathBuf::from("out/benchmark/bin_liba_s1_check"));
        assert_eq!(check.args, vec!["1"]);
        assert_eq!(speed.args, vec!["333"]);
        assert_eq!(memory.args, vec!["1"]);
        assert_eq!(plan[4].1.args, vec!["1"], "15 / 15 for s2");

        for (_, inv) in &plan {
            assert_eq!(inv.stdin.as_deref(), Some(PathBuf::from("benchmark/data/in.json").as_path()));
            assert!(inv.capture);
        }

        assert!(memory.sets_env(PRELOAD_VAR));
        assert_eq!(
            memory.env,
            vec![(PRELOAD_VAR.to_string(), settings.preload_module.clone().into_os_string())]
        );
        for inv in [check, speed] {
            assert!(!inv.sets_env(PRELOAD_VAR));
            assert_eq!(inv.env_remove, vec![PRELOAD_VAR.to_string()]);
        }
    }

    #[test]
    fn benchmark_run_collects_tagged_output() {
        let matrix = small_matrix();
        let harness = BenchmarkHarness::new(&matrix, &BenchmarkSettings::default());
        let mut runner = ScriptedRunner::default();
        let outputs = harness.run(&mut runner).expect("all stages succeed");

        assert_eq!(outputs.len(), 12);
        assert_eq!(runner.seen.len(), 12);
        assert_eq!(outputs[1].mode, BenchmarkMode::Speed);
        assert_eq!(outputs[1].library, "liba");
        assert_eq!(outputs[1].scenario, "s1");
        assert_eq!(outputs[1].to_string(), "Speed liba s1 2");
    }

    #[test]
    fn benchmark_run_halts_on_first_failure() {
        let matrix = small_matrix();
        let harness = BenchmarkHarness::new(&matrix, &BenchmarkSettings::default());
        let mut runner = ScriptedRunner::failing_at(4, 3);
        let err = harness.run(&mut runner).unwrap_err();

        assert_eq!(runner.seen.len(), 5, "no invocation after the failing stage");
        let message = err.to_string();
        assert!(message.contains("Speed stage"), "{}", message);
        assert!(message.contains("library `liba` x scenario `s2`"), "{}", message);
        assert!(message.contains("exit code 3"), "{}", message);
    }

    #[test]
    fn benchmark_run_halts_on_spawn_error() {
        let matrix = small_matrix();
        let harness = BenchmarkHarness::new(&matrix, &BenchmarkSettings::default());
        let mut runner = ScriptedRunner::default();
        runner.outcomes.push_back(Err(anyhow!("no such file")));
        let err = harness.run(&mut runner).unwrap_err();
        assert_eq!(runner.seen.len(), 1);
        assert!(format!("{:#}", err).contains("no such file"));
    }

    fn suite() -> TestSuite {
        TestSuite::new(&TestSettings {
            fixture_dir: PathBuf::from("fixtures"),
            pass_fixtures: 2,
            fail_fixtures: 3,
        })
        .with_binaries(vec![PathBuf::from("out/tests/A"), PathBuf::from("out/tests/B")])
    }

    #[test]
    fn benchmark_run_rejects_non_utf8_output() {
        let matrix = small_matrix();
        let harness = BenchmarkHarness::new(&matrix, &BenchmarkSettings::default());
        let mut runner = ScriptedRunner::default();
        runner.outcomes = VecDeque::from(vec![
            Ok(StageOutcome::exited(0).with_stdout(b"ok\n".to_vec())),
            Ok(StageOutcome::exited(0).with_stdout(b"\xff0.25\n".to_vec())),
        ]);
        let err = harness.run(&mut runner).unwrap_err();

        assert_eq!(runner.seen.len(), 2, "no invocation after the undecodable stage");
        let message = err.to_string();
        assert!(message.contains("Speed stage"), "{}", message);
        assert!(message.contains("library `liba` x scenario `s1`"), "{}", message);
        assert!(message.contains("not valid UTF-8"), "{}", message);
    }

    #[test]
    fn test_plan_lists_binaries_then_fixtures() {
        let plan = suite().plan();
        let rendered: Vec<_> = plan.iter().map(|(inv, _)| inv.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "out/tests/A",
                "out/tests/B",
                "out/tests/JsonSkipConformanceChecker --pass fixtures/pass1.json",
                "out/tests/JsonSkipConformanceChecker --pass fixtures/pass2.json",
                "out/tests/JsonSkipConformanceChecker --fail fixtures/fail1.json",
                "out/tests/JsonSkipConformanceChecker --fail fixtures/fail2.json",
                "out/tests/JsonSkipConformanceChecker --fail fixtures/fail3.json",
            ]
        );
        assert_eq!(plan[0].1, None);
        assert_eq!(plan[2].1, Some(FixtureExpectation::Accept));
        assert_eq!(plan[6].1, Some(FixtureExpectation::Reject));
    }

    #[test]
    fn default_suite_runs_fifteen_binaries_and_thirty_six_fixtures() {
        let plan = TestSuite::new(&TestSettings::default()).plan();
        assert_eq!(plan.len(), 15 + 3 + 33);
        assert_eq!(plan[0].0.program, PathBuf::from("out/src/TestAttributes"));
        assert_eq!(
            plan.last().map(|(inv, _)| inv.to_string()),
            Some("out/tests/JsonSkipConformanceChecker --fail tests/json_checker_tests/fail33.json".to_string())
        );
    }

    #[test]
    fn test_run_flags_discrepancies_and_keeps_going() {
        let mut runner = ScriptedRunner::default();
        runner.outcomes = VecDeque::from(vec![
            Ok(StageOutcome::exited(0)),
            Ok(StageOutcome::exited(2)),
            Ok(StageOutcome::exited(1)),
            Ok(StageOutcome::exited(0)),
            Ok(StageOutcome::exited(0)),
            Ok(StageOutcome::exited(1)),
            Err(anyhow!("spawn failed")),
        ]);
        let report = suite().run(&mut runner);

        assert_eq!(runner.seen.len(), 7, "every step runs despite failures");
        assert!(!report.is_success());
        assert_eq!(report.failure_count(), 4);

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures[0].name, "out/tests/B");
        assert!(failures[0].failure.as_deref().unwrap().contains("exit code 2"));
        assert_eq!(failures[1].expectation, Some(FixtureExpectation::Accept));
        assert!(failures[1].failure.as_deref().unwrap().contains("valid fixture rejected"));
        assert_eq!(failures[2].expectation, Some(FixtureExpectation::Reject));
        assert!(failures[2].failure.as_deref().unwrap().contains("malformed fixture accepted"));
        assert!(failures[3].failure.as_deref().unwrap().contains("spawn failed"));

        assert!(report.to_string().ends_with("7 steps, 3 passed, 4 failed"));
    }

    #[test]
    fn clean_test_run_is_success() {
        let mut runner = ScriptedRunner::default();
        let report = suite().run(&mut runner);
        assert!(report.is_success());
        assert_eq!(report.entries.len(), 7);
    }

    #[cfg(unix)]
    mod system {
        use super::*;
        use std::io::Write;
        use std::time::Duration;

        #[test]
        fn captures_stdout_and_exit_code() {
            let mut runner = SystemRunner::new();
            let inv = Invocation::new("sh")
                .arg("-c")
                .arg("echo hello; exit 3")
                .capture_stdout();
            let outcome = runner.run(&inv).unwrap();
            assert_eq!(outcome.code, Some(3));
            assert!(!outcome.success());
            assert_eq!(outcome.stdout, b"hello\n");
        }

        #[test]
        fn captures_raw_bytes_without_decoding() {
            let mut runner = SystemRunner::new();
            let inv = Invocation::new("sh")
                .arg("-c")
                .arg("printf '\\377ok'")
                .capture_stdout();
            let outcome = runner.run(&inv).unwrap();
            assert!(outcome.success());
            assert_eq!(outcome.stdout, b"\xffok");
        }

        #[test]
        fn feeds_stdin_from_file() {
            let mut input = tempfile::NamedTempFile::new().unwrap();
            input.write_all(b"{\"a\": 1}").unwrap();
            let mut runner = SystemRunner::new();
            let inv = Invocation::new("cat").stdin_file(input.path()).capture_stdout();
            let outcome = runner.run(&inv).unwrap();
            assert!(outcome.success());
            assert_eq!(outcome.stdout, b"{\"a\": 1}");
        }

        #[test]
        fn env_is_set_and_removed_per_invocation() {
            let mut runner = SystemRunner::new();
            let probe = "printf '%s' \"${QJBENCH_PROBE-unset}\"";
            let set = Invocation::new("sh")
                .arg("-c")
                .arg(probe)
                .env("QJBENCH_PROBE", "on")
                .capture_stdout();
            assert_eq!(runner.run(&set).unwrap().stdout, b"on");

            let removed = Invocation::new("sh")
                .arg("-c")
                .arg("printf '%s' \"${CARGO_PKG_NAME-unset}\"")
                .env_remove("CARGO_PKG_NAME")
                .capture_stdout();
            assert_eq!(runner.run(&removed).unwrap().stdout, b"unset");

            let plain = Invocation::new("sh").arg("-c").arg(probe).capture_stdout();
            assert_eq!(runner.run(&plain).unwrap().stdout, b"unset");
        }

        #[test]
        fn timeout_kills_hung_child() {
            let mut runner = SystemRunner::with_timeout(Some(Duration::from_millis(200)));
            let inv = Invocation::new("sleep").arg("5").capture_stdout();
            let err = runner.run(&inv).unwrap_err();
            assert!(err.to_string().contains("did not finish"), "{}", err);
        }

        #[test]
        fn missing_program_is_an_error() {
            let mut runner = SystemRunner::new();
            let err = runner
                .run(&Invocation::new("./definitely/not/a/binary"))
                .unwrap_err();
            assert!(err.to_string().contains("failed to spawn"));
        }
    }
}
