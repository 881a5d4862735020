//! Static description of the benchmark matrix.
//!
//! Scenarios and libraries are declared once here and every downstream
//! consumer (manifest assembly, the benchmark harness, report layout) walks
//! them in declaration order, so the generated manifest and rendered tables
//! stay stable from run to run.

use std::fmt;

/// Divisor applied to a scenario's repeat count for the speed stage.
pub const SPEED_REPEAT_DIVISOR: u64 = 15;

/// Directory every benchmark artifact is written to.
pub const BENCHMARK_OUT_DIR: &str = "out/benchmark";

/// Shared executor object linked into every benchmark binary.
pub const EXECUTOR_OBJECT: &str = "out/benchmark/Executor.o";

/// Allocation tracker injected into memory-stage runs.
pub const MEMORY_REPORTER: &str = "out/benchmark/memory_reporter.so";

/// Generated schema headers the code-generated library depends on.
pub const BENCHMARK_SCHEMA_HEADERS: &[&str] = &[
    "out/benchmark/schema/RedditListing.gen.hpp",
    "out/benchmark/schema/OMDB.gen.hpp",
    "out/benchmark/schema/StackOverflow.gen.hpp",
    "out/benchmark/schema/TFL.gen.hpp",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    pub id: &'static str,
    /// Input payload, relative to the benchmark data root.
    pub input: &'static str,
    pub repeat_count: u64,
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Library {
    pub id: &'static str,
    pub extra_objects: &'static [&'static str],
    /// Generated headers that must exist before compiling, without being inputs.
    pub generated_headers: &'static [&'static str],
    pub url: &'static str,
    pub highlight: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BenchmarkMode {
    Check,
    Speed,
    Memory,
}

impl BenchmarkMode {
    pub const ALL: [BenchmarkMode; 3] = [BenchmarkMode::Check, BenchmarkMode::Speed, BenchmarkMode::Memory];

    /// Modes that produce a measurement in the results file.
    pub const REPORTED: [BenchmarkMode; 2] = [BenchmarkMode::Speed, BenchmarkMode::Memory];

    /// Suffix used in artifact names.
    pub fn id(self) -> &'static str {
        match self {
            BenchmarkMode::Check => "check",
            BenchmarkMode::Speed => "speed",
            BenchmarkMode::Memory => "memory",
        }
    }

    pub fn define(self) -> &'static str {
        match self {
            BenchmarkMode::Check => "-DBENCHMARK_CHECK_CORRECTNESS",
            BenchmarkMode::Speed => "-DBENCHMARK_SPEED",
            BenchmarkMode::Memory => "-DBENCHMARK_MEMORY",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BenchmarkMode::Check => "Correctness",
            BenchmarkMode::Speed => "Speed",
            BenchmarkMode::Memory => "Memory",
        }
    }

    /// Identifier in the results file; `None` for modes that are never reported.
    pub fn report_id(self) -> Option<&'static str> {
        match self {
            BenchmarkMode::Check => None,
            BenchmarkMode::Speed => Some("benchmark_speed"),
            BenchmarkMode::Memory => Some("benchmark_memory"),
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            BenchmarkMode::Check => "Passed",
            BenchmarkMode::Speed => "Runtime (seconds)",
            BenchmarkMode::Memory => "Memory Allocations (bytes)",
        }
    }

    pub fn from_report_id(raw: &str) -> Option<Self> {
        Self::REPORTED.into_iter().find(|mode| mode.report_id() == Some(raw))
    }
}

impl fmt::Display for BenchmarkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

pub fn speed_iterations(repeat_count: u64) -> u64 {
    repeat_count / SPEED_REPEAT_DIVISOR
}

/// One cell of the matrix: a library benchmarked on a scenario in a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task<'a> {
    pub library: &'a Library,
    pub scenario: &'a Scenario,
    pub mode: BenchmarkMode,
}

impl<'a> Task<'a> {
    pub fn new(library: &'a Library, scenario: &'a Scenario, mode: BenchmarkMode) -> Self {
        Self {
            library,
            scenario,
            mode,
        }
    }

    pub fn binary_path(&self) -> String {
        format!(
            "{}/bin_{}_{}_{}",
            BENCHMARK_OUT_DIR,
            self.library.id,
            self.scenario.id,
            self.mode.id()
        )
    }

    pub fn object_path(&self) -> String {
        format!("{}.o", self.binary_path())
    }

    pub fn source_path(&self) -> String {
        format!("benchmark/{}/impl_{}.cpp", self.scenario.id, self.library.id)
    }

    /// Positional argument handed to the benchmark binary for this stage.
    pub fn stage_argument(&self) -> u64 {
        match self.mode {
            BenchmarkMode::Speed => speed_iterations(self.scenario.repeat_count),
            BenchmarkMode::Check | BenchmarkMode::Memory => 1,
        }
    }
}

impl fmt::Display for Task<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "library `{}` x scenario `{}` ({})",
            self.library.id,
            self.scenario.id,
            self.mode.id()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    scenarios: Vec<Scenario>,
    libraries: Vec<Library>,
}

impl Matrix {
    pub fn new(scenarios: Vec<Scenario>, libraries: Vec<Library>) -> Self {
        Self { scenarios, libraries }
    }

    /// The suite as shipped: four scenarios against six libraries.
    pub fn standard() -> Self {
        Self::new(STANDARD_SCENARIOS.to_vec(), STANDARD_LIBRARIES.to_vec())
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn libraries(&self) -> &[Library] {
        &self.libraries
    }

    pub fn scenario(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|sc| sc.id == id)
    }

    pub fn library(&self, id: &str) -> Option<&Library> {
        self.libraries.iter().find(|lib| lib.id == id)
    }

    /// Scenario-major walk, the order build edges are emitted in.
    pub fn pairs_by_scenario(&self) -> impl Iterator<Item = (&Library, &Scenario)> + '_ {
        self.scenarios
            .iter()
            .flat_map(move |sc| self.libraries.iter().map(move |lib| (lib, sc)))
    }

    /// Library-major walk, the order the benchmark harness executes in.
    pub fn pairs_by_library(&self) -> impl Iterator<Item = (&Library, &Scenario)> + '_ {
        self.libraries
            .iter()
            .flat_map(move |lib| self.scenarios.iter().map(move |sc| (lib, sc)))
    }

    /// Every task in manifest order.
    pub fn tasks(&self) -> impl Iterator<Item = Task<'_>> + '_ {
        self.pairs_by_scenario().flat_map(|(lib, sc)| {
            BenchmarkMode::ALL
                .into_iter()
                .map(move |mode| Task::new(lib, sc, mode))
        })
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::standard()
    }
}

static STANDARD_SCENARIOS: &[Scenario] = &[
    Scenario {
        id: "scenario1",
        input: "data/reddit_front.json",
        repeat_count: 5000,
        title: "Scenario 1 (Reddit)",
        description: "Parsing a large JSON when only specific fields are of interest. In this scenario, \
                      Reddit front page JSON (size: 82K) is parsed while only post URL and scores are \
                      extracted. Besides QuantumJson and StaticJSON, libraries parse the full JSON.",
    },
    Scenario {
        id: "scenario2",
        input: "data/omdb_frozen.json",
        repeat_count: 300_000,
        title: "Scenario 2 (OMDB)",
        description: "A JSON from OMDB (size: 1K) is parsed. OMDB API is using strings for every value, \
                      so this benchmark measures only string parsing performance.",
    },
    Scenario {
        id: "scenario3",
        input: "data/stackoverflow_users.json",
        repeat_count: 14_000,
        title: "Scenario 3 (StackOverflow)",
        description: "StackOverflow top users JSON (size: 44K)",
    },
    Scenario {
        id: "scenario4",
        input: "data/tfl_accident_stats_2015.json",
        repeat_count: 15,
        title: "Scenario 4 (TFL)",
        description: "TFL accident statistics for 2015 (tfl_accident_stats_2015.json).",
    },
];

static STANDARD_LIBRARIES: &[Library] = &[
    Library {
        id: "nlohmann_json",
        extra_objects: &[],
        generated_headers: &[],
        url: "https://github.com/nlohmann/json",
        highlight: false,
    },
    Library {
        id: "quantumjson",
        extra_objects: &[],
        generated_headers: BENCHMARK_SCHEMA_HEADERS,
        url: "https://github.com/mserdarsanli/QuantumJson",
        highlight: true,
    },
    Library {
        id: "jsoncpp",
        extra_objects: &["out/third_party/jsoncpp.o"],
        generated_headers: &[],
        url: "https://github.com/open-source-parsers/jsoncpp",
        highlight: false,
    },
    Library {
        id: "rapidjson",
        extra_objects: &[],
        generated_headers: &[],
        url: "https://github.com/miloyip/rapidjson",
        highlight: false,
    },
    Library {
        id: "staticjson",
        extra_objects: &["out/third_party/staticjson/staticjson.o"],
        generated_headers: &[],
        url: "https://github.com/netheril96/StaticJSON",
        highlight: false,
    },
    Library {
        id: "boost_pt",
        extra_objects: &[],
        generated_headers: &[],
        url: "http://www.boost.org/doc/libs/release/libs/property_tree/",
        highlight: false,
    },
];
