//! Targets that exist regardless of the benchmark matrix: the code
//! generator, its unit tests, the library tests and the shared benchmark
//! objects.

use super::{BuildEdge, ManifestBuilder, Rule};
use crate::matrix::{BENCHMARK_SCHEMA_HEADERS, EXECUTOR_OBJECT, MEMORY_REPORTER};

const CPPFLAGS: &str = "-std=c++17 -fPIC -O3 -I out -I . -I third_party";

const CODEGEN: &str = "out/jc";
const HEXDUMP: &str = "out/lib/HexDump";
const LIB_COMMON_HEADER: &str = "out/lib/LibCommonDef.hpp";
const CATCH_MAIN: &str = "out/tests/CatchMain.o";

pub const CONFORMANCE_CHECKER: &str = "out/tests/JsonSkipConformanceChecker";

const CODEGEN_UNITS: &[&str] = &["Attributes", "CodeGenerator", "FieldParser", "Main", "Parser", "Tokenizer"];

const CODEGEN_TESTS: &[&str] = &["TestAttributes", "TestFieldParser", "TestTemplateArgs", "TestUtil"];

/// Library test binaries and the translation units linked into each.
const LIBRARY_TESTS: &[(&str, &[&str])] = &[
    ("Main", &["Main"]),
    ("ReservedObjectSizes", &["ReservedObjectSizes"]),
    ("MultipleSchemas", &["MultipleSchemas", "MultipleSchemas2"]),
    ("SerializeObjectTests", &["SerializeObjectTests"]),
    ("NamespaceTests", &["NamespaceTests"]),
    ("LibTests", &["LibTests"]),
    ("SerializeTests", &["SerializeTests"]),
    ("ConformanceDouble", &["ConformanceDouble"]),
    ("StringAllocations", &["StringAllocations"]),
    ("ReservedSizes", &["ReservedSizes"]),
    ("Utf8StressTest", &["Utf8StressTest"]),
];

const TEST_SCHEMAS: &[&str] = &["Schema1", "Schema2", "SchemaNS"];

const THIRD_PARTY: &[(&str, &str)] = &[
    ("out/third_party/jsoncpp.o", "third_party/jsoncpp.cpp"),
    (
        "out/third_party/staticjson/staticjson.o",
        "third_party/staticjson/staticjson.cpp",
    ),
];

/// Test binaries run by `run-tests`, in execution order.
pub const TEST_BINARIES: &[&str] = &[
    "out/src/TestAttributes",
    "out/src/TestFieldParser",
    "out/src/TestTemplateArgs",
    "out/src/TestUtil",
    "out/tests/Main",
    "out/tests/ReservedObjectSizes",
    "out/tests/MultipleSchemas",
    "out/tests/SerializeObjectTests",
    "out/tests/NamespaceTests",
    "out/tests/LibTests",
    "out/tests/SerializeTests",
    "out/tests/ConformanceDouble",
    "out/tests/StringAllocations",
    "out/tests/ReservedSizes",
    "out/tests/Utf8StressTest",
];

fn compile(object: impl Into<String>, source: impl Into<String>) -> BuildEdge {
    BuildEdge::new(object, "compile").input(source)
}

fn codegen(header: &str, schema: &str) -> BuildEdge {
    BuildEdge::new(header, "jc").input(schema).order_only([CODEGEN])
}

pub fn emit_skeleton(b: &mut ManifestBuilder) {
    b.variable("cppflags", CPPFLAGS)
        .variable("extra_cppflags", "")
        .variable("linkflags", "")
        .blank();

    b.rule(Rule::new("compile", "g++ -MMD -MF $out.d $cppflags $extra_cppflags -c $in -o $out").with_depfile("$out.d"))
        .rule(Rule::new("link", "g++ $linkflags $in -o $out"))
        .rule(Rule::new("hexdump", format!("{HEXDUMP} < $in > $out")))
        .rule(Rule::new("jc", format!("{CODEGEN} --in $in --out $out")))
        .rule(Rule::new("compile_so", "g++ -fPIC -shared -g -o $out $in -ldl"))
        .blank();

    b.comment("Code generator")
        .edge(compile("out/lib/HexDump.o", "lib/HexDump.cpp"))
        .edge(BuildEdge::new(HEXDUMP, "link").input("out/lib/HexDump.o"))
        .edge(
            BuildEdge::new(LIB_COMMON_HEADER, "hexdump")
                .input("lib/Common.hpp")
                .order_only([HEXDUMP]),
        );
    for unit in CODEGEN_UNITS {
        let mut edge = compile(format!("out/src/{unit}.o"), format!("src/{unit}.cpp"));
        if *unit == "CodeGenerator" {
            edge = edge.order_only([LIB_COMMON_HEADER]);
        }
        b.edge(edge);
    }
    b.edge(BuildEdge::new(CODEGEN, "link").inputs(CODEGEN_UNITS.iter().map(|unit| format!("out/src/{unit}.o"))))
        .blank();

    // Unit tests link every code generator object except its entry point.
    b.comment("Code generator tests")
        .edge(compile(CATCH_MAIN, "tests/CatchMain.cpp"));
    let codegen_objects: Vec<String> = CODEGEN_UNITS
        .iter()
        .filter(|unit| **unit != "Main")
        .map(|unit| format!("out/src/{unit}.o"))
        .collect();
    for test in CODEGEN_TESTS {
        b.edge(compile(format!("out/src/{test}.o"), format!("src/{test}.cpp")));
        b.edge(
            BuildEdge::new(format!("out/src/{test}"), "link")
                .input(CATCH_MAIN)
                .input(format!("out/src/{test}.o"))
                .inputs(codegen_objects.iter().cloned()),
        );
    }
    b.blank();

    b.comment("Library tests");
    for schema in TEST_SCHEMAS {
        b.edge(codegen(
            &format!("out/tests/{schema}.gen.hpp"),
            &format!("tests/{schema}.json.hpp"),
        ));
    }
    for (binary, units) in LIBRARY_TESTS {
        for unit in *units {
            b.edge(compile(format!("out/tests/{unit}.o"), format!("tests/{unit}.cpp")));
        }
        b.edge(
            BuildEdge::new(format!("out/tests/{binary}"), "link")
                .input(CATCH_MAIN)
                .inputs(units.iter().map(|unit| format!("out/tests/{unit}.o"))),
        );
    }
    b.edge(compile(
        format!("{CONFORMANCE_CHECKER}.o"),
        "tests/JsonSkipConformanceChecker.cpp",
    ))
    .edge(BuildEdge::new(CONFORMANCE_CHECKER, "link").input(format!("{CONFORMANCE_CHECKER}.o")))
    .blank();

    b.comment("Benchmark support");
    for header in BENCHMARK_SCHEMA_HEADERS {
        let schema = header
            .trim_start_matches("out/")
            .trim_end_matches(".gen.hpp")
            .to_string();
        b.edge(codegen(header, &format!("{schema}.json.hpp")));
    }
    b.edge(BuildEdge::new(MEMORY_REPORTER, "compile_so").input("benchmark/BenchmarkMemoryReporter.cpp"))
        .edge(compile(EXECUTOR_OBJECT, "benchmark/Executor.cpp"));
    for (object, source) in THIRD_PARTY {
        b.edge(compile(*object, *source));
    }
    b.blank();
}
