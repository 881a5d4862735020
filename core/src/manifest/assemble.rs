use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::{BuildEdge, Manifest, ManifestBuilder, ManifestError, emit_skeleton};
use crate::matrix::{BenchmarkMode, EXECUTOR_OBJECT, Matrix, Task};

/// Skeleton followed by one compile and one link edge per matrix task.
pub fn assemble(matrix: &Matrix) -> Result<Manifest, ManifestError> {
    let mut builder = ManifestBuilder::new();
    emit_skeleton(&mut builder);

    builder.comment("Benchmark matrix");
    for (library, scenario) in matrix.pairs_by_scenario() {
        for mode in BenchmarkMode::ALL {
            let task = Task::new(library, scenario, mode);
            let origin = task.to_string();
            builder
                .edge(
                    BuildEdge::new(task.object_path(), "compile")
                        .input(task.source_path())
                        .order_only(library.generated_headers.iter().copied())
                        .variable("extra_cppflags", mode.define())
                        .origin(origin.clone()),
                )
                .edge(
                    BuildEdge::new(task.binary_path(), "link")
                        .input(task.object_path())
                        .input(EXECUTOR_OBJECT)
                        .inputs(library.extra_objects.iter().copied())
                        .origin(origin),
                );
        }
    }

    let manifest = builder.finish()?;
    tracing::info!(
        scenarios = matrix.scenarios().len(),
        libraries = matrix.libraries().len(),
        rules = manifest.rules().count(),
        edges = manifest.edges().count(),
        "assembled build manifest"
    );
    Ok(manifest)
}

/// Renders `manifest` to `path`, replacing any previous content.
pub fn write_manifest(manifest: &Manifest, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, manifest.render()).with_context(|| format!("write {}", path.display()))
}
