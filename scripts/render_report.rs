use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use qjbench_core::{
    matrix::Matrix,
    report::{ReportLayout, RenderTarget, render},
    results::ResultSet,
};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "qjbench-render",
    version,
    about = "Render benchmark results as a markdown or HTML report"
)]
struct RenderArgs {
    /// Tab-separated results: scenario, library, mode, value.
    #[arg(long, value_name = "FILE")]
    input_tsv: PathBuf,
    #[arg(long, value_enum)]
    render_target: TargetArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TargetArg {
    Md,
    Html,
}

impl From<TargetArg> for RenderTarget {
    fn from(value: TargetArg) -> Self {
        match value {
            TargetArg::Md => RenderTarget::Markdown,
            TargetArg::Html => RenderTarget::Html,
        }
    }
}

fn main() -> Result<()> {
    let args = RenderArgs::parse();
    let text = fs::read_to_string(&args.input_tsv)
        .with_context(|| format!("read results file {}", args.input_tsv.display()))?;

    let layout = ReportLayout::from_matrix(&Matrix::standard());
    let results = ResultSet::parse(&text, &layout)
        .with_context(|| format!("invalid results in {}", args.input_tsv.display()))?;

    print!("{}", render(args.render_target.into(), &layout, &results));
    Ok(())
}
