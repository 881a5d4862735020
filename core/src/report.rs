//! Markdown and HTML rendering of a complete [`ResultSet`].

use std::fmt::Write as _;

use crate::matrix::{BenchmarkMode, Library, Matrix, Scenario};
use crate::results::{Measurement, ResultKey, ResultSet};

const BAR_WIDTH_MAX: f64 = 300.0;
const HIGHLIGHT_COLOR: &str = "#0000FF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    Markdown,
    Html,
}

/// Rows and tables of a report, in declaration order.
#[derive(Debug, Clone)]
pub struct ReportLayout {
    pub scenarios: Vec<Scenario>,
    pub libraries: Vec<Library>,
    pub modes: Vec<BenchmarkMode>,
}

impl ReportLayout {
    pub fn from_matrix(matrix: &Matrix) -> Self {
        Self {
            scenarios: matrix.scenarios().to_vec(),
            libraries: matrix.libraries().to_vec(),
            modes: BenchmarkMode::REPORTED.to_vec(),
        }
    }

    pub fn key(scenario: &Scenario, library: &Library, mode: BenchmarkMode) -> ResultKey {
        ResultKey::new(scenario.id, library.id, mode.report_id().unwrap_or(mode.id()))
    }

    /// Every triple the results file must provide.
    pub fn keys(&self) -> Vec<ResultKey> {
        let mut keys = Vec::with_capacity(self.scenarios.len() * self.libraries.len() * self.modes.len());
        for sc in &self.scenarios {
            for &mode in &self.modes {
                for lib in &self.libraries {
                    keys.push(Self::key(sc, lib, mode));
                }
            }
        }
        keys
    }

    /// Bar colours: the highlighted library in blue, the rest on a purple ramp.
    pub fn colors(&self) -> Vec<String> {
        let steps = self.libraries.len().saturating_sub(1).max(1) as f64;
        let mut ramp = 0usize;
        self.libraries
            .iter()
            .map(|lib| {
                if lib.highlight {
                    HIGHLIGHT_COLOR.to_string()
                } else {
                    let level = (128.0 + 127.0 * ramp as f64 / steps).round() as u32;
                    ramp += 1;
                    format!("#{level:x}00{level:x}")
                }
            })
            .collect()
    }
}

pub fn render(target: RenderTarget, layout: &ReportLayout, results: &ResultSet) -> String {
    match target {
        RenderTarget::Markdown => render_markdown(layout, results),
        RenderTarget::Html => render_html(layout, results),
    }
}

fn rows<'a>(
    layout: &'a ReportLayout,
    results: &'a ResultSet,
    scenario: &'a Scenario,
    mode: BenchmarkMode,
) -> impl Iterator<Item = (&'a Library, Option<&'a Measurement>)> + 'a {
    layout
        .libraries
        .iter()
        .map(move |lib| (lib, results.get(&ReportLayout::key(scenario, lib, mode))))
}

pub fn render_markdown(layout: &ReportLayout, results: &ResultSet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Benchmarks");
    let _ = writeln!(out);

    for sc in &layout.scenarios {
        let _ = writeln!(out, "## {}", sc.title);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", sc.description);
        let _ = writeln!(out);

        for &mode in &layout.modes {
            let unit = mode.unit();
            let _ = writeln!(out, "| Library | {} |", unit);
            let _ = writeln!(out, "| ------- | {} |", "-".repeat(unit.len()));
            for (lib, measurement) in rows(layout, results, sc, mode) {
                let _ = writeln!(out, "| {} | {} |", lib.id, display_value(measurement));
            }
            let _ = writeln!(out);
        }
    }
    out
}

pub fn render_html(layout: &ReportLayout, results: &ResultSet) -> String {
    let colors = layout.colors();
    let mut out = String::new();
    let _ = writeln!(out, "<h1>Benchmarks</h1>");

    for sc in &layout.scenarios {
        let _ = writeln!(out, "<h2>{}</h2>", sc.title);
        let _ = writeln!(out, "{}", sc.description);

        for &mode in &layout.modes {
            let _ = writeln!(out, "<table>");
            let _ = writeln!(
                out,
                "<tr><th align=\"left\">Library</th><th align=\"left\" colspan=\"2\">{}</th></tr>",
                mode.unit()
            );

            let max = rows(layout, results, sc, mode)
                .filter_map(|(_, m)| m.map(|m| m.value))
                .fold(0.0_f64, f64::max);

            for ((lib, measurement), color) in rows(layout, results, sc, mode).zip(&colors) {
                let ratio = match measurement {
                    Some(m) if max > 0.0 => m.value / max,
                    _ => 0.0,
                };
                let _ = writeln!(
                    out,
                    "<tr><td><a href=\"{}\">{}</a></td><td align=\"right\">{}</td><td>{}</td></tr>",
                    lib.url,
                    lib.id,
                    display_value(measurement),
                    bar(ratio, color)
                );
            }
            let _ = writeln!(out, "</table>");
        }
    }
    out
}

fn bar(ratio: f64, color: &str) -> String {
    format!(
        "<div style=\"width: {}px; background-color: {};\">&#65279;</div>",
        (BAR_WIDTH_MAX * ratio).round() as u64,
        color
    )
}

// A ResultSet that passed ingestion always has every cell.
fn display_value(measurement: Option<&Measurement>) -> &str {
    measurement.map(|m| m.raw.as_str()).unwrap_or("n/a")
}
