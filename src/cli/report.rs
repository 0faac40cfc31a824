//! Text rendering of pipeline results
//!
//! Each half is printed on its own: a failed chart shows a warning under
//! a successful explanation and the reverse.

use std::path::Path;

use anyhow::{Context, Result};

use healthlens::chart::{to_svg, ChartResult, Figure, SeriesKind};
use healthlens::errors::GenerationError;
use healthlens::{ExplanationResult, PipelineResponse};

use crate::ui::Printer;

/// Print a full response and write the SVG when a path is given
pub fn print_response(
    printer: &Printer,
    response: &PipelineResponse,
    chart_out: Option<&Path>,
) -> Result<()> {
    printer.header(&response.question);
    printer.separator();
    print_explanation(printer, &response.explanation);

    if let Some(chart) = &response.chart {
        printer.newline();
        print_chart(printer, chart);
        if let Some(path) = chart_out {
            write_chart(printer, chart, path)?;
        }
    }
    Ok(())
}

pub fn print_explanation(printer: &Printer, explanation: &Result<ExplanationResult, GenerationError>) {
    match explanation {
        Ok(result) => {
            printer.paragraph(result.body());
            if result.has_subtopics() {
                printer.newline();
                printer.section("Explore further");
                for (idx, subtopic) in result.subtopics().iter().enumerate() {
                    printer.numbered(idx, subtopic);
                }
            }
            if result.metadata.response_time_ms > 0 {
                printer.newline();
                printer.dimmed(&format!(
                    "{} / {} in {}ms",
                    result.metadata.provider, result.metadata.model, result.metadata.response_time_ms
                ));
            }
        }
        Err(e) => printer.error(&format!("Explanation unavailable: {}", e)),
    }
}

pub fn print_chart(printer: &Printer, chart: &ChartResult) {
    match chart {
        ChartResult::Success { figure, caption } => {
            printer.section("Chart");
            printer.kv("Title", figure.headline().unwrap_or("(untitled)"));
            printer.kv("Elements", &describe_elements(figure));
            let (rows, cols) = figure.grid_shape();
            if rows * cols > 1 {
                printer.kv("Layout", &format!("{}x{} grid", rows, cols));
            }
            printer.newline();
            printer.dimmed(caption);
        }
        ChartResult::Failure { error } => {
            printer.warning(&format!("Chart could not be generated: {}", error));
        }
    }
}

/// Write the SVG for a successful chart and say where it went
pub fn write_chart(printer: &Printer, chart: &ChartResult, path: &Path) -> Result<()> {
    if save_svg(chart, path)? {
        printer.success(&format!("Chart written to {}", path.display()));
    }
    Ok(())
}

/// Write the SVG for a successful chart. Returns false for failures.
pub fn save_svg(chart: &ChartResult, path: &Path) -> Result<bool> {
    let Some(figure) = chart.figure() else {
        return Ok(false);
    };

    std::fs::write(path, to_svg(figure))
        .with_context(|| format!("Failed to write chart to {}", path.display()))?;
    Ok(true)
}

/// "2 line, 1 bar" style summary of the drawn series
fn describe_elements(figure: &Figure) -> String {
    let mut counts: Vec<(SeriesKind, usize)> = Vec::new();
    for series in figure
        .axes
        .iter()
        .flat_map(|a| a.series.iter())
        .filter(|s| !s.is_empty())
    {
        match counts.iter_mut().find(|(kind, _)| *kind == series.kind) {
            Some((_, n)) => *n += 1,
            None => counts.push((series.kind, 1)),
        }
    }

    counts
        .iter()
        .map(|(kind, n)| format!("{} {}", n, kind.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthlens::chart::{AxisValue, Series};

    #[test]
    fn elements_grouped_by_kind() {
        let mut figure = Figure::new();
        let axes = figure.current_axes();
        for kind in [SeriesKind::Line, SeriesKind::Bar, SeriesKind::Line] {
            axes.series
                .push(Series::new(kind, vec![AxisValue::Number(1.0)], vec![2.0]));
        }
        axes.series.push(Series::new(SeriesKind::Scatter, vec![], vec![]));

        assert_eq!(describe_elements(&figure), "2 line, 1 bar");
    }

    #[test]
    fn failed_chart_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        let chart = ChartResult::failure(healthlens::ChartError::NoVisualElement);

        assert!(!save_svg(&chart, &path).unwrap());
        assert!(!path.exists());
    }
}
