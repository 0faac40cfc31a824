//! Chart command - chart half only

use std::path::PathBuf;

use anyhow::Result;

use healthlens::pipeline::ChartRequest;
use healthlens::{AiConfig, ChartExecutor};

use crate::cli::{report, OutputFormat};
use crate::ui::{Printer, RequestSpinner};

pub async fn run(
    config: &AiConfig,
    topic: &str,
    chart_out: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let printer = Printer::new();
    let request = ChartRequest::new(topic)?;
    let executor = ChartExecutor::new(config)?;

    let mut spinner = RequestSpinner::new(printer.mode());
    if format == OutputFormat::Text {
        spinner.start("Drawing chart...");
    }
    let result = executor.render(request.topic()).await;
    spinner.finish();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            if let Some(path) = chart_out.as_deref() {
                report::save_svg(&result, path)?;
            }
        }
        OutputFormat::Text => {
            report::print_chart(&printer, &result);
            if let Some(path) = chart_out.as_deref() {
                report::write_chart(&printer, &result, path)?;
            }
        }
    }

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
