//! Ask command - explanation plus chart for one question

use std::path::PathBuf;

use anyhow::Result;

use healthlens::{
    AiConfig, AudienceProfile, ExplanationResult, Pipeline, PipelineOutcome, PipelineRequest,
};

use crate::cli::{interactive, report, OutputFormat};
use crate::ui::{Printer, RequestSpinner};

/// Arguments of `healthlens ask`
#[derive(Debug, Clone)]
pub struct AskArgs {
    pub question: String,
    pub audience: AudienceProfile,
    pub chart: bool,
    pub chart_out: Option<PathBuf>,
    pub interactive: bool,
    pub format: OutputFormat,
}

pub async fn run(config: &AiConfig, args: AskArgs) -> Result<()> {
    let printer = Printer::new();
    let pipeline = Pipeline::new(config)?;

    let mut request = PipelineRequest::new(&args.question, args.audience)?;
    if !args.chart {
        request = request.without_chart();
    }

    tracing::info!(
        "Asking {} ({}) for age {}, {}, {}",
        config.provider,
        config.model,
        args.audience.age,
        args.audience.education,
        args.audience.tone
    );

    let mut spinner = RequestSpinner::new(printer.mode());
    if args.format == OutputFormat::Text {
        spinner.start(if args.chart {
            "Writing explanation and chart..."
        } else {
            "Writing explanation..."
        });
    }
    let outcome = pipeline.run(request).await;
    spinner.finish();

    let response = match outcome {
        PipelineOutcome::Completed(response) => response,
        PipelineOutcome::Superseded => {
            printer.info("Request was replaced by a newer one");
            return Ok(());
        }
    };

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            if let (Some(chart), Some(path)) = (&response.chart, args.chart_out.as_deref()) {
                report::save_svg(chart, path)?;
            }
        }
        OutputFormat::Text => {
            report::print_response(&printer, &response, args.chart_out.as_deref())?;
        }
    }

    let explanation_failed = response.explanation.is_err();
    let chart_failed = response.chart.as_ref().map_or(true, |c| !c.is_success());
    if explanation_failed && chart_failed {
        anyhow::bail!("No explanation or chart could be generated");
    }

    if args.interactive && args.format == OutputFormat::Text {
        let subtopics = response
            .explanation
            .map(ExplanationResult::into_subtopics)
            .unwrap_or_default();
        interactive::deeper_dive_loop(
            &pipeline,
            &printer,
            args.audience,
            subtopics,
            args.chart_out.as_deref(),
        )
        .await?;
    }

    Ok(())
}
