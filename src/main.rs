//! healthlens - explanations and charts about AI in health
//!
//! Command-line front end: asks a question for a given audience, prints
//! the explanation with follow-up subtopics and renders an illustrative
//! chart next to it.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use healthlens::ai::{AiProviderType, ConfigSource};
use healthlens::errors::format_error;
use healthlens::{AiConfig, AudienceProfile, EducationLevel, Tone};

mod cli;
mod ui;

use cli::commands;
use cli::commands::ask::AskArgs;
use cli::OutputFormat;

/// healthlens - AI in health, explained for you
#[derive(Parser)]
#[command(
    name = "healthlens",
    version,
    about = "Audience-tailored explanations and charts about AI in health",
    long_about = "healthlens answers questions about AI in health.\n\n\
                  Features:\n\
                  • Explanations shaped by age, education and tone\n\
                  • Up to three follow-up subtopics per answer\n\
                  • Illustrative charts drawn by sandboxed, model-written scripts\n\
                  • SVG export and JSON output"
)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a healthlens.toml config file
    #[arg(short, long, global = true, env = "HEALTHLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Model provider (overrides the config file)
    #[arg(long, global = true)]
    provider: Option<CliProvider>,

    /// Model name (overrides the config file)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Timeout for each model call in seconds
    #[arg(short, long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Provider choice on the command line
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliProvider {
    Openai,
    Anthropic,
    Ollama,
}

impl From<CliProvider> for AiProviderType {
    fn from(provider: CliProvider) -> Self {
        match provider {
            CliProvider::Openai => AiProviderType::OpenAI,
            CliProvider::Anthropic => AiProviderType::Anthropic,
            CliProvider::Ollama => AiProviderType::Ollama,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Explain a question and draw a chart about it
    Ask {
        /// The question to answer
        question: String,

        /// Reader age
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(10..=80))]
        age: u32,

        /// Education level: primary, secondary, university, phd
        #[arg(short, long, default_value = "university", value_parser = parse_education)]
        education: EducationLevel,

        /// Answer style: informative, technical
        #[arg(long, default_value = "informative", value_parser = parse_tone)]
        tone: Tone,

        /// Skip the chart
        #[arg(long)]
        no_chart: bool,

        /// Write the chart as SVG to this file
        #[arg(short = 'o', long)]
        chart_out: Option<PathBuf>,

        /// Offer the follow-up subtopics for a deeper dive
        #[arg(short, long)]
        interactive: bool,
    },

    /// Draw a chart about a topic
    Chart {
        /// The chart topic
        topic: String,

        /// Write the chart as SVG to this file
        #[arg(short = 'o', long)]
        chart_out: Option<PathBuf>,
    },

    /// Check configuration, credentials and provider reachability
    Doctor,
}

fn parse_education(s: &str) -> Result<EducationLevel, String> {
    s.parse::<EducationLevel>()
        .map_err(|e| cli::input_error_message(&e))
}

fn parse_tone(s: &str) -> Result<Tone, String> {
    s.parse::<Tone>().map_err(|e| cli::input_error_message(&e))
}

fn init_logging(verbosity: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbosity {
            0 => EnvFilter::new("healthlens=info"),
            1 => EnvFilter::new("healthlens=debug"),
            2 => EnvFilter::new("healthlens=trace"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Config file, then command-line overrides
fn resolve_config(cli: &Cli) -> Result<(AiConfig, ConfigSource)> {
    let (mut config, source) = AiConfig::load(cli.config.as_deref())?;

    if let Some(provider) = cli.provider {
        let provider = AiProviderType::from(provider);
        if provider != config.provider {
            config = config.with_provider(provider);
            config.api_key = None;
            config.load_api_key_from_env();
        }
    }
    if let Some(model) = &cli.model {
        config = config.with_model(model.clone());
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(secs);
    }

    Ok((config, source))
}

async fn run(cli: Cli) -> Result<()> {
    let (config, source) = resolve_config(&cli)?;
    tracing::debug!("Using {} ({}) from {}", config.provider, config.model, source);

    if !matches!(cli.command, Commands::Doctor) {
        if let Err(e) = config.validate() {
            eprintln!("{:?}", miette::Report::new(e));
            std::process::exit(2);
        }
    }

    match cli.command {
        Commands::Ask {
            question,
            age,
            education,
            tone,
            no_chart,
            chart_out,
            interactive,
        } => {
            let args = AskArgs {
                question,
                audience: AudienceProfile::new(age, education, tone),
                chart: !no_chart,
                chart_out,
                interactive,
                format: cli.format,
            };
            commands::ask::run(&config, args).await?;
        }
        Commands::Chart { topic, chart_out } => {
            commands::chart::run(&config, &topic, chart_out, cli.format).await?;
        }
        Commands::Doctor => {
            commands::doctor::run(&config, &source).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        ui::Printer::new().error(&format_error(&e));
        std::process::exit(1);
    }
}
