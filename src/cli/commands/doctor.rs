//! Doctor command - configuration and provider diagnostics

use anyhow::Result;

use healthlens::ai::ConfigSource;
use healthlens::{AiConfig, ExplanationService};

use crate::ui::{Printer, RequestSpinner};

pub async fn run(config: &AiConfig, source: &ConfigSource) -> Result<()> {
    let printer = Printer::new();

    printer.header("healthlens Environment Check");
    printer.separator();
    printer.newline();

    printer.section("Version Information");
    printer.kv("healthlens", env!("CARGO_PKG_VERSION"));
    printer.newline();

    printer.section("Configuration");
    printer.kv("Source", &source.to_string());
    printer.kv("Provider", config.provider.as_str());
    printer.kv("Model", &config.model);
    printer.kv("Timeout", &format!("{}s", config.timeout_secs));
    printer.kv(
        "Temperatures",
        &format!(
            "explanation {:.1}, chart {:.1}",
            config.explanation_temperature, config.chart_temperature
        ),
    );
    printer.kv(
        "Script limits",
        &format!(
            "{} operations, {}ms",
            config.script_limits.max_operations, config.script_limits.wall_clock_ms
        ),
    );
    printer.newline();

    printer.section("Credentials");
    let mut healthy = true;
    if !config.provider.requires_credential() {
        printer.success(&format!("{} needs no API key", config.provider));
    } else if config.has_api_key() {
        printer.success(&format!("{} is set", config.provider.env_key_name()));
    } else {
        printer.error(&format!("{} is not set", config.provider.env_key_name()));
        healthy = false;
    }
    printer.newline();

    printer.section("Provider");
    if healthy {
        healthy = check_provider(&printer, config).await;
    } else {
        printer.dimmed("  Skipped: no credential");
    }
    printer.newline();

    if healthy {
        printer.success("Environment Status: All checks passed");
    } else {
        printer.warning("Environment Status: Some checks failed");
    }

    Ok(())
}

async fn check_provider(printer: &Printer, config: &AiConfig) -> bool {
    let service = match ExplanationService::new(config) {
        Ok(service) => service,
        Err(e) => {
            printer.error(&format!("Could not create provider: {}", e));
            return false;
        }
    };

    let mut spinner = RequestSpinner::new(printer.mode());
    spinner.start(&format!("Contacting {}...", service.provider_name()));
    let result = tokio::time::timeout(config.timeout(), service.health_check()).await;
    spinner.finish();

    match result {
        Ok(Ok(true)) => {
            printer.success(&format!("{} is reachable", service.provider_name()));
            true
        }
        Ok(Ok(false)) => {
            printer.error(&format!("{} did not respond as expected", service.provider_name()));
            false
        }
        Ok(Err(e)) => {
            printer.error(&format!("{} check failed: {}", service.provider_name(), e));
            false
        }
        Err(_) => {
            printer.error(&format!(
                "{} did not answer within {}s",
                service.provider_name(),
                config.timeout_secs
            ));
            false
        }
    }
}
