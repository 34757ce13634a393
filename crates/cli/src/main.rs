//! repo-provisioner entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: flags with environment fallbacks ([`config`]).
//! 2. **Wire observability**: `tracing-subscriber` text/JSON output plus an
//!    optional OpenTelemetry OTLP exporter ([`telemetry`]).
//! 3. **Build the request**: read the triggering issue event and combine it
//!    with configuration into a [`provisioning::ProvisioningRequest`].
//! 4. **Construct infrastructure**: pick the credential strategy, create the
//!    [`github::GithubClient`] and inject it into the
//!    [`orchestrator::ProvisioningOrchestrator`].
//! 5. **Report**: map the terminal result onto the process exit code
//!    ([`outcome`]).

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use github::GithubClient;
use listener::{IssueEvent, RequestContextBuilder};
use orchestrator::ProvisioningOrchestrator;
use provisioning::ProvisioningResult;
use tracing::{error, info};

mod config;
mod outcome;
mod telemetry;

use config::CliConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let config = CliConfig::parse();

    let telemetry = match telemetry::init(config.log_format, config.debug) {
        Ok(t) => t,
        Err(err) => {
            outcome::surface_failure(&format!("{err:#}"));
            return ExitCode::from(outcome::EXIT_INVALID_INPUT);
        }
    };

    let code = match run(config).await {
        Ok(result) => {
            if let ProvisioningResult::Failed(info) = &result {
                outcome::surface_failure(&info.message);
            }
            if let Ok(json) = serde_json::to_string(&result) {
                info!(result = %json, "Provisioning complete");
            }
            outcome::exit_code(&result)
        }
        Err(err) => {
            error!(error = %format!("{err:#}"), "Provisioning could not start");
            outcome::surface_failure(&format!("{err:#}"));
            ExitCode::from(outcome::EXIT_INVALID_INPUT)
        }
    };

    telemetry.shutdown();
    code
}

/// Builds everything the run needs and drives it to a terminal result.
///
/// Errors here happen before the orchestrator starts and therefore are never
/// posted on the request thread.
async fn run(config: CliConfig) -> Result<ProvisioningResult> {
    let event = IssueEvent::from_file(&config.event_path)
        .await
        .context("failed to load the triggering event")?;

    let request = RequestContextBuilder::new()
        .target_repo_name(config.repo_name.clone())
        .template_repo_name(config.repo_template.clone())
        .template_owner(config.template_owner.clone())
        .build(&event)?;

    let http = github::http_client()?;
    let credentials = config
        .credential_settings()
        .provider(&config.api_url, http.clone())?;
    info!(
        strategy = credentials.name(),
        api_url = %config.api_url,
        "Resolved GitHub credentials"
    );

    let client = Arc::new(GithubClient::new(
        http,
        config.api_url.clone(),
        request.organization().clone(),
        credentials,
    ));
    let orchestrator = ProvisioningOrchestrator::with_settings(
        client.clone(),
        client,
        config.orchestrator_settings(),
    );

    Ok(orchestrator.run(request).await)
}
