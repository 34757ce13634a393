//! Command-line and environment configuration.
//!
//! Every flag has an environment variable so the binary can run unchanged as a
//! workflow step, a container entrypoint, or by hand.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use github::{CredentialSettings, DEFAULT_API_URL};
use orchestrator::{ConflictPolicy, OrchestratorSettings};
use provisioning::{CollaboratorRole, CreateOptions};
use secrecy::SecretString;

/// Provision a repository from a template for the user who opened an issue.
#[derive(Parser)]
#[command(name = "repo-provisioner")]
#[command(version, about, long_about = None)]
pub struct CliConfig {
    /// Name of the repository to create
    #[arg(long, env = "REPO_NAME")]
    pub repo_name: String,

    /// Template repository name (defaults to the issue title)
    #[arg(long, env = "REPO_TEMPLATE")]
    pub repo_template: Option<String>,

    /// Owner of the template repository (defaults to the organization)
    #[arg(long, env = "TEMPLATE_OWNER")]
    pub template_owner: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Personal access token; takes precedence over app credentials
    #[arg(long = "token", env = "GITHUB_PAT", hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub App id
    #[arg(long, env = "GITHUB_APP_ID")]
    pub app_id: Option<String>,

    /// GitHub App private key (PEM)
    #[arg(long, env = "GITHUB_APP_PRIVATE_KEY", hide_env_values = true)]
    pub app_private_key: Option<String>,

    /// GitHub App installation id
    #[arg(long, env = "GITHUB_APP_INSTALLATION_ID")]
    pub app_installation_id: Option<String>,

    /// Path to the triggering issue event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: PathBuf,

    /// Copy every branch of the template
    #[arg(long, env = "INCLUDE_ALL_BRANCHES")]
    pub include_all_branches: bool,

    /// Create a private repository instead of a public one
    #[arg(long, env = "REPO_PRIVATE")]
    pub private: bool,

    /// How a name conflict at creation time is reported
    #[arg(long, env = "CONFLICT_POLICY", value_enum, default_value_t = ConflictMode::Fail)]
    pub conflict_policy: ConflictMode,

    /// Enable debug logging (`RUNNER_DEBUG=1` on GitHub runners)
    #[arg(long, env = "RUNNER_DEBUG")]
    pub debug: bool,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConflictMode {
    /// Fail the run and leave the request open
    Fail,
    /// Report the repository as already existing
    TreatAsExisting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl CliConfig {
    /// Orchestrator settings derived from the flags.
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            create_options: CreateOptions {
                include_all_branches: self.include_all_branches,
                private: self.private,
            },
            grant_role: CollaboratorRole::Admin,
            conflict_policy: match self.conflict_policy {
                ConflictMode::Fail => ConflictPolicy::Fail,
                ConflictMode::TreatAsExisting => ConflictPolicy::TreatAsExisting,
            },
        }
    }

    /// Credential material for strategy selection.
    pub fn credential_settings(&self) -> CredentialSettings {
        CredentialSettings {
            token: self.token.clone().map(SecretString::from),
            app_id: self.app_id.clone(),
            app_private_key: self.app_private_key.clone().map(SecretString::from),
            app_installation_id: self.app_installation_id.clone(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
