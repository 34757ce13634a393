//! GitHub infrastructure adapter.
//!
//! Implements the ports defined in the [`provisioning`] crate
//! ([`provisioning::RepositoryClient`], [`provisioning::NotificationChannel`])
//! over the GitHub REST API using `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! All GitHub API details (authentication, status-code classification, payload
//! shapes) are handled here; the orchestrator never sees them.
//!
//! ## Authentication
//!
//! Requests are authorised by a [`CredentialProvider`] chosen from
//! configuration by [`CredentialSettings::provider`]: a personal access token
//! when one is configured, otherwise a GitHub App installation token.

pub mod auth;
pub mod client;
pub mod errors;

pub use auth::{
    AppInstallationTokenProvider, CredentialProvider, CredentialSettings, StaticTokenProvider,
};
pub use client::{http_client, GithubClient, DEFAULT_API_URL};

/// GitHub REST API version sent with every request.
pub(crate) const API_VERSION: &str = "2022-11-28";

/// `User-Agent` header; GitHub rejects requests without one.
pub(crate) const USER_AGENT: &str = concat!("repo-provisioner/", env!("CARGO_PKG_VERSION"));
