//! REST implementation of the provisioning ports.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use provisioning::{
    ChannelRef, CollaboratorRole, CreateOptions, Identity, NotificationChannel, PlatformError,
    ProvisionerError, RepoIdentity, RepositoryClient, RepositoryName,
};
use reqwest::{Method, RequestBuilder, Response, Url};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::auth::CredentialProvider;
use crate::errors::{classify_response, classify_transport};
use crate::{API_VERSION, USER_AGENT};

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Builds the HTTP client shared by the REST adapter and the app token
/// exchange.
///
/// # Errors
///
/// Returns [`ProvisionerError::ConfigurationError`] if the TLS backend cannot
/// be initialised.
pub fn http_client() -> Result<reqwest::Client, ProvisionerError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|err| ProvisionerError::ConfigurationError {
            message: format!("failed to build HTTP client: {err}"),
        })
}

/// GitHub adapter for one organization.
///
/// Implements [`RepositoryClient`] for repositories under `organization` and
/// [`NotificationChannel`] for issue threads anywhere the credential can reach.
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    organization: Identity,
    credentials: Arc<dyn CredentialProvider>,
}

impl GithubClient {
    pub fn new(
        http: reqwest::Client,
        api_url: impl Into<String>,
        organization: Identity,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            api_url,
            organization,
            credentials,
        }
    }

    pub fn organization(&self) -> &Identity {
        &self.organization
    }

    /// Appends `segments` to the API base URL.
    ///
    /// Each segment is percent-encoded on its own, so `/`, `#`, `?` and `%`
    /// inside a name can never change the route. `.` and `..` are refused.
    fn url(&self, segments: &[&str]) -> Result<Url, PlatformError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(PlatformError::unknown(format!(
                "refusing to build a GitHub API path with segment '{bad}'"
            )));
        }

        let mut url = Url::parse(&self.api_url).map_err(|err| {
            PlatformError::unknown(format!("invalid GitHub API URL '{}': {err}", self.api_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                PlatformError::unknown(format!(
                    "GitHub API URL '{}' cannot carry a path",
                    self.api_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends an authenticated request and classifies any non-2xx response.
    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&impl Serialize>,
    ) -> Result<Response, PlatformError> {
        let url = self.url(segments)?;
        let token = self.credentials.access_token().await?;
        let mut request: RequestBuilder = self
            .http
            .request(method.clone(), url.clone())
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION)
            .bearer_auth(token.expose_secret());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| classify_transport(&err))?;
        let status = response.status();
        debug!(%method, path = url.path(), status = status.as_u16(), "GitHub API call");

        if status.is_success() {
            Ok(response)
        } else {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            Err(classify_response(status, &headers, &body))
        }
    }
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    owner: &'a str,
    name: &'a str,
    include_all_branches: bool,
    private: bool,
}

#[derive(Debug, Deserialize)]
struct GeneratedRepository {
    full_name: String,
    html_url: String,
}

impl From<GeneratedRepository> for RepoIdentity {
    fn from(repo: GeneratedRepository) -> Self {
        RepoIdentity {
            full_name: repo.full_name,
            url: repo.html_url,
        }
    }
}

#[derive(Debug, Serialize)]
struct CollaboratorRequest<'a> {
    permission: &'a str,
}

#[derive(Debug, Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct IssueStateRequest<'a> {
    state: &'a str,
}

const NO_BODY: Option<&()> = None;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

#[async_trait]
impl RepositoryClient for GithubClient {
    #[instrument(skip(self), fields(organization = %self.organization))]
    async fn exists(&self, name: &RepositoryName) -> Result<bool, PlatformError> {
        let path = ["repos", self.organization.as_str(), name.as_str()];
        match self.send(Method::GET, &path, NO_BODY).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self), fields(organization = %self.organization))]
    async fn create_from_template(
        &self,
        template_owner: &Identity,
        template: &RepositoryName,
        target: &RepositoryName,
        options: CreateOptions,
    ) -> Result<RepoIdentity, PlatformError> {
        let path = [
            "repos",
            template_owner.as_str(),
            template.as_str(),
            "generate",
        ];
        let payload = GenerateRequest {
            owner: self.organization.as_str(),
            name: target.as_str(),
            include_all_branches: options.include_all_branches,
            private: options.private,
        };

        let response = self.send(Method::POST, &path, Some(&payload)).await?;
        let created: GeneratedRepository = response
            .json()
            .await
            .map_err(|err| classify_transport(&err))?;
        Ok(created.into())
    }

    #[instrument(skip(self), fields(organization = %self.organization))]
    async fn grant_collaborator(
        &self,
        repo: &RepositoryName,
        user: &Identity,
        role: CollaboratorRole,
    ) -> Result<(), PlatformError> {
        let path = [
            "repos",
            self.organization.as_str(),
            repo.as_str(),
            "collaborators",
            user.as_str(),
        ];
        let payload = CollaboratorRequest {
            permission: role.as_str(),
        };
        self.send(Method::PUT, &path, Some(&payload)).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for GithubClient {
    #[instrument(skip(self, channel, text), fields(channel = %channel))]
    async fn comment(&self, channel: &ChannelRef, text: &str) -> Result<(), PlatformError> {
        let number = channel.request_id.to_string();
        let path = [
            "repos",
            channel.repo.owner(),
            channel.repo.name(),
            "issues",
            number.as_str(),
            "comments",
        ];
        self.send(Method::POST, &path, Some(&CommentRequest { body: text }))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, channel), fields(channel = %channel))]
    async fn close(&self, channel: &ChannelRef) -> Result<(), PlatformError> {
        let number = channel.request_id.to_string();
        let path = [
            "repos",
            channel.repo.owner(),
            channel.repo.name(),
            "issues",
            number.as_str(),
        ];
        self.send(
            Method::PATCH,
            &path,
            Some(&IssueStateRequest { state: "closed" }),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
