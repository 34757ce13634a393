//! Credential strategies for the GitHub adapter.
//!
//! ```text
//! CredentialProvider (trait)
//!     |
//!     +-- StaticTokenProvider
//!     |       Personal access token supplied by configuration.
//!     |
//!     +-- AppInstallationTokenProvider
//!             Exchanges an RS256 app JWT for an installation access token
//!             and caches it until shortly before expiry.
//! ```
//!
//! [`CredentialSettings::provider`] picks the strategy: a direct token wins,
//! otherwise all three app fields are required.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use provisioning::{PlatformError, ProvisionerError};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::errors::{classify_response, classify_transport};
use crate::{API_VERSION, USER_AGENT};

/// Installation tokens are refreshed this many seconds before GitHub expires them.
const REFRESH_MARGIN_SECS: i64 = 300;

/// Supplies the bearer token for each GitHub request.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns a token valid for at least the next request.
    ///
    /// # Errors
    ///
    /// Returns an [`provisioning::ErrorKind::Auth`] error when no token can be
    /// produced, or the classified failure of the token exchange.
    async fn access_token(&self) -> Result<SecretString, PlatformError>;

    /// Short strategy name for logs.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Personal access token
// ---------------------------------------------------------------------------

/// Uses one fixed token for every request.
pub struct StaticTokenProvider {
    token: SecretString,
}

impl StaticTokenProvider {
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<SecretString, PlatformError> {
        Ok(SecretString::from(self.token.expose_secret().to_owned()))
    }

    fn name(&self) -> &'static str {
        "token"
    }
}

// ---------------------------------------------------------------------------
// GitHub App installation
// ---------------------------------------------------------------------------

struct CachedToken {
    token: SecretString,
    expires_at: DateTime<Utc>,
}

/// Mints installation access tokens for a GitHub App.
pub struct AppInstallationTokenProvider {
    app_id: String,
    installation_id: String,
    private_key: SecretString,
    api_base_url: String,
    http_client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl AppInstallationTokenProvider {
    /// Creates a provider.
    ///
    /// # Errors
    ///
    /// Returns an error when the app id, installation id or private key is
    /// blank.
    pub fn new(
        app_id: impl Into<String>,
        installation_id: impl Into<String>,
        private_key: SecretString,
        api_base_url: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Result<Self, ProvisionerError> {
        let app_id = app_id.into();
        if app_id.trim().is_empty() {
            return Err(config_error("app id must not be empty"));
        }
        let installation_id = installation_id.into();
        if installation_id.trim().is_empty() {
            return Err(config_error("app installation id must not be empty"));
        }
        if private_key.expose_secret().trim().is_empty() {
            return Err(config_error("app private key must not be empty"));
        }

        Ok(Self {
            app_id,
            installation_id,
            private_key,
            api_base_url: api_base_url.into(),
            http_client,
            cached: Mutex::new(None),
        })
    }

    /// Signs the short-lived JWT that authenticates as the app itself.
    fn generate_jwt(&self, now: u64) -> Result<String, PlatformError> {
        #[derive(Debug, Serialize)]
        struct Claims {
            iat: u64,
            exp: u64,
            iss: String,
        }

        // Backdated to tolerate clock drift; GitHub caps `exp` at ten minutes.
        let claims = Claims {
            iat: now.saturating_sub(60),
            exp: now + 540,
            iss: self.app_id.clone(),
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.expose_secret().as_bytes())
            .map_err(|err| PlatformError::auth(format!("Invalid GitHub App private key: {err}")))?;

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|err| PlatformError::auth(format!("Failed to sign GitHub App JWT: {err}")))
    }

    async fn mint(&self) -> Result<CachedToken, PlatformError> {
        #[derive(Debug, Deserialize)]
        struct InstallationTokenResponse {
            token: String,
            expires_at: String,
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| PlatformError::unknown(err.to_string()))?
            .as_secs();
        let jwt = self.generate_jwt(now)?;
        let endpoint = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_base_url.trim_end_matches('/'),
            self.installation_id
        );

        let response = self
            .http_client
            .post(endpoint)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION)
            .bearer_auth(jwt)
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_response(status, &headers, &body));
        }

        let payload: InstallationTokenResponse = response
            .json()
            .await
            .map_err(|err| classify_transport(&err))?;
        let expires_at = DateTime::parse_from_rfc3339(&payload.expires_at)
            .map_err(|err| {
                PlatformError::unknown(format!(
                    "Invalid token expiry '{}': {err}",
                    payload.expires_at
                ))
            })?
            .with_timezone(&Utc);

        Ok(CachedToken {
            token: SecretString::from(payload.token),
            expires_at,
        })
    }
}

#[async_trait]
impl CredentialProvider for AppInstallationTokenProvider {
    #[instrument(skip(self), fields(app_id = %self.app_id, installation_id = %self.installation_id))]
    async fn access_token(&self) -> Result<SecretString, PlatformError> {
        let mut cached = self.cached.lock().await;

        let margin = chrono::Duration::seconds(REFRESH_MARGIN_SECS);
        let fresh = cached
            .as_ref()
            .is_some_and(|c| c.expires_at - margin > Utc::now());
        if !fresh {
            let minted = self.mint().await?;
            debug!(expires_at = %minted.expires_at, "Minted installation access token");
            *cached = Some(minted);
        }

        cached
            .as_ref()
            .map(|c| SecretString::from(c.token.expose_secret().to_owned()))
            .ok_or_else(|| PlatformError::auth("No installation access token available"))
    }

    fn name(&self) -> &'static str {
        "github-app"
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Raw credential material from configuration.
#[derive(Debug, Default)]
pub struct CredentialSettings {
    pub token: Option<SecretString>,
    pub app_id: Option<String>,
    pub app_private_key: Option<SecretString>,
    pub app_installation_id: Option<String>,
}

impl CredentialSettings {
    /// Chooses the credential strategy.
    ///
    /// A non-blank token is used directly. Otherwise the app id, private key
    /// and installation id must all be present.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionerError::ConfigurationError`] when neither a token
    /// nor a complete set of app credentials is configured.
    pub fn provider(
        self,
        api_base_url: &str,
        http_client: reqwest::Client,
    ) -> Result<Arc<dyn CredentialProvider>, ProvisionerError> {
        if let Some(token) = self
            .token
            .filter(|t| !t.expose_secret().trim().is_empty())
        {
            return Ok(Arc::new(StaticTokenProvider::new(token)));
        }

        match (self.app_id, self.app_private_key, self.app_installation_id) {
            (Some(app_id), Some(private_key), Some(installation_id)) => {
                Ok(Arc::new(AppInstallationTokenProvider::new(
                    app_id,
                    installation_id,
                    private_key,
                    api_base_url,
                    http_client,
                )?))
            }
            (None, None, None) => Err(config_error(
                "no credentials configured: set a token or GitHub App id, private key and installation id",
            )),
            _ => Err(config_error(
                "incomplete GitHub App credentials: app id, private key and installation id are all required",
            )),
        }
    }
}

fn config_error(message: &str) -> ProvisionerError {
    ProvisionerError::ConfigurationError {
        message: message.to_string(),
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
