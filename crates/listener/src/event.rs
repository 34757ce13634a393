//! GitHub `issues` event payload.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading the trigger event.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Failed to read trigger event '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse trigger event: {0}")]
    Parse(#[from] serde_json::Error),

    /// The payload parsed but a field this system needs is absent.
    #[error("Trigger event is missing '{0}'")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub user: Account,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: Option<String>,
    pub owner: Option<Account>,
}

/// The fields of an `issues` webhook payload that drive provisioning.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueEvent {
    #[serde(default)]
    pub action: Option<String>,
    pub issue: Option<Issue>,
    pub repository: Repository,
    pub organization: Option<Account>,
}

impl IssueEvent {
    /// Parses a payload from JSON text.
    ///
    /// # Errors
    ///
    /// [`TriggerError::Parse`] for malformed JSON and
    /// [`TriggerError::MissingField`] when the event carries no issue.
    pub fn from_json(json: &str) -> Result<Self, TriggerError> {
        let event: IssueEvent = serde_json::from_str(json)?;
        if event.issue.is_none() {
            return Err(TriggerError::MissingField("issue"));
        }
        Ok(event)
    }

    /// Reads and parses the payload file.
    pub async fn from_file(path: &Path) -> Result<Self, TriggerError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| TriggerError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let event = Self::from_json(&json)?;
        debug!(path = %path.display(), action = ?event.action, "Loaded trigger event");
        Ok(event)
    }

    /// The issue that triggered the run.
    pub fn issue(&self) -> Result<&Issue, TriggerError> {
        self.issue.as_ref().ok_or(TriggerError::MissingField("issue"))
    }

    /// Owning organization, falling back to the repository owner for
    /// payloads delivered outside an organization.
    pub fn organization_login(&self) -> Option<&str> {
        self.organization
            .as_ref()
            .or(self.repository.owner.as_ref())
            .map(|a| a.login.as_str())
    }

    /// `"owner/name"` of the repository hosting the issue.
    pub fn repository_full_name(&self) -> Option<String> {
        if let Some(full) = &self.repository.full_name {
            return Some(full.clone());
        }
        let owner = self.repository.owner.as_ref()?;
        Some(format!("{}/{}", owner.login, self.repository.name))
    }
}
