//! Shared value types for the provisioning domain.
//!
//! Unlike the identifiers in [`crate::identifiers`], these types describe the
//! request being served and the outcome it produced.

use serde::{Deserialize, Serialize};

use crate::{ErrorInfo, Identity, ProvisionerError, RepositoryId, RepositoryName, RequestId};

// ---------------------------------------------------------------------------
// Request channel
// ---------------------------------------------------------------------------

/// Where status comments are posted and which thread is closed.
///
/// The orchestrator passes this through to the
/// [`crate::NotificationChannel`] without looking inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRef {
    /// Repository hosting the request thread.
    pub repo: RepositoryId,
    /// The request (issue) within that repository.
    pub request_id: RequestId,
}

impl ChannelRef {
    /// Creates a new [`ChannelRef`].
    pub fn new(repo: RepositoryId, request_id: RequestId) -> Self {
        Self { repo, request_id }
    }
}

impl std::fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.repo, self.request_id)
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One request to provision a repository.
///
/// Immutable once built: fields are private and only readable through
/// accessors. Owned by exactly one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningRequest {
    requester: Identity,
    organization: Identity,
    target_repo_name: RepositoryName,
    template_owner: Identity,
    template_repo_name: RepositoryName,
    request_channel_ref: ChannelRef,
}

impl ProvisioningRequest {
    /// Creates a request whose template lives in the same organization as the
    /// target.
    pub fn new(
        requester: Identity,
        organization: Identity,
        target_repo_name: RepositoryName,
        template_repo_name: RepositoryName,
        request_channel_ref: ChannelRef,
    ) -> Self {
        Self {
            requester,
            template_owner: organization.clone(),
            organization,
            target_repo_name,
            template_repo_name,
            request_channel_ref,
        }
    }

    /// Overrides the owner of the template repository.
    #[must_use]
    pub fn with_template_owner(mut self, owner: Identity) -> Self {
        self.template_owner = owner;
        self
    }

    /// Builds a request from raw strings, rejecting blank values and
    /// malformed repository names.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionerError::InvalidRequest`] naming the first rejected
    /// field.
    pub fn try_from_parts(
        requester: &str,
        organization: &str,
        target_repo_name: &str,
        template_repo_name: &str,
        request_channel_ref: ChannelRef,
    ) -> Result<Self, ProvisionerError> {
        let requester = Identity::new(requester).ok_or_else(|| blank("requester"))?;
        let organization = Identity::new(organization).ok_or_else(|| blank("organization"))?;
        let target =
            RepositoryName::new(target_repo_name).ok_or_else(|| malformed("target_repo_name"))?;
        let template = RepositoryName::new(template_repo_name)
            .ok_or_else(|| malformed("template_repo_name"))?;
        Ok(Self::new(
            requester,
            organization,
            target,
            template,
            request_channel_ref,
        ))
    }

    pub fn requester(&self) -> &Identity {
        &self.requester
    }

    pub fn organization(&self) -> &Identity {
        &self.organization
    }

    pub fn target_repo_name(&self) -> &RepositoryName {
        &self.target_repo_name
    }

    pub fn template_owner(&self) -> &Identity {
        &self.template_owner
    }

    pub fn template_repo_name(&self) -> &RepositoryName {
        &self.template_repo_name
    }

    pub fn request_channel_ref(&self) -> &ChannelRef {
        &self.request_channel_ref
    }

    /// Full `"org/name"` identifier of the repository to be provisioned.
    pub fn target_repository(&self) -> RepositoryId {
        RepositoryId::from_parts(&self.organization, &self.target_repo_name)
    }

    /// Full `"owner/name"` identifier of the template repository.
    pub fn template_repository(&self) -> RepositoryId {
        RepositoryId::from_parts(&self.template_owner, &self.template_repo_name)
    }
}

fn blank(field: &'static str) -> ProvisionerError {
    ProvisionerError::InvalidRequest {
        field,
        reason: "must not be blank".to_string(),
    }
}

fn malformed(field: &'static str) -> ProvisionerError {
    ProvisionerError::InvalidRequest {
        field,
        reason: "must be a repository name made of letters, digits, '.', '_' or '-'".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Creation inputs / outputs
// ---------------------------------------------------------------------------

/// Flags passed to template-based creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOptions {
    /// Copy every branch of the template, not just the default branch.
    pub include_all_branches: bool,
    /// Create the repository as private.
    pub private: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            include_all_branches: false,
            private: false,
        }
    }
}

/// The repository produced by a successful creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoIdentity {
    /// `"owner/name"` as reported by the platform.
    pub full_name: String,
    /// Browser URL of the new repository.
    pub url: String,
}

/// Permission level granted to a collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorRole {
    Pull,
    Triage,
    Push,
    Maintain,
    Admin,
}

impl CollaboratorRole {
    /// The permission string the platform expects.
    pub fn as_str(self) -> &'static str {
        match self {
            CollaboratorRole::Pull => "pull",
            CollaboratorRole::Triage => "triage",
            CollaboratorRole::Push => "push",
            CollaboratorRole::Maintain => "maintain",
            CollaboratorRole::Admin => "admin",
        }
    }
}

impl std::fmt::Display for CollaboratorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Terminal outcome of one provisioning run.
///
/// Exactly one is produced per request and it is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProvisioningResult {
    /// The repository was created and the requester was granted access.
    Created(RepoIdentity),
    /// The target already existed; nothing was done.
    AlreadyExists,
    /// A step failed; the request was left open.
    Failed(ErrorInfo),
}

impl ProvisioningResult {
    /// `true` for outcomes that should exit the process successfully.
    pub fn is_success(&self) -> bool {
        !matches!(self, ProvisioningResult::Failed(_))
    }

    /// Stable label used in log fields.
    pub fn label(&self) -> &'static str {
        match self {
            ProvisioningResult::Created(_) => "created",
            ProvisioningResult::AlreadyExists => "already_exists",
            ProvisioningResult::Failed(_) => "failed",
        }
    }
}
