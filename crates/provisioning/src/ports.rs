//! Port traits consumed by the orchestrator.
//!
//! Infrastructure crates implement these; the orchestrator only ever sees
//! `dyn RepositoryClient` and `dyn NotificationChannel`.

use async_trait::async_trait;

use crate::{
    ChannelRef, CollaboratorRole, CreateOptions, Identity, PlatformError, RepoIdentity,
    RepositoryName,
};

/// Repository operations on the platform that hosts the provisioned
/// repositories.
///
/// All repositories addressed through one client live under a single owning
/// organization fixed at construction time.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Returns whether `name` already exists under the client's organization.
    ///
    /// Implementations map a platform "not found" to `Ok(false)`; every other
    /// failure is returned as an error.
    async fn exists(&self, name: &RepositoryName) -> Result<bool, PlatformError>;

    /// Creates `target` from the template `template_owner/template`.
    ///
    /// # Errors
    ///
    /// [`crate::ErrorKind::Conflict`] when `target` was taken between the
    /// existence check and this call; otherwise auth, rate-limit, transport or
    /// unknown failures.
    async fn create_from_template(
        &self,
        template_owner: &Identity,
        template: &RepositoryName,
        target: &RepositoryName,
        options: CreateOptions,
    ) -> Result<RepoIdentity, PlatformError>;

    /// Grants `user` the given `role` on `repo`.
    async fn grant_collaborator(
        &self,
        repo: &RepositoryName,
        user: &Identity,
        role: CollaboratorRole,
    ) -> Result<(), PlatformError>;
}

/// The thread a provisioning request came from.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Posts `text` on the request thread.
    async fn comment(&self, channel: &ChannelRef, text: &str) -> Result<(), PlatformError>;

    /// Closes the request thread.
    async fn close(&self, channel: &ChannelRef) -> Result<(), PlatformError>;
}
