//! Repository provisioning orchestration.
//!
//! [`ProvisioningOrchestrator`] drives one request through an
//! idempotency-guarded state machine:
//!
//! ```text
//! Received -> Checking -+-> Creating -> Granting -> Notifying -> Closing -> Closed
//!                       |       |           |            |
//!                       |       +-----------+----> FailedOpen
//!                       +--> ExistsNoOp
//! ```
//!
//! Every remote failure ends the run in `FailedOpen`; nothing is retried. The
//! request thread is closed only on the full happy path.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The orchestrator sequences calls on the
//! [`provisioning`] port traits. It performs no I/O of its own and never
//! returns an error: every outcome is a [`ProvisioningResult`].

use std::sync::Arc;

use provisioning::{
    CollaboratorRole, CreateOptions, ErrorKind, NotificationChannel, PlatformError,
    ProvisioningRequest, ProvisioningResult, ProvisioningRunId, RepoIdentity, RepositoryClient,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, warn, Instrument};

pub mod messages;

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// How a name conflict reported by the create call is treated.
///
/// Two triggers for the same target can both pass the existence check before
/// either creates the repository. The create call's conflict response is the
/// only authoritative signal that this happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Report the conflict as a failure and leave the request open.
    #[default]
    Fail,
    /// Report the conflict as [`ProvisioningResult::AlreadyExists`].
    TreatAsExisting,
}

/// Knobs that shape a run without changing its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Flags passed to the create call.
    pub create_options: CreateOptions,
    /// Role granted to the requester on the new repository.
    pub grant_role: CollaboratorRole,
    /// Treatment of a creation-time name conflict.
    pub conflict_policy: ConflictPolicy,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            create_options: CreateOptions::default(),
            grant_role: CollaboratorRole::Admin,
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// States of a provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningState {
    Received,
    Checking,
    Creating,
    Granting,
    Notifying,
    Closing,
    /// Terminal: created and announced; close was attempted.
    Closed,
    /// Terminal: the target was already there.
    ExistsNoOp,
    /// Terminal: a step failed and the request stays open.
    FailedOpen,
}

impl ProvisioningState {
    /// Returns `true` for states that end a run.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProvisioningState::Closed | ProvisioningState::ExistsNoOp | ProvisioningState::FailedOpen
        )
    }
}

/// A state together with the data it carries forward.
enum Step {
    Received,
    Checking,
    Creating,
    Granting(RepoIdentity),
    Notifying(RepoIdentity),
    Closing(RepoIdentity),
    Closed(RepoIdentity),
    ExistsNoOp,
    FailedOpen(PlatformError),
}

impl Step {
    fn state(&self) -> ProvisioningState {
        match self {
            Step::Received => ProvisioningState::Received,
            Step::Checking => ProvisioningState::Checking,
            Step::Creating => ProvisioningState::Creating,
            Step::Granting(_) => ProvisioningState::Granting,
            Step::Notifying(_) => ProvisioningState::Notifying,
            Step::Closing(_) => ProvisioningState::Closing,
            Step::Closed(_) => ProvisioningState::Closed,
            Step::ExistsNoOp => ProvisioningState::ExistsNoOp,
            Step::FailedOpen(_) => ProvisioningState::FailedOpen,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives provisioning requests against injected repository and notification
/// ports.
pub struct ProvisioningOrchestrator {
    repositories: Arc<dyn RepositoryClient>,
    notifications: Arc<dyn NotificationChannel>,
    settings: OrchestratorSettings,
}

impl ProvisioningOrchestrator {
    /// Creates an orchestrator with default settings.
    pub fn new(
        repositories: Arc<dyn RepositoryClient>,
        notifications: Arc<dyn NotificationChannel>,
    ) -> Self {
        Self::with_settings(repositories, notifications, OrchestratorSettings::default())
    }

    /// Creates an orchestrator with explicit settings.
    pub fn with_settings(
        repositories: Arc<dyn RepositoryClient>,
        notifications: Arc<dyn NotificationChannel>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            repositories,
            notifications,
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Runs one request to a terminal state.
    ///
    /// Side effects happen strictly in order: existence check, creation, grant,
    /// success comment, close. A failure at any step posts one best-effort
    /// failure comment and ends the run; the request is left open.
    pub async fn run(&self, request: ProvisioningRequest) -> ProvisioningResult {
        let run_id = ProvisioningRunId::new_random();
        let span = info_span!(
            "provisioning_run",
            %run_id,
            organization = %request.organization(),
            target = %request.target_repo_name(),
            template = %request.template_repository(),
            requester = %request.requester(),
            channel = %request.request_channel_ref(),
        );
        async {
            let (state, result) = self.drive(&request).await;
            info!(
                outcome = result.label(),
                final_state = ?state,
                "Provisioning run finished"
            );
            result
        }
        .instrument(span)
        .await
    }

    /// Steps until a terminal result, returning it with the state the run
    /// ended in.
    async fn drive(
        &self,
        request: &ProvisioningRequest,
    ) -> (ProvisioningState, ProvisioningResult) {
        let mut step = Step::Received;
        loop {
            let from = step.state();
            step = match step {
                Step::Received => Step::Checking,
                Step::Checking => self.check(request).await,
                Step::Creating => self.create(request).await,
                Step::Granting(repo) => self.grant(request, repo).await,
                Step::Notifying(repo) => {
                    let text = messages::created(request, &repo, self.settings.grant_role);
                    if !self.notify(request, &text).await {
                        // The result is already decided; without a delivered
                        // announcement the thread stays open.
                        warn!(
                            repo = %repo.full_name,
                            "Success comment not delivered; leaving request open"
                        );
                        return (from, ProvisioningResult::Created(repo));
                    }
                    Step::Closing(repo)
                }
                Step::Closing(repo) => {
                    if let Err(err) = self
                        .notifications
                        .close(request.request_channel_ref())
                        .await
                    {
                        warn!(
                            repo = %repo.full_name,
                            error.kind = %err.kind(),
                            error.message = %err,
                            "Failed to close request; request thread is still open"
                        );
                        return (from, ProvisioningResult::Created(repo));
                    }
                    Step::Closed(repo)
                }
                Step::Closed(repo) => return (from, ProvisioningResult::Created(repo)),
                Step::ExistsNoOp => {
                    self.notify(request, &messages::already_exists(request))
                        .await;
                    return (from, ProvisioningResult::AlreadyExists);
                }
                Step::FailedOpen(err) => {
                    error!(
                        error.kind = %err.kind(),
                        error.message = %err,
                        "Provisioning failed"
                    );
                    self.notify(request, &messages::failed(err.message())).await;
                    return (from, ProvisioningResult::Failed(err.into()));
                }
            };
            debug!(from = ?from, to = ?step.state(), "State transition");
        }
    }

    async fn check(&self, request: &ProvisioningRequest) -> Step {
        match self.repositories.exists(request.target_repo_name()).await {
            Ok(true) => {
                info!("Target repository already exists");
                Step::ExistsNoOp
            }
            Ok(false) => Step::Creating,
            // Adapters should already map this to `Ok(false)`.
            Err(err) if err.is_not_found() => Step::Creating,
            Err(err) => Step::FailedOpen(err),
        }
    }

    async fn create(&self, request: &ProvisioningRequest) -> Step {
        let created = self
            .repositories
            .create_from_template(
                request.template_owner(),
                request.template_repo_name(),
                request.target_repo_name(),
                self.settings.create_options,
            )
            .await;

        match created {
            Ok(repo) => {
                info!(repo = %repo.full_name, url = %repo.url, "Repository created");
                Step::Granting(repo)
            }
            Err(err)
                if err.kind() == ErrorKind::Conflict
                    && self.settings.conflict_policy == ConflictPolicy::TreatAsExisting =>
            {
                info!(
                    error.message = %err,
                    "Repository was created concurrently; treating as already existing"
                );
                Step::ExistsNoOp
            }
            Err(err) => Step::FailedOpen(err),
        }
    }

    async fn grant(&self, request: &ProvisioningRequest, repo: RepoIdentity) -> Step {
        let role = self.settings.grant_role;
        match self
            .repositories
            .grant_collaborator(request.target_repo_name(), request.requester(), role)
            .await
        {
            Ok(()) => {
                info!(user = %request.requester(), %role, "Collaborator granted");
                Step::Notifying(repo)
            }
            Err(err) => {
                warn!(
                    repo = %repo.full_name,
                    "Repository exists but the requester was not granted access"
                );
                Step::FailedOpen(err)
            }
        }
    }

    /// Posts a comment, returning whether it was delivered.
    ///
    /// A delivery failure is logged and never changes the run's outcome.
    async fn notify(&self, request: &ProvisioningRequest, text: &str) -> bool {
        match self
            .notifications
            .comment(request.request_channel_ref(), text)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    error.kind = %err.kind(),
                    error.message = %err,
                    "Failed to post comment on request"
                );
                false
            }
        }
    }
}
