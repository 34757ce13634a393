use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use provisioning::{
    ChannelRef, CollaboratorRole, CreateOptions, ErrorKind, Identity, NotificationChannel,
    PlatformError, ProvisioningRequest, ProvisioningResult, RepoIdentity, RepositoryClient,
    RepositoryId, RepositoryName, RequestId,
};

use super::*;

// ---------------------------------------------------------------------------
// In-memory platform
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Exists(String),
    Create {
        template: String,
        target: String,
        options: CreateOptions,
    },
    Grant {
        repo: String,
        user: String,
        role: CollaboratorRole,
    },
    Comment(String),
    Close,
}

/// Fake platform that keeps created repositories between runs and records
/// every call in order.
#[derive(Default)]
struct FakePlatform {
    repos: Mutex<HashSet<String>>,
    calls: Mutex<Vec<Call>>,
    exists_error: Option<PlatformError>,
    create_error: Option<PlatformError>,
    grant_error: Option<PlatformError>,
    comment_error: Option<PlatformError>,
    close_error: Option<PlatformError>,
}

impl FakePlatform {
    fn with_repo(self, name: &str) -> Self {
        self.repos.lock().unwrap().insert(name.to_string());
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(*c)).count()
    }

    fn comments(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Comment(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl RepositoryClient for FakePlatform {
    async fn exists(&self, name: &RepositoryName) -> Result<bool, PlatformError> {
        self.record(Call::Exists(name.to_string()));
        if let Some(err) = &self.exists_error {
            return Err(err.clone());
        }
        Ok(self.repos.lock().unwrap().contains(name.as_str()))
    }

    async fn create_from_template(
        &self,
        _template_owner: &Identity,
        template: &RepositoryName,
        target: &RepositoryName,
        options: CreateOptions,
    ) -> Result<RepoIdentity, PlatformError> {
        self.record(Call::Create {
            template: template.to_string(),
            target: target.to_string(),
            options,
        });
        if let Some(err) = &self.create_error {
            return Err(err.clone());
        }
        if !self.repos.lock().unwrap().insert(target.to_string()) {
            return Err(PlatformError::conflict("Name already exists on this account"));
        }
        Ok(RepoIdentity {
            full_name: format!("acme/{target}"),
            url: format!("https://github.com/acme/{target}"),
        })
    }

    async fn grant_collaborator(
        &self,
        repo: &RepositoryName,
        user: &Identity,
        role: CollaboratorRole,
    ) -> Result<(), PlatformError> {
        self.record(Call::Grant {
            repo: repo.to_string(),
            user: user.to_string(),
            role,
        });
        match &self.grant_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl NotificationChannel for FakePlatform {
    async fn comment(&self, _channel: &ChannelRef, text: &str) -> Result<(), PlatformError> {
        self.record(Call::Comment(text.to_string()));
        match &self.comment_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn close(&self, _channel: &ChannelRef) -> Result<(), PlatformError> {
        self.record(Call::Close);
        match &self.close_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn request(target: &str) -> ProvisioningRequest {
    ProvisioningRequest::try_from_parts(
        "octocat",
        "acme",
        target,
        "rust-template",
        ChannelRef::new(RepositoryId::new("acme/requests").unwrap(), RequestId::new(42)),
    )
    .unwrap()
}

fn orchestrator(platform: &Arc<FakePlatform>) -> ProvisioningOrchestrator {
    ProvisioningOrchestrator::new(platform.clone(), platform.clone())
}

fn is_create(c: &Call) -> bool {
    matches!(c, Call::Create { .. })
}

fn is_grant(c: &Call) -> bool {
    matches!(c, Call::Grant { .. })
}

fn is_close(c: &Call) -> bool {
    matches!(c, Call::Close)
}

// ---------------------------------------------------------------------------
// Happy path and idempotency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_fresh_target_is_created_granted_announced_and_closed() {
    let platform = Arc::new(FakePlatform::default());

    let result = orchestrator(&platform).run(request("x")).await;

    assert_eq!(
        result,
        ProvisioningResult::Created(RepoIdentity {
            full_name: "acme/x".into(),
            url: "https://github.com/acme/x".into(),
        })
    );
    assert_eq!(
        platform.calls(),
        vec![
            Call::Exists("x".into()),
            Call::Create {
                template: "rust-template".into(),
                target: "x".into(),
                options: CreateOptions::default(),
            },
            Call::Grant {
                repo: "x".into(),
                user: "octocat".into(),
                role: CollaboratorRole::Admin,
            },
            Call::Comment(
                "Repository created successfully: https://github.com/acme/x\n\
                 User octocat added as an admin to x"
                    .into()
            ),
            Call::Close,
        ]
    );
}

#[tokio::test]
async fn test_second_run_for_same_target_is_a_no_op() {
    let platform = Arc::new(FakePlatform::default());
    let orchestrator = orchestrator(&platform);

    let first = orchestrator.run(request("x")).await;
    let second = orchestrator.run(request("x")).await;

    assert!(matches!(first, ProvisioningResult::Created(_)));
    assert_eq!(second, ProvisioningResult::AlreadyExists);
    assert_eq!(platform.count(is_create), 1);
    assert_eq!(platform.count(is_grant), 1);
    assert_eq!(platform.count(is_close), 1);
}

#[tokio::test]
async fn test_existing_target_posts_notice_without_creating_or_closing() {
    let platform = Arc::new(FakePlatform::default().with_repo("x"));

    let result = orchestrator(&platform).run(request("x")).await;

    assert_eq!(result, ProvisioningResult::AlreadyExists);
    assert_eq!(
        platform.comments(),
        vec!["Repository acme/x already exists; no action taken.".to_string()]
    );
    assert_eq!(platform.count(is_create), 0);
    assert_eq!(platform.count(is_grant), 0);
    assert_eq!(platform.count(is_close), 0);
}

#[tokio::test]
async fn test_create_options_are_passed_through() {
    let platform = Arc::new(FakePlatform::default());
    let settings = OrchestratorSettings {
        create_options: CreateOptions {
            include_all_branches: true,
            private: false,
        },
        ..OrchestratorSettings::default()
    };
    let orchestrator =
        ProvisioningOrchestrator::with_settings(platform.clone(), platform.clone(), settings);

    orchestrator.run(request("x")).await;

    let create = platform.calls().into_iter().find(is_create).unwrap();
    assert_eq!(
        create,
        Call::Create {
            template: "rust-template".into(),
            target: "x".into(),
            options: CreateOptions {
                include_all_branches: true,
                private: false,
            },
        }
    );
}

#[tokio::test]
async fn test_success_comment_names_the_granted_role() {
    let platform = Arc::new(FakePlatform::default());
    let settings = OrchestratorSettings {
        grant_role: CollaboratorRole::Maintain,
        ..OrchestratorSettings::default()
    };
    let orchestrator =
        ProvisioningOrchestrator::with_settings(platform.clone(), platform.clone(), settings);

    orchestrator.run(request("x")).await;

    assert_eq!(
        platform.comments(),
        vec!["Repository created successfully: https://github.com/acme/x\n\
              User octocat added as a maintain to x"
            .to_string()]
    );
    assert_eq!(platform.count(is_grant), 1);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_existence_check_error_fails_and_leaves_request_open() {
    let platform = Arc::new(FakePlatform {
        exists_error: Some(PlatformError::auth("Bad credentials")),
        ..FakePlatform::default()
    });

    let result = orchestrator(&platform).run(request("x")).await;

    match result {
        ProvisioningResult::Failed(info) => {
            assert_eq!(info.kind, ErrorKind::Auth);
            assert_eq!(info.message, "Bad credentials");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(platform.count(is_create), 0);
    assert_eq!(platform.count(is_close), 0);
    assert_eq!(
        platform.comments(),
        vec!["Failed to create repository: Bad credentials".to_string()]
    );
}

#[tokio::test]
async fn test_not_found_from_existence_check_proceeds_to_create() {
    let platform = Arc::new(FakePlatform {
        exists_error: Some(PlatformError::not_found("Not Found")),
        ..FakePlatform::default()
    });

    let result = orchestrator(&platform).run(request("x")).await;

    assert!(matches!(result, ProvisioningResult::Created(_)));
    assert_eq!(platform.count(is_create), 1);
}

#[tokio::test]
async fn test_grant_failure_is_not_reported_as_success() {
    let platform = Arc::new(FakePlatform {
        grant_error: Some(PlatformError::auth("Must have admin rights to Repository.")),
        ..FakePlatform::default()
    });

    let result = orchestrator(&platform).run(request("x")).await;

    assert!(matches!(
        result,
        ProvisioningResult::Failed(ref info) if info.kind == ErrorKind::Auth
    ));
    assert_eq!(platform.count(is_create), 1);
    assert_eq!(platform.count(is_close), 0);
    let comments = platform.comments();
    assert_eq!(comments.len(), 1);
    assert!(!comments[0].contains("created successfully"));
    assert!(comments[0].contains("Must have admin rights to Repository."));
}

#[tokio::test]
async fn test_creation_conflict_fails_by_default() {
    let platform = Arc::new(FakePlatform {
        create_error: Some(PlatformError::conflict(
            "Name already exists on this account",
        )),
        ..FakePlatform::default()
    });

    let result = orchestrator(&platform).run(request("x")).await;

    assert_eq!(
        result,
        ProvisioningResult::Failed(provisioning::ErrorInfo::new(
            ErrorKind::Conflict,
            "Name already exists on this account"
        ))
    );
    assert_eq!(
        platform.comments(),
        vec!["Failed to create repository: Name already exists on this account".to_string()]
    );
    assert_eq!(platform.count(is_grant), 0);
    assert_eq!(platform.count(is_close), 0);
}

#[tokio::test]
async fn test_creation_conflict_can_be_treated_as_existing() {
    let platform = Arc::new(FakePlatform {
        create_error: Some(PlatformError::conflict(
            "Name already exists on this account",
        )),
        ..FakePlatform::default()
    });
    let settings = OrchestratorSettings {
        conflict_policy: ConflictPolicy::TreatAsExisting,
        ..OrchestratorSettings::default()
    };
    let orchestrator =
        ProvisioningOrchestrator::with_settings(platform.clone(), platform.clone(), settings);

    let result = orchestrator.run(request("x")).await;

    assert_eq!(result, ProvisioningResult::AlreadyExists);
    assert_eq!(
        platform.comments(),
        vec!["Repository acme/x already exists; no action taken.".to_string()]
    );
    assert_eq!(platform.count(is_grant), 0);
    assert_eq!(platform.count(is_close), 0);
}

#[tokio::test]
async fn test_other_creation_errors_still_fail_when_conflicts_are_tolerated() {
    let platform = Arc::new(FakePlatform {
        create_error: Some(PlatformError::rate_limited("API rate limit exceeded")),
        ..FakePlatform::default()
    });
    let settings = OrchestratorSettings {
        conflict_policy: ConflictPolicy::TreatAsExisting,
        ..OrchestratorSettings::default()
    };
    let orchestrator =
        ProvisioningOrchestrator::with_settings(platform.clone(), platform.clone(), settings);

    let result = orchestrator.run(request("x")).await;

    assert!(matches!(
        result,
        ProvisioningResult::Failed(ref info) if info.kind == ErrorKind::RateLimited
    ));
}

// ---------------------------------------------------------------------------
// Notification failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_failed_success_comment_keeps_result_but_skips_close() {
    let platform = Arc::new(FakePlatform {
        comment_error: Some(PlatformError::transport("connection reset")),
        ..FakePlatform::default()
    });

    let result = orchestrator(&platform).run(request("x")).await;

    assert!(matches!(result, ProvisioningResult::Created(_)));
    assert_eq!(platform.count(is_close), 0);
}

#[tokio::test]
async fn test_failed_failure_comment_keeps_primary_error() {
    let platform = Arc::new(FakePlatform {
        create_error: Some(PlatformError::transport("502 Bad Gateway")),
        comment_error: Some(PlatformError::transport("connection reset")),
        ..FakePlatform::default()
    });

    let result = orchestrator(&platform).run(request("x")).await;

    match result {
        ProvisioningResult::Failed(info) => {
            assert_eq!(info.kind, ErrorKind::Transport);
            assert_eq!(info.message, "502 Bad Gateway");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_close_failure_does_not_change_created_result() {
    let platform = Arc::new(FakePlatform {
        close_error: Some(PlatformError::unknown("Validation Failed")),
        ..FakePlatform::default()
    });

    let (state, result) = orchestrator(&platform).drive(&request("x")).await;

    assert!(matches!(result, ProvisioningResult::Created(_)));
    assert_eq!(state, ProvisioningState::Closing);
    assert_eq!(platform.count(is_close), 1);
}

#[tokio::test]
async fn test_successful_close_ends_in_closed_state() {
    let platform = Arc::new(FakePlatform::default());

    let (state, _) = orchestrator(&platform).drive(&request("x")).await;

    assert_eq!(state, ProvisioningState::Closed);
}

#[tokio::test]
async fn test_undelivered_success_comment_ends_in_notifying_state() {
    let platform = Arc::new(FakePlatform {
        comment_error: Some(PlatformError::transport("connection reset")),
        ..FakePlatform::default()
    });

    let (state, result) = orchestrator(&platform).drive(&request("x")).await;

    assert!(matches!(result, ProvisioningResult::Created(_)));
    assert_eq!(state, ProvisioningState::Notifying);
    assert_eq!(platform.count(is_close), 0);
}

#[test]
fn test_terminal_states() {
    assert!(ProvisioningState::Closed.is_terminal());
    assert!(ProvisioningState::ExistsNoOp.is_terminal());
    assert!(ProvisioningState::FailedOpen.is_terminal());
    assert!(!ProvisioningState::Notifying.is_terminal());
}
