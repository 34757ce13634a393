//! Comment bodies posted on the request thread.

use provisioning::{CollaboratorRole, ProvisioningRequest, RepoIdentity};

/// Posted after the repository was created and `role` was granted.
pub fn created(
    request: &ProvisioningRequest,
    repo: &RepoIdentity,
    role: CollaboratorRole,
) -> String {
    let article = if role == CollaboratorRole::Admin { "an" } else { "a" };
    format!(
        "Repository created successfully: {}\nUser {} added as {article} {role} to {}",
        repo.url,
        request.requester(),
        request.target_repo_name()
    )
}

/// Posted when the target repository is already there.
pub fn already_exists(request: &ProvisioningRequest) -> String {
    format!(
        "Repository {} already exists; no action taken.",
        request.target_repository()
    )
}

/// Posted when any step failed. `message` is included verbatim.
pub fn failed(message: &str) -> String {
    format!("Failed to create repository: {message}")
}
