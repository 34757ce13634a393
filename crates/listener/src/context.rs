//! Assembly of a [`ProvisioningRequest`] from trigger data and configuration.

use provisioning::{
    ChannelRef, Identity, ProvisionerError, ProvisioningRequest, RepositoryId, RequestId,
};

use crate::{IssueEvent, TriggerError};

/// Configuration-resolved inputs combined with the trigger event.
#[derive(Debug, Clone, Default)]
pub struct RequestContextBuilder {
    target_repo_name: Option<String>,
    template_repo_name: Option<String>,
    template_owner: Option<String>,
}

impl RequestContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn target_repo_name(mut self, name: impl Into<String>) -> Self {
        self.target_repo_name = Some(name.into());
        self
    }

    /// Template to instantiate. When unset, the issue title names it.
    #[must_use]
    pub fn template_repo_name(mut self, name: Option<String>) -> Self {
        self.template_repo_name = name;
        self
    }

    /// Owner of the template. When unset, the request's organization.
    #[must_use]
    pub fn template_owner(mut self, owner: Option<String>) -> Self {
        self.template_owner = owner;
        self
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionerError::InvalidRequest`] when a value is missing,
    /// blank, or not a valid repository name after falling back to the event.
    /// An issue title is untrusted input and gets the same check.
    pub fn build(self, event: &IssueEvent) -> Result<ProvisioningRequest, ProvisionerError> {
        let issue = event.issue().map_err(|e| invalid("issue", e))?;

        let organization = event
            .organization_login()
            .ok_or_else(|| invalid("organization", TriggerError::MissingField("organization")))?;
        let repo = event
            .repository_full_name()
            .and_then(RepositoryId::new)
            .ok_or_else(|| invalid("repository", TriggerError::MissingField("repository.full_name")))?;
        let channel = ChannelRef::new(repo, RequestId::new(issue.number));

        let target = self.target_repo_name.unwrap_or_default();
        let template = self
            .template_repo_name
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| issue.title.clone());

        let mut request = ProvisioningRequest::try_from_parts(
            &issue.user.login,
            organization,
            &target,
            &template,
            channel,
        )?;

        if let Some(owner) = self.template_owner.and_then(Identity::new) {
            request = request.with_template_owner(owner);
        }
        Ok(request)
    }
}

fn invalid(field: &'static str, cause: TriggerError) -> ProvisionerError {
    ProvisionerError::InvalidRequest {
        field,
        reason: cause.to_string(),
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
