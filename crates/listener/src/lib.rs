//! Trigger event intake.
//!
//! Turns the GitHub `issues` event that started the run into a
//! [`provisioning::ProvisioningRequest`]:
//!
//! - [`IssueEvent`]: the subset of the webhook payload this system reads,
//!   loaded from the JSON file GitHub Actions exposes at `GITHUB_EVENT_PATH`.
//! - [`RequestContextBuilder`]: combines the event with configuration
//!   (target name, template name, template owner) into an immutable request.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Payload shapes and file access live here. The
//! orchestrator sees only the finished request.

pub mod context;
pub mod event;

pub use context::RequestContextBuilder;
pub use event::{IssueEvent, TriggerError};
