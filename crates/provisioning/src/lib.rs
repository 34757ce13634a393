//! Core domain for repository provisioning.
//!
//! This crate contains the request and result types, the error classification
//! shared by every adapter, and the port traits the orchestrator drives.
//! Infrastructure crates implement the traits defined here; they never add
//! domain rules.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`Identity`, `RepositoryName`, `RequestId`, etc.) |
//! | [`types`] | Request, options, and outcome types |
//! | [`errors`] | `ErrorKind`, `PlatformError`, `ErrorInfo`, `ProvisionerError` |
//! | [`ports`] | `RepositoryClient` and `NotificationChannel` |

pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{ErrorInfo, ErrorKind, PlatformError, ProvisionerError};
pub use identifiers::{Identity, ProvisioningRunId, RepositoryId, RepositoryName, RequestId};
pub use ports::{NotificationChannel, RepositoryClient};
pub use types::{
    ChannelRef, CollaboratorRole, CreateOptions, ProvisioningRequest, ProvisioningResult,
    RepoIdentity,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
