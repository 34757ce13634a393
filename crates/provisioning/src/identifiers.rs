//! Newtype domain identifiers.
//!
//! Every name that crosses a port boundary is a distinct newtype, so an
//! [`Identity`] (a login) can never be passed where a [`RepositoryName`] is
//! expected even though both are strings underneath.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// An optional predicate further restricts the trimmed value.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        string_id! {
            $(#[$attr])*
            $name, |_: &str| true
        }
    };
    (
        $(#[$attr:meta])*
        $name:ident, $accepts:expr
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is blank
            /// or not well formed.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                let trimmed = v.trim();
                if trimmed.is_empty() || !($accepts)(trimmed) {
                    None
                } else {
                    Some(Self(trimmed.to_string()))
                }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// An opaque login or handle: a user requesting a repository, or the
    /// organization that owns it.
    ///
    /// No internal structure is assumed beyond being non-blank.
    Identity
}

string_id! {
    /// A bare repository name without its owner (e.g. `"my-service"`).
    ///
    /// Limited to the characters GitHub allows in repository names
    /// (`A-Z a-z 0-9 . _ -`, at most 100 of them). `.` and `..` are rejected.
    RepositoryName, is_repository_name
}

/// Maximum length GitHub accepts for a repository name.
pub const MAX_REPOSITORY_NAME_LEN: usize = 100;

fn is_repository_name(value: &str) -> bool {
    value != "."
        && value != ".."
        && value.len() <= MAX_REPOSITORY_NAME_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Identifies a GitHub repository in `"owner/repo"` format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryId(String);

impl RepositoryId {
    /// Creates a [`RepositoryId`] from a full `"owner/repo"` string.
    ///
    /// Returns `None` unless the value has exactly one `/` with a non-empty
    /// segment on each side.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        let (owner, repo) = v.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self(v))
    }

    /// Builds a [`RepositoryId`] from its owner and name parts.
    pub fn from_parts(owner: &Identity, name: &RepositoryName) -> Self {
        Self(format!("{owner}/{name}"))
    }

    /// Returns the owner segment.
    pub fn owner(&self) -> &str {
        self.0.split_once('/').map_or("", |(owner, _)| owner)
    }

    /// Returns the repository name segment.
    pub fn name(&self) -> &str {
        self.0.split_once('/').map_or("", |(_, name)| name)
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: GitHub-integer-backed
// ---------------------------------------------------------------------------

/// Identifies the request (issue) within its repository that triggered
/// provisioning.
///
/// Wraps the issue number assigned by GitHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a new identifier from a raw integer.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single provisioning run.
///
/// Generated fresh for every invocation and recorded on the run span so all
/// log lines from one run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProvisioningRunId(Uuid);

impl ProvisioningRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`ProvisioningRunId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for ProvisioningRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
