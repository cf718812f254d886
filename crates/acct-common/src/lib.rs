use serde::{Deserialize, Serialize};
use std::fmt;

pub mod logging;

/// Scope identifier meaning "applies to every identity".
pub const WILDCARD_SCOPE: &str = "*";

// ============================================================================
// Identity
// ============================================================================

/// Opaque account handle issued by the Login service.
///
/// The orchestrator never mints identities; it only carries the value the
/// Login service returned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the zero value, which no remote call accepts.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Email/password pair with an optional confirmation, used by register and reset.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequest {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<String>,
}

impl CredentialRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            verify: None,
        }
    }

    pub fn with_verify(mut self, verify: impl Into<String>) -> Self {
        self.verify = Some(verify.into());
        self
    }
}

// Passwords never reach the logs.
impl fmt::Debug for CredentialRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .field("verify", &self.verify.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Email/password pair for login and verify.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

// ============================================================================
// Permissions
// ============================================================================

/// A (resource, action, scope) triple.
///
/// `identifier` is either a concrete identity or [`WILDCARD_SCOPE`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub name: String,
    pub action: String,
    pub identifier: String,
}

impl PermissionGrant {
    /// Grant scoped to a single identity.
    pub fn scoped(name: &str, action: &str, identity: &Identity) -> Self {
        Self {
            name: name.to_string(),
            action: action.to_string(),
            identifier: identity.as_str().to_string(),
        }
    }

    /// Grant that applies to all identities.
    pub fn wildcard(name: &str, action: &str) -> Self {
        Self {
            name: name.to_string(),
            action: action.to_string(),
            identifier: WILDCARD_SCOPE.to_string(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.identifier == WILDCARD_SCOPE
    }
}

/// A resource/action pair to test against an identity's grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionPair {
    pub name: String,
    pub action: String,
}

impl PermissionPair {
    pub fn new(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: action.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCheckRequest {
    pub identifier: Identity,
    pub permissions: Vec<PermissionPair>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Allowed,
    Denied,
}

impl CheckStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "allowed" => Some(Self::Allowed),
            "denied" => Some(Self::Denied),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Denied => "denied",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single verdict for a whole check request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCheckResult {
    pub identifier: Identity,
    pub status: CheckStatus,
}
