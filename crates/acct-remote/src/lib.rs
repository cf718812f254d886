//! Remote Service Capabilities
//!
//! Narrow interfaces to the two backing services the account orchestrator
//! composes:
//!
//! - [`LoginCapability`]: credential storage and identity issuance
//! - [`PermissionsCapability`]: grant storage and evaluation
//!
//! The HTTP implementations ([`HttpLoginClient`], [`HttpPermissionsClient`])
//! are built once at startup and share a pooled `reqwest::Client` each. Remote
//! payloads are decoded once at this boundary into a tagged reply, so callers
//! branch on [`RemoteError`] / [`ErrorKind`] rather than on response strings.
//! [`memory`] holds in-process stand-ins with the same contract.

use std::fmt;

use acct_common::{
    CredentialRequest, Identity, PermissionCheckRequest, PermissionCheckResult, PermissionGrant,
};
use async_trait::async_trait;

pub mod error;
pub mod login;
pub mod memory;
pub mod permissions;
pub mod transport;
pub(crate) mod wire;

pub use error::{DomainCode, ErrorKind, RemoteError, Result};
pub use login::HttpLoginClient;
pub use memory::{InMemoryLoginService, InMemoryPermissionsService};
pub use permissions::HttpPermissionsClient;
pub use transport::RemoteClientConfig;

/// Every remote operation the orchestrator may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Register,
    Login,
    Reset,
    DeleteLogin,
    CreatePermissions,
    RetrievePermissions,
    Allowed,
    DeletePermissions,
}

impl Endpoint {
    /// Path relative to the owning service's base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Register => "/register",
            Endpoint::Login => "/login",
            Endpoint::Reset => "/reset",
            Endpoint::DeleteLogin | Endpoint::DeletePermissions => "/delete",
            Endpoint::CreatePermissions => "/create",
            Endpoint::RetrievePermissions => "/retrieve",
            Endpoint::Allowed => "/allowed",
        }
    }

    pub fn method(&self) -> reqwest::Method {
        match self {
            Endpoint::DeleteLogin | Endpoint::DeletePermissions => reqwest::Method::DELETE,
            _ => reqwest::Method::POST,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Endpoint::Register => "register",
            Endpoint::Login => "login",
            Endpoint::Reset => "reset",
            Endpoint::DeleteLogin => "delete login",
            Endpoint::CreatePermissions => "create permissions",
            Endpoint::RetrievePermissions => "retrieve permissions",
            Endpoint::Allowed => "allowed",
            Endpoint::DeletePermissions => "delete permissions",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity confirmed created by the Login service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIdentity {
    pub identity: Identity,
    pub email: String,
}

/// Zero-value identities are refused before any request is built.
pub(crate) fn require_identity(identity: &Identity, endpoint: Endpoint) -> Result<()> {
    if identity.is_empty() {
        Err(RemoteError::EmptyIdentity { endpoint })
    } else {
        Ok(())
    }
}

/// Login service contract.
#[async_trait]
pub trait LoginCapability: Send + Sync {
    /// Create a login; fails with `login already exists` for a known email.
    async fn create_identity(&self, request: &CredentialRequest) -> Result<CreatedIdentity>;

    /// Check an email/password pair and return the identity it belongs to.
    async fn verify_credential(&self, email: &str, password: &str) -> Result<Identity>;

    /// Replace the password of an existing login.
    async fn reset_credential(&self, request: &CredentialRequest) -> Result<Identity>;

    async fn delete_identity(&self, identity: &Identity) -> Result<()>;
}

/// Permissions service contract.
#[async_trait]
pub trait PermissionsCapability: Send + Sync {
    async fn create_grants(&self, identity: &Identity, grants: &[PermissionGrant]) -> Result<()>;

    /// Grants in the order the service stores them.
    async fn retrieve_grants(&self, identity: &Identity) -> Result<Vec<PermissionGrant>>;

    /// Collapse the requested pairs to a single allowed/denied verdict.
    async fn evaluate(&self, request: &PermissionCheckRequest) -> Result<PermissionCheckResult>;

    async fn delete_grants(&self, identity: &Identity) -> Result<()>;
}
