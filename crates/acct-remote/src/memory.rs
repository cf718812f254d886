//! In-process stand-ins for the Login and Permissions services.
//!
//! Used by the server's development mode and by tests. They follow the same
//! contract as the HTTP clients, including the rejection messages the real
//! services send, and can be told to reject a given endpoint with a status
//! code to exercise failure paths.

use std::collections::HashMap;

use acct_common::{
    CheckStatus, CredentialRequest, Identity, PermissionCheckRequest, PermissionCheckResult,
    PermissionGrant,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::{RemoteError, Result};
use crate::{require_identity, CreatedIdentity, Endpoint, LoginCapability, PermissionsCapability};

/// Call journal plus injected rejections
#[derive(Debug, Default)]
struct Faults {
    calls: Mutex<Vec<Endpoint>>,
    rejections: Mutex<HashMap<Endpoint, u16>>,
}

impl Faults {
    fn enter(&self, endpoint: Endpoint) -> Result<()> {
        self.calls.lock().push(endpoint);
        match self.rejections.lock().get(&endpoint) {
            Some(status) => Err(RemoteError::Rejected {
                endpoint,
                status: *status,
                body: String::new(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredLogin {
    identity: Identity,
    password: String,
}

/// Login service held in memory, keyed by email.
///
/// Identities are name-based UUIDs of the email, so the same email always
/// maps to the same identity.
#[derive(Debug, Default)]
pub struct InMemoryLoginService {
    logins: Mutex<HashMap<String, StoredLogin>>,
    faults: Faults,
}

impl InMemoryLoginService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity_for(email: &str) -> Identity {
        Identity::new(Uuid::new_v5(&Uuid::NAMESPACE_OID, email.as_bytes()).to_string())
    }

    /// Make every call to `endpoint` fail with the given status.
    pub fn reject(&self, endpoint: Endpoint, status: u16) {
        self.faults.rejections.lock().insert(endpoint, status);
    }

    pub fn clear_rejections(&self) {
        self.faults.rejections.lock().clear();
    }

    /// Endpoints called so far, in order
    pub fn calls(&self) -> Vec<Endpoint> {
        self.faults.calls.lock().clone()
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.logins.lock().values().any(|login| &login.identity == identity)
    }
}

fn passwords_match(request: &CredentialRequest) -> bool {
    request
        .verify
        .as_deref()
        .map_or(true, |verify| verify == request.password)
}

#[async_trait]
impl LoginCapability for InMemoryLoginService {
    async fn create_identity(&self, request: &CredentialRequest) -> Result<CreatedIdentity> {
        self.faults.enter(Endpoint::Register)?;

        if !passwords_match(request) {
            return Err(RemoteError::domain(Endpoint::Register, "passwords do not match"));
        }

        let mut logins = self.logins.lock();
        if logins.contains_key(&request.email) {
            return Err(RemoteError::domain(
                Endpoint::Register,
                "ConditionalCheckFailedException: ErrCodeConditionalCheckFailedException",
            ));
        }

        let identity = Self::identity_for(&request.email);
        logins.insert(
            request.email.clone(),
            StoredLogin {
                identity: identity.clone(),
                password: request.password.clone(),
            },
        );
        debug!(identifier = %identity, "In-memory login created");

        Ok(CreatedIdentity {
            identity,
            email: request.email.clone(),
        })
    }

    async fn verify_credential(&self, email: &str, password: &str) -> Result<Identity> {
        self.faults.enter(Endpoint::Login)?;

        let logins = self.logins.lock();
        let login = logins.get(email).ok_or_else(|| {
            RemoteError::domain(Endpoint::Login, "login response err: no identity")
        })?;

        if login.password != password {
            return Err(RemoteError::domain(
                Endpoint::Login,
                "login response err: invalid password",
            ));
        }
        Ok(login.identity.clone())
    }

    async fn reset_credential(&self, request: &CredentialRequest) -> Result<Identity> {
        self.faults.enter(Endpoint::Reset)?;

        if !passwords_match(request) {
            return Err(RemoteError::domain(Endpoint::Reset, "passwords do not match"));
        }

        let mut logins = self.logins.lock();
        let login = logins
            .get_mut(&request.email)
            .ok_or_else(|| RemoteError::domain(Endpoint::Reset, "no identity"))?;
        login.password = request.password.clone();
        Ok(login.identity.clone())
    }

    async fn delete_identity(&self, identity: &Identity) -> Result<()> {
        require_identity(identity, Endpoint::DeleteLogin)?;
        self.faults.enter(Endpoint::DeleteLogin)?;

        self.logins.lock().retain(|_, login| &login.identity != identity);
        Ok(())
    }
}

/// Permissions service held in memory, keyed by identity.
#[derive(Debug, Default)]
pub struct InMemoryPermissionsService {
    grants: Mutex<HashMap<Identity, Vec<PermissionGrant>>>,
    faults: Faults,
}

impl InMemoryPermissionsService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&self, endpoint: Endpoint, status: u16) {
        self.faults.rejections.lock().insert(endpoint, status);
    }

    pub fn clear_rejections(&self) {
        self.faults.rejections.lock().clear();
    }

    pub fn calls(&self) -> Vec<Endpoint> {
        self.faults.calls.lock().clone()
    }

    pub fn stored(&self, identity: &Identity) -> Option<Vec<PermissionGrant>> {
        self.grants.lock().get(identity).cloned()
    }
}

#[async_trait]
impl PermissionsCapability for InMemoryPermissionsService {
    async fn create_grants(&self, identity: &Identity, grants: &[PermissionGrant]) -> Result<()> {
        require_identity(identity, Endpoint::CreatePermissions)?;
        self.faults.enter(Endpoint::CreatePermissions)?;

        self.grants.lock().insert(identity.clone(), grants.to_vec());
        Ok(())
    }

    async fn retrieve_grants(&self, identity: &Identity) -> Result<Vec<PermissionGrant>> {
        require_identity(identity, Endpoint::RetrievePermissions)?;
        self.faults.enter(Endpoint::RetrievePermissions)?;

        self.grants
            .lock()
            .get(identity)
            .cloned()
            .ok_or_else(|| RemoteError::domain(Endpoint::RetrievePermissions, "no permissions"))
    }

    async fn evaluate(&self, request: &PermissionCheckRequest) -> Result<PermissionCheckResult> {
        require_identity(&request.identifier, Endpoint::Allowed)?;
        self.faults.enter(Endpoint::Allowed)?;

        let grants = self.grants.lock();
        let held = grants.get(&request.identifier).map(Vec::as_slice).unwrap_or(&[]);

        let allowed = !request.permissions.is_empty()
            && request.permissions.iter().all(|pair| {
                held.iter().any(|grant| {
                    grant.name == pair.name
                        && grant.action == pair.action
                        && (grant.is_wildcard() || grant.identifier == request.identifier.as_str())
                })
            });

        Ok(PermissionCheckResult {
            identifier: request.identifier.clone(),
            status: if allowed {
                CheckStatus::Allowed
            } else {
                CheckStatus::Denied
            },
        })
    }

    async fn delete_grants(&self, identity: &Identity) -> Result<()> {
        require_identity(identity, Endpoint::DeletePermissions)?;
        self.faults.enter(Endpoint::DeletePermissions)?;

        self.grants.lock().remove(identity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DomainCode, ErrorKind};
    use acct_common::PermissionPair;

    #[tokio::test]
    async fn test_login_lifecycle() {
        let login = InMemoryLoginService::new();
        let request =
            CredentialRequest::new("tester@carpark.ninja", "tester").with_verify("tester");

        let created = login.create_identity(&request).await.unwrap();
        assert_eq!(created.identity, InMemoryLoginService::identity_for("tester@carpark.ninja"));

        let err = login.create_identity(&request).await.unwrap_err();
        assert_eq!(err.domain_code(), Some(DomainCode::LoginExists));
        assert_eq!(err.to_string(), "login already exists");

        let ident = login.verify_credential("tester@carpark.ninja", "tester").await.unwrap();
        assert_eq!(ident, created.identity);

        let err = login.verify_credential("tester@carpark.ninja", "failure").await.unwrap_err();
        assert_eq!(err.domain_code(), Some(DomainCode::InvalidPassword));
        assert_eq!(err.to_string(), "login response err: invalid password");

        let err = login.verify_credential("failure@carpark.ninja", "tester").await.unwrap_err();
        assert_eq!(err.domain_code(), Some(DomainCode::NoIdentity));

        login.delete_identity(&created.identity).await.unwrap();
        assert!(!login.contains(&created.identity));
    }

    #[tokio::test]
    async fn test_evaluate_with_wildcard() {
        let perms = InMemoryPermissionsService::new();
        let ident = Identity::new("id-1");
        perms
            .create_grants(
                &ident,
                &[
                    PermissionGrant::scoped("account", "login", &ident),
                    PermissionGrant::wildcard("carparks", "book"),
                ],
            )
            .await
            .unwrap();

        let check = |pairs: Vec<PermissionPair>| PermissionCheckRequest {
            identifier: ident.clone(),
            permissions: pairs,
        };

        let result = perms
            .evaluate(&check(vec![PermissionPair::new("account", "login")]))
            .await
            .unwrap();
        assert_eq!(result.status, CheckStatus::Allowed);

        let result = perms
            .evaluate(&check(vec![
                PermissionPair::new("account", "login"),
                PermissionPair::new("carparks", "book"),
            ]))
            .await
            .unwrap();
        assert_eq!(result.status, CheckStatus::Allowed);

        let result = perms
            .evaluate(&check(vec![PermissionPair::new("carparks", "create")]))
            .await
            .unwrap();
        assert_eq!(result.status, CheckStatus::Denied);

        let result = perms.evaluate(&check(vec![])).await.unwrap();
        assert_eq!(result.status, CheckStatus::Denied);
    }

    #[tokio::test]
    async fn test_rejection_injection_and_journal() {
        let perms = InMemoryPermissionsService::new();
        perms.reject(Endpoint::CreatePermissions, 503);

        let err = perms.create_grants(&Identity::new("id"), &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteRejected);
        assert_eq!(perms.calls(), vec![Endpoint::CreatePermissions]);

        let err = perms.delete_grants(&Identity::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedPayload);
        assert_eq!(perms.calls().len(), 1);
    }
}
