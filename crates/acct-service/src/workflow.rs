//! Account workflows
//!
//! Each workflow is a fixed, strictly sequential chain of capability calls.
//! A step runs only after the previous one returned, and the first failure
//! stops the chain.

use std::sync::Arc;

use acct_common::{
    CredentialRequest, Identity, LoginRequest, PermissionCheckRequest, PermissionCheckResult,
    PermissionGrant,
};
use acct_remote::{LoginCapability, PermissionsCapability};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::WorkflowError;
use crate::grants::default_grants;

/// Behaviour switches for the workflows
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// Delete the new login when its default grants cannot be stored
    pub compensate_failed_register: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            compensate_failed_register: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterPayload {
    pub identifier: Identity,
    pub email: String,
    pub permissions: Vec<PermissionGrant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginPayload {
    pub identifier: Identity,
    pub permissions: Vec<PermissionGrant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPayload {
    pub identifier: Identity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPayload {
    pub identifier: Identity,
    pub email: String,
}

/// Account to tear down
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveRequest {
    pub identifier: Identity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovePayload {
    pub identifier: Identity,
    pub status: String,
}

/// The account workflows over one Login and one Permissions capability.
///
/// Capabilities are long-lived and shared; a `Workflows` value holds no
/// per-request state and can serve any number of concurrent operations.
#[derive(Clone)]
pub struct Workflows {
    login: Arc<dyn LoginCapability>,
    permissions: Arc<dyn PermissionsCapability>,
    options: WorkflowOptions,
}

impl Workflows {
    pub fn new(
        login: Arc<dyn LoginCapability>,
        permissions: Arc<dyn PermissionsCapability>,
    ) -> Self {
        Self {
            login,
            permissions,
            options: WorkflowOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WorkflowOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &WorkflowOptions {
        &self.options
    }

    /// Create a login, then install the default grants for it.
    pub async fn register(
        &self,
        request: &CredentialRequest,
    ) -> Result<RegisterPayload, WorkflowError> {
        let created = self
            .login
            .create_identity(request)
            .await
            .map_err(WorkflowError::CreateLogin)?;

        let identity = created.identity;
        let grants = default_grants(&identity);

        if let Err(e) = self.permissions.create_grants(&identity, &grants).await {
            if self.options.compensate_failed_register {
                self.compensate_register(&identity).await;
            } else {
                warn!(identifier = %identity, "Login left without permissions");
            }
            return Err(WorkflowError::CreatePermissions(e));
        }

        info!(identifier = %identity, grants = grants.len(), "Account registered");

        Ok(RegisterPayload {
            identifier: identity,
            email: created.email,
            permissions: grants,
        })
    }

    /// Best-effort removal of a login whose grants were never stored.
    /// The outcome is logged only.
    async fn compensate_register(&self, identity: &Identity) {
        match self.login.delete_identity(identity).await {
            Ok(()) => info!(
                identifier = %identity,
                "Rolled back login after failed permissions create"
            ),
            Err(e) => warn!(
                identifier = %identity,
                error = %e,
                "Could not roll back login after failed permissions create"
            ),
        }
    }

    /// Verify credentials, then fetch the identity's grants.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginPayload, WorkflowError> {
        let identity = self.verify_identity(request).await?;

        let permissions = self
            .permissions
            .retrieve_grants(&identity)
            .await
            .map_err(WorkflowError::RetrieveGrants)?;

        debug!(identifier = %identity, grants = permissions.len(), "Login succeeded");

        Ok(LoginPayload {
            identifier: identity,
            permissions,
        })
    }

    /// Pass the check through to the Permissions service.
    pub async fn allowed(
        &self,
        request: &PermissionCheckRequest,
    ) -> Result<PermissionCheckResult, WorkflowError> {
        let result = self
            .permissions
            .evaluate(request)
            .await
            .map_err(WorkflowError::Evaluate)?;

        debug!(identifier = %result.identifier, status = %result.status, "Permissions evaluated");
        Ok(result)
    }

    /// Verify credentials only.
    pub async fn verify(&self, request: &LoginRequest) -> Result<VerifyPayload, WorkflowError> {
        let identifier = self.verify_identity(request).await?;
        Ok(VerifyPayload { identifier })
    }

    pub async fn reset(&self, request: &CredentialRequest) -> Result<ResetPayload, WorkflowError> {
        let identifier = self
            .login
            .reset_credential(request)
            .await
            .map_err(WorkflowError::ResetLogin)?;

        info!(identifier = %identifier, "Password reset");

        Ok(ResetPayload {
            identifier,
            email: request.email.clone(),
        })
    }

    /// Delete the login, then its grants.
    pub async fn remove(&self, request: &RemoveRequest) -> Result<RemovePayload, WorkflowError> {
        let identity = &request.identifier;

        self.login
            .delete_identity(identity)
            .await
            .map_err(WorkflowError::DeleteLogin)?;

        self.permissions
            .delete_grants(identity)
            .await
            .map_err(WorkflowError::DeletePermissions)?;

        info!(identifier = %identity, "Account removed");

        Ok(RemovePayload {
            identifier: identity.clone(),
            status: "deleted".to_string(),
        })
    }

    async fn verify_identity(&self, request: &LoginRequest) -> Result<Identity, WorkflowError> {
        self.login
            .verify_credential(&request.email, &request.password)
            .await
            .map_err(WorkflowError::Verify)
    }
}
