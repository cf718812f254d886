//! HTTP client for the Permissions service

use acct_common::{Identity, PermissionCheckRequest, PermissionCheckResult, PermissionGrant};
use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::transport::{RemoteClientConfig, RemoteTransport};
use crate::wire::{self, AllowedReply, CreateGrantsBody, IdentifierBody, RetrieveReply};
use crate::{require_identity, Endpoint, PermissionsCapability};

#[derive(Debug, Clone)]
pub struct HttpPermissionsClient {
    transport: RemoteTransport,
}

impl HttpPermissionsClient {
    pub fn new(config: RemoteClientConfig) -> reqwest::Result<Self> {
        Ok(Self {
            transport: RemoteTransport::new(config)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }
}

#[async_trait]
impl PermissionsCapability for HttpPermissionsClient {
    async fn create_grants(&self, identity: &Identity, grants: &[PermissionGrant]) -> Result<()> {
        require_identity(identity, Endpoint::CreatePermissions)?;

        let body = CreateGrantsBody {
            identifier: identity.as_str(),
            permissions: grants,
        };
        self.transport.call(Endpoint::CreatePermissions, &body).await?;
        debug!(identifier = %identity, grants = grants.len(), "Permissions created");
        Ok(())
    }

    async fn retrieve_grants(&self, identity: &Identity) -> Result<Vec<PermissionGrant>> {
        require_identity(identity, Endpoint::RetrievePermissions)?;

        let body = IdentifierBody {
            identifier: identity.as_str(),
        };
        let text = self.transport.call(Endpoint::RetrievePermissions, &body).await?;
        let reply: RetrieveReply = wire::decode(Endpoint::RetrievePermissions, &text)?;
        reply.into_reply().into_result(Endpoint::RetrievePermissions)
    }

    async fn evaluate(&self, request: &PermissionCheckRequest) -> Result<PermissionCheckResult> {
        require_identity(&request.identifier, Endpoint::Allowed)?;

        let text = self.transport.call(Endpoint::Allowed, request).await?;
        let reply: AllowedReply = wire::decode(Endpoint::Allowed, &text)?;
        reply
            .into_reply(&request.identifier)
            .into_result(Endpoint::Allowed)
    }

    async fn delete_grants(&self, identity: &Identity) -> Result<()> {
        require_identity(identity, Endpoint::DeletePermissions)?;

        let body = IdentifierBody {
            identifier: identity.as_str(),
        };
        self.transport.call(Endpoint::DeletePermissions, &body).await?;
        Ok(())
    }
}
