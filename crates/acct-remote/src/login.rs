//! HTTP client for the Login service

use acct_common::{CredentialRequest, Identity};
use async_trait::async_trait;

use crate::error::{RemoteError, Result};
use crate::transport::{RemoteClientConfig, RemoteTransport};
use crate::wire::{self, IdentifierBody, LoginBody, LoginReply};
use crate::{require_identity, CreatedIdentity, Endpoint, LoginCapability};

#[derive(Debug, Clone)]
pub struct HttpLoginClient {
    transport: RemoteTransport,
}

impl HttpLoginClient {
    pub fn new(config: RemoteClientConfig) -> reqwest::Result<Self> {
        Ok(Self {
            transport: RemoteTransport::new(config)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    async fn login_call<B>(&self, endpoint: Endpoint, body: &B) -> Result<LoginReply>
    where
        B: serde::Serialize + ?Sized,
    {
        let text = self.transport.call(endpoint, body).await?;
        let reply: LoginReply = wire::decode(endpoint, &text)?;
        let reply = reply.into_reply().into_result(endpoint)?;

        if reply.identifier.trim().is_empty() {
            return Err(RemoteError::MissingIdentifier { endpoint });
        }
        Ok(reply)
    }
}

#[async_trait]
impl LoginCapability for HttpLoginClient {
    async fn create_identity(&self, request: &CredentialRequest) -> Result<CreatedIdentity> {
        let reply = self.login_call(Endpoint::Register, request).await?;
        let email = if reply.email.is_empty() {
            request.email.clone()
        } else {
            reply.email
        };

        Ok(CreatedIdentity {
            identity: Identity::new(reply.identifier),
            email,
        })
    }

    async fn verify_credential(&self, email: &str, password: &str) -> Result<Identity> {
        let body = LoginBody { email, password };
        let reply = self.login_call(Endpoint::Login, &body).await?;
        Ok(Identity::new(reply.identifier))
    }

    async fn reset_credential(&self, request: &CredentialRequest) -> Result<Identity> {
        let reply = self.login_call(Endpoint::Reset, request).await?;
        Ok(Identity::new(reply.identifier))
    }

    async fn delete_identity(&self, identity: &Identity) -> Result<()> {
        require_identity(identity, Endpoint::DeleteLogin)?;

        let body = IdentifierBody {
            identifier: identity.as_str(),
        };
        self.transport.call(Endpoint::DeleteLogin, &body).await?;
        Ok(())
    }
}
