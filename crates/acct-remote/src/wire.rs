//! JSON bodies exchanged with the backing services.
//!
//! The services overload `error` (login) and `status` (permissions) as both
//! data and error signal. Each reply type turns that into a [`Reply`] exactly
//! once, here.

use acct_common::{CheckStatus, Identity, PermissionCheckResult, PermissionGrant};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{DomainCode, RemoteError};
use crate::Endpoint;

/// A decoded remote payload: data, or a business-rule rejection.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Reply<T> {
    Ok(T),
    DomainError { code: DomainCode, message: String },
}

impl<T> Reply<T> {
    fn rejected(raw: &str) -> Self {
        let (code, message) = DomainCode::classify(raw);
        Reply::DomainError { code, message }
    }

    pub(crate) fn into_result(self, endpoint: Endpoint) -> Result<T, RemoteError> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::DomainError { code, message } => Err(RemoteError::Domain {
                endpoint,
                code,
                message,
            }),
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(
    endpoint: Endpoint,
    body: &str,
) -> Result<T, RemoteError> {
    serde_json::from_str(body).map_err(|source| RemoteError::Malformed { endpoint, source })
}

/// `error` field of a non-success response, when the remote sent one.
pub(crate) fn error_field(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        #[serde(default)]
        error: String,
    }

    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error)
        .filter(|error| !error.trim().is_empty())
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct IdentifierBody<'a> {
    pub identifier: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateGrantsBody<'a> {
    pub identifier: &'a str,
    pub permissions: &'a [PermissionGrant],
}

// ============================================================================
// Replies
// ============================================================================

/// `{identifier, email, error}` from register, login and reset
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct LoginReply {
    pub identifier: String,
    pub email: String,
    pub error: String,
}

impl LoginReply {
    pub(crate) fn into_reply(self) -> Reply<LoginReply> {
        if self.error.trim().is_empty() {
            Reply::Ok(self)
        } else {
            Reply::rejected(&self.error)
        }
    }
}

/// `{identifier, permissions, status}` from retrieve.
/// `permissions` may arrive as `null` alongside a rejection status.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RetrieveReply {
    pub identifier: String,
    pub permissions: Option<Vec<PermissionGrant>>,
    pub status: String,
}

impl RetrieveReply {
    pub(crate) fn into_reply(self) -> Reply<Vec<PermissionGrant>> {
        if self.status.trim().is_empty() {
            Reply::Ok(self.permissions.unwrap_or_default())
        } else {
            Reply::rejected(&self.status)
        }
    }
}

/// `{identifier, status}` from allowed; `status` is the verdict
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AllowedReply {
    pub identifier: String,
    pub status: String,
}

impl AllowedReply {
    pub(crate) fn into_reply(self, requested: &Identity) -> Reply<PermissionCheckResult> {
        let identifier = if self.identifier.is_empty() {
            requested.clone()
        } else {
            Identity::new(self.identifier)
        };

        match CheckStatus::parse(self.status.trim()) {
            Some(status) => Reply::Ok(PermissionCheckResult { identifier, status }),
            None if self.status.trim().is_empty() => Reply::rejected("no status"),
            None => Reply::rejected(&self.status),
        }
    }
}
