//! Workflow and dispatch errors
//!
//! Every remote failure is wrapped once by the workflow step that produced it
//! and once more by the operation that ran the workflow. The `Display` chain
//! of a [`DispatchError`] is the body of a failed response, e.g.
//! `can't register: can't get create login: login already exists`.

use acct_remote::{ErrorKind, RemoteError};
use thiserror::Error;

/// Failure of one workflow step
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("can't get create login: {0}")]
    CreateLogin(#[source] RemoteError),

    #[error("can't create permissions: {0}")]
    CreatePermissions(#[source] RemoteError),

    #[error("can't get login for user: {0}")]
    Verify(#[source] RemoteError),

    #[error("can't get permissions for user: {0}")]
    RetrieveGrants(#[source] RemoteError),

    #[error("can't evaluate permissions: {0}")]
    Evaluate(#[source] RemoteError),

    #[error("can't reset login: {0}")]
    ResetLogin(#[source] RemoteError),

    #[error("can't delete login: {0}")]
    DeleteLogin(#[source] RemoteError),

    #[error("can't delete permissions: {0}")]
    DeletePermissions(#[source] RemoteError),
}

impl WorkflowError {
    pub fn remote(&self) -> &RemoteError {
        match self {
            WorkflowError::CreateLogin(e)
            | WorkflowError::CreatePermissions(e)
            | WorkflowError::Verify(e)
            | WorkflowError::RetrieveGrants(e)
            | WorkflowError::Evaluate(e)
            | WorkflowError::ResetLogin(e)
            | WorkflowError::DeleteLogin(e)
            | WorkflowError::DeletePermissions(e) => e,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.remote().kind()
    }

    /// Step tag, stable across message changes
    pub fn stage(&self) -> &'static str {
        match self {
            WorkflowError::CreateLogin(_) => "CreateLoginFailed",
            WorkflowError::CreatePermissions(_) => "CreatePermissionsFailed",
            WorkflowError::Verify(_) => "VerifyFailed",
            WorkflowError::RetrieveGrants(_) => "RetrieveGrantsFailed",
            WorkflowError::Evaluate(e) if e.kind() == ErrorKind::TransportError => {
                "EvaluateUnavailable"
            }
            WorkflowError::Evaluate(_) => "EvaluateFailed",
            WorkflowError::ResetLogin(_) => "ResetLoginFailed",
            WorkflowError::DeleteLogin(_) => "DeleteLoginFailed",
            WorkflowError::DeletePermissions(_) => "DeletePermissionsFailed",
        }
    }
}

/// Failure of one dispatched operation
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("can't register: {0}")]
    Register(#[source] WorkflowError),

    #[error("can't get login: {0}")]
    Login(#[source] WorkflowError),

    #[error("can't get allowed: {0}")]
    Allowed(#[source] WorkflowError),

    #[error("can't verify: {0}")]
    Verify(#[source] WorkflowError),

    #[error("can't reset: {0}")]
    Reset(#[source] WorkflowError),

    #[error("can't delete: {0}")]
    Remove(#[source] WorkflowError),

    #[error("can't unmarshall input: {source}")]
    MalformedInput {
        #[source]
        source: serde_json::Error,
    },

    #[error("can't unmarshall input: {source}")]
    InvalidEncoding {
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("can't marshal response: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },

    #[error("no matching operation: {0}")]
    UnknownOperation(String),
}

impl DispatchError {
    pub fn workflow(&self) -> Option<&WorkflowError> {
        match self {
            DispatchError::Register(e)
            | DispatchError::Login(e)
            | DispatchError::Allowed(e)
            | DispatchError::Verify(e)
            | DispatchError::Reset(e)
            | DispatchError::Remove(e) => Some(e),
            _ => None,
        }
    }

    /// Classification of the failure; `None` for an unrecognised operation.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            DispatchError::MalformedInput { .. }
            | DispatchError::InvalidEncoding { .. }
            | DispatchError::Encode { .. } => Some(ErrorKind::MalformedPayload),
            DispatchError::UnknownOperation(_) => None,
            other => other.workflow().map(WorkflowError::kind),
        }
    }

    /// Operation-level tag, e.g. `RegisterFailed`
    pub fn stage(&self) -> &'static str {
        match self {
            DispatchError::Register(_) => "RegisterFailed",
            DispatchError::Login(_) => "LoginFailed",
            DispatchError::Allowed(_) => "AllowedFailed",
            DispatchError::Verify(_) => "VerifyFailed",
            DispatchError::Reset(_) => "ResetFailed",
            DispatchError::Remove(_) => "RemoveFailed",
            DispatchError::MalformedInput { .. } | DispatchError::InvalidEncoding { .. } => {
                "MalformedInput"
            }
            DispatchError::Encode { .. } => "EncodeFailed",
            DispatchError::UnknownOperation(_) => "NoMatchingOperation",
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            DispatchError::UnknownOperation(_) => 404,
            DispatchError::Encode { .. } => 500,
            _ => 400,
        }
    }
}
