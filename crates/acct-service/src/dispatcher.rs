//! Operation dispatcher
//!
//! Maps `(operation, body)` to one workflow and its outcome to
//! `(status, body)`. Bodies are decoded before any workflow runs; a failed
//! workflow returns its full error chain as a plain-text body.

use acct_common::{CredentialRequest, LoginRequest, PermissionCheckRequest};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info_span, warn, Instrument};

use crate::error::DispatchError;
use crate::workflow::{RemoveRequest, Workflows};

/// Recognised operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    Login,
    Allowed,
    Verify,
    Reset,
    Remove,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Register,
        Operation::Login,
        Operation::Allowed,
        Operation::Verify,
        Operation::Reset,
        Operation::Remove,
    ];

    /// Resolve `/register`, `/login` and so on. Matching is exact, including
    /// the leading `/`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Register => "/register",
            Operation::Login => "/login",
            Operation::Allowed => "/allowed",
            Operation::Verify => "/verify",
            Operation::Reset => "/reset",
            Operation::Remove => "/delete",
        }
    }
}

/// Status code and body produced for one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResponse {
    pub status: u16,
    pub body: String,
}

impl DispatchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<DispatchError> for DispatchResponse {
    fn from(err: DispatchError) -> Self {
        Self {
            status: err.status(),
            body: err.to_string(),
        }
    }
}

pub struct Dispatcher {
    workflows: Workflows,
}

impl Dispatcher {
    pub fn new(workflows: Workflows) -> Self {
        Self { workflows }
    }

    /// Run one operation to completion. Always produces a response.
    pub async fn handle(&self, operation: &str, body: &str) -> DispatchResponse {
        self.handle_bytes(operation, body.as_bytes()).await
    }

    /// Like [`Dispatcher::handle`] for a raw body. A body that is not valid
    /// UTF-8 is rejected as malformed input before any workflow runs.
    pub async fn handle_bytes(&self, operation: &str, body: &[u8]) -> DispatchResponse {
        let span = info_span!("operation", operation = %operation);

        async move {
            match self.dispatch(operation, body).await {
                Ok(body) => {
                    debug!("Operation succeeded");
                    DispatchResponse { status: 200, body }
                }
                Err(err) => {
                    warn!(
                        stage = err.stage(),
                        kind = err.kind().map(|k| k.as_str()).unwrap_or("none"),
                        error = %err,
                        "Operation failed"
                    );
                    err.into()
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, operation: &str, body: &[u8]) -> Result<String, DispatchError> {
        let op = Operation::from_name(operation)
            .ok_or_else(|| DispatchError::UnknownOperation(operation.to_string()))?;
        let body = std::str::from_utf8(body)
            .map_err(|source| DispatchError::InvalidEncoding { source })?;

        match op {
            Operation::Register => {
                let request: CredentialRequest = decode(body)?;
                let payload = self
                    .workflows
                    .register(&request)
                    .await
                    .map_err(DispatchError::Register)?;
                encode(&payload)
            }
            Operation::Login => {
                let request: LoginRequest = decode(body)?;
                let payload = self.workflows.login(&request).await.map_err(DispatchError::Login)?;
                encode(&payload)
            }
            Operation::Allowed => {
                let request: PermissionCheckRequest = decode(body)?;
                let result = self
                    .workflows
                    .allowed(&request)
                    .await
                    .map_err(DispatchError::Allowed)?;
                encode(&result)
            }
            Operation::Verify => {
                let request: LoginRequest = decode(body)?;
                let payload = self.workflows.verify(&request).await.map_err(DispatchError::Verify)?;
                encode(&payload)
            }
            Operation::Reset => {
                let request: CredentialRequest = decode(body)?;
                let payload = self.workflows.reset(&request).await.map_err(DispatchError::Reset)?;
                encode(&payload)
            }
            Operation::Remove => {
                let request: RemoveRequest = decode(body)?;
                let payload = self.workflows.remove(&request).await.map_err(DispatchError::Remove)?;
                encode(&payload)
            }
        }
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, DispatchError> {
    serde_json::from_str(body).map_err(|source| DispatchError::MalformedInput { source })
}

fn encode<T: Serialize>(value: &T) -> Result<String, DispatchError> {
    serde_json::to_string(value).map_err(|source| DispatchError::Encode { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use acct_remote::{InMemoryLoginService, InMemoryPermissionsService};

    fn dispatcher() -> (Arc<InMemoryLoginService>, Dispatcher) {
        let login = Arc::new(InMemoryLoginService::new());
        let workflows = Workflows::new(login.clone(), Arc::new(InMemoryPermissionsService::new()));
        (login, Dispatcher::new(workflows))
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::from_name("/register"), Some(Operation::Register));
        assert_eq!(Operation::from_name("/allowed"), Some(Operation::Allowed));
        assert_eq!(Operation::from_name("allowed"), None);
        assert_eq!(Operation::from_name("register"), None);
        assert_eq!(Operation::from_name("//register"), None);
        assert_eq!(Operation::from_name("/delete"), Some(Operation::Remove));
        assert_eq!(Operation::from_name("/Register"), None);
        assert_eq!(Operation::from_name("/"), None);
        assert_eq!(Operation::from_name(""), None);
        for op in Operation::ALL {
            assert_eq!(Operation::from_name(op.name()), Some(op));
        }
    }

    #[tokio::test]
    async fn test_unknown_operation_is_404() {
        let (_login, dispatcher) = dispatcher();
        let response = dispatcher.handle("/unknown", "{}").await;
        assert_eq!(response.status, 404);
        assert_eq!(response.body, "no matching operation: /unknown");
    }

    #[tokio::test]
    async fn test_bare_operation_name_is_404() {
        let (login, dispatcher) = dispatcher();
        let response = dispatcher.handle("register", "{").await;
        assert_eq!(response.status, 404);
        assert_eq!(response.body, "no matching operation: register");
        assert!(login.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_runs_no_workflow() {
        let (login, dispatcher) = dispatcher();
        let response = dispatcher.handle("/register", "{\"email\":").await;
        assert_eq!(response.status, 400);
        assert!(response.body.starts_with("can't unmarshall input:"));
        assert!(login.calls().is_empty());

        let response = dispatcher.handle("/login", "[]").await;
        assert_eq!(response.status, 400);
        assert!(login.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_utf8_body_runs_no_workflow() {
        let (login, dispatcher) = dispatcher();
        let body = [b'{', b'"', 0xff, 0xfe, b'"', b'}'];

        let response = dispatcher.handle_bytes("/register", &body).await;
        assert_eq!(response.status, 400);
        assert!(response.body.starts_with("can't unmarshall input:"));
        assert!(login.calls().is_empty());

        let response = dispatcher.handle_bytes("/nothing", &body).await;
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_register_then_duplicate() {
        let (_login, dispatcher) = dispatcher();
        let body = r#"{"email":"tester@carpark.ninja","password":"tester","verify":"tester"}"#;

        let first = dispatcher.handle("/register", body).await;
        assert_eq!(first.status, 200);
        let payload: serde_json::Value = serde_json::from_str(&first.body).unwrap();
        assert_eq!(payload["email"], "tester@carpark.ninja");
        assert_eq!(payload["permissions"].as_array().map(Vec::len), Some(8));

        let second = dispatcher.handle("/register", body).await;
        assert_eq!(second.status, 400);
        assert_eq!(
            second.body,
            "can't register: can't get create login: login already exists"
        );
    }

    #[tokio::test]
    async fn test_allowed_denied_is_success() {
        let (_login, dispatcher) = dispatcher();
        let registered = dispatcher
            .handle("/register", r#"{"email":"a@b.c","password":"p","verify":"p"}"#)
            .await;
        let payload: serde_json::Value = serde_json::from_str(&registered.body).unwrap();
        let ident = payload["identifier"].as_str().unwrap().to_string();

        let body = serde_json::json!({
            "identifier": ident,
            "permissions": [{"name": "carparks", "action": "create"}]
        });
        let response = dispatcher.handle("/allowed", &body.to_string()).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body, format!(r#"{{"identifier":"{}","status":"denied"}}"#, ident));
    }
}
