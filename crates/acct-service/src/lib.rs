//! Account Orchestration
//!
//! The front door composing the Login and Permissions services:
//!
//! - [`grants`]: the default permission template for new accounts
//! - [`workflow`]: register, login, allowed, verify, reset and remove
//! - [`dispatcher`]: `(operation, body) -> (status, body)`
//! - [`api`]: axum router over the dispatcher

pub mod api;
pub mod dispatcher;
pub mod error;
pub mod grants;
pub mod workflow;

pub use api::create_router;
pub use dispatcher::{DispatchResponse, Dispatcher, Operation};
pub use error::{DispatchError, WorkflowError};
pub use grants::default_grants;
pub use workflow::{
    LoginPayload, RegisterPayload, RemovePayload, RemoveRequest, ResetPayload, VerifyPayload,
    WorkflowOptions, Workflows,
};
