//! Account Orchestration Server
//!
//! Serves the account operations over HTTP. The Login and Permissions clients
//! are built once here and shared by every request.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ACCOUNT_CONFIG` | - | Path to a TOML config file |
//! | `ACCOUNT_HTTP_PORT` | `8080` | HTTP port |
//! | `ACCOUNT_LOGIN_URL` | - | Login service base URL |
//! | `ACCOUNT_LOGIN_AUTH_KEY` | - | Login service auth key |
//! | `ACCOUNT_PERMISSIONS_URL` | - | Permissions service base URL |
//! | `ACCOUNT_PERMISSIONS_AUTH_KEY` | - | Permissions service auth key |
//! | `ACCOUNT_REMOTE_TIMEOUT_MS` | `10000` | Per-call timeout for both services |
//! | `ACCOUNT_DEV_MODE` | `false` | Use in-memory services |
//! | `LOG_FORMAT` | `text` | `json` for structured logs |
//! | `RUST_LOG` | `info` | Log filter |

use std::sync::Arc;

use acct_config::{AppConfig, ConfigLoader, RemoteServiceConfig};
use acct_remote::{
    HttpLoginClient, HttpPermissionsClient, InMemoryLoginService, InMemoryPermissionsService,
    LoginCapability, PermissionsCapability, RemoteClientConfig,
};
use acct_service::{create_router, Dispatcher, WorkflowOptions, Workflows};
use anyhow::Context;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    acct_common::logging::init_logging("acct-server");

    info!("Starting account orchestration server");

    let config = ConfigLoader::new().load()?;
    config.validate()?;

    let workflows = build_workflows(&config)?;
    let dispatcher = Arc::new(Dispatcher::new(workflows));
    let app = create_router(dispatcher);

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Account orchestration server stopped");
    Ok(())
}

fn build_workflows(config: &AppConfig) -> anyhow::Result<Workflows> {
    let (login, permissions): (Arc<dyn LoginCapability>, Arc<dyn PermissionsCapability>) =
        if config.dev_mode {
            warn!("DEV MODE: using in-memory Login and Permissions services");
            (
                Arc::new(InMemoryLoginService::new()),
                Arc::new(InMemoryPermissionsService::new()),
            )
        } else {
            let login = HttpLoginClient::new(client_config(&config.login))
                .context("Failed to build Login client")?;
            let permissions = HttpPermissionsClient::new(client_config(&config.permissions))
                .context("Failed to build Permissions client")?;
            info!(
                login = %login.base_url(),
                permissions = %permissions.base_url(),
                timeout_ms = config.login.timeout_ms,
                "Remote clients ready"
            );
            (Arc::new(login), Arc::new(permissions))
        };

    Ok(Workflows::new(login, permissions).with_options(WorkflowOptions {
        compensate_failed_register: config.workflow.compensate_failed_register,
    }))
}

fn client_config(service: &RemoteServiceConfig) -> RemoteClientConfig {
    RemoteClientConfig::new(service.base_url.clone())
        .with_auth(service.auth_header.clone(), service.auth_key.clone())
        .with_timeout(service.timeout())
        .with_connect_timeout(service.connect_timeout())
        .with_pool(service.max_idle_connections, service.idle_timeout())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
