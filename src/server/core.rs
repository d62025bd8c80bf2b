use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::post;
use log::{info, warn};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::middleware::{log_request, require_token};
use crate::server::handlers;
use crate::storage::StorageService;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<StorageService>,
    pub internal_token: Arc<str>,
}

impl AppState {
    pub fn new(storage: StorageService, internal_token: &str) -> Self {
        Self {
            storage: Arc::new(storage),
            internal_token: Arc::from(internal_token),
        }
    }
}

/// Build the HTTP router
///
/// The storage API sits behind the token gate; `/public` serves stored
/// files read-only so returned URLs resolve.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let public_root = state
        .storage
        .file_store()
        .resolver()
        .root()
        .as_path()
        .to_path_buf();

    let api = Router::new()
        .route(
            "/files",
            post(handlers::upload).delete(handlers::delete_files),
        )
        .route("/folders", post(handlers::create_folder))
        .route("/archive", post(handlers::archive_folder))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state);

    Router::new()
        .merge(api)
        .nest_service("/public", ServeDir::new(public_root))
        .layer(middleware::from_fn(log_request))
}

pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let storage_config = config.storage();

        std::fs::create_dir_all(&storage_config.root).map_err(ServerError::StorageRoot)?;
        let storage =
            StorageService::from_config(&storage_config).map_err(ServerError::StorageRoot)?;

        info!(
            "Storage root directory: {}",
            storage.file_store().resolver().root().as_path().display()
        );

        let state = AppState::new(storage, &config.internal_token);
        Ok(Self { config, state })
    }

    pub fn router(&self) -> Router {
        router(self.state.clone(), self.config.max_upload_bytes())
    }

    pub async fn start(self) -> Result<(), ServerError> {
        let addr = self.config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        info!(
            "Starting file storage server on {} (max upload {} MB)",
            addr, self.config.max_upload_mb
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(ServerError::Serve)?;

        info!("Server shutting down...");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
