//! HTTP server for the journal.
//!
//! Wires the axum router, the shared application state, and the mapping
//! from crate errors to HTTP responses.

mod handlers;
mod session;
mod templates;

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::FromRef;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use axum_extra::extract::cookie::Key;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::render::MarkdownRenderer;
use crate::storage::Storage;

/// Shared application state for the request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Entry storage behind an async lock (a single rusqlite connection).
    storage: Arc<Mutex<Storage>>,
    /// Application configuration.
    config: Arc<Config>,
    /// Shared Markdown renderer; loading syntax definitions is expensive.
    renderer: Arc<MarkdownRenderer>,
    /// Cookie signing key.
    key: Key,
}

impl AppState {
    /// Build the shared state from configuration and an opened storage.
    #[must_use]
    pub fn new(config: Config, storage: Storage) -> Self {
        let key = session::cookie_key(&config);
        Self {
            storage: Arc::new(Mutex::new(storage)),
            config: Arc::new(config),
            renderer: Arc::new(MarkdownRenderer::new()),
            key,
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

/// Build the application router over the given state.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/add", post(handlers::create_entry))
        .route("/entry/{id}", get(handlers::show_entry))
        .route(
            "/edit/{id}",
            get(handlers::edit_form).post(handlers::update_entry),
        )
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The HTTP server.
#[derive(Debug)]
pub struct Server {
    addr: SocketAddr,
    state: AppState,
}

impl Server {
    /// Create a server from configuration and an opened storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured bind address is invalid.
    pub fn new(config: Config, storage: Storage) -> Result<Self> {
        let addr = config.bind_addr()?;
        Ok(Self {
            addr,
            state: AppState::new(config, storage),
        })
    }

    /// Run the server until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind or the server fails
    /// while serving.
    pub async fn run(self) -> Result<()> {
        let app = router(self.state);

        info!(addr = %self.addr, "Starting journal server");
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|err| Error::server(format!("failed to bind {}: {err}", self.addr)))?;

        eprintln!("Journal listening on http://{}", self.addr);
        eprintln!("Press Ctrl+C to stop");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|err| Error::server(err.to_string()))?;

        info!("Server shutdown complete");
        Ok(())
    }
}

/// Resolve when the process receives Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::EntryNotFound { id } => (
                StatusCode::NOT_FOUND,
                Html(format!("<h1>Not Found</h1><p>No entry with id {id}.</p>")),
            )
                .into_response(),
            Self::InvalidEntry { message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(format!("<h1>Invalid Entry</h1><p>{message}</p>")),
            )
                .into_response(),
            other => {
                error!("request failed: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html("<h1>Internal Server Error</h1>".to_string()),
                )
                    .into_response()
            }
        }
    }
}
