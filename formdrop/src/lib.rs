//! # formdrop: multipart upload service
//!
//! `formdrop` accepts `multipart/form-data` submissions carrying two scalar fields (`a`, `b`)
//! and a `file` part, stores the file in a directory on disk and answers with a small HTML page
//! confirming the upload and embedding an `<img>` reference to the stored file.
//!
//! ## Request Flow
//!
//! 1. The target directory is resolved: the trailing path of `POST /upload/{*dir}` if present,
//!    otherwise the configured default. It is created if missing and must stay inside the
//!    storage root.
//! 2. The multipart body is read field by field. The `file` part's filename is reduced to its
//!    final component and checked against the canonical target directory.
//! 3. The file body is streamed to disk in bounded chunks, then moved into place.
//! 4. The confirmation page is rendered only after the write completed.
//!
//! Failures map to explicit status codes (see [`errors`]); a form with no file is not an error.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use formdrop::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = formdrop::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     formdrop::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config)?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await
//! }
//! ```

pub mod api;
pub mod config;
pub mod errors;
mod openapi;
pub mod render;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use openapi::ApiDoc;
use std::sync::Arc;
use storage::Storage;
use tokio::net::TcpListener;
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info};
use utoipa::OpenApi;

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .storage(Arc::new(storage))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<Storage>,
}

/// Build the application router with all routes and layers
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Uploads are unbounded; the default 2MB extractor limit does not apply
    let upload_routes = Router::new()
        .route(
            "/upload",
            get(api::handlers::upload::upload_form).post(api::handlers::upload::upload_file),
        )
        .route("/upload/", post(api::handlers::upload::upload_file))
        .route("/upload/{*dir}", post(api::handlers::upload::upload_file_to_directory))
        .layer(DefaultBodyLimit::disable());

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/add", get(api::handlers::add::add))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(upload_routes)
        .with_state(state.clone());

    let storage_config = &state.config.storage;
    if storage_config.serve_files {
        let public_path = storage_config.public_path.trim_end_matches('/');
        router = router.nest_service(public_path, ServeDir::new(state.storage.root()));
        debug!(public_path, "Serving stored files");
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The HTTP server and the state it was built from.
///
/// 1. **Create**: [`Application::new`] prepares the storage root and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests until the
///    shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with storage initialized
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting formdrop with configuration: {:#?}", config);

        let storage = Storage::new(&config.storage)?;

        let app_state = AppState::builder()
            .config(config.clone())
            .storage(Arc::new(storage))
            .build();

        let router = build_router(&app_state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "formdrop listening on http://{}, upload form at http://localhost:{}/upload",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
