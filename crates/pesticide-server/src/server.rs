//! HTTP server implementation.
//!
//! This module wires the handlers into an `axum` router and runs it until
//! Ctrl-C.

use crate::context::AppState;
use crate::error::Result;
use crate::handlers;
use axum::Router;
use axum::routing::{get, post, put};
use tokio::net::TcpListener;
use tracing::info;

/// The pesticide HTTP server.
#[derive(Debug, Clone)]
pub struct PesticideServer {
    state: AppState,
}

impl PesticideServer {
    /// Creates a server over `state`.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// The full application router, with every route mounted under `/api`.
    #[must_use]
    pub fn router(&self) -> Router {
        let api = Router::new()
            .route("/issues", get(handlers::list_issues))
            .route("/issues/newIssue", post(handlers::create_issue))
            .route("/issues/v/{tag}", post(handlers::view_issue))
            .route("/issues/v/{tag}/comment", post(handlers::add_comment))
            .route("/issues/v/{tag}/close", put(handlers::close_issue))
            .route("/issues/newCategory", post(handlers::create_category))
            .route("/issues/newProject", post(handlers::create_project))
            .route("/issues/getCategories", get(handlers::list_categories))
            .route("/issues/getProjects", get(handlers::list_projects))
            .route("/search/{query}", get(handlers::search))
            .route("/users/permissions", get(handlers::permissions));

        Router::new()
            .nest("/api", api)
            .with_state(self.state.clone())
    }

    /// Serves on `listener` until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails while accepting connections.
    pub async fn run(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        info!(%addr, prefix = %self.state.service.prefix(), "Listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
