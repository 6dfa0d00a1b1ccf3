//! Relay HTTP server with axum router and graceful shutdown.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{
    api_not_found, get_meta, get_status, method_not_allowed, post_bootstrap, post_build,
    preflight,
};
use super::state::AppState;
use crate::config::ServerConfig;
use crate::shell::{HostPlatform, ShellResolver, SystemProbe};

/// Response header carrying the id of a build or bootstrap run.
pub const RUN_ID_HEADER: &str = "x-build-run-id";

/// HTTP server fronting the build scripts and the configurator UI.
pub struct RelayServer {
    state: AppState,
}

impl RelayServer {
    /// Create a server resolving shells on the real host.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let resolver = ShellResolver::new(
            HostPlatform::current(),
            Arc::new(SystemProbe),
            config.shell.clone(),
        );
        Self::with_resolver(config, resolver)
    }

    /// Create a server with an explicit resolver.
    #[must_use]
    pub fn with_resolver(config: ServerConfig, resolver: ShellResolver) -> Self {
        Self {
            state: AppState::new(config, resolver),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Get the configured address as a string.
    #[must_use]
    pub fn address(&self) -> String {
        self.state.config.address()
    }

    /// Token that shuts the server down and cancels any running build.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.state.cancel.clone()
    }

    /// Build the axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let api = Router::new()
            .route(
                "/meta",
                get(get_meta)
                    .options(preflight)
                    .fallback(method_not_allowed),
            )
            .route(
                "/status",
                get(get_status)
                    .options(preflight)
                    .fallback(method_not_allowed),
            )
            .route(
                "/build",
                post(post_build)
                    .options(preflight)
                    .fallback(method_not_allowed),
            )
            .route(
                "/bootstrap",
                post(post_bootstrap)
                    .options(preflight)
                    .fallback(method_not_allowed),
            )
            .fallback(api_not_found);

        let router = Router::new()
            .nest("/api", api)
            .fallback_service(ServeDir::new(self.state.config.public_path()))
            .with_state(self.state.clone());

        let router = if self.state.config.cors_permissive {
            router.layer(CorsLayer::permissive())
        } else {
            router
        };

        router
            .layer(middleware::from_fn(preflight_no_content))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, binding to the configured address.
    ///
    /// The server will run until the cancellation token is triggered,
    /// at which point running builds are cancelled and the server shuts
    /// down gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or serve.
    pub async fn run(self) -> std::io::Result<()> {
        let addr = self.address();
        let cancel = self.state.cancel.clone();
        let app = self.build_router();

        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(
            address = %addr,
            root = %self.state.config.project_root.display(),
            "Starting relay server"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("Relay server shutting down gracefully");
            })
            .await
    }
}

/// Answer CORS preflights with 204 and no body.
async fn preflight_no_content(request: Request, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if is_options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
        *response.body_mut() = Body::empty();
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PORT;

    #[test]
    fn test_server_address() {
        let server = RelayServer::new(ServerConfig::default());
        assert_eq!(server.address(), format!("127.0.0.1:{DEFAULT_PORT}"));
    }

    #[test]
    fn test_server_with_config() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_permissive: false,
            ..ServerConfig::default()
        };
        let server = RelayServer::new(config);

        assert_eq!(server.address(), "0.0.0.0:8080");
        assert!(!server.config().cors_permissive);
    }

    #[test]
    fn test_build_router() {
        let server = RelayServer::new(ServerConfig::default());
        let _router = server.build_router();
    }

    #[test]
    fn test_build_router_without_cors() {
        let server = RelayServer::new(ServerConfig {
            cors_permissive: false,
            ..ServerConfig::default()
        });
        let _router = server.build_router();
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let server = RelayServer::new(ServerConfig {
            port: 0,
            ..ServerConfig::default()
        });
        let cancel = server.cancel_token();
        let task = tokio::spawn(server.run());

        cancel.cancel();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .expect("server did not stop")
            .unwrap();
        assert!(result.is_ok());
    }
}
