//! HTTP surface for ragrelay.
//!
//! Exposes the relay endpoints over plain JSON POSTs and streams chat and
//! model-pull output back to the client as it is produced.
//!
//! # Routes
//!
//! | Method | Path                | Response                          |
//! |--------|---------------------|-----------------------------------|
//! | POST   | `/chat`             | streamed text or `{id,text}` lines |
//! | POST   | `/tags`             | envelope with local models        |
//! | POST   | `/pull`             | streamed JSON progress lines      |
//! | POST   | `/delete`           | envelope, `data: null`            |
//! | POST   | `/addData`          | envelope, `data: "ok"`            |
//! | POST   | `/deleteCollection` | envelope, `data: null`            |
//! | GET    | `/health`           | `{status, version}`               |
//!
//! # Example
//!
//! ```ignore
//! use ragrelay_server::{Server, ServerConfig};
//!
//! let services = DomainServices::new(backend, store, DomainConfig::default());
//! let config = ServerConfig::new().with_bind_address("127.0.0.1:7010".parse()?);
//!
//! Server::new(services, config).run().await?;
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod relay;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ErrorEnvelope, Result, ServerError};
pub use relay::{ChatEncoder, Frame, FrameEncoder, PullEncoder, RelayOptions, relay, relay_body};
pub use routes::{ChatBody, Envelope, HealthResponse};
pub use state::AppState;

use std::net::SocketAddr;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use ragrelay_domain::DomainServices;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// The ragrelay HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server over the given services and configuration.
    pub fn new(services: DomainServices, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(services, config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        use axum::routing::post;

        let router = Router::new()
            .merge(routes::health_routes())
            .route("/chat", post(routes::chat_handler))
            .route("/tags", post(routes::tags_handler))
            .route("/pull", post(routes::pull_handler))
            .route("/delete", post(routes::delete_handler))
            .route("/addData", post(routes::add_data_handler))
            .route("/deleteCollection", post(routes::delete_collection_handler))
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size));

        let router = if self.state.config.cors {
            router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
        } else {
            router
        };

        router
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server on the configured address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

        info!("Listening on {}", addr);

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use ragrelay_domain::DomainConfig;
    use ragrelay_llm::MockBackend;
    use ragrelay_vector::MemoryVectorStore;
    use tower::ServiceExt;

    fn test_server(backend: MockBackend, config: ServerConfig) -> Server {
        let services = DomainServices::new(
            Arc::new(backend),
            Arc::new(MemoryVectorStore::new()),
            DomainConfig::default(),
        );
        Server::new(services, config)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_server_health_endpoint() {
        let server = test_server(MockBackend::new(vec![]), ServerConfig::new());

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_tags_returns_envelope() {
        let backend = MockBackend::new(vec![]).with_models(&["qwen:14b", "llama3"]);
        let server = test_server(backend, ServerConfig::new());

        let response = server
            .router()
            .oneshot(post_json("/tags", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["code"], 200);
        assert_eq!(json["data"][0]["name"], "qwen:14b");
        assert_eq!(json["data"][1]["name"], "llama3");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let config = ServerConfig::new().with_max_body_size(32);
        let server = test_server(MockBackend::new(vec![]), config);
        let big = format!(r#"{{"dataList":["{}"]}}"#, "x".repeat(256));

        let response = server
            .router()
            .oneshot(post_json("/addData", &big))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let json = body_json(response).await;
        assert_eq!(json["code"], 413);
        assert_eq!(json["error"], "payload_too_large");
    }

    #[tokio::test]
    async fn test_cors_preflight_allowed() {
        let server = test_server(MockBackend::new(vec![]), ServerConfig::new());

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/chat")
                    .header(header::ORIGIN, "http://example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_cors_disabled_sends_no_header() {
        let config = ServerConfig::new().with_cors(false);
        let backend = MockBackend::new(vec![]).with_models(&["m"]);
        let server = test_server(backend, config);

        let mut request = post_json("/tags", "{}");
        request
            .headers_mut()
            .insert(header::ORIGIN, "http://example.com".parse().unwrap());

        let response = server.router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }

    #[test]
    fn test_server_config_builder() {
        let config = ServerConfig::new()
            .with_bind_address("0.0.0.0:9000".parse().unwrap())
            .with_cors(false)
            .with_max_body_size(1024);

        let server = test_server(MockBackend::new(vec![]), config);
        assert_eq!(server.bind_address().port(), 9000);
        assert!(!server.state.config.cors);
        assert_eq!(server.state.config.max_body_size, 1024);
    }
}
