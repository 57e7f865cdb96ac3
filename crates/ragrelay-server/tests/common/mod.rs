//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use ragrelay_domain::{DomainConfig, DomainServices};
use ragrelay_llm::MockBackend;
use ragrelay_server::{Server, ServerConfig};
use ragrelay_vector::MemoryVectorStore;

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server.
    pub client: Client,
    /// The scripted inference backend, for asserting on recorded calls.
    pub backend: MockBackend,
    /// The in-memory vector store behind the server.
    pub store: MemoryVectorStore,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server whose chat stream yields "hello".
    #[allow(dead_code)]
    pub async fn start() -> Result<Self> {
        Self::start_with_backend(MockBackend::new(vec!["hel", "lo"])).await
    }

    /// Start a server over the given mock backend.
    pub async fn start_with_backend(backend: MockBackend) -> Result<Self> {
        Self::start_with(backend, ServerConfig::new()).await
    }

    /// Start a server over the given mock backend and server config.
    pub async fn start_with(backend: MockBackend, config: ServerConfig) -> Result<Self> {
        let addr = find_available_port().await?;
        let store = MemoryVectorStore::new();

        let services = DomainServices::new(
            Arc::new(backend.clone()),
            Arc::new(store.clone()),
            DomainConfig::default(),
        );

        let server = Server::new(services, config.with_bind_address(addr));
        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            backend,
            store,
            _handle: handle,
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// POST a JSON body.
    pub fn post(&self, path: &str, body: serde_json::Value) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url(), path))
            .json(&body)
    }

    /// POST a raw body with a JSON content type.
    #[allow(dead_code)]
    pub fn post_raw(&self, path: &str, body: &'static str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url(), path))
            .header("content-type", "application/json")
            .body(body)
    }
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
