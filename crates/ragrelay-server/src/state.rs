//! Application state shared across handlers.

use std::sync::Arc;

use ragrelay_domain::DomainServices;

use crate::config::ServerConfig;
use crate::relay::RelayOptions;

/// Application state shared across all handlers.
///
/// Holds only long-lived, read-only handles; nothing here changes per request.
#[derive(Clone)]
pub struct AppState {
    /// Domain services (chat, ingest, models).
    pub services: DomainServices,

    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(services: DomainServices, config: ServerConfig) -> Self {
        Self {
            services,
            config: Arc::new(config),
        }
    }

    /// Relay options for a streamed response.
    pub fn relay_options(&self, label: &'static str) -> RelayOptions {
        RelayOptions::new(label, self.config.stream_idle_timeout)
    }
}
