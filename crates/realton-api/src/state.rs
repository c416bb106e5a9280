//! Application state management

use crate::auth::jwt::JwtConfig;
use realton_core::AppConfig;
use realton_store::DocumentStore;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Document store holding users, properties and reviews
    pub store: Arc<dyn DocumentStore>,
    /// Token signing and verification settings
    pub jwt: JwtConfig,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state over an opened store
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        let jwt = JwtConfig::from(&config.auth);
        Self {
            config,
            store,
            jwt,
            start_time: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
