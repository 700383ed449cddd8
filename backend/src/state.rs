//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! The auth key store is owned by the [`AuthService`] held here; it is
//! created once at startup and never lives in a static, so each test can
//! build an isolated state.

use crate::auth::{AuthService, Clock};
use crate::config::AppConfig;
use crate::repositories::UserRepository;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state
///
/// All fields are Arc-backed, so cloning per request is O(1).
#[derive(Clone)]
pub struct AppState {
    /// Account persistence
    pub users: Arc<dyn UserRepository>,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Password hashing and auth keys
    pub auth: AuthService,
    /// Prometheus renderer, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new application state using the system clock
    pub fn new(users: Arc<dyn UserRepository>, config: AppConfig) -> Self {
        let auth = AuthService::from_config(&config.auth);
        Self::with_auth(users, config, auth)
    }

    /// Create a state whose auth keys are driven by `clock`
    pub fn with_clock(users: Arc<dyn UserRepository>, config: AppConfig, clock: Arc<dyn Clock>) -> Self {
        let auth = AuthService::with_clock(&config.auth, clock);
        Self::with_auth(users, config, auth)
    }

    /// Create a state around an existing auth service
    pub fn with_auth(users: Arc<dyn UserRepository>, config: AppConfig, auth: AuthService) -> Self {
        Self {
            users,
            config: Arc::new(config),
            auth,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Get a reference to the account repository
    #[inline]
    pub fn users(&self) -> &dyn UserRepository {
        self.users.as_ref()
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a reference to the auth service
    #[inline]
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }
}
