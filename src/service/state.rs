//! Service state management.
//!
//! Holds the injected task store, the token service and the deployment mode.
//! Everything here is read-only after startup.

use std::sync::Arc;

use crate::config::{DeploymentMode, ServiceConfig};
use crate::store::TaskStore;
use crate::token::TokenService;

/// Shared service state.
///
/// The store is constructed by the caller and injected here, so tests can
/// run the full router against an in-memory store.
pub struct ServiceState<S: TaskStore + 'static> {
    /// The task store.
    pub store: Arc<S>,
    /// Session token issuer/verifier.
    tokens: Arc<TokenService>,
    /// Cookie attribute mode.
    mode: DeploymentMode,
}

impl<S: TaskStore + 'static> ServiceState<S> {
    /// Create new service state.
    pub fn new(store: S, tokens: TokenService, mode: DeploymentMode) -> Self {
        Self::with_shared_store(Arc::new(store), tokens, mode)
    }

    /// Create service state around a store the caller keeps a handle to.
    pub fn with_shared_store(store: Arc<S>, tokens: TokenService, mode: DeploymentMode) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
            mode,
        }
    }

    /// Create service state from loaded configuration.
    pub fn from_config(store: Arc<S>, config: &ServiceConfig) -> Self {
        Self::with_shared_store(
            store,
            TokenService::new(config.token_secret.clone()),
            config.mode,
        )
    }

    /// The token service.
    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// The deployment mode.
    pub fn mode(&self) -> DeploymentMode {
        self.mode
    }
}

impl<S: TaskStore + 'static> Clone for ServiceState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tokens: Arc::clone(&self.tokens),
            mode: self.mode,
        }
    }
}
