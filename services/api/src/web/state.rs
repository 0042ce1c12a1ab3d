//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use reviewiz_core::ports::{
    CredentialStore, GenerationService, IdentityVerifier, ProfileStore, TeamStore,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The storage ports usually point at one adapter; they are kept apart so each
/// handler only sees the capability it needs.
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileStore>,
    pub team: Arc<dyn TeamStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub generator: Arc<dyn GenerationService>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires every storage port to the same store.
    pub fn new<S>(
        store: Arc<S>,
        generator: Arc<dyn GenerationService>,
        identity: Arc<dyn IdentityVerifier>,
        config: Arc<Config>,
    ) -> Self
    where
        S: ProfileStore + TeamStore + CredentialStore + 'static,
    {
        Self {
            profiles: store.clone(),
            team: store.clone(),
            credentials: store,
            generator,
            identity,
            config,
        }
    }
}
