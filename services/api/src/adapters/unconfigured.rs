//! services/api/src/adapters/unconfigured.rs
//!
//! Stand-ins for collaborators whose credentials are missing. Every call fails
//! with `PortError::Configuration`, which handlers report as 503.

use async_trait::async_trait;
use reviewiz_core::domain::FederatedIdentity;
use reviewiz_core::ports::{GenerationService, IdentityVerifier, PortError, PortResult};

/// Names the missing setting in every error it returns.
#[derive(Clone, Debug)]
pub struct Unconfigured {
    setting: &'static str,
}

impl Unconfigured {
    pub fn new(setting: &'static str) -> Self {
        Self { setting }
    }

    fn error(&self) -> PortError {
        PortError::Configuration(format!("{} is not set", self.setting))
    }
}

#[async_trait]
impl GenerationService for Unconfigured {
    async fn generate(&self, _prompt: &str) -> PortResult<String> {
        Err(self.error())
    }
}

#[async_trait]
impl IdentityVerifier for Unconfigured {
    async fn verify(&self, _id_token: &str) -> PortResult<FederatedIdentity> {
        Err(self.error())
    }
}
