//! services/api/src/adapters/identity.rs
//!
//! Verifies Google ID tokens for federated sign-in. The token is checked by
//! Google's tokeninfo endpoint; this adapter then pins the audience and issuer.

use async_trait::async_trait;
use reviewiz_core::domain::FederatedIdentity;
use reviewiz_core::ports::{IdentityVerifier, PortError, PortResult};
use serde::Deserialize;
use tracing::{error, warn};

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[derive(Deserialize)]
struct TokenInfo {
    iss: String,
    aud: String,
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<String>,
    name: Option<String>,
}

/// An adapter that implements `IdentityVerifier` for Google accounts.
#[derive(Clone)]
pub struct GoogleIdentityAdapter {
    http: reqwest::Client,
    client_id: String,
}

impl GoogleIdentityAdapter {
    pub fn new(client_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
        }
    }

    fn check(&self, info: TokenInfo) -> PortResult<FederatedIdentity> {
        if info.aud != self.client_id {
            warn!("Rejected ID token issued for another audience");
            return Err(PortError::Unauthorized);
        }
        if !GOOGLE_ISSUERS.contains(&info.iss.as_str()) {
            warn!("Rejected ID token from issuer {}", info.iss);
            return Err(PortError::Unauthorized);
        }
        // Unverified addresses are not shown as the account's email.
        let email = match info.email_verified.as_deref() {
            Some("true") => info.email,
            _ => None,
        };
        Ok(FederatedIdentity {
            provider: "google".to_string(),
            subject: info.sub,
            email,
            display_name: info.name,
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdentityAdapter {
    async fn verify(&self, id_token: &str) -> PortResult<FederatedIdentity> {
        let response = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| {
                error!("Token verification request failed: {}", e);
                PortError::Unexpected(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(PortError::Unauthorized);
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Unreadable tokeninfo response: {}", e)))?;
        self.check(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(aud: &str, iss: &str, verified: Option<&str>) -> TokenInfo {
        TokenInfo {
            iss: iss.to_string(),
            aud: aud.to_string(),
            sub: "1234".to_string(),
            email: Some("ada@example.com".to_string()),
            email_verified: verified.map(str::to_string),
            name: Some("Ada".to_string()),
        }
    }

    #[test]
    fn accepts_matching_audience_and_issuer() {
        let adapter = GoogleIdentityAdapter::new("client".into());
        let identity = adapter
            .check(info("client", "https://accounts.google.com", Some("true")))
            .unwrap();
        assert_eq!(identity.subject, "1234");
        assert_eq!(identity.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn rejects_foreign_audience_or_issuer() {
        let adapter = GoogleIdentityAdapter::new("client".into());
        assert!(adapter.check(info("other", "accounts.google.com", Some("true"))).is_err());
        assert!(adapter.check(info("client", "evil.example", Some("true"))).is_err());
    }

    #[test]
    fn drops_unverified_email() {
        let adapter = GoogleIdentityAdapter::new("client".into());
        let identity = adapter.check(info("client", "accounts.google.com", None)).unwrap();
        assert!(identity.email.is_none());
    }
}
