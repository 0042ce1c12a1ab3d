//! Shared harness for the route tests: an in-memory store, scripted external
//! collaborators and sessions seeded straight into the credential store.
#![allow(dead_code)]

use api_lib::{adapters::Unconfigured, config::Config, create_app, web::AppState};
use async_trait::async_trait;
use axum::http::HeaderValue;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use reviewiz_core::memory::MemoryStore;
use reviewiz_core::ports::{
    CredentialStore, GenerationService, IdentityVerifier, PortError, PortResult,
};
use reviewiz_core::{FederatedIdentity, SessionGrant, UserId};
use std::sync::{Arc, Mutex};

pub fn test_config() -> Arc<Config> {
    let lookup = |key: &str| (key == "DOCUMENT_STORE").then(|| "memory".to_string());
    Arc::new(Config::from_lookup(lookup).expect("default config"))
}

/// Returns the same answer to every prompt and records what it was asked.
pub struct ScriptedGenerator {
    answer: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> PortResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answer.clone())
    }
}

/// Accepts exactly one token.
pub struct StaticIdentity;

pub const GOOD_TOKEN: &str = "good-token";

#[async_trait]
impl IdentityVerifier for StaticIdentity {
    async fn verify(&self, id_token: &str) -> PortResult<FederatedIdentity> {
        if id_token != GOOD_TOKEN {
            return Err(PortError::Unauthorized);
        }
        Ok(FederatedIdentity {
            provider: "google".into(),
            subject: "g-123".into(),
            email: Some("fed@example.com".into()),
            display_name: Some("Fed User".into()),
        })
    }
}

pub struct Harness {
    pub server: TestServer,
    pub store: MemoryStore,
}

fn unconfigured_state(store: &MemoryStore) -> AppState {
    AppState::new(
        Arc::new(store.clone()),
        Arc::new(Unconfigured::new("GEMINI_API_KEY or OPENAI_API_KEY")),
        Arc::new(Unconfigured::new("GOOGLE_CLIENT_ID")),
        test_config(),
    )
}

pub fn harness_with(
    generator: Arc<dyn GenerationService>,
    identity: Arc<dyn IdentityVerifier>,
) -> Harness {
    let store = MemoryStore::new();
    let state = AppState::new(Arc::new(store.clone()), generator, identity, test_config());
    let server = TestServer::new(create_app(Arc::new(state))).expect("Failed to create TestServer");
    Harness { server, store }
}

/// Serves over a real socket so WebSocket upgrades work.
pub fn live_harness() -> Harness {
    let store = MemoryStore::new();
    let app = create_app(Arc::new(unconfigured_state(&store)));
    let server = TestServer::builder()
        .http_transport()
        .build(app)
        .expect("Failed to create TestServer");
    Harness { server, store }
}

/// A harness whose external collaborators are all unconfigured.
pub fn harness() -> Harness {
    let store = MemoryStore::new();
    let app = create_app(Arc::new(unconfigured_state(&store)));
    let server = TestServer::new(app).expect("Failed to create TestServer");
    Harness { server, store }
}

/// Seeds an auth session carrying the given flags and returns its `Cookie` header value.
pub async fn session_cookie(store: &MemoryStore, user: &str, is_admin: bool) -> HeaderValue {
    let grant = SessionGrant {
        user_id: UserId::parse(user).expect("valid user id"),
        is_admin,
        is_paid: false,
    };
    let session_id = format!("sid-{}", user);
    store
        .create_auth_session(&session_id, &grant, Utc::now() + Duration::days(1))
        .await
        .expect("seed session");
    HeaderValue::from_str(&format!("session={}", session_id)).expect("cookie header")
}
