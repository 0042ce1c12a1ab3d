//! crates/reviewiz_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the document store, the session gateway and the
//! generation endpoint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;
use uuid::Uuid;

use crate::domain::{
    Artifact, Employee, EmployeeDraft, FederatedIdentity, Note, NoteDraft,
    NotePatch, PasswordAccount, SessionGrant, UserId, UserProfile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// A required external-service credential is missing.
    #[error("Service not configured: {0}")]
    Configuration(String),
    /// The generation endpoint answered with something that could not be used.
    #[error("Generation failed: {0}")]
    Generation(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A live query: yields the full result set on subscription and after every change.
/// Dropping the stream releases the subscription.
pub type SnapshotStream<T> = Pin<Box<dyn Stream<Item = PortResult<Vec<T>>> + Send>>;

/// Sort orders supported by the cross-user profile listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOrder {
    /// Most recent login first; profiles that never logged in come last.
    LastLoginDesc,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Profile documents, one per account under `users/{uid}/profile`.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &UserId) -> PortResult<UserProfile>;

    async fn create_profile(&self, profile: UserProfile) -> PortResult<()>;

    async fn touch_last_login(&self, user_id: &UserId, at: DateTime<Utc>) -> PortResult<()>;

    /// Reads every profile regardless of owner. The only cross-user operation; read-only.
    async fn list_all_profiles(&self, order: ProfileOrder) -> PortResult<Vec<UserProfile>>;
}

/// Everything a manager owns: employees and, nested under each, notes and generated
/// artifacts. Every call is scoped to the owning account.
#[async_trait]
pub trait TeamStore: Send + Sync {
    // --- Employees ---
    async fn list_employees(&self, user_id: &UserId) -> PortResult<Vec<Employee>>;

    async fn get_employee(&self, user_id: &UserId, employee_id: Uuid) -> PortResult<Employee>;

    async fn create_employee(&self, user_id: &UserId, draft: EmployeeDraft)
        -> PortResult<Employee>;

    async fn update_employee(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
        draft: EmployeeDraft,
    ) -> PortResult<Employee>;

    async fn delete_employee(&self, user_id: &UserId, employee_id: Uuid) -> PortResult<()>;

    // --- Notes ---
    async fn list_notes(&self, user_id: &UserId, employee_id: Uuid) -> PortResult<Vec<Note>>;

    async fn create_note(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
        draft: NoteDraft,
    ) -> PortResult<Note>;

    async fn update_note(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
        note_id: Uuid,
        patch: NotePatch,
    ) -> PortResult<Note>;

    async fn delete_note(&self, user_id: &UserId, employee_id: Uuid, note_id: Uuid)
        -> PortResult<()>;

    async fn delete_notes_for_employee(&self, user_id: &UserId, employee_id: Uuid)
        -> PortResult<()>;

    // --- Generated artifacts ---
    async fn list_artifacts(&self, user_id: &UserId, employee_id: Uuid)
        -> PortResult<Vec<Artifact>>;

    /// Stores an artifact, replacing any previous one of the same kind.
    async fn put_artifact(&self, user_id: &UserId, artifact: Artifact) -> PortResult<()>;

    async fn delete_artifacts_for_employee(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
    ) -> PortResult<()>;

    // --- Live subscriptions ---
    async fn watch_employees(&self, user_id: &UserId) -> PortResult<SnapshotStream<Employee>>;

    async fn watch_notes(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
    ) -> PortResult<SnapshotStream<Note>>;
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn create_password_account(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<PasswordAccount>;

    async fn get_password_account(&self, email: &str) -> PortResult<PasswordAccount>;

    /// Maps a provider identity to an account, creating one on first sign-in.
    async fn get_or_create_federated_account(
        &self,
        identity: &FederatedIdentity,
    ) -> PortResult<UserId>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        grant: &SessionGrant,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<SessionGrant>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    /// Removes every session that expired at or before `now`. Returns how many went.
    async fn purge_expired_auth_sessions(&self, now: DateTime<Utc>) -> PortResult<u64>;
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Submits a fully substituted prompt once and returns the raw response text.
    async fn generate(&self, prompt: &str) -> PortResult<String>;
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verifies a provider-issued ID token.
    async fn verify(&self, id_token: &str) -> PortResult<FederatedIdentity>;
}

