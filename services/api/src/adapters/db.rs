//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the Postgres implementation of the
//! storage ports from the `core` crate. It handles all interactions with the
//! database using `sqlx`.
//!
//! Every write to an employee or note emits a `pg_notify` on `document_changes`;
//! `start_change_listener` turns those notifications into live-query updates, so a
//! subscription sees writes made by any process sharing the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reviewiz_core::domain::{
    Artifact, ArtifactContent, Employee, EmployeeDraft, FederatedIdentity, Note, NoteDraft,
    NotePatch, NoteTag, PasswordAccount, SessionGrant, UserId, UserProfile,
};
use reviewiz_core::feed::{Change, ChangeFeed};
use reviewiz_core::ports::{
    CredentialStore, PortError, PortResult, ProfileOrder, ProfileStore, SnapshotStream,
    TeamStore,
};
use sqlx::postgres::PgListener;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

const CHANGE_CHANNEL: &str = "document_changes";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    feed: ChangeFeed,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            feed: ChangeFeed::default(),
        }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Subscribes to change notifications and feeds them to live queries.
    pub async fn start_change_listener(&self) -> Result<(), sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        let feed = self.feed.clone();
        tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        match serde_json::from_str::<Change>(notification.payload()) {
                            Ok(change) => feed.publish(change),
                            Err(e) => warn!("Ignoring malformed change notification: {}", e),
                        }
                    }
                    Err(e) => {
                        error!("Change listener error: {:?}", e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });
        info!("Listening for document changes on '{}'", CHANGE_CHANNEL);
        Ok(())
    }

    /// Best-effort: a lost notification only delays a live view until the next change.
    async fn notify(&self, change: Change) {
        let payload = match serde_json::to_string(&change) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Could not encode change notification: {}", e);
                return;
            }
        };
        if let Err(e) = sqlx::query("SELECT pg_notify($1, $2)")
            .bind(CHANGE_CHANNEL)
            .bind(payload)
            .execute(&self.pool)
            .await
        {
            warn!("Failed to publish change notification: {:?}", e);
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ProfileRecord {
    user_id: String,
    email: Option<String>,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
    is_paid: bool,
    is_admin: bool,
}
impl ProfileRecord {
    /// `None` when the stored key is not a usable identity.
    fn to_domain(self) -> Option<UserProfile> {
        Some(UserProfile {
            user_id: UserId::parse(&self.user_id)?,
            email: self.email,
            display_name: self.display_name,
            created_at: self.created_at,
            last_login_at: self.last_login_at,
            is_paid: self.is_paid,
            is_admin: self.is_admin,
        })
    }
}

#[derive(FromRow)]
struct EmployeeRecord {
    id: Uuid,
    name: String,
    role: String,
    created_at: DateTime<Utc>,
}
impl EmployeeRecord {
    fn to_domain(self, user_id: &UserId) -> Employee {
        Employee {
            id: self.id,
            user_id: user_id.clone(),
            name: self.name,
            role: self.role,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct NoteRecord {
    id: Uuid,
    employee_id: Uuid,
    content: String,
    tag: String,
    category: Option<String>,
    created_at: DateTime<Utc>,
    completed: bool,
}
impl NoteRecord {
    fn to_domain(self) -> Note {
        let tag = self.tag.parse().unwrap_or_else(|e| {
            warn!("Note {} has {}; showing it as neutral", self.id, e);
            NoteTag::Neutral
        });
        Note {
            id: self.id,
            employee_id: self.employee_id,
            content: self.content,
            tag,
            category: self.category,
            created_at: self.created_at,
            completed: self.completed,
        }
    }
}

#[derive(FromRow)]
struct ArtifactRecord {
    id: Uuid,
    employee_id: Uuid,
    content: Json<ArtifactContent>,
    generated_at: DateTime<Utc>,
}
impl ArtifactRecord {
    fn to_domain(self) -> Artifact {
        Artifact {
            id: self.id,
            employee_id: self.employee_id,
            content: self.content.0,
            generated_at: self.generated_at,
        }
    }
}

#[derive(FromRow)]
struct PasswordAccountRecord {
    user_id: String,
    email: String,
    hashed_password: String,
}

#[derive(FromRow)]
struct AuthSessionRecord {
    user_id: String,
    is_admin: bool,
    is_paid: bool,
}

const PROFILE_COLUMNS: &str =
    "user_id, email, display_name, created_at, last_login_at, is_paid, is_admin";
const NOTE_COLUMNS: &str = "id, employee_id, content, tag, category, created_at, completed";

//=========================================================================================
// `ProfileStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProfileStore for DbAdapter {
    async fn get_profile(&self, user_id: &UserId) -> PortResult<UserProfile> {
        let record = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {} FROM profiles WHERE user_id = $1",
            PROFILE_COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Profile {} not found", user_id)),
            _ => unexpected(e),
        })?;
        record
            .to_domain()
            .ok_or_else(|| PortError::Unexpected(format!("Profile {} has an invalid key", user_id)))
    }

    async fn create_profile(&self, profile: UserProfile) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO profiles (user_id, email, display_name, created_at, last_login_at, is_paid, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(profile.user_id.as_str())
        .bind(profile.email)
        .bind(profile.display_name)
        .bind(profile.created_at)
        .bind(profile.last_login_at)
        .bind(profile.is_paid)
        .bind(profile.is_admin)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn touch_last_login(&self, user_id: &UserId, at: DateTime<Utc>) -> PortResult<()> {
        let result = sqlx::query("UPDATE profiles SET last_login_at = $1 WHERE user_id = $2")
            .bind(at)
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Profile {} not found", user_id)));
        }
        Ok(())
    }

    async fn list_all_profiles(&self, order: ProfileOrder) -> PortResult<Vec<UserProfile>> {
        let order_by = match order {
            ProfileOrder::LastLoginDesc => "last_login_at DESC NULLS LAST",
        };
        let records = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {} FROM profiles ORDER BY {}",
            PROFILE_COLUMNS, order_by
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records
            .into_iter()
            .filter_map(|r| {
                let key = r.user_id.clone();
                let profile = r.to_domain();
                if profile.is_none() {
                    warn!("Skipping profile row with unusable key '{}'", key);
                }
                profile
            })
            .collect())
    }
}

//=========================================================================================
// `TeamStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl TeamStore for DbAdapter {
    async fn list_employees(&self, user_id: &UserId) -> PortResult<Vec<Employee>> {
        let records = sqlx::query_as::<_, EmployeeRecord>(
            "SELECT id, name, role, created_at FROM employees WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain(user_id)).collect())
    }

    async fn get_employee(&self, user_id: &UserId, employee_id: Uuid) -> PortResult<Employee> {
        let record = sqlx::query_as::<_, EmployeeRecord>(
            "SELECT id, name, role, created_at FROM employees WHERE id = $1 AND user_id = $2",
        )
        .bind(employee_id)
        .bind(user_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Employee {} not found", employee_id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain(user_id))
    }

    async fn create_employee(
        &self,
        user_id: &UserId,
        draft: EmployeeDraft,
    ) -> PortResult<Employee> {
        let record = sqlx::query_as::<_, EmployeeRecord>(
            "INSERT INTO employees (id, user_id, name, role) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, role, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id.as_str())
        .bind(draft.name)
        .bind(draft.role)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        self.notify(Change::Employees { user_id: user_id.clone() }).await;
        Ok(record.to_domain(user_id))
    }

    async fn update_employee(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
        draft: EmployeeDraft,
    ) -> PortResult<Employee> {
        let record = sqlx::query_as::<_, EmployeeRecord>(
            "UPDATE employees SET name = $1, role = $2 WHERE id = $3 AND user_id = $4 \
             RETURNING id, name, role, created_at",
        )
        .bind(draft.name)
        .bind(draft.role)
        .bind(employee_id)
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Employee {} not found", employee_id)))?;
        self.notify(Change::Employees { user_id: user_id.clone() }).await;
        Ok(record.to_domain(user_id))
    }

    async fn delete_employee(&self, user_id: &UserId, employee_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1 AND user_id = $2")
            .bind(employee_id)
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Employee {} not found", employee_id)));
        }
        self.notify(Change::Employees { user_id: user_id.clone() }).await;
        Ok(())
    }

    async fn list_notes(&self, user_id: &UserId, employee_id: Uuid) -> PortResult<Vec<Note>> {
        let records = sqlx::query_as::<_, NoteRecord>(&format!(
            "SELECT {} FROM notes WHERE employee_id = $1 AND user_id = $2 ORDER BY created_at DESC",
            NOTE_COLUMNS
        ))
        .bind(employee_id)
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_note(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
        draft: NoteDraft,
    ) -> PortResult<Note> {
        self.get_employee(user_id, employee_id).await?;
        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "INSERT INTO notes (id, employee_id, user_id, content, tag, category) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(employee_id)
        .bind(user_id.as_str())
        .bind(draft.content)
        .bind(draft.tag.as_str())
        .bind(draft.category)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        self.notify(Change::Notes { user_id: user_id.clone(), employee_id }).await;
        Ok(record.to_domain())
    }

    async fn update_note(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
        note_id: Uuid,
        patch: NotePatch,
    ) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "UPDATE notes SET content = COALESCE($1, content), tag = COALESCE($2, tag), \
             completed = COALESCE($3, completed) \
             WHERE id = $4 AND employee_id = $5 AND user_id = $6 RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(patch.content)
        .bind(patch.tag.map(|t| t.as_str()))
        .bind(patch.completed)
        .bind(note_id)
        .bind(employee_id)
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Note {} not found", note_id)))?;
        self.notify(Change::Notes { user_id: user_id.clone(), employee_id }).await;
        Ok(record.to_domain())
    }

    async fn delete_note(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
        note_id: Uuid,
    ) -> PortResult<()> {
        let result =
            sqlx::query("DELETE FROM notes WHERE id = $1 AND employee_id = $2 AND user_id = $3")
                .bind(note_id)
                .bind(employee_id)
                .bind(user_id.as_str())
                .execute(&self.pool)
                .await
                .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Note {} not found", note_id)));
        }
        self.notify(Change::Notes { user_id: user_id.clone(), employee_id }).await;
        Ok(())
    }

    async fn delete_notes_for_employee(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
    ) -> PortResult<()> {
        sqlx::query("DELETE FROM notes WHERE employee_id = $1 AND user_id = $2")
            .bind(employee_id)
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        self.notify(Change::Notes { user_id: user_id.clone(), employee_id }).await;
        Ok(())
    }

    async fn list_artifacts(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
    ) -> PortResult<Vec<Artifact>> {
        let records = sqlx::query_as::<_, ArtifactRecord>(
            "SELECT id, employee_id, content, generated_at FROM artifacts \
             WHERE employee_id = $1 AND user_id = $2 ORDER BY kind",
        )
        .bind(employee_id)
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn put_artifact(&self, user_id: &UserId, artifact: Artifact) -> PortResult<()> {
        self.get_employee(user_id, artifact.employee_id).await?;
        sqlx::query(
            "INSERT INTO artifacts (id, employee_id, user_id, kind, content, generated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (employee_id, kind) DO UPDATE \
             SET id = EXCLUDED.id, content = EXCLUDED.content, generated_at = EXCLUDED.generated_at",
        )
        .bind(artifact.id)
        .bind(artifact.employee_id)
        .bind(user_id.as_str())
        .bind(artifact.kind().as_str())
        .bind(Json(&artifact.content))
        .bind(artifact.generated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_artifacts_for_employee(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
    ) -> PortResult<()> {
        sqlx::query("DELETE FROM artifacts WHERE employee_id = $1 AND user_id = $2")
            .bind(employee_id)
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn watch_employees(&self, user_id: &UserId) -> PortResult<SnapshotStream<Employee>> {
        let adapter = self.clone();
        let owner = user_id.clone();
        let target = user_id.clone();
        Ok(self.feed.snapshots(
            move |change| matches!(change, Change::Employees { user_id } if *user_id == target),
            move || {
                let adapter = adapter.clone();
                let owner = owner.clone();
                async move { adapter.list_employees(&owner).await }
            },
        ))
    }

    async fn watch_notes(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
    ) -> PortResult<SnapshotStream<Note>> {
        self.get_employee(user_id, employee_id).await?;
        let adapter = self.clone();
        let owner = user_id.clone();
        let target = user_id.clone();
        Ok(self.feed.snapshots(
            move |change| {
                matches!(change, Change::Notes { user_id, employee_id: e }
                    if *user_id == target && *e == employee_id)
            },
            move || {
                let adapter = adapter.clone();
                let owner = owner.clone();
                async move { adapter.list_notes(&owner, employee_id).await }
            },
        ))
    }
}

//=========================================================================================
// `CredentialStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CredentialStore for DbAdapter {
    async fn create_password_account(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<PasswordAccount> {
        let email = email.trim().to_lowercase();
        let user_id = UserId::generate();
        sqlx::query(
            "INSERT INTO password_accounts (user_id, email, hashed_password) VALUES ($1, $2, $3)",
        )
        .bind(user_id.as_str())
        .bind(&email)
        .bind(hashed_password)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::Conflict(format!("Email {} already registered", email))
            }
            _ => unexpected(e),
        })?;
        Ok(PasswordAccount {
            user_id,
            email,
            hashed_password: hashed_password.to_string(),
        })
    }

    async fn get_password_account(&self, email: &str) -> PortResult<PasswordAccount> {
        let record = sqlx::query_as::<_, PasswordAccountRecord>(
            "SELECT user_id, email, hashed_password FROM password_accounts WHERE email = $1",
        )
        .bind(email.trim().to_lowercase())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("No account for {}", email)),
            _ => unexpected(e),
        })?;
        let user_id = UserId::parse(&record.user_id).ok_or_else(|| {
            PortError::Unexpected(format!("Account for {} has an invalid key", email))
        })?;
        Ok(PasswordAccount {
            user_id,
            email: record.email,
            hashed_password: record.hashed_password,
        })
    }

    async fn get_or_create_federated_account(
        &self,
        identity: &FederatedIdentity,
    ) -> PortResult<UserId> {
        sqlx::query(
            "INSERT INTO federated_accounts (provider, subject, user_id) VALUES ($1, $2, $3) \
             ON CONFLICT (provider, subject) DO NOTHING",
        )
        .bind(&identity.provider)
        .bind(&identity.subject)
        .bind(UserId::generate().as_str())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        let (raw,): (String,) = sqlx::query_as(
            "SELECT user_id FROM federated_accounts WHERE provider = $1 AND subject = $2",
        )
        .bind(&identity.provider)
        .bind(&identity.subject)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        UserId::parse(&raw)
            .ok_or_else(|| PortError::Unexpected("Federated account has an invalid key".into()))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        grant: &SessionGrant,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO auth_sessions (id, user_id, is_admin, is_paid, expires_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(session_id)
        .bind(grant.user_id.as_str())
        .bind(grant.is_admin)
        .bind(grant.is_paid)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<SessionGrant> {
        let record = sqlx::query_as::<_, AuthSessionRecord>(
            "SELECT user_id, is_admin, is_paid FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => unexpected(e),
        })?;
        let user_id = UserId::parse(&record.user_id).ok_or(PortError::Unauthorized)?;
        Ok(SessionGrant {
            user_id,
            is_admin: record.is_admin,
            is_paid: record.is_paid,
        })
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn purge_expired_auth_sessions(&self, now: DateTime<Utc>) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }
}
