//! crates/reviewiz_core/src/memory.rs
//!
//! In-memory document store for single-process runs and tests.
//!
//! Documents are kept under hierarchical paths that mirror the hosted layout:
//!
//! ```text
//! users/{uid}/profile/account
//! users/{uid}/employees/{employee_id}
//! users/{uid}/employees/{employee_id}/notes/{note_id}
//! users/{uid}/employees/{employee_id}/artifacts/{kind}
//! ```
//!
//! Profile documents do not carry their owner; `list_all_profiles` recovers it from
//! the path, like a collection-group query over every `profile` container.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{
    Artifact, Employee, EmployeeDraft, FederatedIdentity, Note, NoteDraft, NotePatch,
    PasswordAccount, SessionGrant, UserId, UserProfile,
};
use crate::feed::{Change, ChangeFeed};
use crate::ports::{
    CredentialStore, PortError, PortResult, ProfileOrder, ProfileStore, SnapshotStream,
    TeamStore,
};

/// Profile fields as stored; the owner lives in the document path.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDocument {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub is_paid: bool,
    pub is_admin: bool,
}

impl ProfileDocument {
    fn into_profile(self, user_id: UserId) -> UserProfile {
        UserProfile {
            user_id,
            email: self.email,
            display_name: self.display_name,
            created_at: self.created_at,
            last_login_at: self.last_login_at,
            is_paid: self.is_paid,
            is_admin: self.is_admin,
        }
    }
}

impl From<UserProfile> for ProfileDocument {
    fn from(p: UserProfile) -> Self {
        Self {
            email: p.email,
            display_name: p.display_name,
            created_at: p.created_at,
            last_login_at: p.last_login_at,
            is_paid: p.is_paid,
            is_admin: p.is_admin,
        }
    }
}

#[derive(Debug, Clone)]
enum Document {
    Profile(ProfileDocument),
    Employee(Employee),
    Note(Note),
    Artifact(Artifact),
}

fn profile_path(user_id: &UserId) -> String {
    format!("users/{}/profile/account", user_id)
}

fn employees_prefix(user_id: &UserId) -> String {
    format!("users/{}/employees/", user_id)
}

fn employee_path(user_id: &UserId, employee_id: Uuid) -> String {
    format!("users/{}/employees/{}", user_id, employee_id)
}

fn notes_prefix(user_id: &UserId, employee_id: Uuid) -> String {
    format!("{}/notes/", employee_path(user_id, employee_id))
}

fn artifacts_prefix(user_id: &UserId, employee_id: Uuid) -> String {
    format!("{}/artifacts/", employee_path(user_id, employee_id))
}

/// Owner of a profile document: the id of the container two levels above it.
fn profile_owner(path: &str) -> Option<UserId> {
    let segments: Vec<&str> = path.split('/').collect();
    let n = segments.len();
    if n < 3 || segments[n - 2] != "profile" {
        return None;
    }
    UserId::parse(segments[n - 3])
}

/// Direct children of a collection prefix (no deeper descendants).
fn is_direct_child(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
}

/// A path-keyed, in-process implementation of every storage port.
#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<RwLock<BTreeMap<String, Document>>>,
    accounts: Arc<DashMap<String, PasswordAccount>>,
    federated: Arc<DashMap<(String, String), UserId>>,
    sessions: Arc<DashMap<String, (SessionGrant, DateTime<Utc>)>>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a profile document at an arbitrary path, e.g. to import legacy data.
    pub async fn insert_profile_document(&self, path: &str, doc: ProfileDocument) {
        self.docs
            .write()
            .await
            .insert(path.to_string(), Document::Profile(doc));
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    async fn employees_of(&self, user_id: &UserId) -> Vec<Employee> {
        let prefix = employees_prefix(user_id);
        let docs = self.docs.read().await;
        let mut employees: Vec<Employee> = docs
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter(|(path, _)| is_direct_child(path, &prefix))
            .filter_map(|(_, doc)| match doc {
                Document::Employee(e) => Some(e.clone()),
                _ => None,
            })
            .collect();
        employees.sort_by_key(|e| e.created_at);
        employees
    }

    async fn notes_of(&self, user_id: &UserId, employee_id: Uuid) -> Vec<Note> {
        let prefix = notes_prefix(user_id, employee_id);
        let docs = self.docs.read().await;
        let mut notes: Vec<Note> = docs
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter_map(|(_, doc)| match doc {
                Document::Note(n) => Some(n.clone()),
                _ => None,
            })
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes
    }

    async fn require_employee(&self, user_id: &UserId, employee_id: Uuid) -> PortResult<()> {
        match self.docs.read().await.get(&employee_path(user_id, employee_id)) {
            Some(Document::Employee(_)) => Ok(()),
            _ => Err(PortError::NotFound(format!("Employee {} not found", employee_id))),
        }
    }

    async fn remove_prefix(&self, prefix: &str) {
        self.docs.write().await.retain(|path, _| !path.starts_with(prefix));
    }
}

//=========================================================================================
// `ProfileStore` Implementation
//=========================================================================================

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, user_id: &UserId) -> PortResult<UserProfile> {
        match self.docs.read().await.get(&profile_path(user_id)) {
            Some(Document::Profile(doc)) => Ok(doc.clone().into_profile(user_id.clone())),
            _ => Err(PortError::NotFound(format!("Profile {} not found", user_id))),
        }
    }

    async fn create_profile(&self, profile: UserProfile) -> PortResult<()> {
        let path = profile_path(&profile.user_id);
        self.docs
            .write()
            .await
            .insert(path, Document::Profile(profile.into()));
        Ok(())
    }

    async fn touch_last_login(&self, user_id: &UserId, at: DateTime<Utc>) -> PortResult<()> {
        match self.docs.write().await.get_mut(&profile_path(user_id)) {
            Some(Document::Profile(doc)) => {
                doc.last_login_at = Some(at);
                Ok(())
            }
            _ => Err(PortError::NotFound(format!("Profile {} not found", user_id))),
        }
    }

    async fn list_all_profiles(&self, order: ProfileOrder) -> PortResult<Vec<UserProfile>> {
        let docs = self.docs.read().await;
        let mut profiles = Vec::new();
        for (path, doc) in docs.iter() {
            let Document::Profile(doc) = doc else { continue };
            match profile_owner(path) {
                Some(owner) => profiles.push(doc.clone().into_profile(owner)),
                None => warn!("Skipping profile document with no derivable owner: {}", path),
            }
        }
        match order {
            // `None < Some(_)`, so a reversed comparison puts never-logged-in last.
            ProfileOrder::LastLoginDesc => {
                profiles.sort_by(|a, b| b.last_login_at.cmp(&a.last_login_at))
            }
        }
        Ok(profiles)
    }
}

//=========================================================================================
// `TeamStore` Implementation
//=========================================================================================

#[async_trait]
impl TeamStore for MemoryStore {
    async fn list_employees(&self, user_id: &UserId) -> PortResult<Vec<Employee>> {
        Ok(self.employees_of(user_id).await)
    }

    async fn get_employee(&self, user_id: &UserId, employee_id: Uuid) -> PortResult<Employee> {
        match self.docs.read().await.get(&employee_path(user_id, employee_id)) {
            Some(Document::Employee(e)) => Ok(e.clone()),
            _ => Err(PortError::NotFound(format!("Employee {} not found", employee_id))),
        }
    }

    async fn create_employee(
        &self,
        user_id: &UserId,
        draft: EmployeeDraft,
    ) -> PortResult<Employee> {
        let employee = Employee {
            id: Uuid::new_v4(),
            user_id: user_id.clone(),
            name: draft.name,
            role: draft.role,
            created_at: Utc::now(),
        };
        self.docs.write().await.insert(
            employee_path(user_id, employee.id),
            Document::Employee(employee.clone()),
        );
        self.feed.publish(Change::Employees { user_id: user_id.clone() });
        Ok(employee)
    }

    async fn update_employee(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
        draft: EmployeeDraft,
    ) -> PortResult<Employee> {
        let updated = match self.docs.write().await.get_mut(&employee_path(user_id, employee_id)) {
            Some(Document::Employee(e)) => {
                e.name = draft.name;
                e.role = draft.role;
                e.clone()
            }
            _ => return Err(PortError::NotFound(format!("Employee {} not found", employee_id))),
        };
        self.feed.publish(Change::Employees { user_id: user_id.clone() });
        Ok(updated)
    }

    async fn delete_employee(&self, user_id: &UserId, employee_id: Uuid) -> PortResult<()> {
        let removed = self
            .docs
            .write()
            .await
            .remove(&employee_path(user_id, employee_id));
        if !matches!(removed, Some(Document::Employee(_))) {
            return Err(PortError::NotFound(format!("Employee {} not found", employee_id)));
        }
        self.feed.publish(Change::Employees { user_id: user_id.clone() });
        Ok(())
    }

    async fn list_notes(&self, user_id: &UserId, employee_id: Uuid) -> PortResult<Vec<Note>> {
        Ok(self.notes_of(user_id, employee_id).await)
    }

    async fn create_note(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
        draft: NoteDraft,
    ) -> PortResult<Note> {
        self.require_employee(user_id, employee_id).await?;
        let note = Note {
            id: Uuid::new_v4(),
            employee_id,
            content: draft.content,
            tag: draft.tag,
            category: draft.category,
            created_at: Utc::now(),
            completed: false,
        };
        let path = format!("{}{}", notes_prefix(user_id, employee_id), note.id);
        self.docs.write().await.insert(path, Document::Note(note.clone()));
        self.feed.publish(Change::Notes {
            user_id: user_id.clone(),
            employee_id,
        });
        Ok(note)
    }

    async fn update_note(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
        note_id: Uuid,
        patch: NotePatch,
    ) -> PortResult<Note> {
        let path = format!("{}{}", notes_prefix(user_id, employee_id), note_id);
        let updated = match self.docs.write().await.get_mut(&path) {
            Some(Document::Note(n)) => {
                if let Some(content) = patch.content {
                    n.content = content;
                }
                if let Some(tag) = patch.tag {
                    n.tag = tag;
                }
                if let Some(completed) = patch.completed {
                    n.completed = completed;
                }
                n.clone()
            }
            _ => return Err(PortError::NotFound(format!("Note {} not found", note_id))),
        };
        self.feed.publish(Change::Notes {
            user_id: user_id.clone(),
            employee_id,
        });
        Ok(updated)
    }

    async fn delete_note(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
        note_id: Uuid,
    ) -> PortResult<()> {
        let path = format!("{}{}", notes_prefix(user_id, employee_id), note_id);
        if self.docs.write().await.remove(&path).is_none() {
            return Err(PortError::NotFound(format!("Note {} not found", note_id)));
        }
        self.feed.publish(Change::Notes {
            user_id: user_id.clone(),
            employee_id,
        });
        Ok(())
    }

    async fn delete_notes_for_employee(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
    ) -> PortResult<()> {
        self.remove_prefix(&notes_prefix(user_id, employee_id)).await;
        self.feed.publish(Change::Notes {
            user_id: user_id.clone(),
            employee_id,
        });
        Ok(())
    }

    async fn list_artifacts(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
    ) -> PortResult<Vec<Artifact>> {
        let prefix = artifacts_prefix(user_id, employee_id);
        let docs = self.docs.read().await;
        Ok(docs
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter_map(|(_, doc)| match doc {
                Document::Artifact(a) => Some(a.clone()),
                _ => None,
            })
            .collect())
    }

    async fn put_artifact(&self, user_id: &UserId, artifact: Artifact) -> PortResult<()> {
        self.require_employee(user_id, artifact.employee_id).await?;
        let path = format!(
            "{}{}",
            artifacts_prefix(user_id, artifact.employee_id),
            artifact.kind().as_str()
        );
        self.docs.write().await.insert(path, Document::Artifact(artifact));
        Ok(())
    }

    async fn delete_artifacts_for_employee(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
    ) -> PortResult<()> {
        self.remove_prefix(&artifacts_prefix(user_id, employee_id)).await;
        Ok(())
    }

    async fn watch_employees(&self, user_id: &UserId) -> PortResult<SnapshotStream<Employee>> {
        let store = self.clone();
        let owner = user_id.clone();
        let target = user_id.clone();
        Ok(self.feed.snapshots(
            move |change| matches!(change, Change::Employees { user_id } if *user_id == target),
            move || {
                let store = store.clone();
                let owner = owner.clone();
                async move { Ok(store.employees_of(&owner).await) }
            },
        ))
    }

    async fn watch_notes(
        &self,
        user_id: &UserId,
        employee_id: Uuid,
    ) -> PortResult<SnapshotStream<Note>> {
        self.require_employee(user_id, employee_id).await?;
        let store = self.clone();
        let owner = user_id.clone();
        let target = user_id.clone();
        Ok(self.feed.snapshots(
            move |change| {
                matches!(change, Change::Notes { user_id, employee_id: e }
                    if *user_id == target && *e == employee_id)
            },
            move || {
                let store = store.clone();
                let owner = owner.clone();
                async move { Ok(store.notes_of(&owner, employee_id).await) }
            },
        ))
    }
}

//=========================================================================================
// `CredentialStore` Implementation
//=========================================================================================

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create_password_account(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<PasswordAccount> {
        let key = email.trim().to_lowercase();
        let entry = self.accounts.entry(key.clone());
        if let dashmap::mapref::entry::Entry::Occupied(_) = entry {
            return Err(PortError::Conflict(format!("Email {} already registered", key)));
        }
        let account = PasswordAccount {
            user_id: UserId::generate(),
            email: key,
            hashed_password: hashed_password.to_string(),
        };
        entry.or_insert(account.clone());
        Ok(account)
    }

    async fn get_password_account(&self, email: &str) -> PortResult<PasswordAccount> {
        self.accounts
            .get(&email.trim().to_lowercase())
            .map(|a| a.value().clone())
            .ok_or_else(|| PortError::NotFound(format!("No account for {}", email)))
    }

    async fn get_or_create_federated_account(
        &self,
        identity: &FederatedIdentity,
    ) -> PortResult<UserId> {
        let key = (identity.provider.clone(), identity.subject.clone());
        Ok(self
            .federated
            .entry(key)
            .or_insert_with(UserId::generate)
            .value()
            .clone())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        grant: &SessionGrant,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.sessions
            .insert(session_id.to_string(), (grant.clone(), expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<SessionGrant> {
        let (grant, expires_at) = self
            .sessions
            .get(session_id)
            .map(|s| s.value().clone())
            .ok_or(PortError::Unauthorized)?;
        if expires_at <= Utc::now() {
            self.sessions.remove(session_id);
            return Err(PortError::Unauthorized);
        }
        Ok(grant)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.sessions.remove(session_id);
        Ok(())
    }

    async fn purge_expired_auth_sessions(&self, now: DateTime<Utc>) -> PortResult<u64> {
        let before = self.sessions.len();
        self.sessions.retain(|_, (_, expires_at)| *expires_at > now);
        Ok(before.saturating_sub(self.sessions.len()) as u64)
    }
}
