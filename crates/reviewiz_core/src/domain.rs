//! crates/reviewiz_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! Storage layout and wire formats live in the adapters; the serde derives here
//! only cover the shapes the generation endpoint returns and the artifact payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identity key of an account, as issued by the session gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Parses a raw key. Blank keys and keys containing a path separator are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.contains('/') {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Issues a fresh key for a newly created account.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-user record holding plan/role flags and login timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub is_paid: bool,
    pub is_admin: bool,
}

impl UserProfile {
    /// A fresh profile: not paid, not admin, never logged in.
    pub fn new(identity: &SessionIdentity, now: DateTime<Utc>) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            created_at: now,
            last_login_at: None,
            is_paid: false,
            is_admin: false,
        }
    }
}

/// What the session gateway knows about a freshly established session.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub user_id: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Flags resolved once at session start and carried for the session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    pub user_id: UserId,
    pub is_admin: bool,
    pub is_paid: bool,
}

impl SessionGrant {
    /// The grant used when the profile cannot be resolved.
    pub fn unprivileged(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
            is_paid: false,
        }
    }
}

// Password account, only used internally for login/signup.
#[derive(Debug, Clone)]
pub struct PasswordAccount {
    pub user_id: UserId,
    pub email: String,
    pub hashed_password: String,
}

/// Identity asserted by a federated provider after token verification.
#[derive(Debug, Clone)]
pub struct FederatedIdentity {
    pub provider: String,
    pub subject: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: Uuid,
    pub user_id: UserId,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Fields a manager supplies when creating or renaming an employee.
#[derive(Debug, Clone)]
pub struct EmployeeDraft {
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteTag {
    Positive,
    Improvement,
    Neutral,
}

impl NoteTag {
    pub fn as_str(self) -> &'static str {
        match self {
            NoteTag::Positive => "positive",
            NoteTag::Improvement => "improvement",
            NoteTag::Neutral => "neutral",
        }
    }
}

impl FromStr for NoteTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(NoteTag::Positive),
            "improvement" | "negative" => Ok(NoteTag::Improvement),
            "neutral" => Ok(NoteTag::Neutral),
            other => Err(format!("unknown note tag '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub content: String,
    pub tag: NoteTag,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct NoteDraft {
    pub content: String,
    pub tag: NoteTag,
    pub category: Option<String>,
}

/// Partial update of a note; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub content: Option<String>,
    pub tag: Option<NoteTag>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Report,
    Training,
    Reading,
    Okr,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Report,
        ArtifactKind::Training,
        ArtifactKind::Reading,
        ArtifactKind::Okr,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Report => "report",
            ArtifactKind::Training => "training",
            ArtifactKind::Reading => "reading",
            ArtifactKind::Okr => "okr",
        }
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown artifact kind '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSuggestion {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingSuggestion {
    pub title: String,
    pub author: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Okr {
    pub objective: String,
    pub key_results: Vec<String>,
}

/// Generated payload of an artifact. Serialized as `{"kind": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ArtifactContent {
    Report(String),
    Training(Vec<TrainingSuggestion>),
    Reading(Vec<ReadingSuggestion>),
    #[serde(rename = "okr")]
    Okrs(Vec<Okr>),
}

impl ArtifactContent {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            ArtifactContent::Report(_) => ArtifactKind::Report,
            ArtifactContent::Training(_) => ArtifactKind::Training,
            ArtifactContent::Reading(_) => ArtifactKind::Reading,
            ArtifactContent::Okrs(_) => ArtifactKind::Okr,
        }
    }
}

/// A generated report or suggestion list. One per kind per employee.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub content: ArtifactContent,
    pub generated_at: DateTime<Utc>,
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        self.content.kind()
    }
}

/// The single object returned by the note rewrite template.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NoteRewrite {
    pub text: String,
    pub tag: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_rejects_blank_and_path_like_keys() {
        assert!(UserId::parse("").is_none());
        assert!(UserId::parse("   ").is_none());
        assert!(UserId::parse("users/abc").is_none());
        assert_eq!(UserId::parse(" abc ").unwrap().as_str(), "abc");
    }

    #[test]
    fn artifact_content_serializes_with_kind_tag() {
        let content = ArtifactContent::Okrs(vec![Okr {
            objective: "Ship".into(),
            key_results: vec!["KR1".into()],
        }]);
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["kind"], "okr");
        assert_eq!(json["data"][0]["objective"], "Ship");
        assert_eq!(content.kind(), ArtifactKind::Okr);
    }

    #[test]
    fn note_tag_parses_loosely() {
        assert_eq!("Positive".parse::<NoteTag>().unwrap(), NoteTag::Positive);
        assert_eq!("negative".parse::<NoteTag>().unwrap(), NoteTag::Improvement);
        assert!("shiny".parse::<NoteTag>().is_err());
    }
}
