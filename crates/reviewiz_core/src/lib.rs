pub mod admin;
pub mod domain;
pub mod employees;
pub mod feed;
pub mod generation;
pub mod i18n;
pub mod memory;
pub mod ports;
pub mod profile;
pub mod prompts;

pub use domain::{
    Artifact, ArtifactContent, ArtifactKind, Employee, EmployeeDraft, FederatedIdentity, Note,
    NoteDraft, NotePatch, NoteTag, PasswordAccount, SessionGrant, SessionIdentity, UserId,
    UserProfile,
};
pub use i18n::Locale;
pub use ports::{
    CredentialStore, GenerationService, IdentityVerifier, PortError, PortResult, ProfileOrder,
    ProfileStore, SnapshotStream, TeamStore,
};
