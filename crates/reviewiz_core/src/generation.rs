//! crates/reviewiz_core/src/generation.rs
//!
//! Builds prompts from an employee's record, submits them once to the generation
//! endpoint and writes the parsed result back through the store.

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{Artifact, ArtifactKind, Note, NoteDraft, NoteTag, UserId};
use crate::i18n::Locale;
use crate::ports::{GenerationService, PortResult, TeamStore};
use crate::prompts::{self, PromptTemplate, Substitution};

/// Generates (or regenerates) one artifact for an employee, replacing any previous one.
pub async fn generate_artifact<S, G>(
    store: &S,
    generator: &G,
    user_id: &UserId,
    employee_id: Uuid,
    kind: ArtifactKind,
    locale: Locale,
) -> PortResult<Artifact>
where
    S: TeamStore + ?Sized,
    G: GenerationService + ?Sized,
{
    let employee = store.get_employee(user_id, employee_id).await?;
    let notes = store.list_notes(user_id, employee_id).await?;

    let values = Substitution {
        name: employee.name,
        role: employee.role,
        notes: prompts::concat_notes(&notes),
    };
    let prompt = prompts::render(kind.into(), locale, &values)?;

    let raw = generator.generate(&prompt).await?;
    let content = prompts::parse_artifact(kind, &raw).inspect_err(|e| {
        error!("Could not parse {} for employee {}: {:?}", kind.as_str(), employee_id, e);
    })?;

    let artifact = Artifact {
        id: Uuid::new_v4(),
        employee_id,
        content,
        generated_at: Utc::now(),
    };
    store.put_artifact(user_id, artifact.clone()).await?;
    info!("Stored {} for employee {}", kind.as_str(), employee_id);
    Ok(artifact)
}

/// Rewrites a manager's draft note and stores the result as a new note.
pub async fn rewrite_note<S, G>(
    store: &S,
    generator: &G,
    user_id: &UserId,
    employee_id: Uuid,
    draft_text: &str,
    locale: Locale,
) -> PortResult<Note>
where
    S: TeamStore + ?Sized,
    G: GenerationService + ?Sized,
{
    let employee = store.get_employee(user_id, employee_id).await?;
    let values = Substitution {
        name: employee.name,
        role: employee.role,
        notes: draft_text.trim().to_string(),
    };
    let prompt = prompts::render(PromptTemplate::NoteRewrite, locale, &values)?;

    let raw = generator.generate(&prompt).await?;
    let rewrite = prompts::parse_note_rewrite(&raw)?;
    // An unexpected tag from the model is not worth failing the rewrite over.
    let tag = rewrite.tag.parse().unwrap_or(NoteTag::Neutral);

    store
        .create_note(
            user_id,
            employee_id,
            NoteDraft {
                content: rewrite.text.trim().to_string(),
                tag,
                category: rewrite.category.filter(|c| !c.trim().is_empty()),
            },
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtifactContent, EmployeeDraft};
    use crate::memory::MemoryStore;
    use crate::ports::PortError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays one canned answer and records the prompts it was sent.
    struct Scripted {
        answer: String,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn answering(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerationService for Scripted {
        async fn generate(&self, prompt: &str) -> PortResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.answer.clone())
        }
    }

    async fn setup() -> (MemoryStore, UserId, Uuid) {
        let store = MemoryStore::new();
        let owner = UserId::parse("mgr").unwrap();
        let emp = store
            .create_employee(&owner, EmployeeDraft { name: "Ada".into(), role: "Dev".into() })
            .await
            .unwrap();
        store
            .create_note(
                &owner,
                emp.id,
                NoteDraft { content: "Led the migration".into(), tag: NoteTag::Positive, category: None },
            )
            .await
            .unwrap();
        (store, owner, emp.id)
    }

    #[tokio::test]
    async fn report_prompt_carries_name_role_and_notes() {
        let (store, owner, emp) = setup().await;
        let generator = Scripted::answering("## Review\nSolid quarter.");

        let artifact = generate_artifact(&store, &generator, &owner, emp, ArtifactKind::Report, Locale::En)
            .await
            .unwrap();

        let sent = generator.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Ada") && sent[0].contains("Dev"));
        assert!(sent[0].contains("- [positive] Led the migration"));
        assert_eq!(artifact.content, ArtifactContent::Report("## Review\nSolid quarter.".into()));
        assert_eq!(store.list_artifacts(&owner, emp).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unparseable_suggestions_store_nothing() {
        let (store, owner, emp) = setup().await;
        let generator = Scripted::answering("Sorry, I cannot help with that.");

        let err = generate_artifact(&store, &generator, &owner, emp, ArtifactKind::Training, Locale::Fr)
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::Generation(_)));
        assert!(store.list_artifacts(&owner, emp).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rewrite_stores_a_tagged_note() {
        let (store, owner, emp) = setup().await;
        let generator = Scripted::answering(
            "```json\n{\"text\":\"In the Q3 demo, Ada...\",\"tag\":\"improvement\",\"category\":\"Communication\"}\n```",
        );

        let note = rewrite_note(&store, &generator, &owner, emp, "demo was messy", Locale::En)
            .await
            .unwrap();

        assert_eq!(note.tag, NoteTag::Improvement);
        assert_eq!(note.category.as_deref(), Some("Communication"));
        assert!(generator.sent()[0].contains("demo was messy"));
        assert_eq!(store.list_notes(&owner, emp).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_employee_sends_no_request() {
        let (store, owner, _) = setup().await;
        let generator = Scripted::answering("unused");
        let err = generate_artifact(&store, &generator, &owner, Uuid::new_v4(), ArtifactKind::Okr, Locale::De)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
        assert!(generator.sent().is_empty());
    }
}
