//! crates/reviewiz_core/src/prompts.rs
//!
//! Locale-specific prompt templates for the generation endpoint, the
//! placeholder substitution that fills them, and the parsers for what comes back.

use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use std::sync::LazyLock;

use crate::domain::{ArtifactContent, ArtifactKind, Note, NoteRewrite};
use crate::i18n::Locale;
use crate::ports::{PortError, PortResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    Report,
    Training,
    Reading,
    Okr,
    NoteRewrite,
}

impl From<ArtifactKind> for PromptTemplate {
    fn from(kind: ArtifactKind) -> Self {
        match kind {
            ArtifactKind::Report => PromptTemplate::Report,
            ArtifactKind::Training => PromptTemplate::Training,
            ArtifactKind::Reading => PromptTemplate::Reading,
            ArtifactKind::Okr => PromptTemplate::Okr,
        }
    }
}

/// Values substituted into a template's `{name}`, `{role}` and `{notes}` tokens.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    pub name: String,
    pub role: String,
    pub notes: String,
}

//=========================================================================================
// Templates
//=========================================================================================

const REPORT_FR: &str = r#"Tu es un expert RH qui aide un manager à rédiger une revue de performance.
Collaborateur : {name}
Poste : {role}

Notes du manager :
{notes}

Rédige une revue de performance structurée en Markdown, en t'appuyant sur la méthode S.B.I. (Situation, Comportement, Impact) : points forts, axes d'amélioration et objectifs pour la prochaine période. Reste factuel, bienveillant et n'invente aucun fait absent des notes."#;

const REPORT_EN: &str = r#"You are an HR expert helping a manager write a performance review.
Employee: {name}
Role: {role}

Manager notes:
{notes}

Write a structured performance review in Markdown using the S.B.I. (Situation, Behavior, Impact) method: strengths, areas for improvement and goals for the next period. Stay factual and kind, and do not invent facts that are not in the notes."#;

const REPORT_DE: &str = r#"Du bist eine HR-Fachkraft und hilfst einer Führungskraft, eine Leistungsbeurteilung zu schreiben.
Mitarbeiter: {name}
Position: {role}

Notizen der Führungskraft:
{notes}

Schreibe eine strukturierte Leistungsbeurteilung in Markdown nach der S.B.I.-Methode (Situation, Verhalten, Wirkung): Stärken, Verbesserungsbereiche und Ziele für den nächsten Zeitraum. Bleib sachlich und wohlwollend und erfinde keine Fakten, die nicht in den Notizen stehen."#;

const TRAINING_FR: &str = r#"Voici les notes d'un manager sur {name} ({role}) :
{notes}

Propose 3 à 5 formations adaptées à ses axes de progression. Réponds uniquement avec un tableau JSON dont chaque élément a les champs "title", "description" et "duration"."#;

const TRAINING_EN: &str = r#"Here are a manager's notes about {name} ({role}):
{notes}

Suggest 3 to 5 trainings suited to their areas for growth. Answer only with a JSON array whose items have the fields "title", "description" and "duration"."#;

const TRAINING_DE: &str = r#"Hier sind die Notizen einer Führungskraft über {name} ({role}):
{notes}

Schlage 3 bis 5 passende Schulungen für die Entwicklungsbereiche vor. Antworte nur mit einem JSON-Array, dessen Elemente die Felder "title", "description" und "duration" haben."#;

const READING_FR: &str = r#"Voici les notes d'un manager sur {name} ({role}) :
{notes}

Propose 3 à 5 livres ou articles utiles à son développement. Réponds uniquement avec un tableau JSON dont chaque élément a les champs "title", "author" et "reason"."#;

const READING_EN: &str = r#"Here are a manager's notes about {name} ({role}):
{notes}

Suggest 3 to 5 books or articles useful for their development. Answer only with a JSON array whose items have the fields "title", "author" and "reason"."#;

const READING_DE: &str = r#"Hier sind die Notizen einer Führungskraft über {name} ({role}):
{notes}

Schlage 3 bis 5 Bücher oder Artikel für die Weiterentwicklung vor. Antworte nur mit einem JSON-Array, dessen Elemente die Felder "title", "author" und "reason" haben."#;

const OKR_FR: &str = r#"Voici les notes d'un manager sur {name} ({role}) :
{notes}

Propose 2 à 4 OKR pour le prochain trimestre. Réponds uniquement avec un tableau JSON dont chaque élément a les champs "objective" (texte) et "key_results" (tableau de textes)."#;

const OKR_EN: &str = r#"Here are a manager's notes about {name} ({role}):
{notes}

Suggest 2 to 4 OKRs for the next quarter. Answer only with a JSON array whose items have the fields "objective" (text) and "key_results" (array of texts)."#;

const OKR_DE: &str = r#"Hier sind die Notizen einer Führungskraft über {name} ({role}):
{notes}

Schlage 2 bis 4 OKRs für das nächste Quartal vor. Antworte nur mit einem JSON-Array, dessen Elemente die Felder "objective" (Text) und "key_results" (Array von Texten) haben."#;

const REWRITE_FR: &str = r#"Reformule cette note de manager sur {name} ({role}) selon la méthode S.B.I. (Situation, Comportement, Impact), de façon claire et professionnelle :
{notes}

Réponds uniquement avec un objet JSON ayant les champs "text" (la note reformulée), "tag" ("positive", "improvement" ou "neutral") et "category" (une compétence en un ou deux mots)."#;

const REWRITE_EN: &str = r#"Rewrite this manager note about {name} ({role}) using the S.B.I. (Situation, Behavior, Impact) method, clearly and professionally:
{notes}

Answer only with a JSON object with the fields "text" (the rewritten note), "tag" ("positive", "improvement" or "neutral") and "category" (a skill in one or two words)."#;

const REWRITE_DE: &str = r#"Formuliere diese Notiz einer Führungskraft über {name} ({role}) nach der S.B.I.-Methode (Situation, Verhalten, Wirkung) klar und professionell um:
{notes}

Antworte nur mit einem JSON-Objekt mit den Feldern "text" (die umformulierte Notiz), "tag" ("positive", "improvement" oder "neutral") und "category" (eine Kompetenz in ein oder zwei Wörtern)."#;

/// The raw template text for a locale.
pub fn template(template: PromptTemplate, locale: Locale) -> &'static str {
    use PromptTemplate::*;
    match (template, locale) {
        (Report, Locale::Fr) => REPORT_FR,
        (Report, Locale::En) => REPORT_EN,
        (Report, Locale::De) => REPORT_DE,
        (Training, Locale::Fr) => TRAINING_FR,
        (Training, Locale::En) => TRAINING_EN,
        (Training, Locale::De) => TRAINING_DE,
        (Reading, Locale::Fr) => READING_FR,
        (Reading, Locale::En) => READING_EN,
        (Reading, Locale::De) => READING_DE,
        (Okr, Locale::Fr) => OKR_FR,
        (Okr, Locale::En) => OKR_EN,
        (Okr, Locale::De) => OKR_DE,
        (NoteRewrite, Locale::Fr) => REWRITE_FR,
        (NoteRewrite, Locale::En) => REWRITE_EN,
        (NoteRewrite, Locale::De) => REWRITE_DE,
    }
}

static TOKEN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\{(name|role|notes)\}"));

fn pattern(compiled: &'static Result<Regex, regex::Error>) -> PortResult<&'static Regex> {
    compiled
        .as_ref()
        .map_err(|e| PortError::Unexpected(format!("Invalid built-in pattern: {}", e)))
}

/// Fills the template's placeholder tokens in a single pass, so tokens inside
/// the substituted values are left as written.
pub fn render(which: PromptTemplate, locale: Locale, values: &Substitution) -> PortResult<String> {
    let token = pattern(&TOKEN)?;
    let filled = token.replace_all(template(which, locale), |caps: &Captures| match &caps[1] {
        "name" => values.name.clone(),
        "role" => values.role.clone(),
        _ => values.notes.clone(),
    });
    Ok(filled.into_owned())
}

/// One `- [tag] content` line per note, oldest first.
pub fn concat_notes(notes: &[Note]) -> String {
    let mut sorted: Vec<&Note> = notes.iter().collect();
    sorted.sort_by_key(|n| n.created_at);
    sorted
        .iter()
        .map(|n| format!("- [{}] {}", n.tag.as_str(), n.content.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

//=========================================================================================
// Response Parsing
//=========================================================================================

static FENCED_BLOCK: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?s)```[a-zA-Z]*\s*\n?(.*?)```"));

/// Removes a surrounding Markdown code fence, if any.
fn unfence(raw: &str) -> PortResult<&str> {
    let fence = pattern(&FENCED_BLOCK)?;
    Ok(match fence.captures(raw).and_then(|c| c.get(1)) {
        Some(body) => body.as_str().trim(),
        None => raw.trim(),
    })
}

fn parse_json<T: DeserializeOwned>(raw: &str) -> PortResult<T> {
    serde_json::from_str(unfence(raw)?)
        .map_err(|e| PortError::Generation(format!("Unparseable response body: {}", e)))
}

/// The narrative report is free text.
pub fn parse_report(raw: &str) -> PortResult<String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(PortError::Generation("Empty report".to_string()));
    }
    Ok(text.to_string())
}

/// Parses the response for any artifact kind into its stored content.
pub fn parse_artifact(kind: ArtifactKind, raw: &str) -> PortResult<ArtifactContent> {
    match kind {
        ArtifactKind::Report => parse_report(raw).map(ArtifactContent::Report),
        ArtifactKind::Training => parse_json(raw).map(ArtifactContent::Training),
        ArtifactKind::Reading => parse_json(raw).map(ArtifactContent::Reading),
        ArtifactKind::Okr => parse_json(raw).map(ArtifactContent::Okrs),
    }
}

pub fn parse_note_rewrite(raw: &str) -> PortResult<NoteRewrite> {
    let rewrite: NoteRewrite = parse_json(raw)?;
    if rewrite.text.trim().is_empty() {
        return Err(PortError::Generation("Rewrite has no text".to_string()));
    }
    Ok(rewrite)
}
