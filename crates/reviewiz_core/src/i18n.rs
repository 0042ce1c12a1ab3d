//! crates/reviewiz_core/src/i18n.rs
//!
//! Static UI string tables for the supported locales, plus localized date
//! rendering. Prompt templates live in `prompts`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Rendered for any timestamp that is missing or cannot be represented.
pub const MISSING_DATE: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Fr,
    En,
    De,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::Fr, Locale::En, Locale::De];

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::Fr => "fr",
            Locale::En => "en",
            Locale::De => "de",
        }
    }

    /// Parses a tag such as `fr`, `fr-FR` or `de_DE`, falling back when unsupported.
    pub fn from_tag_or(tag: &str, fallback: Locale) -> Locale {
        tag.parse().unwrap_or(fallback)
    }

    fn date_format(self) -> &'static str {
        match self {
            Locale::Fr => "%d/%m/%Y %H:%M",
            Locale::En => "%m/%d/%Y, %I:%M %p",
            Locale::De => "%d.%m.%Y, %H:%M",
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let primary = s
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "fr" => Ok(Locale::Fr),
            "en" => Ok(Locale::En),
            "de" => Ok(Locale::De),
            _ => Err(format!("unsupported locale '{}'", s)),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Keys used from code. The tables may carry more keys than these for the UI.
pub mod keys {
    pub const ADMIN_ACCESS_DENIED: &str = "admin.access_denied";
    pub const ADMIN_LOAD_ERROR: &str = "admin.load_error";
    pub const AUTH_INVALID_CREDENTIALS: &str = "auth.invalid_credentials";
    pub const CONFIG_ERROR: &str = "config.error";
    pub const GENERATION_ERROR: &str = "generation.error";
    pub const NOT_FOUND: &str = "common.not_found";
}

const FR: &[(&str, &str)] = &[
    ("app.title", "Reviewiz.ai"),
    ("app.tagline", "Vos notes de management, des revues de performance en un clic."),
    ("auth.sign_in", "Se connecter"),
    ("auth.sign_in_google", "Se connecter avec Google"),
    ("auth.sign_up", "Créer un compte"),
    ("auth.sign_out", "Se déconnecter"),
    ("auth.invalid_credentials", "E-mail ou mot de passe invalide."),
    ("employees.title", "Mes collaborateurs"),
    ("employees.add", "Ajouter un collaborateur"),
    ("employees.delete_confirm", "Supprimer ce collaborateur et toutes ses notes ?"),
    ("notes.title", "Notes"),
    ("notes.add", "Ajouter une note"),
    ("notes.rewrite", "Reformuler avec l'IA"),
    ("notes.tag.positive", "Positif"),
    ("notes.tag.improvement", "À améliorer"),
    ("notes.tag.neutral", "Neutre"),
    ("artifacts.report", "Revue de performance"),
    ("artifacts.training", "Formations suggérées"),
    ("artifacts.reading", "Lectures suggérées"),
    ("artifacts.okr", "OKR"),
    ("artifacts.generate", "Générer"),
    ("generation.error", "La génération a échoué. Veuillez réessayer."),
    ("config.error", "Service indisponible : configuration manquante."),
    ("common.not_found", "Élément introuvable."),
    ("admin.title", "Administration des utilisateurs"),
    ("admin.access_denied", "Accès refusé : cette page est réservée aux administrateurs."),
    ("admin.load_error", "Impossible de charger la liste des utilisateurs."),
    ("admin.column.email", "E-mail"),
    ("admin.column.created", "Créé le"),
    ("admin.column.last_login", "Dernière connexion"),
    ("admin.column.paid", "Payant"),
    ("admin.column.admin", "Admin"),
];

const EN: &[(&str, &str)] = &[
    ("app.title", "Reviewiz.ai"),
    ("app.tagline", "Your management notes, performance reviews in one click."),
    ("auth.sign_in", "Sign in"),
    ("auth.sign_in_google", "Sign in with Google"),
    ("auth.sign_up", "Create an account"),
    ("auth.sign_out", "Sign out"),
    ("auth.invalid_credentials", "Invalid email or password."),
    ("employees.title", "My team"),
    ("employees.add", "Add an employee"),
    ("employees.delete_confirm", "Delete this employee and all their notes?"),
    ("notes.title", "Notes"),
    ("notes.add", "Add a note"),
    ("notes.rewrite", "Rewrite with AI"),
    ("notes.tag.positive", "Positive"),
    ("notes.tag.improvement", "To improve"),
    ("notes.tag.neutral", "Neutral"),
    ("artifacts.report", "Performance review"),
    ("artifacts.training", "Suggested trainings"),
    ("artifacts.reading", "Suggested reading"),
    ("artifacts.okr", "OKRs"),
    ("artifacts.generate", "Generate"),
    ("generation.error", "Generation failed. Please try again."),
    ("config.error", "Service unavailable: missing configuration."),
    ("common.not_found", "Item not found."),
    ("admin.title", "User administration"),
    ("admin.access_denied", "Access denied: this page is restricted to administrators."),
    ("admin.load_error", "Could not load the user list."),
    ("admin.column.email", "Email"),
    ("admin.column.created", "Created"),
    ("admin.column.last_login", "Last login"),
    ("admin.column.paid", "Paid"),
    ("admin.column.admin", "Admin"),
];

const DE: &[(&str, &str)] = &[
    ("app.title", "Reviewiz.ai"),
    ("app.tagline", "Ihre Führungsnotizen, Leistungsbeurteilungen mit einem Klick."),
    ("auth.sign_in", "Anmelden"),
    ("auth.sign_in_google", "Mit Google anmelden"),
    ("auth.sign_up", "Konto erstellen"),
    ("auth.sign_out", "Abmelden"),
    ("auth.invalid_credentials", "Ungültige E-Mail oder ungültiges Passwort."),
    ("employees.title", "Mein Team"),
    ("employees.add", "Mitarbeiter hinzufügen"),
    ("employees.delete_confirm", "Diesen Mitarbeiter und alle Notizen löschen?"),
    ("notes.title", "Notizen"),
    ("notes.add", "Notiz hinzufügen"),
    ("notes.rewrite", "Mit KI umformulieren"),
    ("notes.tag.positive", "Positiv"),
    ("notes.tag.improvement", "Verbesserung"),
    ("notes.tag.neutral", "Neutral"),
    ("artifacts.report", "Leistungsbeurteilung"),
    ("artifacts.training", "Empfohlene Schulungen"),
    ("artifacts.reading", "Leseempfehlungen"),
    ("artifacts.okr", "OKRs"),
    ("artifacts.generate", "Generieren"),
    ("generation.error", "Die Generierung ist fehlgeschlagen. Bitte erneut versuchen."),
    ("config.error", "Dienst nicht verfügbar: Konfiguration fehlt."),
    ("common.not_found", "Element nicht gefunden."),
    ("admin.title", "Benutzerverwaltung"),
    ("admin.access_denied", "Zugriff verweigert: Diese Seite ist Administratoren vorbehalten."),
    ("admin.load_error", "Die Benutzerliste konnte nicht geladen werden."),
    ("admin.column.email", "E-Mail"),
    ("admin.column.created", "Erstellt am"),
    ("admin.column.last_login", "Letzte Anmeldung"),
    ("admin.column.paid", "Bezahlt"),
    ("admin.column.admin", "Admin"),
];

/// The full string table of a locale, in declaration order.
pub fn table(locale: Locale) -> &'static [(&'static str, &'static str)] {
    match locale {
        Locale::Fr => FR,
        Locale::En => EN,
        Locale::De => DE,
    }
}

/// Looks a key up in the locale's table, falling back to English.
pub fn lookup(locale: Locale, key: &str) -> Option<&'static str> {
    find(table(locale), key).or_else(|| find(EN, key))
}

/// Like `lookup`, but yields the key itself when no table has it.
pub fn text(locale: Locale, key: &'static str) -> &'static str {
    lookup(locale, key).unwrap_or(key)
}

fn find(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Renders a timestamp in the locale's convention, or `"-"` when absent.
pub fn format_timestamp(at: Option<DateTime<Utc>>, locale: Locale) -> String {
    match at {
        Some(at) => at.format(locale.date_format()).to_string(),
        None => MISSING_DATE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_locale_has_the_same_keys() {
        let en_keys: Vec<_> = EN.iter().map(|(k, _)| *k).collect();
        for locale in Locale::ALL {
            let keys: Vec<_> = table(locale).iter().map(|(k, _)| *k).collect();
            assert_eq!(keys, en_keys, "key mismatch for {}", locale);
        }
    }

    #[test]
    fn parses_region_tags() {
        assert_eq!("fr-FR".parse::<Locale>().unwrap(), Locale::Fr);
        assert_eq!("de_DE".parse::<Locale>().unwrap(), Locale::De);
        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!(Locale::from_tag_or("es", Locale::Fr), Locale::Fr);
    }

    #[test]
    fn lookup_falls_back_to_english_then_key() {
        assert_eq!(lookup(Locale::De, "auth.sign_out"), Some("Abmelden"));
        assert_eq!(lookup(Locale::Fr, "missing.key"), None);
        assert_eq!(text(Locale::Fr, "missing.key"), "missing.key");
    }

    #[test]
    fn formats_timestamps_in_every_locale() {
        let at = DateTime::from_timestamp(1_700_000_000, 0);
        for locale in Locale::ALL {
            let rendered = format_timestamp(at, locale);
            assert!(!rendered.is_empty());
            assert_ne!(rendered, MISSING_DATE);
        }
        assert_eq!(format_timestamp(at, Locale::De), "14.11.2023, 22:13");
    }

    #[test]
    fn missing_or_unrepresentable_dates_render_dash() {
        assert_eq!(format_timestamp(None, Locale::En), "-");
        assert_eq!(format_timestamp(DateTime::from_timestamp(i64::MAX, 0), Locale::Fr), "-");
    }
}
