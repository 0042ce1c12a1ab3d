//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use reviewiz_core::Locale;
use std::net::SocketAddr;
use tracing::Level;

/// OpenAI-compatible base URL of the Gemini API.
pub const GEMINI_OPENAI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Credentials for the generation endpoint, if any were supplied.
#[derive(Clone, Debug)]
pub struct GenerationConfig {
    pub api_key: String,
    pub api_base: Option<String>,
    pub model: String,
}

/// Where documents are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    /// Process-local; everything is lost on restart. Only used when asked for explicitly.
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub store: StoreBackend,
    pub log_level: Level,
    pub generation: Option<GenerationConfig>,
    pub google_client_id: Option<String>,
    pub default_locale: Locale,
    pub allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and storage ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = var("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let store = match var("DOCUMENT_STORE").as_deref().map(str::trim) {
            None | Some("postgres") => StoreBackend::Postgres {
                database_url: database_url
                    .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
            },
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "DOCUMENT_STORE".to_string(),
                    format!("'{}' is not one of postgres, memory", other),
                ))
            }
        };

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Generation endpoint (optional; Gemini preferred) ---
        let model = var("GENERATION_MODEL").unwrap_or_else(|| "gemini-2.0-flash".to_string());
        let explicit_base = var("GENERATION_API_BASE");
        let generation = match (var("GEMINI_API_KEY"), var("OPENAI_API_KEY")) {
            (Some(key), _) => Some(GenerationConfig {
                api_key: key,
                api_base: explicit_base.or_else(|| Some(GEMINI_OPENAI_BASE.to_string())),
                model,
            }),
            (None, Some(key)) => Some(GenerationConfig {
                api_key: key,
                api_base: explicit_base,
                model,
            }),
            (None, None) => None,
        };

        // --- Session gateway and UI ---
        let google_client_id = var("GOOGLE_CLIENT_ID");

        let default_locale = match var("DEFAULT_LOCALE") {
            Some(tag) => tag.parse::<Locale>().map_err(|e| {
                ConfigError::InvalidValue("DEFAULT_LOCALE".to_string(), e)
            })?,
            None => Locale::Fr,
        };

        let allowed_origin =
            var("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        Ok(Self {
            bind_address,
            store,
            log_level,
            generation,
            google_client_id,
            default_locale,
            allowed_origin,
        })
    }

    /// Names of the optional collaborators that are not configured.
    pub fn missing_collaborators(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.generation.is_none() {
            missing.push("GEMINI_API_KEY or OPENAI_API_KEY");
        }
        if self.google_client_id.is_none() {
            missing.push("GOOGLE_CLIENT_ID");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    const DB: (&str, &str) = ("DATABASE_URL", "postgres://localhost/reviewiz");

    #[test]
    fn defaults_apply_when_only_the_database_is_set() {
        let config = load(&[DB]).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(
            config.store,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/reviewiz".to_string()
            }
        );
        assert_eq!(config.default_locale, Locale::Fr);
        assert_eq!(config.missing_collaborators().len(), 2);
    }

    #[test]
    fn missing_database_url_is_a_configuration_error() {
        match load(&[]) {
            Err(ConfigError::MissingVar(name)) => assert_eq!(name, "DATABASE_URL"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            load(&[("DATABASE_URL", "  ")]),
            Err(ConfigError::MissingVar(_))
        ));
    }

    #[test]
    fn memory_store_requires_an_explicit_opt_in() {
        let config = load(&[("DOCUMENT_STORE", "memory")]).unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert!(matches!(
            load(&[("DOCUMENT_STORE", "sqlite"), DB]),
            Err(ConfigError::InvalidValue(_, _))
        ));
    }

    #[test]
    fn gemini_key_selects_the_gemini_endpoint() {
        let config = load(&[DB, ("GEMINI_API_KEY", "g"), ("OPENAI_API_KEY", "o")]).unwrap();
        let generation = config.generation.unwrap();
        assert_eq!(generation.api_key, "g");
        assert_eq!(generation.api_base.as_deref(), Some(GEMINI_OPENAI_BASE));
    }

    #[test]
    fn openai_key_uses_the_client_default_base() {
        let config = load(&[DB, ("OPENAI_API_KEY", "o"), ("GENERATION_MODEL", "gpt-4o-mini")]).unwrap();
        let generation = config.generation.unwrap();
        assert!(generation.api_base.is_none());
        assert_eq!(generation.model, "gpt-4o-mini");
    }

    #[test]
    fn invalid_values_are_reported_by_name() {
        match load(&[DB, ("BIND_ADDRESS", "nowhere")]) {
            Err(ConfigError::InvalidValue(name, _)) => assert_eq!(name, "BIND_ADDRESS"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            load(&[DB, ("DEFAULT_LOCALE", "es")]),
            Err(ConfigError::InvalidValue(_, _))
        ));
    }
}
