//! crates/reviewiz_core/src/admin.rs
//!
//! The administrator's user listing: every registered profile, most recent login first.

use serde::Serialize;
use tracing::{error, info};

use crate::domain::{SessionGrant, UserProfile};
use crate::i18n::{self, keys, Locale};
use crate::ports::{ProfileOrder, ProfileStore};

/// Shown in place of a missing email.
pub const MISSING_EMAIL: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminRow {
    pub user_id: String,
    pub email: String,
    pub created_at: String,
    pub last_login_at: String,
    pub is_paid: bool,
    pub is_admin: bool,
}

impl AdminRow {
    fn render(profile: UserProfile, locale: Locale) -> Self {
        Self {
            user_id: profile.user_id.to_string(),
            email: profile.email.unwrap_or_else(|| MISSING_EMAIL.to_string()),
            created_at: i18n::format_timestamp(Some(profile.created_at), locale),
            last_login_at: i18n::format_timestamp(profile.last_login_at, locale),
            is_paid: profile.is_paid,
            is_admin: profile.is_admin,
        }
    }
}

/// A persistent error message the user can dismiss. Nothing retries behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBanner {
    pub message: String,
    pub dismissible: bool,
}

/// Terminal state of the listing screen; loading has always finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AdminListing {
    Denied { message: String },
    Loaded { rows: Vec<AdminRow> },
    Failed { banner: ErrorBanner },
}

impl AdminListing {
    pub fn loading(&self) -> bool {
        false
    }

    pub fn rows(&self) -> &[AdminRow] {
        match self {
            AdminListing::Loaded { rows } => rows,
            _ => &[],
        }
    }
}

/// Loads the listing for the caller.
///
/// The grant is checked before the store is touched. The read is a single
/// one-shot query, not a subscription.
pub async fn load_admin_listing<S>(grant: &SessionGrant, store: &S, locale: Locale) -> AdminListing
where
    S: ProfileStore + ?Sized,
{
    if !grant.is_admin {
        info!("Denied admin listing to {}", grant.user_id);
        return AdminListing::Denied {
            message: i18n::text(locale, keys::ADMIN_ACCESS_DENIED).to_string(),
        };
    }

    match store.list_all_profiles(ProfileOrder::LastLoginDesc).await {
        Ok(profiles) => AdminListing::Loaded {
            rows: profiles
                .into_iter()
                .map(|p| AdminRow::render(p, locale))
                .collect(),
        },
        Err(e) => {
            error!("Admin listing query failed: {:?}", e);
            AdminListing::Failed {
                banner: ErrorBanner {
                    message: i18n::text(locale, keys::ADMIN_LOAD_ERROR).to_string(),
                    dismissible: true,
                },
            }
        }
    }
}
