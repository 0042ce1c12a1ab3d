//! crates/reviewiz_core/src/profile.rs
//!
//! Resolves the caller's plan and role flags when a session starts.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::domain::{SessionGrant, SessionIdentity, UserProfile};
use crate::ports::{PortError, ProfileStore};

/// Runs once per session establishment.
///
/// Creates the profile on first sign-in, then records the login time. The login
/// write is best-effort. If the profile cannot be read or created at all, the
/// session proceeds without privileges.
pub async fn resolve_session<S>(
    store: &S,
    identity: &SessionIdentity,
    now: DateTime<Utc>,
) -> SessionGrant
where
    S: ProfileStore + ?Sized,
{
    let profile = match store.get_profile(&identity.user_id).await {
        Ok(profile) => profile,
        Err(PortError::NotFound(_)) => {
            let profile = UserProfile::new(identity, now);
            if let Err(e) = store.create_profile(profile.clone()).await {
                error!("Failed to create profile for {}: {:?}", identity.user_id, e);
                return SessionGrant::unprivileged(identity.user_id.clone());
            }
            info!("Created profile for {}", identity.user_id);
            profile
        }
        Err(e) => {
            error!("Failed to read profile for {}: {:?}", identity.user_id, e);
            return SessionGrant::unprivileged(identity.user_id.clone());
        }
    };

    if let Err(e) = store.touch_last_login(&identity.user_id, now).await {
        warn!("Could not record last login for {}: {:?}", identity.user_id, e);
    }

    SessionGrant {
        user_id: profile.user_id,
        is_admin: profile.is_admin,
        is_paid: profile.is_paid,
    }
}
