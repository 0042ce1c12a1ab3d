//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for signup, login, federated sign-in and logout.
//! Every successful sign-in resolves the caller's profile flags once and pins
//! them to the new auth session.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use reviewiz_core::i18n::{self, keys};
use reviewiz_core::ports::PortError;
use reviewiz_core::profile::resolve_session;
use reviewiz_core::{SessionIdentity, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::port_error_response;
use crate::web::locale::RequestLocale;
use crate::web::middleware::session_cookie;
use crate::web::state::AppState;

const SESSION_DAYS: i64 = 30;
const MIN_PASSWORD_LEN: usize = 8;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of a federated sign-in: the provider-issued ID token.
#[derive(Deserialize, ToSchema)]
pub struct FederatedRequest {
    pub id_token: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub is_admin: bool,
    pub is_paid: bool,
}

//=========================================================================================
// Session Establishment
//=========================================================================================

/// Resolves the profile flags, stores the auth session and builds the cookie response.
async fn establish_session(
    state: &AppState,
    identity: SessionIdentity,
    status: StatusCode,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let now = Utc::now();
    let grant = resolve_session(state.profiles.as_ref(), &identity, now).await;

    match state.credentials.purge_expired_auth_sessions(now).await {
        Ok(0) => {}
        Ok(purged) => info!("Purged {} expired auth sessions", purged),
        Err(e) => warn!("Failed to purge expired auth sessions: {:?}", e),
    }

    let auth_session_id = Uuid::new_v4().to_string();
    let expires_at = now + Duration::days(SESSION_DAYS);

    state
        .credentials
        .create_auth_session(&auth_session_id, &grant, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session".to_string())
        })?;

    let cookie = format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        auth_session_id,
        Duration::days(SESSION_DAYS).num_seconds()
    );

    info!("Session established for {}", grant.user_id);
    let response = AuthResponse {
        user_id: grant.user_id.to_string(),
        email: identity.email,
        is_admin: grant.is_admin,
        is_paid: grant.is_paid,
    };

    Ok((status, [(header::SET_COOKIE, cookie)], Json(response)))
}

fn invalid_credentials(locale: RequestLocale) -> (StatusCode, String) {
    (
        StatusCode::UNAUTHORIZED,
        i18n::text(locale.0, keys::AUTH_INVALID_CREDENTIALS).to_string(),
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new password account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    locale: RequestLocale,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let email = req.email.trim();
    if !email.contains('@') || req.password.len() < MIN_PASSWORD_LEN {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "A valid email and a password of at least {} characters are required",
                MIN_PASSWORD_LEN
            ),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password".to_string())
        })?
        .to_string();

    let account = state
        .credentials
        .create_password_account(email, &password_hash)
        .await
        .map_err(|e| {
            error!("Failed to create account: {:?}", e);
            port_error_response(&e, locale.0)
        })?;

    let identity = SessionIdentity {
        user_id: account.user_id,
        email: Some(account.email),
        display_name: None,
    };
    establish_session(&state, identity, StatusCode::CREATED).await
}

/// POST /auth/login - Login with an existing password account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    locale: RequestLocale,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let account = match state.credentials.get_password_account(req.email.trim()).await {
        Ok(account) => account,
        Err(PortError::NotFound(_)) => return Err(invalid_credentials(locale)),
        Err(e) => {
            error!("Failed to get account: {:?}", e);
            return Err(port_error_response(&e, locale.0));
        }
    };

    let parsed_hash = PasswordHash::new(&account.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
    })?;

    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid_credentials(locale));
    }

    let identity = SessionIdentity {
        user_id: account.user_id,
        email: Some(account.email),
        display_name: None,
    };
    establish_session(&state, identity, StatusCode::OK).await
}

/// POST /auth/federated - Sign in with a provider-issued ID token
#[utoipa::path(
    post,
    path = "/auth/federated",
    request_body = FederatedRequest,
    responses(
        (status = 200, description = "Sign-in successful", body = AuthResponse),
        (status = 401, description = "Token rejected"),
        (status = 503, description = "Federated sign-in is not configured")
    )
)]
pub async fn federated_handler(
    State(state): State<Arc<AppState>>,
    locale: RequestLocale,
    Json(req): Json<FederatedRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let identity = state
        .identity
        .verify(&req.id_token)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized => invalid_credentials(locale),
            other => port_error_response(&other, locale.0),
        })?;

    let user_id: UserId = state
        .credentials
        .get_or_create_federated_account(&identity)
        .await
        .map_err(|e| {
            error!("Failed to map federated identity: {:?}", e);
            port_error_response(&e, locale.0)
        })?;

    let session_identity = SessionIdentity {
        user_id,
        email: identity.email,
        display_name: identity.display_name,
    };
    establish_session(&state, session_identity, StatusCode::OK).await
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let auth_session_id = session_cookie(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    state
        .credentials
        .delete_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to delete auth session: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout".to_string())
        })?;

    let cookie = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]))
}
