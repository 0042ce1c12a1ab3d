//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the account, localization, employee and note
//! endpoints, the shared payload structs, and the master definition for the
//! OpenAPI specification.

use crate::error::port_error_response;
use crate::web::locale::RequestLocale;
use crate::web::state::AppState;
use crate::web::{admin, auth, generate};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use reviewiz_core::employees::delete_employee_cascade;
use reviewiz_core::i18n::{self, Locale};
use reviewiz_core::{Employee, EmployeeDraft, Note, NoteDraft, NotePatch, NoteTag, SessionGrant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::federated_handler,
        auth::logout_handler,
        me_handler,
        translations_handler,
        list_employees_handler,
        create_employee_handler,
        get_employee_handler,
        update_employee_handler,
        delete_employee_handler,
        list_notes_handler,
        create_note_handler,
        update_note_handler,
        delete_note_handler,
        generate::list_artifacts_handler,
        generate::generate_artifact_handler,
        generate::rewrite_note_handler,
        admin::list_users_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            auth::FederatedRequest,
            auth::AuthResponse,
            MeResponse,
            TranslationsResponse,
            EmployeeRequest,
            EmployeeResponse,
            CreateNoteRequest,
            UpdateNoteRequest,
            NoteResponse,
            generate::ArtifactResponse,
            generate::RewriteRequest,
        )
    ),
    tags(
        (name = "Reviewiz API", description = "Employee notes, generated reviews and the admin user listing.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The caller's identity and the flags resolved when the session started.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub user_id: String,
    pub is_admin: bool,
    pub is_paid: bool,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TranslationsResponse {
    pub locale: String,
    pub strings: BTreeMap<String, String>,
}

#[derive(Deserialize, ToSchema)]
pub struct EmployeeRequest {
    pub name: String,
    pub role: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct EmployeeResponse {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<Employee> for EmployeeResponse {
    fn from(e: Employee) -> Self {
        Self {
            id: e.id,
            name: e.name,
            role: e.role,
            created_at: e.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    pub content: String,
    /// One of `positive`, `improvement` or `neutral`.
    pub tag: String,
    pub category: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateNoteRequest {
    pub content: Option<String>,
    pub tag: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub content: String,
    pub tag: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed: bool,
}

impl From<Note> for NoteResponse {
    fn from(n: Note) -> Self {
        Self {
            id: n.id,
            employee_id: n.employee_id,
            content: n.content,
            tag: n.tag.as_str().to_string(),
            category: n.category,
            created_at: n.created_at,
            completed: n.completed,
        }
    }
}

fn employee_draft(req: EmployeeRequest) -> Result<EmployeeDraft, (StatusCode, String)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Employee name is required".to_string()));
    }
    Ok(EmployeeDraft {
        name: name.to_string(),
        role: req.role.trim().to_string(),
    })
}

fn parse_tag(raw: &str) -> Result<NoteTag, (StatusCode, String)> {
    raw.parse().map_err(|e: String| (StatusCode::BAD_REQUEST, e))
}

//=========================================================================================
// Account and Localization Handlers
//=========================================================================================

/// Returns the caller's session flags.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current session", body = MeResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn me_handler(Extension(grant): Extension<SessionGrant>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: grant.user_id.to_string(),
        is_admin: grant.is_admin,
        is_paid: grant.is_paid,
    })
}

/// Returns the UI string table for a locale. Unsupported tags get the default locale.
#[utoipa::path(
    get,
    path = "/i18n/{locale}",
    params(("locale" = String, Path, description = "Locale tag such as fr, en-US or de_DE.")),
    responses((status = 200, description = "String table", body = TranslationsResponse))
)]
pub async fn translations_handler(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
) -> Json<TranslationsResponse> {
    let locale = Locale::from_tag_or(&tag, state.config.default_locale);
    let strings = i18n::table(locale)
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Json(TranslationsResponse {
        locale: locale.as_str().to_string(),
        strings,
    })
}

//=========================================================================================
// Employee Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/employees",
    responses((status = 200, description = "The caller's employees", body = [EmployeeResponse]))
)]
pub async fn list_employees_handler(
    State(state): State<Arc<AppState>>,
    Extension(grant): Extension<SessionGrant>,
    RequestLocale(locale): RequestLocale,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let employees = state
        .team
        .list_employees(&grant.user_id)
        .await
        .map_err(|e| port_error_response(&e, locale))?;
    Ok(Json(
        employees
            .into_iter()
            .map(EmployeeResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    post,
    path = "/employees",
    request_body = EmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = EmployeeResponse),
        (status = 400, description = "Missing name")
    )
)]
pub async fn create_employee_handler(
    State(state): State<Arc<AppState>>,
    Extension(grant): Extension<SessionGrant>,
    RequestLocale(locale): RequestLocale,
    Json(req): Json<EmployeeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let draft = employee_draft(req)?;
    let employee = state
        .team
        .create_employee(&grant.user_id, draft)
        .await
        .map_err(|e| port_error_response(&e, locale))?;
    info!("Employee {} created by {}", employee.id, grant.user_id);
    Ok((StatusCode::CREATED, Json(EmployeeResponse::from(employee))))
}

#[utoipa::path(
    get,
    path = "/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "The employee", body = EmployeeResponse),
        (status = 404, description = "No such employee")
    )
)]
pub async fn get_employee_handler(
    State(state): State<Arc<AppState>>,
    Extension(grant): Extension<SessionGrant>,
    RequestLocale(locale): RequestLocale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let employee = state
        .team
        .get_employee(&grant.user_id, id)
        .await
        .map_err(|e| port_error_response(&e, locale))?;
    Ok(Json(EmployeeResponse::from(employee)))
}

#[utoipa::path(
    put,
    path = "/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee id")),
    request_body = EmployeeRequest,
    responses(
        (status = 200, description = "Employee updated", body = EmployeeResponse),
        (status = 404, description = "No such employee")
    )
)]
pub async fn update_employee_handler(
    State(state): State<Arc<AppState>>,
    Extension(grant): Extension<SessionGrant>,
    RequestLocale(locale): RequestLocale,
    Path(id): Path<Uuid>,
    Json(req): Json<EmployeeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let draft = employee_draft(req)?;
    let employee = state
        .team
        .update_employee(&grant.user_id, id, draft)
        .await
        .map_err(|e| port_error_response(&e, locale))?;
    Ok(Json(EmployeeResponse::from(employee)))
}

/// Deletes the employee together with its notes and generated artifacts.
#[utoipa::path(
    delete,
    path = "/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 404, description = "No such employee")
    )
)]
pub async fn delete_employee_handler(
    State(state): State<Arc<AppState>>,
    Extension(grant): Extension<SessionGrant>,
    RequestLocale(locale): RequestLocale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    delete_employee_cascade(state.team.as_ref(), &grant.user_id, id)
        .await
        .map_err(|e| port_error_response(&e, locale))?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Note Handlers
//=========================================================================================

/// Lists an employee's notes, newest first.
#[utoipa::path(
    get,
    path = "/employees/{id}/notes",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses((status = 200, description = "Notes", body = [NoteResponse]))
)]
pub async fn list_notes_handler(
    State(state): State<Arc<AppState>>,
    Extension(grant): Extension<SessionGrant>,
    RequestLocale(locale): RequestLocale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let notes = state
        .team
        .list_notes(&grant.user_id, id)
        .await
        .map_err(|e| port_error_response(&e, locale))?;
    Ok(Json(
        notes.into_iter().map(NoteResponse::from).collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    post,
    path = "/employees/{id}/notes",
    params(("id" = Uuid, Path, description = "Employee id")),
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = NoteResponse),
        (status = 400, description = "Empty content or unknown tag"),
        (status = 404, description = "No such employee")
    )
)]
pub async fn create_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(grant): Extension<SessionGrant>,
    RequestLocale(locale): RequestLocale,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Note content is required".to_string()));
    }
    let draft = NoteDraft {
        content: content.to_string(),
        tag: parse_tag(&req.tag)?,
        category: req.category.filter(|c| !c.trim().is_empty()),
    };

    let note = state
        .team
        .create_note(&grant.user_id, id, draft)
        .await
        .map_err(|e| port_error_response(&e, locale))?;
    Ok((StatusCode::CREATED, Json(NoteResponse::from(note))))
}

#[utoipa::path(
    put,
    path = "/employees/{id}/notes/{note_id}",
    params(
        ("id" = Uuid, Path, description = "Employee id"),
        ("note_id" = Uuid, Path, description = "Note id")
    ),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated", body = NoteResponse),
        (status = 400, description = "Empty content or unknown tag"),
        (status = 404, description = "No such note")
    )
)]
pub async fn update_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(grant): Extension<SessionGrant>,
    RequestLocale(locale): RequestLocale,
    Path((id, note_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let content = req.content.map(|c| c.trim().to_string());
    if content.as_deref() == Some("") {
        return Err((StatusCode::BAD_REQUEST, "Note content is required".to_string()));
    }
    let patch = NotePatch {
        content,
        tag: req.tag.as_deref().map(parse_tag).transpose()?,
        completed: req.completed,
    };

    let note = state
        .team
        .update_note(&grant.user_id, id, note_id, patch)
        .await
        .map_err(|e| port_error_response(&e, locale))?;
    Ok(Json(NoteResponse::from(note)))
}

#[utoipa::path(
    delete,
    path = "/employees/{id}/notes/{note_id}",
    params(
        ("id" = Uuid, Path, description = "Employee id"),
        ("note_id" = Uuid, Path, description = "Note id")
    ),
    responses(
        (status = 204, description = "Note deleted"),
        (status = 404, description = "No such note")
    )
)]
pub async fn delete_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(grant): Extension<SessionGrant>,
    RequestLocale(locale): RequestLocale,
    Path((id, note_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .team
        .delete_note(&grant.user_id, id, note_id)
        .await
        .map_err(|e| port_error_response(&e, locale))?;
    Ok(StatusCode::NO_CONTENT)
}
