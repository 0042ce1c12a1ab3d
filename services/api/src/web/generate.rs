//! services/api/src/web/generate.rs
//!
//! Endpoints that drive the generation endpoint: per-employee artifacts and
//! note rewriting.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use reviewiz_core::generation::{generate_artifact, rewrite_note};
use reviewiz_core::{Artifact, ArtifactKind, SessionGrant};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::port_error_response;
use crate::web::locale::RequestLocale;
use crate::web::rest::NoteResponse;
use crate::web::state::AppState;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ArtifactResponse {
    pub id: Uuid,
    pub employee_id: Uuid,
    /// One of `report`, `training`, `reading` or `okr`.
    pub kind: String,
    /// A string for reports, an array of suggestion objects otherwise.
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    pub generated_at: DateTime<Utc>,
}

impl TryFrom<Artifact> for ArtifactResponse {
    type Error = serde_json::Error;

    fn try_from(a: Artifact) -> Result<Self, Self::Error> {
        let kind = a.kind().as_str().to_string();
        let data = match serde_json::to_value(&a.content)? {
            serde_json::Value::Object(mut tagged) => {
                tagged.remove("data").unwrap_or(serde_json::Value::Null)
            }
            other => other,
        };
        Ok(Self {
            id: a.id,
            employee_id: a.employee_id,
            kind,
            data,
            generated_at: a.generated_at,
        })
    }
}

fn artifact_response(a: Artifact) -> Result<ArtifactResponse, (StatusCode, String)> {
    ArtifactResponse::try_from(a).map_err(|e| {
        error!("Failed to serialize artifact: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    })
}

/// A manager's draft note to be rewritten.
#[derive(Deserialize, ToSchema)]
pub struct RewriteRequest {
    pub text: String,
}

/// Lists the stored artifacts of an employee, at most one per kind.
#[utoipa::path(
    get,
    path = "/employees/{id}/artifacts",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses((status = 200, description = "Stored artifacts", body = [ArtifactResponse]))
)]
pub async fn list_artifacts_handler(
    State(state): State<Arc<AppState>>,
    Extension(grant): Extension<SessionGrant>,
    RequestLocale(locale): RequestLocale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let artifacts = state
        .team
        .list_artifacts(&grant.user_id, id)
        .await
        .map_err(|e| port_error_response(&e, locale))?;
    let body = artifacts
        .into_iter()
        .map(artifact_response)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(body))
}

/// Generates (or regenerates) one artifact, replacing the previous one of that kind.
#[utoipa::path(
    post,
    path = "/employees/{id}/artifacts/{kind}",
    params(
        ("id" = Uuid, Path, description = "Employee id"),
        ("kind" = String, Path, description = "report, training, reading or okr")
    ),
    responses(
        (status = 201, description = "Artifact generated", body = ArtifactResponse),
        (status = 400, description = "Unknown artifact kind"),
        (status = 404, description = "No such employee"),
        (status = 502, description = "The generation endpoint failed or answered unusably"),
        (status = 503, description = "Generation is not configured")
    )
)]
pub async fn generate_artifact_handler(
    State(state): State<Arc<AppState>>,
    Extension(grant): Extension<SessionGrant>,
    RequestLocale(locale): RequestLocale,
    Path((id, kind)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let kind: ArtifactKind = kind
        .parse()
        .map_err(|e: String| (StatusCode::BAD_REQUEST, e))?;

    let artifact = generate_artifact(
        state.team.as_ref(),
        state.generator.as_ref(),
        &grant.user_id,
        id,
        kind,
        locale,
    )
    .await
    .map_err(|e| port_error_response(&e, locale))?;

    Ok((StatusCode::CREATED, Json(artifact_response(artifact)?)))
}

/// Rewrites a draft note and stores the result as a new note.
#[utoipa::path(
    post,
    path = "/employees/{id}/notes/rewrite",
    params(("id" = Uuid, Path, description = "Employee id")),
    request_body = RewriteRequest,
    responses(
        (status = 201, description = "Rewritten note stored", body = NoteResponse),
        (status = 400, description = "Empty draft"),
        (status = 502, description = "The generation endpoint failed or answered unusably"),
        (status = 503, description = "Generation is not configured")
    )
)]
pub async fn rewrite_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(grant): Extension<SessionGrant>,
    RequestLocale(locale): RequestLocale,
    Path(id): Path<Uuid>,
    Json(req): Json<RewriteRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.text.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Draft text is required".to_string()));
    }

    let note = rewrite_note(
        state.team.as_ref(),
        state.generator.as_ref(),
        &grant.user_id,
        id,
        &req.text,
        locale,
    )
    .await
    .map_err(|e| port_error_response(&e, locale))?;

    Ok((StatusCode::CREATED, Json(NoteResponse::from(note))))
}
