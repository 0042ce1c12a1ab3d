//! services/api/src/web/admin.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use reviewiz_core::admin::{load_admin_listing, AdminListing};
use reviewiz_core::SessionGrant;
use serde::Serialize;
use std::sync::Arc;

use crate::web::locale::RequestLocale;
use crate::web::state::AppState;

#[derive(Serialize)]
struct AdminListingBody {
    loading: bool,
    #[serde(flatten)]
    listing: AdminListing,
}

/// Lists every registered user, most recent login first. Admins only.
///
/// The body is the listing state: `denied` (403), `loaded` (200) or `failed` (502).
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "Every profile, most recent login first"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 502, description = "The profile query failed")
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    Extension(grant): Extension<SessionGrant>,
    RequestLocale(locale): RequestLocale,
) -> impl IntoResponse {
    let listing = load_admin_listing(&grant, state.profiles.as_ref(), locale).await;
    let status = match listing {
        AdminListing::Denied { .. } => StatusCode::FORBIDDEN,
        AdminListing::Loaded { .. } => StatusCode::OK,
        AdminListing::Failed { .. } => StatusCode::BAD_GATEWAY,
    };
    let body = AdminListingBody {
        loading: listing.loading(),
        listing,
    };
    (status, Json(body))
}
