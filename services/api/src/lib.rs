//! services/api/src/lib.rs
//!
//! The `api` service as a library: adapters, configuration and the web layer,
//! plus `create_app`, which assembles the router for the binary and the tests.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;

use axum::{
    http::{
        header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::{
    admin::list_users_handler,
    auth::{federated_handler, login_handler, logout_handler, signup_handler},
    generate::{generate_artifact_handler, list_artifacts_handler, rewrite_note_handler},
    require_auth,
    rest::{
        create_employee_handler, create_note_handler, delete_employee_handler,
        delete_note_handler, get_employee_handler, list_employees_handler, list_notes_handler,
        me_handler, translations_handler, update_employee_handler, update_note_handler,
    },
    ws_handler::{employees_ws_handler, notes_ws_handler},
    ApiDoc, AppState,
};

fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT, ACCEPT_LANGUAGE]);
    match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!("ALLOWED_ORIGIN '{}' is not a valid header value; cross-origin requests will be refused", allowed_origin);
            cors
        }
    }
}

/// Builds the complete application router over the given state.
pub fn create_app(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/federated", post(federated_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/i18n/{locale}", get(translations_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/me", get(me_handler))
        .route(
            "/employees",
            get(list_employees_handler).post(create_employee_handler),
        )
        .route(
            "/employees/{id}",
            get(get_employee_handler)
                .put(update_employee_handler)
                .delete(delete_employee_handler),
        )
        .route(
            "/employees/{id}/notes",
            get(list_notes_handler).post(create_note_handler),
        )
        .route("/employees/{id}/notes/rewrite", post(rewrite_note_handler))
        .route(
            "/employees/{id}/notes/{note_id}",
            put(update_note_handler).delete(delete_note_handler),
        )
        .route("/employees/{id}/artifacts", get(list_artifacts_handler))
        .route(
            "/employees/{id}/artifacts/{kind}",
            post(generate_artifact_handler),
        )
        .route("/admin/users", get(list_users_handler))
        .route("/ws/employees", get(employees_ws_handler))
        .route("/ws/employees/{id}/notes", get(notes_ws_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let cors = cors_layer(&app_state.config.allowed_origin);

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
