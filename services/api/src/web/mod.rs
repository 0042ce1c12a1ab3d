pub mod admin;
pub mod auth;
pub mod generate;
pub mod locale;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

// Re-export the pieces the router in `lib.rs` is assembled from.
pub use middleware::require_auth;
pub use rest::ApiDoc;
pub use state::AppState;
