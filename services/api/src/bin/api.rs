//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, GoogleIdentityAdapter, OpenAiGenerationAdapter, Unconfigured},
    config::{Config, StoreBackend},
    create_app,
    error::ApiError,
    web::AppState,
};
use reviewiz_core::memory::MemoryStore;
use reviewiz_core::ports::{GenerationService, IdentityVerifier};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize External Collaborators ---
    // A missing credential leaves the service up; the affected endpoints answer 503.
    for setting in config.missing_collaborators() {
        error!("{} is not set; dependent features will report a configuration error", setting);
    }

    let generator: Arc<dyn GenerationService> = match &config.generation {
        Some(generation) => {
            info!("Generation endpoint configured with model {}", generation.model);
            Arc::new(OpenAiGenerationAdapter::from_config(generation))
        }
        None => Arc::new(Unconfigured::new("GEMINI_API_KEY or OPENAI_API_KEY")),
    };

    let identity: Arc<dyn IdentityVerifier> = match &config.google_client_id {
        Some(client_id) => Arc::new(GoogleIdentityAdapter::new(client_id.clone())),
        None => Arc::new(Unconfigured::new("GOOGLE_CLIENT_ID")),
    };

    // --- 3. Connect to the Document Store & Build the Shared AppState ---
    let app_state = match &config.store {
        StoreBackend::Postgres { database_url } => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            db_adapter.start_change_listener().await?;
            AppState::new(db_adapter, generator, identity, config.clone())
        }
        StoreBackend::Memory => {
            warn!("DOCUMENT_STORE=memory; data is lost on restart.");
            AppState::new(Arc::new(MemoryStore::new()), generator, identity, config.clone())
        }
    };

    // --- 4. Create the Web Router ---
    let app = create_app(Arc::new(app_state));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
