//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        HttpMailerAdapter, OpenAiEmbeddingAdapter, OpenAiResponderAdapter, PgAdapter,
        PineconeIndexAdapter,
    },
    config::Config,
    error::ApiError,
    web::{
        auth::{
            forgot_password_handler, logout_handler, reset_password_handler, signin_handler,
            signup_handler, verify_email_handler,
        },
        notes::{
            chat_handler, create_note_handler, delete_note_handler, fetch_all_notes_handler,
            fetch_note_by_id_handler, update_note_handler,
        },
        health_handler, require_auth,
        state::AppState,
        ApiDoc,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use notes_core::{auth::AuthFlow, chat::ChatFlow, notes::NoteFlow};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(PgAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter
        .run_migrations()
        .await
        .map_err(|e| ApiError::Internal(format!("Migration failed: {}", e)))?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);
    let http_client = reqwest::Client::new();

    let embedder = Arc::new(OpenAiEmbeddingAdapter::new(
        openai_client.clone(),
        config.embedding_model.clone(),
    ));
    let responder = Arc::new(OpenAiResponderAdapter::new(
        openai_client.clone(),
        config.chat_model.clone(),
    ));
    let index = Arc::new(PineconeIndexAdapter::new(
        http_client.clone(),
        config.vector_index_url.clone(),
        config.vector_index_api_key.clone(),
    ));
    let mailer = Arc::new(HttpMailerAdapter::new(
        http_client,
        config.mail_api_url.clone(),
        config.mail_api_key.clone(),
        config.mail_from.clone(),
    ));

    // --- 4. Wire the Core Flows & Build the Shared AppState ---
    let auth = AuthFlow::new(db_adapter.clone(), mailer, config.client_url.clone());
    let notes = NoteFlow::new(db_adapter.clone(), embedder.clone(), index.clone());
    let chat = ChatFlow::new(db_adapter, embedder, index, responder);

    let app_state = Arc::new(AppState {
        auth,
        notes,
        chat,
        config: config.clone(),
    });

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(health_handler))
        .route("/api/v1/auth/signup", post(signup_handler))
        .route("/api/v1/auth/verify-email", post(verify_email_handler))
        .route("/api/v1/auth/signin", post(signin_handler))
        .route("/api/v1/auth/logout", post(logout_handler))
        .route("/api/v1/auth/forgot-password", post(forgot_password_handler))
        .route(
            "/api/v1/auth/reset-password/{reset_token}",
            post(reset_password_handler),
        );

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/api/v1/notes",
            post(create_note_handler).get(fetch_all_notes_handler),
        )
        .route(
            "/api/v1/notes/{note_id}",
            get(fetch_note_by_id_handler)
                .patch(update_note_handler)
                .delete(delete_note_handler),
        )
        .route("/api/v1/notes/chat", post(chat_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
