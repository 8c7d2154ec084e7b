//! services/api/src/web/mod.rs
//!
//! The HTTP surface: handlers, middleware, shared state, and the master
//! definition for the OpenAPI specification.

pub mod auth;
pub mod middleware;
pub mod notes;
pub mod response;
pub mod state;
pub mod token;

pub use middleware::require_auth;

use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::web::response::SuccessBody;

/// GET / - Liveness check
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Server is up and running")
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    Json(SuccessBody::new(
        "Server is up and running",
        serde_json::json!({}),
    ))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::signup_handler,
        auth::verify_email_handler,
        auth::signin_handler,
        auth::logout_handler,
        auth::forgot_password_handler,
        auth::reset_password_handler,
        notes::create_note_handler,
        notes::fetch_all_notes_handler,
        notes::fetch_note_by_id_handler,
        notes::update_note_handler,
        notes::delete_note_handler,
        notes::chat_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::VerifyEmailRequest,
            auth::SigninRequest,
            auth::ForgotPasswordRequest,
            auth::ResetPasswordRequest,
            auth::UserResponse,
            auth::SessionResponse,
            notes::CreateNoteRequest,
            notes::UpdateNoteRequest,
            notes::ChatRequest,
            notes::NoteResponse,
            notes::ChatResponse,
        )
    ),
    tags(
        (name = "AI Notes API", description = "Accounts, per-user notes, and retrieval-grounded chat.")
    )
)]
pub struct ApiDoc;
