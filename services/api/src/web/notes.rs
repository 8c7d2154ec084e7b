//! services/api/src/web/notes.rs
//!
//! Note CRUD and chat endpoints. Every handler takes its owner id from the
//! verified session token in request extensions, never from the body, so a
//! caller can only ever touch its own notes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::ApiError;
use crate::web::response::SuccessBody;
use crate::web::state::AppState;
use notes_core::domain::{NewNote, Note, NoteCategory, NotePatch};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateNoteRequest {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    #[schema(value_type = Option<String>)]
    pub category: Option<NoteCategory>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct UpdateNoteRequest {
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: Option<String>,
    #[schema(value_type = Option<String>)]
    pub category: Option<NoteCategory>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct ChatRequest {
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct NoteResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    #[schema(value_type = String)]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[schema(value_type = String)]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Note> for NoteResponse {
    fn from(n: Note) -> Self {
        Self {
            id: n.id,
            user_id: n.owner_id,
            title: n.title,
            content: n.content,
            category: n.category.map(|c| c.as_str().to_string()),
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub answer: String,
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("title");
        err.message = Some(Cow::Borrowed("Title is required"));
        return Err(err);
    }
    if trimmed.chars().count() > 100 {
        let mut err = ValidationError::new("title");
        err.message = Some(Cow::Borrowed("Title must be at most 100 characters"));
        return Err(err);
    }
    Ok(())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/v1/notes - Create a note
#[utoipa::path(
    post,
    path = "/api/v1/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created successfully", body = NoteResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid session token")
    )
)]
pub async fn create_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let note = state
        .notes
        .create_note(NewNote {
            owner_id: user_id,
            title: req.title.trim().to_string(),
            content: req.content,
            category: req.category,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessBody::new(
            "Note created successfully",
            NoteResponse::from(note),
        )),
    ))
}

/// GET /api/v1/notes - Fetch all of the caller's notes
#[utoipa::path(
    get,
    path = "/api/v1/notes",
    responses(
        (status = 200, description = "Notes fetched successfully", body = [NoteResponse]),
        (status = 401, description = "Missing or invalid session token")
    )
)]
pub async fn fetch_all_notes_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let notes = state.notes.fetch_all_notes(user_id).await?;
    let notes: Vec<NoteResponse> = notes.into_iter().map(NoteResponse::from).collect();
    Ok(Json(SuccessBody::new("Notes fetched successfully", notes)))
}

/// GET /api/v1/notes/{note_id} - Fetch one note by id
#[utoipa::path(
    get,
    path = "/api/v1/notes/{note_id}",
    params(
        ("note_id" = Uuid, Path, description = "The id of the note to fetch.")
    ),
    responses(
        (status = 200, description = "Successfully fetched note by id", body = NoteResponse),
        (status = 404, description = "Missing or not owned by the caller")
    )
)]
pub async fn fetch_note_by_id_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(note_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.notes.fetch_note_by_id(note_id, user_id).await?;
    Ok(Json(SuccessBody::new(
        "Successfully fetched note by id",
        NoteResponse::from(note),
    )))
}

/// PATCH /api/v1/notes/{note_id} - Update a note
#[utoipa::path(
    patch,
    path = "/api/v1/notes/{note_id}",
    request_body = UpdateNoteRequest,
    params(
        ("note_id" = Uuid, Path, description = "The id of the note to update.")
    ),
    responses(
        (status = 200, description = "Note updated successfully", body = NoteResponse),
        (status = 404, description = "Missing or not owned by the caller")
    )
)]
pub async fn update_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(note_id): Path<Uuid>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let note = state
        .notes
        .update_note(
            note_id,
            user_id,
            NotePatch {
                title: req.title.map(|t| t.trim().to_string()),
                content: req.content,
                category: req.category,
            },
        )
        .await?;
    Ok(Json(SuccessBody::new(
        "Note updated successfully",
        NoteResponse::from(note),
    )))
}

/// DELETE /api/v1/notes/{note_id} - Delete a note
#[utoipa::path(
    delete,
    path = "/api/v1/notes/{note_id}",
    params(
        ("note_id" = Uuid, Path, description = "The id of the note to delete.")
    ),
    responses(
        (status = 200, description = "Note deleted successfully", body = NoteResponse),
        (status = 404, description = "Missing or not owned by the caller")
    )
)]
pub async fn delete_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(note_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.notes.delete_note(note_id, user_id).await?;
    Ok(Json(SuccessBody::new(
        "Note deleted successfully",
        NoteResponse::from(note),
    )))
}

/// POST /api/v1/notes/chat - Ask a question grounded in the caller's notes
#[utoipa::path(
    post,
    path = "/api/v1/notes/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Response generated", body = ChatResponse),
        (status = 404, description = "No relevant notes found"),
        (status = 500, description = "Provider failure")
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let answer = state.chat.answer(user_id, &req.message).await?;
    Ok(Json(SuccessBody::new(
        "Response generated",
        ChatResponse { answer },
    )))
}
