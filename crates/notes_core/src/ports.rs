//! crates/notes_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases,
//! vector indexes, or model APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AuthUser, Mail, NewNote, NewUser, Note, NotePatch, VectorMatch, VectorRecord,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The resource does not exist, or is not owned by the caller. The two
    /// cases are deliberately indistinguishable.
    #[error("{0}")]
    NotFound(String),
    /// A business-rule violation: duplicate email, wrong password, expired
    /// or invalid token, mismatched passwords.
    #[error("{0}")]
    BadRequest(String),
    /// The embedding provider could not produce a usable vector.
    #[error("Error generating embeddings: {0}")]
    Embedding(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence for user credential records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks up a user by normalized (lowercased, trimmed) email.
    async fn find_by_email(&self, email: &str) -> PortResult<Option<AuthUser>>;

    async fn create(&self, new_user: NewUser) -> PortResult<AuthUser>;

    /// Marks the user verified: clears the verification code and its expiry,
    /// sets the verified flag, and stamps the login time.
    async fn mark_verified(&self, user_id: Uuid, login_at: DateTime<Utc>) -> PortResult<AuthUser>;

    async fn touch_last_login(&self, user_id: Uuid, login_at: DateTime<Utc>) -> PortResult<()>;

    /// Stores a reset token, replacing any previous one.
    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Finds the user holding `token` with `expires_at > now`.
    async fn find_by_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> PortResult<Option<AuthUser>>;

    /// Replaces the password hash and clears the reset token and its expiry.
    async fn replace_password(&self, user_id: Uuid, password_hash: &str) -> PortResult<()>;
}

/// Persistence for notes and the per-user list of owned note ids.
///
/// The two `*_with_backref` operations cover the note row and the owner's
/// note-id list in a single transactional scope; the vector index is outside
/// that scope and is coordinated by the [`crate::notes::NoteFlow`].
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Inserts the note and appends its id to the owner's note-id list,
    /// atomically.
    async fn insert_with_backref(&self, new_note: NewNote) -> PortResult<Note>;

    /// Returns the note only if it exists AND is owned by `owner_id`.
    async fn find_by_id(&self, note_id: Uuid, owner_id: Uuid) -> PortResult<Option<Note>>;

    /// All notes owned by `owner_id`, in store-native order.
    async fn find_all(&self, owner_id: Uuid) -> PortResult<Vec<Note>>;

    /// Applies the patch, filtered by both id and owner. Returns `None` if no
    /// such note exists for this owner.
    async fn update_fields(
        &self,
        note_id: Uuid,
        owner_id: Uuid,
        patch: NotePatch,
    ) -> PortResult<Option<Note>>;

    /// Removes the id from the owner's note-id list and then deletes the note
    /// row, atomically and in that order, so a concurrent reader never sees a
    /// listed id that no longer resolves. Returns the deleted note.
    async fn delete_with_backref(&self, note_id: Uuid, owner_id: Uuid)
        -> PortResult<Option<Note>>;

    /// The owner's note-id back-reference list.
    async fn note_ids(&self, owner_id: Uuid) -> PortResult<Vec<Uuid>>;
}

/// External capability producing a fixed-length vector for a text blob.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> PortResult<Vec<f32>>;
}

/// External nearest-neighbor index over note embeddings, filterable by owner.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, record: VectorRecord) -> PortResult<()>;

    async fn query(
        &self,
        values: &[f32],
        top_k: usize,
        owner_id: Uuid,
    ) -> PortResult<Vec<VectorMatch>>;

    async fn delete(&self, id: Uuid) -> PortResult<()>;
}

/// External capability producing free-text answers from a prompt.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn generate(&self, prompt: &str) -> PortResult<String>;
}

/// Outbound email. Never errors; a `false` return signals failure and the
/// auth flow treats it as fatal to the enclosing operation.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> bool;
}
