//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `UserStore` and `NoteStore` ports from the `core`
//! crate. It handles all interactions with the PostgreSQL database using
//! `sqlx`.
//!
//! The note-row and note-id-list mutations that must stay in lockstep run
//! inside one sqlx transaction here; the vector index is coordinated a level
//! up, in the core flows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use notes_core::domain::{AuthUser, NewNote, NewUser, Note, NoteCategory, NotePatch};
use notes_core::ports::{NoteStore, PortError, PortResult, UserStore};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `UserStore` and `NoteStore` ports.
#[derive(Clone)]
pub struct PgAdapter {
    pool: PgPool,
}

impl PgAdapter {
    /// Creates a new `PgAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    password_hash: String,
    is_verified: bool,
    last_login: Option<DateTime<Utc>>,
    verification_code: Option<String>,
    verification_code_expires_at: Option<DateTime<Utc>>,
    reset_password_token: Option<String>,
    reset_password_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn to_domain(self) -> AuthUser {
        AuthUser {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            is_verified: self.is_verified,
            last_login: self.last_login,
            verification_code: self.verification_code,
            verification_code_expires_at: self.verification_code_expires_at,
            reset_password_token: self.reset_password_token,
            reset_password_expires_at: self.reset_password_expires_at,
            created_at: self.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, is_verified, last_login, \
     verification_code, verification_code_expires_at, \
     reset_password_token, reset_password_expires_at, created_at";

#[derive(FromRow)]
struct NoteRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    content: String,
    category: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NoteRecord {
    fn to_domain(self) -> Note {
        Note {
            id: self.id,
            owner_id: self.user_id,
            title: self.title,
            content: self.content,
            // Only values this adapter wrote can be present, so an unknown
            // string would mean a hand-edited row; it degrades to "no
            // category" instead of failing the whole fetch.
            category: self
                .category
                .and_then(|s| NoteCategory::from_str(&s).ok()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const NOTE_COLUMNS: &str = "id, user_id, title, content, category, created_at, updated_at";

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for PgAdapter {
    async fn find_by_email(&self, email: &str) -> PortResult<Option<AuthUser>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn create(&self, new_user: NewUser) -> PortResult<AuthUser> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, email, password_hash, verification_code, verification_code_expires_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.verification_code)
        .bind(new_user.verification_code_expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn mark_verified(&self, user_id: Uuid, login_at: DateTime<Utc>) -> PortResult<AuthUser> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET is_verified = TRUE, last_login = $2, \
             verification_code = NULL, verification_code_expires_at = NULL \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(login_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record
            .map(UserRecord::to_domain)
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))
    }

    async fn touch_last_login(&self, user_id: Uuid, login_at: DateTime<Utc>) -> PortResult<()> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(user_id)
            .bind(login_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query(
            "UPDATE users SET reset_password_token = $2, reset_password_expires_at = $3 \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn find_by_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> PortResult<Option<AuthUser>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users \
             WHERE reset_password_token = $1 AND reset_password_expires_at > $2",
            USER_COLUMNS
        ))
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn replace_password(&self, user_id: Uuid, password_hash: &str) -> PortResult<()> {
        sqlx::query(
            "UPDATE users SET password_hash = $2, \
             reset_password_token = NULL, reset_password_expires_at = NULL \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `NoteStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl NoteStore for PgAdapter {
    async fn insert_with_backref(&self, new_note: NewNote) -> PortResult<Note> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "INSERT INTO notes (id, user_id, title, content, category) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(new_note.owner_id)
        .bind(&new_note.title)
        .bind(&new_note.content)
        .bind(new_note.category.map(|c| c.as_str()))
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        // The primary key on user_notes makes the back-reference list hold
        // each note id at most once.
        sqlx::query(
            "INSERT INTO user_notes (user_id, note_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(record.user_id)
        .bind(record.id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn find_by_id(&self, note_id: Uuid, owner_id: Uuid) -> PortResult<Option<Note>> {
        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "SELECT {} FROM notes WHERE id = $1 AND user_id = $2",
            NOTE_COLUMNS
        ))
        .bind(note_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(NoteRecord::to_domain))
    }

    async fn find_all(&self, owner_id: Uuid) -> PortResult<Vec<Note>> {
        let records = sqlx::query_as::<_, NoteRecord>(&format!(
            "SELECT {} FROM notes WHERE user_id = $1",
            NOTE_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(NoteRecord::to_domain).collect())
    }

    async fn update_fields(
        &self,
        note_id: Uuid,
        owner_id: Uuid,
        patch: NotePatch,
    ) -> PortResult<Option<Note>> {
        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "UPDATE notes SET \
             title = COALESCE($3, title), \
             content = COALESCE($4, content), \
             category = COALESCE($5, category), \
             updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(note_id)
        .bind(owner_id)
        .bind(patch.title)
        .bind(patch.content)
        .bind(patch.category.map(|c| c.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(NoteRecord::to_domain))
    }

    async fn delete_with_backref(
        &self,
        note_id: Uuid,
        owner_id: Uuid,
    ) -> PortResult<Option<Note>> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // List membership first, then the row, so a concurrent reader never
        // observes a listed id that no longer resolves to a note.
        sqlx::query("DELETE FROM user_notes WHERE user_id = $1 AND note_id = $2")
            .bind(owner_id)
            .bind(note_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "DELETE FROM notes WHERE id = $1 AND user_id = $2 RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(note_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(record.map(NoteRecord::to_domain))
    }

    async fn note_ids(&self, owner_id: Uuid) -> PortResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT note_id FROM user_notes WHERE user_id = $1",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(ids)
    }
}
