//! crates/notes_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The fixed set of categories a note can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteCategory {
    Work,
    Personal,
    Ideas,
}

impl NoteCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteCategory::Work => "work",
            NoteCategory::Personal => "personal",
            NoteCategory::Ideas => "ideas",
        }
    }
}

impl fmt::Display for NoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(NoteCategory::Work),
            "personal" => Ok(NoteCategory::Personal),
            "ideas" => Ok(NoteCategory::Ideas),
            other => Err(format!("unknown note category '{}'", other)),
        }
    }
}

/// A note owned by a single user. The owner never changes after creation.
#[derive(Debug, Clone, Serialize)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Option<NoteCategory>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// The text blob that gets embedded into the vector index.
    pub fn embedding_text(title: &str, content: &str) -> String {
        format!("{}\n\n{}", title, content)
    }
}

/// Input for creating a note. Validation happens at the web boundary.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Option<NoteCategory>,
}

/// A partial update to a note. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<NoteCategory>,
}

/// The full credential record for a user, including secrets and one-time
/// token state. Only used inside the auth flow and store adapters; clients
/// only ever see the [`User`] projection.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub verification_code: Option<String>,
    pub verification_code_expires_at: Option<DateTime<Utc>>,
    pub reset_password_token: Option<String>,
    pub reset_password_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// The public view of a user account.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub is_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<AuthUser> for User {
    fn from(u: AuthUser) -> Self {
        User {
            id: u.id,
            email: u.email,
            is_verified: u.is_verified,
            last_login: u.last_login,
            created_at: u.created_at,
        }
    }
}

/// Input for creating a user record at signup time.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub verification_code: String,
    pub verification_code_expires_at: DateTime<Utc>,
}

/// An outgoing email.
#[derive(Debug, Clone)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// One entry in the vector index: a note's embedding tagged with its owner.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: Uuid,
    pub values: Vec<f32>,
    pub owner_id: Uuid,
}

/// A nearest-neighbor hit returned by the vector index.
#[derive(Debug, Clone)]
pub struct VectorMatch {
    pub id: Uuid,
    pub score: f32,
}
