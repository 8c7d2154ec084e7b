//! In-memory fake implementations of the ports, shared by the flow tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    AuthUser, Mail, NewNote, NewUser, Note, NotePatch, VectorMatch, VectorRecord,
};
use crate::ports::{
    EmbeddingProvider, Mailer, NoteStore, PortError, PortResult, Responder, UserStore, VectorIndex,
};

//=========================================================================================
// Users
//=========================================================================================

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, AuthUser>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_user_by_email<T>(&self, email: &str, f: impl FnOnce(&mut AuthUser) -> T) -> Option<T> {
        let mut users = self.users.lock().unwrap();
        users.values_mut().find(|u| u.email == email).map(f)
    }

    pub fn verification_code(&self, email: &str) -> Option<String> {
        self.with_user_by_email(email, |u| u.verification_code.clone())
            .flatten()
    }

    pub fn expire_verification_code(&self, email: &str) {
        self.with_user_by_email(email, |u| {
            u.verification_code_expires_at = Some(Utc::now() - Duration::seconds(1));
        });
    }

    pub fn reset_token(&self, email: &str) -> Option<String> {
        self.with_user_by_email(email, |u| u.reset_password_token.clone())
            .flatten()
    }

    pub fn expire_reset_token(&self, email: &str) {
        self.with_user_by_email(email, |u| {
            u.reset_password_expires_at = Some(Utc::now() - Duration::seconds(1));
        });
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> PortResult<Option<AuthUser>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new_user: NewUser) -> PortResult<AuthUser> {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            is_verified: false,
            last_login: None,
            verification_code: Some(new_user.verification_code),
            verification_code_expires_at: Some(new_user.verification_code_expires_at),
            reset_password_token: None,
            reset_password_expires_at: None,
            created_at: Utc::now(),
        };
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(user)
    }

    async fn mark_verified(&self, user_id: Uuid, login_at: DateTime<Utc>) -> PortResult<AuthUser> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))?;
        user.is_verified = true;
        user.last_login = Some(login_at);
        user.verification_code = None;
        user.verification_code_expires_at = None;
        Ok(user.clone())
    }

    async fn touch_last_login(&self, user_id: Uuid, login_at: DateTime<Utc>) -> PortResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))?;
        user.last_login = Some(login_at);
        Ok(())
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))?;
        user.reset_password_token = Some(token.to_string());
        user.reset_password_expires_at = Some(expires_at);
        Ok(())
    }

    async fn find_by_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> PortResult<Option<AuthUser>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|u| {
                u.reset_password_token.as_deref() == Some(token)
                    && u.reset_password_expires_at.is_some_and(|at| at > now)
            })
            .cloned())
    }

    async fn replace_password(&self, user_id: Uuid, password_hash: &str) -> PortResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))?;
        user.password_hash = password_hash.to_string();
        user.reset_password_token = None;
        user.reset_password_expires_at = None;
        Ok(())
    }
}

//=========================================================================================
// Notes
//=========================================================================================

#[derive(Default)]
pub struct InMemoryNoteStore {
    notes: Mutex<HashMap<Uuid, Note>>,
    backrefs: Mutex<HashMap<Uuid, Vec<Uuid>>>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn insert_with_backref(&self, new_note: NewNote) -> PortResult<Note> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            owner_id: new_note.owner_id,
            title: new_note.title,
            content: new_note.content,
            category: new_note.category,
            created_at: now,
            updated_at: now,
        };
        self.notes.lock().unwrap().insert(note.id, note.clone());
        let mut backrefs = self.backrefs.lock().unwrap();
        let list = backrefs.entry(note.owner_id).or_default();
        if !list.contains(&note.id) {
            list.push(note.id);
        }
        Ok(note)
    }

    async fn find_by_id(&self, note_id: Uuid, owner_id: Uuid) -> PortResult<Option<Note>> {
        let notes = self.notes.lock().unwrap();
        Ok(notes
            .get(&note_id)
            .filter(|n| n.owner_id == owner_id)
            .cloned())
    }

    async fn find_all(&self, owner_id: Uuid) -> PortResult<Vec<Note>> {
        let notes = self.notes.lock().unwrap();
        Ok(notes
            .values()
            .filter(|n| n.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update_fields(
        &self,
        note_id: Uuid,
        owner_id: Uuid,
        patch: NotePatch,
    ) -> PortResult<Option<Note>> {
        let mut notes = self.notes.lock().unwrap();
        let Some(note) = notes.get_mut(&note_id).filter(|n| n.owner_id == owner_id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            note.title = title;
        }
        if let Some(content) = patch.content {
            note.content = content;
        }
        if let Some(category) = patch.category {
            note.category = Some(category);
        }
        note.updated_at = Utc::now();
        Ok(Some(note.clone()))
    }

    async fn delete_with_backref(
        &self,
        note_id: Uuid,
        owner_id: Uuid,
    ) -> PortResult<Option<Note>> {
        let mut notes = self.notes.lock().unwrap();
        if !notes
            .get(&note_id)
            .is_some_and(|n| n.owner_id == owner_id)
        {
            return Ok(None);
        }
        // List membership goes first, mirroring the real adapter's ordering.
        let mut backrefs = self.backrefs.lock().unwrap();
        if let Some(list) = backrefs.get_mut(&owner_id) {
            list.retain(|id| *id != note_id);
        }
        Ok(notes.remove(&note_id))
    }

    async fn note_ids(&self, owner_id: Uuid) -> PortResult<Vec<Uuid>> {
        let backrefs = self.backrefs.lock().unwrap();
        Ok(backrefs.get(&owner_id).cloned().unwrap_or_default())
    }
}

//=========================================================================================
// Vector index
//=========================================================================================

#[derive(Default)]
pub struct InMemoryVectorIndex {
    entries: Mutex<HashMap<Uuid, (Vec<f32>, Uuid)>>,
    fail_upsert: AtomicBool,
    fail_delete: AtomicBool,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_upsert(&self) {
        self.fail_upsert.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_delete(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.entries.lock().unwrap().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Corrupts an entry's owner tag, for stale/poisoned-index tests.
    pub fn retag(&self, id: Uuid, owner_id: Uuid) {
        if let Some(entry) = self.entries.lock().unwrap().get_mut(&id) {
            entry.1 = owner_id;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, record: VectorRecord) -> PortResult<()> {
        if self.fail_upsert.swap(false, Ordering::SeqCst) {
            return Err(PortError::Unexpected("index upsert refused".to_string()));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(record.id, (record.values, record.owner_id));
        Ok(())
    }

    async fn query(
        &self,
        values: &[f32],
        top_k: usize,
        owner_id: Uuid,
    ) -> PortResult<Vec<VectorMatch>> {
        let entries = self.entries.lock().unwrap();
        let mut matches: Vec<VectorMatch> = entries
            .iter()
            .filter(|(_, (_, owner))| *owner == owner_id)
            .map(|(id, (vector, _))| VectorMatch {
                id: *id,
                score: dot(values, vector),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn delete(&self, id: Uuid) -> PortResult<()> {
        if self.fail_delete.swap(false, Ordering::SeqCst) {
            return Err(PortError::Unexpected("index delete refused".to_string()));
        }
        self.entries.lock().unwrap().remove(&id);
        Ok(())
    }
}

//=========================================================================================
// Embedding provider, responder, mailer
//=========================================================================================

/// Deterministic embedder: maps text to a small vector derived from its
/// bytes, so identical text always embeds identically.
#[derive(Default)]
pub struct FakeEmbedder {
    fail: AtomicBool,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str) -> PortResult<Vec<f32>> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(PortError::Embedding("provider refused".to_string()));
        }
        let mut values = vec![0.0f32; 8];
        for (i, byte) in text.bytes().enumerate() {
            values[i % 8] += f32::from(byte) / 255.0;
        }
        Ok(values)
    }
}

pub struct CannedResponder {
    answer: Mutex<String>,
    last_prompt: Mutex<Option<String>>,
}

impl CannedResponder {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: Mutex::new(answer.to_string()),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn set_answer(&self, answer: &str) {
        *self.answer.lock().unwrap() = answer.to_string();
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl Responder for CannedResponder {
    async fn generate(&self, prompt: &str) -> PortResult<String> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        Ok(self.answer.lock().unwrap().clone())
    }
}

pub struct RecordingMailer {
    ok: AtomicBool,
    sent: Mutex<Vec<Mail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            ok: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_sends(&self) {
        self.ok.store(false, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: Mail) -> bool {
        if !self.ok.load(Ordering::SeqCst) {
            return false;
        }
        self.sent.lock().unwrap().push(mail);
        true
    }
}
