//! crates/notes_core/src/notes.rs
//!
//! The note transaction coordinator. Creating, updating, and deleting a note
//! must keep three things in lockstep: the note row, the owner's note-id
//! list, and the entry in the external vector index. The store side (row +
//! list) is covered by one transactional scope inside the [`NoteStore`]
//! adapter; the vector index sits outside that scope, so this coordinator
//! runs it as a compensating-action sequence and reports any drift on the
//! `reconciliation` tracing target instead of swallowing it.

use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::domain::{NewNote, Note, NotePatch, VectorRecord};
use crate::ports::{EmbeddingProvider, NoteStore, PortError, PortResult, VectorIndex};

/// Orchestrates note writes across the note store and the vector index.
#[derive(Clone)]
pub struct NoteFlow {
    notes: Arc<dyn NoteStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl NoteFlow {
    pub fn new(
        notes: Arc<dyn NoteStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            notes,
            embedder,
            index,
        }
    }

    /// Creates a note. The embedding is computed first so that a provider
    /// failure aborts before any store is touched. If the vector upsert fails
    /// after the store transaction committed, the store side is compensated
    /// by deleting the freshly created note again.
    pub async fn create_note(&self, new_note: NewNote) -> PortResult<Note> {
        let text = Note::embedding_text(&new_note.title, &new_note.content);
        let embedding = self.embedder.embed(&text).await?;

        let owner_id = new_note.owner_id;
        let note = self.notes.insert_with_backref(new_note).await?;

        let upsert = self
            .index
            .upsert(VectorRecord {
                id: note.id,
                values: embedding,
                owner_id,
            })
            .await;

        if let Err(e) = upsert {
            match self.notes.delete_with_backref(note.id, owner_id).await {
                Ok(_) => {
                    error!(
                        target: "reconciliation",
                        note_id = %note.id,
                        "vector upsert failed on create, store write compensated: {}", e
                    );
                }
                Err(comp) => {
                    error!(
                        target: "reconciliation",
                        note_id = %note.id,
                        "vector upsert failed on create AND compensation failed, \
                         note has no index entry: upsert: {}; compensation: {}",
                        e, comp
                    );
                }
            }
            return Err(PortError::Unexpected("Error creating note".to_string()));
        }

        Ok(note)
    }

    /// Returns the note only if it exists and belongs to `owner_id`. This
    /// ownership filter is the sole access-control boundary for notes.
    pub async fn fetch_note_by_id(&self, note_id: Uuid, owner_id: Uuid) -> PortResult<Note> {
        self.notes
            .find_by_id(note_id, owner_id)
            .await?
            .ok_or_else(|| PortError::NotFound("Note not found".to_string()))
    }

    /// All of the owner's notes, in store-native order.
    pub async fn fetch_all_notes(&self, owner_id: Uuid) -> PortResult<Vec<Note>> {
        self.notes.find_all(owner_id).await
    }

    /// Applies a partial update and refreshes the vector index with the
    /// merged title/content. The store update commits first; if the index
    /// upsert then fails, the stale embedding is reported for reconciliation
    /// (the store remains the source of truth and the next write repairs it).
    pub async fn update_note(
        &self,
        note_id: Uuid,
        owner_id: Uuid,
        patch: NotePatch,
    ) -> PortResult<Note> {
        let existing = self
            .notes
            .find_by_id(note_id, owner_id)
            .await?
            .ok_or_else(|| PortError::NotFound("Note not found".to_string()))?;

        let title = patch.title.clone().unwrap_or(existing.title);
        let content = patch.content.clone().unwrap_or(existing.content);
        let embedding = self
            .embedder
            .embed(&Note::embedding_text(&title, &content))
            .await?;

        let updated = self
            .notes
            .update_fields(note_id, owner_id, patch)
            .await?
            .ok_or_else(|| PortError::NotFound("Note not found".to_string()))?;

        if let Err(e) = self
            .index
            .upsert(VectorRecord {
                id: updated.id,
                values: embedding,
                owner_id,
            })
            .await
        {
            error!(
                target: "reconciliation",
                note_id = %updated.id,
                "vector upsert failed on update, index embedding is stale: {}", e
            );
        }

        Ok(updated)
    }

    /// Deletes a note. Inside the store transaction the list membership goes
    /// first, then the row. The index entry is removed afterwards; if that
    /// fails the dangling entry is reported for reconciliation and is
    /// otherwise harmless, because the chat flow re-checks every match
    /// against the store.
    pub async fn delete_note(&self, note_id: Uuid, owner_id: Uuid) -> PortResult<Note> {
        let deleted = self
            .notes
            .delete_with_backref(note_id, owner_id)
            .await?
            .ok_or_else(|| PortError::NotFound("Note not found".to_string()))?;

        if let Err(e) = self.index.delete(deleted.id).await {
            error!(
                target: "reconciliation",
                note_id = %deleted.id,
                "vector delete failed, index entry is dangling: {}", e
            );
        }

        Ok(deleted)
    }
}
