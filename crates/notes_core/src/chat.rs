//! crates/notes_core/src/chat.rs
//!
//! The retrieval-augmented chat flow: embed the question, find the closest
//! note in the vector index restricted to the asking user, ground a prompt in
//! that note, and hand it to the generative responder. Read-only; the only
//! side effects are the external provider calls.

use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::domain::Note;
use crate::ports::{EmbeddingProvider, NoteStore, PortError, PortResult, Responder, VectorIndex};

// Single-pass substitution: note text containing literal brace markers must
// never capture another field's value.
fn answer_prompt(title: &str, content: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant answering a question using one of the user's own notes. \
         Answer naturally and concisely, using only the note below. If the note does not \
         contain the answer, say so.\n\n\
         NOTE TITLE: {title}\n\
         NOTE CONTENT: {content}\n\n\
         QUESTION: {question}"
    )
}

/// Answers free-text questions grounded in the asking user's notes.
#[derive(Clone)]
pub struct ChatFlow {
    notes: Arc<dyn NoteStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    responder: Arc<dyn Responder>,
}

impl ChatFlow {
    pub fn new(
        notes: Arc<dyn NoteStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        responder: Arc<dyn Responder>,
    ) -> Self {
        Self {
            notes,
            embedder,
            index,
            responder,
        }
    }

    pub async fn answer(&self, owner_id: Uuid, message: &str) -> PortResult<String> {
        // Questions are embedded the same way notes are, with a synthetic
        // title in place of a real one.
        let embedding = self
            .embedder
            .embed(&Note::embedding_text("Question", message))
            .await?;

        let matches = self.index.query(&embedding, 1, owner_id).await?;
        let best = matches
            .into_iter()
            .next()
            .ok_or_else(|| PortError::NotFound("No relevant notes found".to_string()))?;

        // Resolve the match back through the store, filtered by owner again.
        // A stale index can point at a deleted note or, worse, a foreign one;
        // neither must ever reach the prompt.
        let note = match self.notes.find_by_id(best.id, owner_id).await? {
            Some(note) => note,
            None => {
                error!(
                    target: "reconciliation",
                    note_id = %best.id,
                    "vector index returned an id that does not resolve for this owner"
                );
                return Err(PortError::NotFound("No relevant notes found".to_string()));
            }
        };

        let prompt = answer_prompt(&note.title, &note.content, message);

        let answer = self.responder.generate(&prompt).await?;
        if answer.trim().is_empty() {
            return Err(PortError::Unexpected(
                "Responder returned no usable text".to_string(),
            ));
        }
        Ok(answer)
    }
}
