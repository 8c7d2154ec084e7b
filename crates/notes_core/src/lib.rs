pub mod auth;
pub mod chat;
pub mod domain;
pub mod notes;
pub mod password;
pub mod ports;
pub mod templates;

#[cfg(test)]
mod test_support;

pub use domain::{
    AuthUser, Mail, NewNote, NewUser, Note, NoteCategory, NotePatch, User, VectorMatch,
    VectorRecord,
};
pub use ports::{
    EmbeddingProvider, Mailer, NoteStore, PortError, PortResult, Responder, UserStore, VectorIndex,
};
