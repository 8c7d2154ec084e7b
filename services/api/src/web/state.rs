//! services/api/src/web/state.rs
//!
//! Defines the application's shared state: the three core flows with their
//! port implementations injected, plus the loaded configuration. Built once
//! in the binary and cloned into every handler.

use std::sync::Arc;

use crate::config::Config;
use notes_core::auth::AuthFlow;
use notes_core::chat::ChatFlow;
use notes_core::notes::NoteFlow;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthFlow,
    pub notes: NoteFlow,
    pub chat: ChatFlow,
    pub config: Arc<Config>,
}
