//! services/api/src/web/response.rs
//!
//! The JSON success envelope shared by all handlers. Errors use the
//! counterpart envelope in [`crate::error`].

use serde::Serialize;

/// `{ "success": true, "message": ..., "data": ... }`
#[derive(Debug, Serialize)]
pub struct SuccessBody<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> SuccessBody<T> {
    pub fn new(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data,
        }
    }
}
