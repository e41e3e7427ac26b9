//! API route handlers

pub mod chat;
pub mod health;

use crate::error::ServerError;

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
