//! User account model and DTOs.

use bugspot_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
///
/// **Note:** `password_hash` is never serialized to responses.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub api_key: String,
    pub plan: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new user account.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Already normalized (lowercased, trimmed) by the caller.
    pub email: String,
    /// Argon2id PHC string, never a plaintext password.
    pub password_hash: String,
    pub api_key: String,
}
