//! Password reset token model.
//!
//! Only the SHA-256 hash of a reset token is stored; the plaintext goes to
//! the user once and is never persisted.

use bugspot_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `password_reset_tokens` table.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub id: DbId,
    pub user_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub used: bool,
    pub created_at: Timestamp,
}
