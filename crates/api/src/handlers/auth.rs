//! Handlers for the `/auth` resource (register, login, profile, password
//! reset).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use bugspot_core::api_keys::generate_api_key;
use bugspot_core::error::CoreError;
use bugspot_core::types::DbId;
use bugspot_db::models::project::{CreateProject, DEFAULT_PROJECT_NAME};
use bugspot_db::models::user::{CreateUser, User};
use bugspot_db::store::Datastore as _;

use crate::auth::jwt::{generate_reset_token, generate_token, hash_reset_token};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Reset tokens expire after one hour.
const RESET_TOKEN_EXPIRY_MINS: i64 = 60;

/// Constant response for password reset requests, regardless of whether
/// the account exists (prevents email enumeration).
const RESET_REQUESTED_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register` and `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/forgot-password`.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for `POST /auth/reset-password`.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Successful authentication response returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserInfo,
}

/// Public user info embedded in [`AuthResponse`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: DbId,
    pub email: String,
    pub api_key: String,
    pub plan: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            api_key: user.api_key.clone(),
            plan: user.plan.clone(),
        }
    }
}

/// Simple `{ "message": ... }` response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/register
///
/// Create an account with a personal API key and a default project, and
/// issue a JWT.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<CredentialsRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    if input.email.trim().is_empty() || input.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".into(),
        ));
    }

    // Normalize email for consistent storage and lookup.
    let email = input.email.trim().to_lowercase();

    if !email.validate_email() {
        return Err(AppError::BadRequest("Invalid email format".into()));
    }
    validate_password_strength(&input.password).map_err(AppError::BadRequest)?;

    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "User already exists".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = state
        .store
        .create_user(&CreateUser {
            email,
            password_hash,
            api_key: generate_api_key(),
        })
        .await?;

    // Every account starts with a default project the widget can target.
    state
        .store
        .create_project(&CreateProject {
            user_id: user.id,
            name: DEFAULT_PROJECT_NAME.to_string(),
            api_key: generate_api_key(),
        })
        .await?;

    let token = generate_token(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully",
            token,
            user: UserInfo::from(&user),
        }),
    ))
}

/// POST /api/auth/login
///
/// Authenticate with email + password. Returns a JWT and user info.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<CredentialsRequest>,
) -> AppResult<Json<AuthResponse>> {
    if input.email.trim().is_empty() || input.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".into(),
        ));
    }

    let email = input.email.trim().to_lowercase();

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Invalid credentials".into())))?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid credentials".into(),
        )));
    }

    let token = generate_token(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(Json(AuthResponse {
        message: "Login successful",
        token,
        user: UserInfo::from(&user),
    }))
}

/// GET /api/auth/profile
///
/// The authenticated user's account record.
pub async fn profile(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<User>> {
    let user = state
        .store
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    Ok(Json(user))
}

/// POST /api/auth/forgot-password
///
/// Store a hashed single-use reset token. Always answers with the same
/// message so account existence cannot be probed.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    if input.email.trim().is_empty() {
        return Err(AppError::BadRequest("Email is required".into()));
    }

    let email = input.email.trim().to_lowercase();

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        tracing::info!("Password reset requested for unknown email");
        return Ok(Json(MessageResponse {
            message: RESET_REQUESTED_MESSAGE,
        }));
    };

    let (plaintext, token_hash) = generate_reset_token();
    let expires_at = Utc::now() + chrono::Duration::minutes(RESET_TOKEN_EXPIRY_MINS);

    state
        .store
        .replace_reset_token(user.id, &token_hash, expires_at)
        .await?;

    // Email delivery is out of scope; the reset URL is logged for the
    // operator instead.
    let reset_url = format!(
        "{}/#/reset-password?token={plaintext}",
        state.config.app_url
    );
    tracing::info!(user_id = user.id, %reset_url, %expires_at, "Password reset requested");

    Ok(Json(MessageResponse {
        message: RESET_REQUESTED_MESSAGE,
    }))
}

/// POST /api/auth/reset-password
///
/// Exchange a valid reset token for a new password. Tokens are single-use
/// and expire after an hour.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    if input.token.is_empty() || input.password.is_empty() {
        return Err(AppError::BadRequest(
            "Token and new password are required".into(),
        ));
    }
    validate_password_strength(&input.password).map_err(AppError::BadRequest)?;

    let token_hash = hash_reset_token(&input.token);

    let token = state
        .store
        .find_reset_token(&token_hash)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".into()))?;

    if token.expires_at < Utc::now() {
        return Err(AppError::BadRequest("Reset token has expired".into()));
    }
    if token.used {
        return Err(AppError::BadRequest(
            "Reset token has already been used".into(),
        ));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    state
        .store
        .update_user_password(token.user_id, &password_hash)
        .await?;

    // The password is already changed at this point, so a failure here is
    // logged for monitoring rather than failing the request.
    if let Err(e) = state.store.mark_reset_token_used(token.id).await {
        tracing::error!(
            token_id = token.id,
            user_id = token.user_id,
            error = %e,
            "Failed to mark reset token as used",
        );
    }

    tracing::info!(user_id = token.user_id, "Password reset successful");

    Ok(Json(MessageResponse {
        message: "Password has been reset successfully. You can now log in with your new password.",
    }))
}
