//! Axum route handlers for registration and sign-in.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::jwt::generate_token;
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::auth::users::{find_by_email, find_by_id, insert_user, is_unique_violation};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::JsonBody;
use crate::models::user::{PublicUser, Role};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub user: PublicUser,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Validated registration input.
#[derive(Debug, PartialEq)]
struct NewUser {
    email: String,
    password: String,
    name: Option<String>,
    role: Role,
}

fn validate_registration(request: RegisterRequest) -> Result<NewUser, AppError> {
    let email = normalize_email(request.email.as_deref());
    let password = request.password.unwrap_or_default();

    if email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Email and password required".to_string(),
        ));
    }
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    validate_password_strength(&password).map_err(AppError::Validation)?;

    let role = match request.role.as_deref().map(str::trim) {
        None | Some("") => Role::JobSeeker,
        Some(r) => r.parse::<Role>().map_err(AppError::Validation)?,
    };

    let name = request
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    Ok(NewUser {
        email,
        password,
        name,
        role,
    })
}

fn normalize_email(email: Option<&str>) -> String {
    email.unwrap_or_default().trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let new_user = validate_registration(request)?;

    if find_by_email(&state.db, &new_user.email).await?.is_some() {
        return Err(AppError::Validation("User already exists".to_string()));
    }

    let password = new_user.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?;

    let user = insert_user(
        &state.db,
        &new_user.email,
        &password_hash,
        new_user.name.as_deref(),
        new_user.role,
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Validation("User already exists".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    info!(user_id = %user.id, role = %user.role, "registered user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/login
///
/// Verifies email + password and issues a session token.
pub async fn handle_login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = normalize_email(request.email.as_deref());
    let password = request.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Email and password required".to_string(),
        ));
    }

    let user = find_by_email(&state.db, &email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let stored_hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("stored hash unreadable: {e}")))?;
    if !valid {
        return Err(AppError::Unauthorized);
    }

    let role = user
        .role
        .parse::<Role>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    let token = generate_token(user.id, &user.email, role, &state.jwt)
        .map_err(|e| AppError::Internal(e.into()))?;

    info!(user_id = %user.id, "user signed in");

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(user.into()))
}
