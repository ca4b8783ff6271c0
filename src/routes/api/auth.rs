use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Extension;
use serde::{Deserialize, Serialize};

use crate::auth::{CurrentUser, create_session, hash_password, verify_password};
use crate::error::AppError;
use crate::models::user::User;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username = input.username.trim();
    let email = input.email.trim();
    if username.is_empty() || email.is_empty() {
        return Err(AppError::BadRequest(
            "Username and email are required".to_string(),
        ));
    }
    if input.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if User::find_by_email(&state.pool, email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".to_string()));
    }
    if User::find_by_username(&state.pool, username).await?.is_some() {
        return Err(AppError::BadRequest("Username already taken".to_string()));
    }

    let user = User::create(&state.pool, username, email, &hash_password(&input.password)).await?;
    let token = create_session(&state.pool, user.id, state.session_ttl_hours).await?;
    tracing::info!("Registered user '{}'", user.username);

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            access_token: token,
            token_type: "bearer".to_string(),
            user: user.into(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = User::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !verify_password(&input.password, &user.password_hash) {
        return Err(AppError::Unauthorized);
    }

    let token = create_session(&state.pool, user.id, state.session_ttl_hours).await?;
    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: user.into(),
    }))
}

pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<CurrentUser> {
    Json(user)
}
