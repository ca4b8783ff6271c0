use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::error::AppError;
use crate::state::AppState;

/// The authenticated user attached to the request by `require_session`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
}

/// Hash a raw session token for storage/lookup.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a new random session token.
pub fn generate_token() -> String {
    use rand::Rng;
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

fn digest_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Salted hash for password storage, formatted as `salt:digest`.
pub fn hash_password(password: &str) -> String {
    use rand::Rng;
    let salt: [u8; 16] = rand::rng().random();
    let salt_hex = hex::encode(salt);
    let digest = digest_password(&salt_hex, password);
    format!("{salt_hex}:{digest}")
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, digest)) = stored.split_once(':') else {
        return false;
    };
    digest_password(salt, password) == digest
}

/// Open a session for a user and return the raw bearer token. Only the
/// hash is stored.
pub async fn create_session(
    pool: &PgPool,
    user_id: i32,
    ttl_hours: i64,
) -> Result<String, AppError> {
    let token = generate_token();
    let token_hash = hash_token(&token);
    let expires_at = Utc::now() + Duration::hours(ttl_hours);
    sqlx::query("INSERT INTO sessions (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(token)
}

/// Middleware that resolves a Bearer token to a live session and
/// attaches the user to the request.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let token_hash = hash_token(token);

    let user = sqlx::query_as::<_, CurrentUser>(
        "SELECT u.id, u.username, u.email, u.role
         FROM sessions s JOIN users u ON u.id = s.user_id
         WHERE s.token_hash = $1 AND s.expires_at > NOW()",
    )
    .bind(&token_hash)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    // Update last_used timestamp (fire and forget)
    let pool = state.pool.clone();
    let hash = token_hash.clone();
    tokio::spawn(async move {
        let _ = sqlx::query("UPDATE sessions SET last_used = NOW() WHERE token_hash = $1")
            .bind(&hash)
            .execute(&pool)
            .await;
    });

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Middleware gating a route on the admin role. Must run after
/// `require_session`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::Unauthorized)?;
    if user.role != "admin" {
        return Err(AppError::Forbidden);
    }
    Ok(next.run(request).await)
}
