// POST /register - create an account and hand out a token pair

use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::generate_token_pair;
use crate::auth::password::{hash_password, validate_password_strength};
use crate::database::manager::DatabaseManager;
use crate::database::models::user::{
    validate_email, validate_username, RegisterPayload, User, UserResponse,
};
use crate::database::repository::Repository;
use crate::error::ApiError;

pub async fn register(
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let pool = DatabaseManager::pool().await?;

    validate_username(&payload.username)
        .and_then(|_| validate_email(&payload.email))
        .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;
    let min_len = crate::config::config().security.min_password_length;
    validate_password_strength(&payload.password, min_len)
        .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;

    let duplicate = Repository::<User>::new("users", pool.clone())
        .exists(json!({ "username": &payload.username }))
        .await?;
    if duplicate {
        return Err(ApiError::conflict("El usuario ya existe"));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&password_hash)
    .fetch_one(&pool)
    .await?;

    let tokens = generate_token_pair(&user)?;
    tracing::info!("Registered user {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": UserResponse::from(&user),
            "refresh": tokens.refresh,
            "access": tokens.access,
        })),
    ))
}
