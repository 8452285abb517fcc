// POST /login - validate credentials and hand out a token pair

use axum::Json;
use serde_json::{json, Value};

use crate::auth::generate_token_pair;
use crate::auth::password::verify_password;
use crate::database::manager::DatabaseManager;
use crate::database::models::user::{LoginPayload, User, UserResponse};
use crate::database::repository::Repository;
use crate::error::ApiError;

pub async fn login(Json(payload): Json<LoginPayload>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    // Same message for unknown user and wrong password
    let user = Repository::<User>::new("users", pool.clone())
        .select_one(crate::filter::FilterData {
            where_clause: Some(json!({ "username": payload.username })),
            ..Default::default()
        })
        .await?
        .ok_or_else(|| ApiError::unauthorized("Credenciales incorrectas"))?;

    let valid = verify_password(&payload.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::unauthorized("Credenciales incorrectas"));
    }

    sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await?;

    let tokens = generate_token_pair(&user)?;
    tracing::info!("User {} logged in", user.username);

    Ok(Json(json!({
        "refresh": tokens.refresh,
        "access": tokens.access,
        "user": UserResponse::from(&user),
    })))
}
