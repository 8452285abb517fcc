// POST /token/refresh - rotate a refresh token into a new pair

use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{decode_token, denylist, generate_token_pair, TokenKind};
use crate::database::manager::DatabaseManager;
use crate::database::models::user::User;
use crate::database::repository::Repository;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RefreshPayload {
    pub refresh: String,
}

pub async fn refresh(Json(payload): Json<RefreshPayload>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let claims = decode_token(&payload.refresh, TokenKind::Refresh)
        .map_err(|_| ApiError::unauthorized("Token inválido o ya expirado"))?;
    if denylist::is_revoked(&pool, &payload.refresh).await? {
        return Err(ApiError::unauthorized("Token inválido o ya expirado"));
    }

    // The account may have been deleted since the token was issued
    let user = Repository::<User>::new("users", pool.clone())
        .select_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Token inválido o ya expirado"))?;

    // Rotation: the presented token is spent, a fresh pair replaces it
    denylist::revoke(&pool, &payload.refresh).await?;
    let tokens = generate_token_pair(&user)?;

    Ok(Json(json!({
        "access": tokens.access,
        "refresh": tokens.refresh,
    })))
}
