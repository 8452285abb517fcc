// POST /logout - denylist the presented refresh token

use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{decode_token, denylist, TokenKind};
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LogoutPayload {
    pub refresh: String,
}

pub async fn logout(Json(payload): Json<LogoutPayload>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    // An unparseable, expired or already-revoked token is a client error
    decode_token(&payload.refresh, TokenKind::Refresh)
        .map_err(|_| ApiError::bad_request("Token inválido o ya expirado"))?;
    if denylist::is_revoked(&pool, &payload.refresh).await? {
        return Err(ApiError::bad_request("Token inválido o ya expirado"));
    }

    denylist::revoke(&pool, &payload.refresh).await?;

    Ok(Json(json!({ "message": "Sesión cerrada correctamente" })))
}
