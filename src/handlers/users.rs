//! Handlers for the `/usuarios` resource (staff only).

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::password::{hash_password, validate_password_strength};
use crate::database::manager::DatabaseManager;
use crate::database::models::user::{
    validate_email, validate_username, User, UserDetailResponse, UserPatch, UserPayload,
};
use crate::database::repository::Repository;
use crate::error::ApiError;
use crate::handlers::params::{filter_data, translate_ordering, WhereBuilder};

const ORDER_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("username", "username"),
    ("email", "email"),
    ("is_staff", "is_staff"),
    ("date_joined", "date_joined"),
    ("last_login", "last_login"),
];

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub username: Option<String>,
    pub email: Option<String>,
    pub ordering: Option<String>,
}

/// GET /usuarios
pub async fn list(
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserDetailResponse>>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let where_clause = WhereBuilder::new()
        .contains("username", query.username.as_deref())
        .contains("email", query.email.as_deref())
        .into_where();
    let order = translate_ordering(query.ordering.as_deref(), ORDER_FIELDS)?;

    let rows = Repository::<User>::new("users", pool)
        .select_any(filter_data(where_clause, order))
        .await?;

    Ok(Json(rows.into_iter().map(UserDetailResponse::from).collect()))
}

/// GET /usuarios/:id
pub async fn retrieve(Path(id): Path<i32>) -> Result<Json<UserDetailResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let row = Repository::<User>::new("users", pool)
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("El usuario no existe"))?;
    Ok(Json(UserDetailResponse::from(row)))
}

/// POST /usuarios - staff-created account
pub async fn create(
    Json(payload): Json<UserPayload>,
) -> Result<(StatusCode, Json<UserDetailResponse>), ApiError> {
    let pool = DatabaseManager::pool().await?;

    validate_username(&payload.username)
        .and_then(|_| validate_email(&payload.email))
        .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;

    let password = payload
        .password
        .as_deref()
        .ok_or_else(|| ApiError::validation_error("Datos inválidos", Some(json!("password es obligatorio"))))?;
    let min_len = crate::config::config().security.min_password_length;
    validate_password_strength(password, min_len)
        .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;

    let duplicate = Repository::<User>::new("users", pool.clone())
        .exists(json!({ "username": &payload.username }))
        .await?;
    if duplicate {
        return Err(ApiError::conflict("El usuario ya existe"));
    }

    let password_hash = hash_password(password)?;
    let row = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email, password_hash, is_staff, first_name, last_name) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(payload.is_staff)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(UserDetailResponse::from(row))))
}

/// PUT /usuarios/:id - full update; password changes only when provided
pub async fn update(
    Path(id): Path<i32>,
    Json(payload): Json<UserPayload>,
) -> Result<Json<UserDetailResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let existing = Repository::<User>::new("users", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("El usuario no existe"))?;

    validate_username(&payload.username)
        .and_then(|_| validate_email(&payload.email))
        .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;

    // Renaming onto an existing username is a conflict
    if payload.username != existing.username {
        let taken = Repository::<User>::new("users", pool.clone())
            .exists(json!({ "username": &payload.username }))
            .await?;
        if taken {
            return Err(ApiError::conflict("El usuario ya existe"));
        }
    }

    let password_hash = match payload.password.as_deref() {
        Some(password) => {
            let min_len = crate::config::config().security.min_password_length;
            validate_password_strength(password, min_len)
                .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;
            hash_password(password)?
        }
        None => existing.password_hash,
    };

    let row = sqlx::query_as::<_, User>(
        "UPDATE users SET username = $1, email = $2, password_hash = $3, is_staff = $4, \
         first_name = $5, last_name = $6 WHERE id = $7 RETURNING *",
    )
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(payload.is_staff)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(UserDetailResponse::from(row)))
}

/// PATCH /usuarios/:id
pub async fn partial_update(
    Path(id): Path<i32>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<UserDetailResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let mut row = Repository::<User>::new("users", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("El usuario no existe"))?;

    if let Some(v) = patch.username {
        validate_username(&v)
            .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;
        if v != row.username {
            let taken = Repository::<User>::new("users", pool.clone())
                .exists(json!({ "username": &v }))
                .await?;
            if taken {
                return Err(ApiError::conflict("El usuario ya existe"));
            }
        }
        row.username = v;
    }
    if let Some(v) = patch.email {
        validate_email(&v).map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;
        row.email = v;
    }
    if let Some(password) = patch.password.as_deref() {
        let min_len = crate::config::config().security.min_password_length;
        validate_password_strength(password, min_len)
            .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;
        row.password_hash = hash_password(password)?;
    }
    if let Some(v) = patch.is_staff {
        row.is_staff = v;
    }
    if let Some(v) = patch.first_name {
        row.first_name = Some(v);
    }
    if let Some(v) = patch.last_name {
        row.last_name = Some(v);
    }

    let row = sqlx::query_as::<_, User>(
        "UPDATE users SET username = $1, email = $2, password_hash = $3, is_staff = $4, \
         first_name = $5, last_name = $6 WHERE id = $7 RETURNING *",
    )
    .bind(&row.username)
    .bind(&row.email)
    .bind(&row.password_hash)
    .bind(row.is_staff)
    .bind(&row.first_name)
    .bind(&row.last_name)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(UserDetailResponse::from(row)))
}

/// DELETE /usuarios/:id
pub async fn destroy(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    Repository::<User>::new("users", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("El usuario no existe"))?;

    sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&pool).await?;

    Ok(Json(json!({ "message": format!("Usuario con ID {} eliminado correctamente", id) })))
}
