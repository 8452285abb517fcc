//! Handlers for the `/mascotas` resource.

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::models::pet::{Pet, PetPatch, PetPayload, PetResponse};
use crate::database::models::photo::{Photo, PhotoOwner};
use crate::database::repository::Repository;
use crate::error::ApiError;
use crate::handlers::params::{filter_data, translate_ordering, WhereBuilder};

const ORDER_FIELDS: &[(&str, &str)] =
    &[("Id", "id"), ("Nombre", "nombre"), ("Tipo", "tipo")];

#[derive(Debug, Deserialize)]
pub struct PetListQuery {
    pub nombre: Option<String>,
    pub tipo: Option<String>,
    pub ordering: Option<String>,
}

/// GET /mascotas
pub async fn list(Query(query): Query<PetListQuery>) -> Result<Json<Vec<PetResponse>>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let where_clause = WhereBuilder::new()
        .contains("nombre", query.nombre.as_deref())
        .contains("tipo", query.tipo.as_deref())
        .into_where();
    let order = translate_ordering(query.ordering.as_deref(), ORDER_FIELDS)?;

    let rows = Repository::<Pet>::new("pets", pool.clone())
        .select_any(filter_data(where_clause, order))
        .await?;

    let ids: Vec<i32> = rows.iter().map(|p| p.id).collect();
    let photos = Photo::map_for(&pool, PhotoOwner::Pet, &ids).await?;

    let out = rows
        .into_iter()
        .map(|row| {
            let foto = photos.get(&row.id).and_then(|urls| urls.first().cloned());
            PetResponse::from_row(row, foto)
        })
        .collect();
    Ok(Json(out))
}

/// GET /mascotas/:id
pub async fn retrieve(Path(id): Path<i32>) -> Result<Json<PetResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let row = Repository::<Pet>::new("pets", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("La mascota no existe"))?;
    let foto = Photo::urls_for(&pool, PhotoOwner::Pet, id).await?.into_iter().next();
    Ok(Json(PetResponse::from_row(row, foto)))
}

/// POST /mascotas - duplicate-checked create
pub async fn create(
    Json(payload): Json<PetPayload>,
) -> Result<(StatusCode, Json<PetResponse>), ApiError> {
    let pool = DatabaseManager::pool().await?;
    payload
        .validate()
        .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;

    let duplicate = Repository::<Pet>::new("pets", pool.clone())
        .exists(json!({ "nombre": &payload.nombre, "tipo": &payload.tipo }))
        .await?;
    if duplicate {
        return Err(ApiError::conflict("Esta mascota ya existe"));
    }

    let row = sqlx::query_as::<_, Pet>(
        "INSERT INTO pets (nombre, tipo) VALUES ($1, $2) RETURNING *",
    )
    .bind(&payload.nombre)
    .bind(&payload.tipo)
    .fetch_one(&pool)
    .await?;

    let urls: Vec<String> = payload.foto.clone().into_iter().collect();
    Photo::replace_for(&pool, PhotoOwner::Pet, row.id, &urls).await?;

    Ok((StatusCode::CREATED, Json(PetResponse::from_row(row, payload.foto))))
}

/// PUT /mascotas/:id
pub async fn update(
    Path(id): Path<i32>,
    Json(payload): Json<PetPayload>,
) -> Result<Json<PetResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    payload
        .validate()
        .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;

    Repository::<Pet>::new("pets", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("La mascota no existe"))?;

    let row = sqlx::query_as::<_, Pet>(
        "UPDATE pets SET nombre = $1, tipo = $2 WHERE id = $3 RETURNING *",
    )
    .bind(&payload.nombre)
    .bind(&payload.tipo)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    let urls: Vec<String> = payload.foto.clone().into_iter().collect();
    Photo::replace_for(&pool, PhotoOwner::Pet, id, &urls).await?;

    Ok(Json(PetResponse::from_row(row, payload.foto)))
}

/// PATCH /mascotas/:id
pub async fn partial_update(
    Path(id): Path<i32>,
    Json(patch): Json<PetPatch>,
) -> Result<Json<PetResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let mut row = Repository::<Pet>::new("pets", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("La mascota no existe"))?;

    if let Some(v) = patch.nombre {
        row.nombre = v;
    }
    if let Some(v) = patch.tipo {
        row.tipo = v;
    }

    let row = sqlx::query_as::<_, Pet>(
        "UPDATE pets SET nombre = $1, tipo = $2 WHERE id = $3 RETURNING *",
    )
    .bind(&row.nombre)
    .bind(&row.tipo)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    if let Some(url) = patch.foto {
        Photo::replace_for(&pool, PhotoOwner::Pet, id, &[url]).await?;
    }

    let foto = Photo::urls_for(&pool, PhotoOwner::Pet, id).await?.into_iter().next();
    Ok(Json(PetResponse::from_row(row, foto)))
}

/// DELETE /mascotas/:id - referencing characters fall back to NULL
pub async fn destroy(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    Repository::<Pet>::new("pets", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("La mascota no existe"))?;

    sqlx::query("DELETE FROM pets WHERE id = $1").bind(id).execute(&pool).await?;

    Ok(Json(json!({ "message": format!("Mascota con ID {} eliminado correctamente", id) })))
}
