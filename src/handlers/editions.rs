//! Handlers for the `/ediciones` resource.

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::models::edition::{
    validate_generation, Edition, EditionPatch, EditionPayload, EditionResponse,
};
use crate::database::models::photo::{Photo, PhotoOwner};
use crate::database::repository::Repository;
use crate::error::ApiError;
use crate::handlers::params::{filter_data, parse_int_param, translate_ordering, WhereBuilder};

const ORDER_FIELDS: &[(&str, &str)] = &[
    ("Id", "id"),
    ("Serie", "serie"),
    ("FechaDeLanzamiento", "fecha_de_lanzamiento"),
    ("TipoDeGeneracion", "tipo_de_generacion"),
];

#[derive(Debug, Deserialize)]
pub struct EditionListQuery {
    pub serie: Option<String>,
    pub lanzamiento: Option<String>,
    pub generacion: Option<String>,
    pub ordering: Option<String>,
}

/// GET /ediciones
pub async fn list(
    Query(query): Query<EditionListQuery>,
) -> Result<Json<Vec<EditionResponse>>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let generacion = match &query.generacion {
        Some(raw) => {
            Some(parse_int_param(raw, "El parámetro 'generacion' debe ser un número")?)
        }
        None => None,
    };

    let where_clause = WhereBuilder::new()
        .contains("serie", query.serie.as_deref())
        .contains("fecha_de_lanzamiento", query.lanzamiento.as_deref())
        .eq("tipo_de_generacion", generacion.map(Value::from))
        .into_where();
    let order = translate_ordering(query.ordering.as_deref(), ORDER_FIELDS)?;

    let rows = Repository::<Edition>::new("editions", pool.clone())
        .select_any(filter_data(where_clause, order))
        .await?;

    let ids: Vec<i32> = rows.iter().map(|e| e.id).collect();
    let mut photos = Photo::map_for(&pool, PhotoOwner::Edition, &ids).await?;

    let out = rows
        .into_iter()
        .map(|row| {
            let foto = photos.remove(&row.id).unwrap_or_default();
            EditionResponse::from_row(row, foto)
        })
        .collect();
    Ok(Json(out))
}

/// GET /ediciones/:id
pub async fn retrieve(Path(id): Path<i32>) -> Result<Json<EditionResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let row = Repository::<Edition>::new("editions", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("La edición introducida no existe"))?;
    let foto = Photo::urls_for(&pool, PhotoOwner::Edition, id).await?;
    Ok(Json(EditionResponse::from_row(row, foto)))
}

/// POST /ediciones
pub async fn create(
    Json(payload): Json<EditionPayload>,
) -> Result<(StatusCode, Json<EditionResponse>), ApiError> {
    let pool = DatabaseManager::pool().await?;
    payload
        .validate()
        .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;

    let row = sqlx::query_as::<_, Edition>(
        "INSERT INTO editions (serie, fecha_de_lanzamiento, tipo_de_generacion) \
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&payload.serie)
    .bind(&payload.fecha_de_lanzamiento)
    .bind(payload.tipo_de_generacion)
    .fetch_one(&pool)
    .await?;

    Photo::replace_for(&pool, PhotoOwner::Edition, row.id, &payload.foto).await?;
    let foto = Photo::urls_for(&pool, PhotoOwner::Edition, row.id).await?;

    Ok((StatusCode::CREATED, Json(EditionResponse::from_row(row, foto))))
}

/// PUT /ediciones/:id
pub async fn update(
    Path(id): Path<i32>,
    Json(payload): Json<EditionPayload>,
) -> Result<Json<EditionResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    payload
        .validate()
        .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;

    Repository::<Edition>::new("editions", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("La edición introducida no existe"))?;

    let row = sqlx::query_as::<_, Edition>(
        "UPDATE editions SET serie = $1, fecha_de_lanzamiento = $2, tipo_de_generacion = $3 \
         WHERE id = $4 RETURNING *",
    )
    .bind(&payload.serie)
    .bind(&payload.fecha_de_lanzamiento)
    .bind(payload.tipo_de_generacion)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Photo::replace_for(&pool, PhotoOwner::Edition, id, &payload.foto).await?;
    let foto = Photo::urls_for(&pool, PhotoOwner::Edition, id).await?;

    Ok(Json(EditionResponse::from_row(row, foto)))
}

/// PATCH /ediciones/:id
pub async fn partial_update(
    Path(id): Path<i32>,
    Json(patch): Json<EditionPatch>,
) -> Result<Json<EditionResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let mut row = Repository::<Edition>::new("editions", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("La edición introducida no existe"))?;

    if let Some(v) = patch.serie {
        row.serie = v;
    }
    if let Some(v) = patch.fecha_de_lanzamiento {
        row.fecha_de_lanzamiento = v;
    }
    if let Some(v) = patch.tipo_de_generacion {
        validate_generation(v)
            .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;
        row.tipo_de_generacion = v;
    }

    let row = sqlx::query_as::<_, Edition>(
        "UPDATE editions SET serie = $1, fecha_de_lanzamiento = $2, tipo_de_generacion = $3 \
         WHERE id = $4 RETURNING *",
    )
    .bind(&row.serie)
    .bind(&row.fecha_de_lanzamiento)
    .bind(row.tipo_de_generacion)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    if let Some(fotos) = patch.foto {
        Photo::replace_for(&pool, PhotoOwner::Edition, id, &fotos).await?;
    }
    let foto = Photo::urls_for(&pool, PhotoOwner::Edition, id).await?;

    Ok(Json(EditionResponse::from_row(row, foto)))
}

/// DELETE /ediciones/:id - clears character links first
pub async fn destroy(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    Repository::<Edition>::new("editions", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("La edición introducida no existe"))?;

    sqlx::query("DELETE FROM character_editions WHERE edition_id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    sqlx::query("DELETE FROM editions WHERE id = $1").bind(id).execute(&pool).await?;

    Ok(Json(json!({ "message": format!("Edicion con ID {} eliminado correctamente", id) })))
}
