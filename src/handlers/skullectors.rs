//! Handlers for the `/skullectors` resource.

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::database::manager::DatabaseManager;
use crate::database::models::character::{Character, CharacterResponse};
use crate::database::models::photo::{Photo, PhotoOwner};
use crate::database::models::skullector::{
    Skullector, SkullectorPatch, SkullectorPayload, SkullectorResponse,
};
use crate::database::repository::Repository;
use crate::error::ApiError;
use crate::handlers::params::{
    filter_data, parse_bool_param, parse_int_param, translate_ordering, WhereBuilder,
};

const ORDER_FIELDS: &[(&str, &str)] = &[
    ("Id", "id"),
    ("Serie", "serie"),
    ("FechaDeLanzamiento", "fecha_de_lanzamiento"),
    ("Descripcion", "descripcion"),
    ("EdicionLimitada", "edicion_limitada"),
    ("Inspiracion", "inspiracion"),
    ("Certificado", "certificado"),
    ("PrecioOriginal", "precio_original"),
    ("PrecioMercado", "precio_mercado"),
];

#[derive(Debug, Deserialize)]
pub struct SkullectorListQuery {
    pub serie: Option<String>,
    pub descripcion: Option<String>,
    pub lanzamiento: Option<String>,
    pub inspiracion: Option<String>,
    #[serde(rename = "edicionLimitada")]
    pub edicion_limitada: Option<String>,
    pub certificado: Option<String>,
    #[serde(rename = "precioOriginal")]
    pub precio_original: Option<String>,
    #[serde(rename = "precioMercado")]
    pub precio_mercado: Option<String>,
    pub ordering: Option<String>,
}

/// GET /skullectors
pub async fn list(
    Query(query): Query<SkullectorListQuery>,
) -> Result<Json<Vec<SkullectorResponse>>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let edicion_limitada = match &query.edicion_limitada {
        Some(raw) => {
            Some(parse_bool_param(raw, "El parámetro 'edicionLimitada' debe ser booleano")?)
        }
        None => None,
    };
    let certificado = match &query.certificado {
        Some(raw) => Some(parse_bool_param(raw, "El parámetro 'certificado' debe ser booleano")?),
        None => None,
    };
    let precio_original = match &query.precio_original {
        Some(raw) => {
            Some(parse_int_param(raw, "El parámetro 'precioOriginal' debe ser un número")?)
        }
        None => None,
    };
    let precio_mercado = match &query.precio_mercado {
        Some(raw) => Some(parse_int_param(raw, "El parámetro 'precioMercado' debe ser un número")?),
        None => None,
    };

    let where_clause = WhereBuilder::new()
        .contains("serie", query.serie.as_deref())
        .contains("descripcion", query.descripcion.as_deref())
        .contains("fecha_de_lanzamiento", query.lanzamiento.as_deref())
        .contains("inspiracion", query.inspiracion.as_deref())
        .eq("edicion_limitada", edicion_limitada.map(Value::from))
        .eq("certificado", certificado.map(Value::from))
        .eq("precio_original", precio_original.map(Value::from))
        .eq("precio_mercado", precio_mercado.map(Value::from))
        .into_where();
    let order = translate_ordering(query.ordering.as_deref(), ORDER_FIELDS)?;

    let rows = Repository::<Skullector>::new("skullectors", pool.clone())
        .select_any(filter_data(where_clause, order))
        .await?;

    let ids: Vec<i32> = rows.iter().map(|s| s.id).collect();
    let mut photos = Photo::map_for(&pool, PhotoOwner::Skullector, &ids).await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let foto = photos.remove(&row.id).unwrap_or_default();
        let muneca = resolve_character(&pool, row.muneca_id).await?;
        out.push(SkullectorResponse::from_row(row, foto, muneca));
    }
    Ok(Json(out))
}

/// GET /skullectors/:id
pub async fn retrieve(Path(id): Path<i32>) -> Result<Json<SkullectorResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let row = Repository::<Skullector>::new("skullectors", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Esta Skullector no existe"))?;
    let foto = Photo::urls_for(&pool, PhotoOwner::Skullector, id).await?;
    let muneca = resolve_character(&pool, row.muneca_id).await?;
    Ok(Json(SkullectorResponse::from_row(row, foto, muneca)))
}

/// POST /skullectors - duplicate-checked create
pub async fn create(
    Json(payload): Json<SkullectorPayload>,
) -> Result<(StatusCode, Json<SkullectorResponse>), ApiError> {
    let pool = DatabaseManager::pool().await?;
    payload
        .validate()
        .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;

    let duplicate = Repository::<Skullector>::new("skullectors", pool.clone())
        .exists(json!({
            "serie": &payload.serie,
            "descripcion": &payload.descripcion,
            "fecha_de_lanzamiento": &payload.fecha_de_lanzamiento,
        }))
        .await?;
    if duplicate {
        return Err(ApiError::conflict("Esta skullector ya existe"));
    }

    ensure_character_exists(&pool, payload.muneca_id).await?;

    let row = sqlx::query_as::<_, Skullector>(
        "INSERT INTO skullectors \
         (muneca_id, serie, edicion_limitada, inspiracion, fecha_de_lanzamiento, descripcion, \
          certificado, precio_original, precio_mercado) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING *",
    )
    .bind(payload.muneca_id)
    .bind(&payload.serie)
    .bind(payload.edicion_limitada)
    .bind(&payload.inspiracion)
    .bind(&payload.fecha_de_lanzamiento)
    .bind(&payload.descripcion)
    .bind(payload.certificado)
    .bind(payload.precio_original)
    .bind(payload.precio_mercado)
    .fetch_one(&pool)
    .await?;

    Photo::replace_for(&pool, PhotoOwner::Skullector, row.id, &payload.foto).await?;
    let foto = Photo::urls_for(&pool, PhotoOwner::Skullector, row.id).await?;
    let muneca = resolve_character(&pool, row.muneca_id).await?;

    Ok((StatusCode::CREATED, Json(SkullectorResponse::from_row(row, foto, muneca))))
}

/// PUT /skullectors/:id
pub async fn update(
    Path(id): Path<i32>,
    Json(payload): Json<SkullectorPayload>,
) -> Result<Json<SkullectorResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    payload
        .validate()
        .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;

    Repository::<Skullector>::new("skullectors", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Esta Skullector no existe"))?;

    ensure_character_exists(&pool, payload.muneca_id).await?;

    let row = sqlx::query_as::<_, Skullector>(
        "UPDATE skullectors SET \
         muneca_id = $1, serie = $2, edicion_limitada = $3, inspiracion = $4, \
         fecha_de_lanzamiento = $5, descripcion = $6, certificado = $7, \
         precio_original = $8, precio_mercado = $9 \
         WHERE id = $10 RETURNING *",
    )
    .bind(payload.muneca_id)
    .bind(&payload.serie)
    .bind(payload.edicion_limitada)
    .bind(&payload.inspiracion)
    .bind(&payload.fecha_de_lanzamiento)
    .bind(&payload.descripcion)
    .bind(payload.certificado)
    .bind(payload.precio_original)
    .bind(payload.precio_mercado)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Photo::replace_for(&pool, PhotoOwner::Skullector, id, &payload.foto).await?;
    let foto = Photo::urls_for(&pool, PhotoOwner::Skullector, id).await?;
    let muneca = resolve_character(&pool, row.muneca_id).await?;

    Ok(Json(SkullectorResponse::from_row(row, foto, muneca)))
}

/// PATCH /skullectors/:id
pub async fn partial_update(
    Path(id): Path<i32>,
    Json(patch): Json<SkullectorPatch>,
) -> Result<Json<SkullectorResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let mut row = Repository::<Skullector>::new("skullectors", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Esta Skullector no existe"))?;

    if let Some(v) = patch.serie {
        row.serie = v;
    }
    if let Some(v) = patch.fecha_de_lanzamiento {
        row.fecha_de_lanzamiento = v;
    }
    if let Some(v) = patch.descripcion {
        row.descripcion = v;
    }
    if let Some(v) = patch.edicion_limitada {
        row.edicion_limitada = v;
    }
    if let Some(v) = patch.inspiracion {
        row.inspiracion = Some(v);
    }
    if let Some(v) = patch.certificado {
        row.certificado = v;
    }
    if let Some(v) = patch.precio_original {
        row.precio_original = Some(v);
    }
    if let Some(v) = patch.precio_mercado {
        row.precio_mercado = Some(v);
    }
    if let Some(v) = patch.muneca_id {
        ensure_character_exists(&pool, Some(v)).await?;
        row.muneca_id = Some(v);
    }

    let row = sqlx::query_as::<_, Skullector>(
        "UPDATE skullectors SET \
         muneca_id = $1, serie = $2, edicion_limitada = $3, inspiracion = $4, \
         fecha_de_lanzamiento = $5, descripcion = $6, certificado = $7, \
         precio_original = $8, precio_mercado = $9 \
         WHERE id = $10 RETURNING *",
    )
    .bind(row.muneca_id)
    .bind(&row.serie)
    .bind(row.edicion_limitada)
    .bind(&row.inspiracion)
    .bind(&row.fecha_de_lanzamiento)
    .bind(&row.descripcion)
    .bind(row.certificado)
    .bind(row.precio_original)
    .bind(row.precio_mercado)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    if let Some(fotos) = patch.foto {
        Photo::replace_for(&pool, PhotoOwner::Skullector, id, &fotos).await?;
    }
    let foto = Photo::urls_for(&pool, PhotoOwner::Skullector, id).await?;
    let muneca = resolve_character(&pool, row.muneca_id).await?;

    Ok(Json(SkullectorResponse::from_row(row, foto, muneca)))
}

/// DELETE /skullectors/:id
pub async fn destroy(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    Repository::<Skullector>::new("skullectors", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Esta Skullector no existe"))?;

    sqlx::query("DELETE FROM skullectors WHERE id = $1").bind(id).execute(&pool).await?;

    Ok(Json(json!({ "message": format!("Skullector con ID {} eliminado correctamente", id) })))
}

/// Resolve the optional linked character, photos included
async fn resolve_character(
    pool: &PgPool,
    muneca_id: Option<i32>,
) -> Result<Option<CharacterResponse>, ApiError> {
    let id = match muneca_id {
        Some(id) => id,
        None => return Ok(None),
    };
    let row = Repository::<Character>::new("characters", pool.clone()).select_by_id(id).await?;
    match row {
        Some(row) => {
            let foto = Photo::urls_for(pool, PhotoOwner::Character, id).await?;
            Ok(Some(CharacterResponse::from_row(row, foto)))
        }
        None => Ok(None),
    }
}

async fn ensure_character_exists(pool: &PgPool, id: Option<i32>) -> Result<(), ApiError> {
    if let Some(id) = id {
        let found = Repository::<Character>::new("characters", pool.clone()).select_by_id(id).await?;
        if found.is_none() {
            return Err(ApiError::validation_error(
                "Datos inválidos",
                Some(json!(format!("El personaje con ID {} no existe", id))),
            ));
        }
    }
    Ok(())
}
