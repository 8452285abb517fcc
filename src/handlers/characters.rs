//! Handlers for the `/personajes` resource.
//!
//! `/todos` shares these write handlers; only its read side differs (see
//! `handlers::catalog`).

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::database::manager::DatabaseManager;
use crate::database::models::character::{
    validate_sexo, Character, CharacterPatch, CharacterPayload, CharacterResponse,
};
use crate::database::models::edition::Edition;
use crate::database::models::pet::Pet;
use crate::database::models::photo::{Photo, PhotoOwner};
use crate::database::repository::Repository;
use crate::error::ApiError;
use crate::handlers::params::{filter_data, parse_int_param, translate_ordering, WhereBuilder};

/// Wire field name to column map, shared by ordering validation
pub(crate) const ORDER_FIELDS: &[(&str, &str)] = &[
    ("Id", "id"),
    ("Nombre", "nombre"),
    ("TipoDeMonstruo", "tipo_de_monstruo"),
    ("FechaDeLanzamiento", "fecha_de_lanzamiento"),
    ("FechaCumpleanios", "fecha_cumpleanios"),
    ("CiudadNatal", "ciudad_natal"),
    ("Edad", "edad"),
    ("Frase", "frase"),
    ("ColorFav", "color_fav"),
    ("Sexo", "sexo"),
];

#[derive(Debug, Deserialize)]
pub struct CharacterListQuery {
    pub nombre: Option<String>,
    pub tipo: Option<String>,
    pub ciudad: Option<String>,
    pub edad: Option<String>,
    pub lanzamiento: Option<String>,
    #[serde(rename = "fechaCumpleanios")]
    pub fecha_cumpleanios: Option<String>,
    pub frase: Option<String>,
    #[serde(rename = "colorFav")]
    pub color_fav: Option<String>,
    pub sexo: Option<String>,
    pub ordering: Option<String>,
}

/// GET /personajes - filtered, ordered list
pub async fn list(
    Query(query): Query<CharacterListQuery>,
) -> Result<Json<Vec<CharacterResponse>>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let edad = match &query.edad {
        Some(raw) => Some(parse_int_param(raw, "La edad debe ser un número")?),
        None => None,
    };

    let where_clause = WhereBuilder::new()
        .contains("nombre", query.nombre.as_deref())
        .contains("tipo_de_monstruo", query.tipo.as_deref())
        .contains("ciudad_natal", query.ciudad.as_deref())
        .contains("fecha_de_lanzamiento", query.lanzamiento.as_deref())
        .contains("fecha_cumpleanios", query.fecha_cumpleanios.as_deref())
        .contains("frase", query.frase.as_deref())
        .contains("color_fav", query.color_fav.as_deref())
        .eq("edad", edad.map(Value::from))
        .eq("sexo", query.sexo.clone().map(Value::from))
        .into_where();
    let order = translate_ordering(query.ordering.as_deref(), ORDER_FIELDS)?;

    let rows = Repository::<Character>::new("characters", pool.clone())
        .select_any(filter_data(where_clause, order))
        .await?;

    let ids: Vec<i32> = rows.iter().map(|c| c.id).collect();
    let mut photos = Photo::map_for(&pool, PhotoOwner::Character, &ids).await?;

    let out = rows
        .into_iter()
        .map(|row| {
            let foto = photos.remove(&row.id).unwrap_or_default();
            CharacterResponse::from_row(row, foto)
        })
        .collect();
    Ok(Json(out))
}

/// GET /personajes/:id
pub async fn retrieve(Path(id): Path<i32>) -> Result<Json<CharacterResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let row = Repository::<Character>::new("characters", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("El personaje no existe"))?;
    let foto = Photo::urls_for(&pool, PhotoOwner::Character, id).await?;
    Ok(Json(CharacterResponse::from_row(row, foto)))
}

/// POST /personajes - duplicate-checked create
pub async fn create(
    Json(payload): Json<CharacterPayload>,
) -> Result<(StatusCode, Json<CharacterResponse>), ApiError> {
    let pool = DatabaseManager::pool().await?;
    payload
        .validate()
        .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;

    // Pre-insert existence check over the identity fields; not guarded
    // against concurrent inserts, matching the upstream behavior
    let duplicate = Repository::<Character>::new("characters", pool.clone())
        .exists(json!({
            "nombre": &payload.nombre,
            "tipo_de_monstruo": &payload.tipo_de_monstruo,
            "fecha_de_lanzamiento": &payload.fecha_de_lanzamiento,
            "edad": payload.edad,
            "sexo": &payload.sexo,
        }))
        .await?;
    if duplicate {
        return Err(ApiError::conflict("Este personaje ya existe"));
    }

    ensure_pet_exists(&pool, payload.mascota_id).await?;
    ensure_editions_exist(&pool, &payload.ediciones_id).await?;

    let row = sqlx::query_as::<_, Character>(
        "INSERT INTO characters \
         (nombre, tipo_de_monstruo, fecha_de_lanzamiento, fecha_cumpleanios, ciudad_natal, \
          edad, frase, color_fav, sexo, mascota_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING *",
    )
    .bind(&payload.nombre)
    .bind(&payload.tipo_de_monstruo)
    .bind(&payload.fecha_de_lanzamiento)
    .bind(&payload.fecha_cumpleanios)
    .bind(&payload.ciudad_natal)
    .bind(payload.edad)
    .bind(&payload.frase)
    .bind(&payload.color_fav)
    .bind(&payload.sexo)
    .bind(payload.mascota_id)
    .fetch_one(&pool)
    .await?;

    set_edition_links(&pool, row.id, &payload.ediciones_id).await?;
    Photo::replace_for(&pool, PhotoOwner::Character, row.id, &payload.foto).await?;

    let foto = Photo::urls_for(&pool, PhotoOwner::Character, row.id).await?;
    Ok((StatusCode::CREATED, Json(CharacterResponse::from_row(row, foto))))
}

/// PUT /personajes/:id - full update
pub async fn update(
    Path(id): Path<i32>,
    Json(payload): Json<CharacterPayload>,
) -> Result<Json<CharacterResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    payload
        .validate()
        .map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;

    Repository::<Character>::new("characters", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("El personaje no existe"))?;

    ensure_pet_exists(&pool, payload.mascota_id).await?;
    ensure_editions_exist(&pool, &payload.ediciones_id).await?;

    let row = sqlx::query_as::<_, Character>(
        "UPDATE characters SET \
         nombre = $1, tipo_de_monstruo = $2, fecha_de_lanzamiento = $3, fecha_cumpleanios = $4, \
         ciudad_natal = $5, edad = $6, frase = $7, color_fav = $8, sexo = $9, mascota_id = $10 \
         WHERE id = $11 RETURNING *",
    )
    .bind(&payload.nombre)
    .bind(&payload.tipo_de_monstruo)
    .bind(&payload.fecha_de_lanzamiento)
    .bind(&payload.fecha_cumpleanios)
    .bind(&payload.ciudad_natal)
    .bind(payload.edad)
    .bind(&payload.frase)
    .bind(&payload.color_fav)
    .bind(&payload.sexo)
    .bind(payload.mascota_id)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    set_edition_links(&pool, id, &payload.ediciones_id).await?;
    Photo::replace_for(&pool, PhotoOwner::Character, id, &payload.foto).await?;

    let foto = Photo::urls_for(&pool, PhotoOwner::Character, id).await?;
    Ok(Json(CharacterResponse::from_row(row, foto)))
}

/// PATCH /personajes/:id - partial update; absent fields keep their value
pub async fn partial_update(
    Path(id): Path<i32>,
    Json(patch): Json<CharacterPatch>,
) -> Result<Json<CharacterResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let mut row = Repository::<Character>::new("characters", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("El personaje no existe"))?;

    if let Some(v) = patch.nombre {
        row.nombre = v;
    }
    if let Some(v) = patch.tipo_de_monstruo {
        row.tipo_de_monstruo = v;
    }
    if let Some(v) = patch.fecha_de_lanzamiento {
        row.fecha_de_lanzamiento = v;
    }
    if let Some(v) = patch.fecha_cumpleanios {
        row.fecha_cumpleanios = Some(v);
    }
    if let Some(v) = patch.ciudad_natal {
        row.ciudad_natal = Some(v);
    }
    if let Some(v) = patch.edad {
        row.edad = Some(v);
    }
    if let Some(v) = patch.frase {
        row.frase = Some(v);
    }
    if let Some(v) = patch.color_fav {
        row.color_fav = Some(v);
    }
    if let Some(v) = patch.sexo {
        validate_sexo(&v).map_err(|e| ApiError::validation_error("Datos inválidos", Some(json!(e))))?;
        row.sexo = v;
    }
    if let Some(v) = patch.mascota_id {
        ensure_pet_exists(&pool, Some(v)).await?;
        row.mascota_id = Some(v);
    }

    let row = sqlx::query_as::<_, Character>(
        "UPDATE characters SET \
         nombre = $1, tipo_de_monstruo = $2, fecha_de_lanzamiento = $3, fecha_cumpleanios = $4, \
         ciudad_natal = $5, edad = $6, frase = $7, color_fav = $8, sexo = $9, mascota_id = $10 \
         WHERE id = $11 RETURNING *",
    )
    .bind(&row.nombre)
    .bind(&row.tipo_de_monstruo)
    .bind(&row.fecha_de_lanzamiento)
    .bind(&row.fecha_cumpleanios)
    .bind(&row.ciudad_natal)
    .bind(row.edad)
    .bind(&row.frase)
    .bind(&row.color_fav)
    .bind(&row.sexo)
    .bind(row.mascota_id)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    if let Some(eds) = patch.ediciones_id {
        ensure_editions_exist(&pool, &eds).await?;
        set_edition_links(&pool, id, &eds).await?;
    }
    if let Some(fotos) = patch.foto {
        Photo::replace_for(&pool, PhotoOwner::Character, id, &fotos).await?;
    }

    let foto = Photo::urls_for(&pool, PhotoOwner::Character, id).await?;
    Ok(Json(CharacterResponse::from_row(row, foto)))
}

/// DELETE /personajes/:id - clears edition links, photos cascade with the row
pub async fn destroy(Path(id): Path<i32>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    Repository::<Character>::new("characters", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("El personaje no existe"))?;

    sqlx::query("DELETE FROM character_editions WHERE character_id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    sqlx::query("DELETE FROM characters WHERE id = $1").bind(id).execute(&pool).await?;

    Ok(Json(json!({ "message": format!("Personaje con ID {} eliminado correctamente", id) })))
}

/// Replace the character's edition link rows with the given set
pub(crate) async fn set_edition_links(
    pool: &PgPool,
    character_id: i32,
    edition_ids: &[i32],
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM character_editions WHERE character_id = $1")
        .bind(character_id)
        .execute(pool)
        .await?;
    for edition_id in edition_ids {
        sqlx::query(
            "INSERT INTO character_editions (character_id, edition_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(character_id)
        .bind(edition_id)
        .execute(pool)
        .await?;
    }
    Ok(())
}

pub(crate) async fn ensure_pet_exists(pool: &PgPool, pet_id: Option<i32>) -> Result<(), ApiError> {
    if let Some(pet_id) = pet_id {
        let found = Repository::<Pet>::new("pets", pool.clone()).select_by_id(pet_id).await?;
        if found.is_none() {
            return Err(ApiError::validation_error(
                "Datos inválidos",
                Some(json!(format!("La mascota con ID {} no existe", pet_id))),
            ));
        }
    }
    Ok(())
}

pub(crate) async fn ensure_editions_exist(pool: &PgPool, ids: &[i32]) -> Result<(), ApiError> {
    if ids.is_empty() {
        return Ok(());
    }
    let mut ids: Vec<i32> = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    let found = Repository::<Edition>::new("editions", pool.clone())
        .select_ids(ids.clone())
        .await?;
    if found.len() != ids.len() {
        return Err(ApiError::validation_error(
            "Datos inválidos",
            Some(json!("Alguna de las ediciones indicadas no existe")),
        ));
    }
    Ok(())
}
