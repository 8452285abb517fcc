//! Read handlers for `/todos`: characters with their pet and edition
//! relations resolved inline. Writes are shared with `/personajes`.

use std::collections::HashMap;

use axum::extract::{Path, Query};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use sqlx::{PgPool, Row};

use crate::database::manager::DatabaseManager;
use crate::database::models::character::{Character, CharacterDetailResponse, CharacterResponse};
use crate::database::models::edition::{Edition, EditionResponse};
use crate::database::models::pet::{Pet, PetResponse};
use crate::database::models::photo::{Photo, PhotoOwner};
use crate::database::repository::Repository;
use crate::error::ApiError;
use crate::handlers::characters::ORDER_FIELDS;
use crate::handlers::params::{filter_data, parse_int_param, translate_ordering, WhereBuilder};

#[derive(Debug, Deserialize)]
pub struct CatalogListQuery {
    pub generacion: Option<String>,
    pub nombre: Option<String>,
    pub edad: Option<String>,
    #[serde(rename = "fechaLanzamiento")]
    pub fecha_lanzamiento: Option<String>,
    #[serde(rename = "fechaCumpleanios")]
    pub fecha_cumpleanios: Option<String>,
    #[serde(rename = "tipoMascota")]
    pub tipo_mascota: Option<String>,
    pub tipo: Option<String>,
    pub ciudad: Option<String>,
    pub frase: Option<String>,
    #[serde(rename = "colorFav")]
    pub color_fav: Option<String>,
    pub sexo: Option<String>,
    pub ordering: Option<String>,
}

/// GET /todos - filtered list with nested pet and edition data
pub async fn list(
    Query(query): Query<CatalogListQuery>,
) -> Result<Json<Vec<CharacterDetailResponse>>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let edad = match &query.edad {
        Some(raw) => Some(parse_int_param(raw, "La edad debe ser un número")?),
        None => None,
    };

    // Relation filters resolve to id sets first, then join the conjunction
    let generation_ids = match &query.generacion {
        Some(raw) => {
            let generacion = parse_int_param(raw, "El parámetro 'generacion' debe ser un número")?;
            Some(character_ids_for_generation(&pool, generacion).await?)
        }
        None => None,
    };
    let pet_ids = match &query.tipo_mascota {
        Some(tipo) => Some(pet_ids_for_type(&pool, tipo).await?),
        None => None,
    };

    let where_clause = WhereBuilder::new()
        .contains("nombre", query.nombre.as_deref())
        .contains("tipo_de_monstruo", query.tipo.as_deref())
        .contains("ciudad_natal", query.ciudad.as_deref())
        .contains("fecha_de_lanzamiento", query.fecha_lanzamiento.as_deref())
        .contains("fecha_cumpleanios", query.fecha_cumpleanios.as_deref())
        .contains("frase", query.frase.as_deref())
        .contains("color_fav", query.color_fav.as_deref())
        .contains("sexo", query.sexo.as_deref())
        .eq("edad", edad.map(Value::from))
        .id_in("id", generation_ids)
        .id_in("mascota_id", pet_ids)
        .into_where();
    let order = translate_ordering(query.ordering.as_deref(), ORDER_FIELDS)?;

    let rows = Repository::<Character>::new("characters", pool.clone())
        .select_any(filter_data(where_clause, order))
        .await?;

    let details = assemble_details(&pool, rows).await?;
    Ok(Json(details))
}

/// GET /todos/:id - one character with nested relations
pub async fn retrieve(Path(id): Path<i32>) -> Result<Json<CharacterDetailResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let row = Repository::<Character>::new("characters", pool.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("El personaje no existe"))?;

    let mut details = assemble_details(&pool, vec![row]).await?;
    // assemble_details returns exactly one entry per input row
    Ok(Json(details.remove(0)))
}

/// Characters linked to at least one edition of the given generation
async fn character_ids_for_generation(pool: &PgPool, generacion: i64) -> Result<Vec<i32>, ApiError> {
    let rows = sqlx::query(
        "SELECT DISTINCT ce.character_id FROM character_editions ce \
         JOIN editions e ON e.id = ce.edition_id \
         WHERE e.tipo_de_generacion = $1",
    )
    .bind(generacion as i16)
    .fetch_all(pool)
    .await?;
    let mut ids = Vec::with_capacity(rows.len());
    for row in rows {
        ids.push(row.try_get("character_id")?);
    }
    Ok(ids)
}

/// Pets of the given exact type
async fn pet_ids_for_type(pool: &PgPool, tipo: &str) -> Result<Vec<i32>, ApiError> {
    let rows = sqlx::query("SELECT id FROM pets WHERE tipo = $1").bind(tipo).fetch_all(pool).await?;
    let mut ids = Vec::with_capacity(rows.len());
    for row in rows {
        ids.push(row.try_get("id")?);
    }
    Ok(ids)
}

/// Resolve pets, editions and photos for a page of character rows
pub(crate) async fn assemble_details(
    pool: &PgPool,
    rows: Vec<Character>,
) -> Result<Vec<CharacterDetailResponse>, ApiError> {
    let character_ids: Vec<i32> = rows.iter().map(|c| c.id).collect();

    // Photos for the characters themselves
    let mut character_photos = Photo::map_for(pool, PhotoOwner::Character, &character_ids).await?;

    // Pets, batched by the referenced ids (a pet can appear on several rows)
    let pet_ids: Vec<i32> = rows.iter().filter_map(|c| c.mascota_id).collect();
    let pets = Repository::<Pet>::new("pets", pool.clone()).select_ids(pet_ids).await?;
    let pet_photo_ids: Vec<i32> = pets.iter().map(|p| p.id).collect();
    let pet_photos = Photo::map_for(pool, PhotoOwner::Pet, &pet_photo_ids).await?;
    let pets_by_id: HashMap<i32, Pet> = pets.into_iter().map(|p| (p.id, p)).collect();

    // Edition links for the whole page, then the editions themselves
    let links = edition_links(pool, &character_ids).await?;
    let edition_ids: Vec<i32> = {
        let mut ids: Vec<i32> = links.iter().map(|(_, e)| *e).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    };
    let editions =
        Repository::<Edition>::new("editions", pool.clone()).select_ids(edition_ids).await?;
    let edition_photos = Photo::map_for(
        pool,
        PhotoOwner::Edition,
        &editions.iter().map(|e| e.id).collect::<Vec<_>>(),
    )
    .await?;
    let editions_by_id: HashMap<i32, Edition> = editions.into_iter().map(|e| (e.id, e)).collect();

    let mut links_by_character: HashMap<i32, Vec<i32>> = HashMap::new();
    for (character_id, edition_id) in links {
        links_by_character.entry(character_id).or_default().push(edition_id);
    }

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mascota = row.mascota_id.and_then(|id| pets_by_id.get(&id).cloned()).map(|pet| {
            let foto = pet_photos.get(&pet.id).and_then(|urls| urls.first().cloned());
            PetResponse::from_row(pet, foto)
        });

        let ediciones = links_by_character
            .remove(&row.id)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|edition_id| editions_by_id.get(&edition_id).cloned())
            .map(|edition| {
                let foto = edition_photos.get(&edition.id).cloned().unwrap_or_default();
                EditionResponse::from_row(edition, foto)
            })
            .collect();

        let foto = character_photos.remove(&row.id).unwrap_or_default();
        out.push(CharacterDetailResponse {
            character: CharacterResponse::from_row(row, foto),
            mascota_id: mascota,
            ediciones_id: ediciones,
        });
    }
    Ok(out)
}

async fn edition_links(pool: &PgPool, character_ids: &[i32]) -> Result<Vec<(i32, i32)>, ApiError> {
    if character_ids.is_empty() {
        return Ok(vec![]);
    }
    let rows = sqlx::query(
        "SELECT character_id, edition_id FROM character_editions \
         WHERE character_id = ANY($1) ORDER BY edition_id",
    )
    .bind(character_ids)
    .fetch_all(pool)
    .await?;
    let mut links = Vec::with_capacity(rows.len());
    for row in rows {
        links.push((row.try_get("character_id")?, row.try_get("edition_id")?));
    }
    Ok(links)
}
