use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Row};

use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Photo {
    pub url: String,
    pub character_id: Option<i32>,
    pub edition_id: Option<i32>,
    pub skullector_id: Option<i32>,
    pub pet_id: Option<i32>,
}

/// The single catalog row a photo hangs off of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoOwner {
    Character,
    Edition,
    Skullector,
    Pet,
}

impl PhotoOwner {
    fn column(&self) -> &'static str {
        match self {
            PhotoOwner::Character => "character_id",
            PhotoOwner::Edition => "edition_id",
            PhotoOwner::Skullector => "skullector_id",
            PhotoOwner::Pet => "pet_id",
        }
    }
}

impl Photo {
    /// All photo URLs attached to one row, sorted for stable output
    pub async fn urls_for(
        pool: &PgPool,
        owner: PhotoOwner,
        id: i32,
    ) -> Result<Vec<String>, DatabaseError> {
        let sql = format!("SELECT url FROM photos WHERE \"{}\" = $1 ORDER BY url", owner.column());
        let rows = sqlx::query(&sql).bind(id).fetch_all(pool).await?;
        let mut urls = Vec::with_capacity(rows.len());
        for row in rows {
            urls.push(row.try_get("url")?);
        }
        Ok(urls)
    }

    /// Photo URLs for a whole result page, grouped by owning row id
    pub async fn map_for(
        pool: &PgPool,
        owner: PhotoOwner,
        ids: &[i32],
    ) -> Result<HashMap<i32, Vec<String>>, DatabaseError> {
        let mut map: HashMap<i32, Vec<String>> = HashMap::new();
        if ids.is_empty() {
            return Ok(map);
        }
        let sql = format!(
            "SELECT url, \"{}\" AS owner_id FROM photos WHERE \"{}\" = ANY($1) ORDER BY url",
            owner.column(),
            owner.column()
        );
        let rows = sqlx::query(&sql).bind(ids).fetch_all(pool).await?;
        for row in rows {
            let owner_id: i32 = row.try_get("owner_id")?;
            let url: String = row.try_get("url")?;
            map.entry(owner_id).or_default().push(url);
        }
        Ok(map)
    }

    /// Replace the photo set of one row. Existing rows for that owner are
    /// dropped and the given URLs inserted; url is the global key, so a URL
    /// known elsewhere is re-pointed at this owner.
    pub async fn replace_for(
        pool: &PgPool,
        owner: PhotoOwner,
        id: i32,
        urls: &[String],
    ) -> Result<(), DatabaseError> {
        let delete_sql = format!("DELETE FROM photos WHERE \"{}\" = $1", owner.column());
        sqlx::query(&delete_sql).bind(id).execute(pool).await?;

        let cleared: Vec<String> = ["character_id", "edition_id", "skullector_id", "pet_id"]
            .iter()
            .filter(|c| **c != owner.column())
            .map(|c| format!("\"{}\" = NULL", c))
            .collect();
        let insert_sql = format!(
            "INSERT INTO photos (url, \"{col}\") VALUES ($1, $2) \
             ON CONFLICT (url) DO UPDATE SET \"{col}\" = EXCLUDED.\"{col}\", {cleared}",
            col = owner.column(),
            cleared = cleared.join(", ")
        );
        for url in urls {
            sqlx::query(&insert_sql).bind(url).bind(id).execute(pool).await?;
        }
        Ok(())
    }
}
