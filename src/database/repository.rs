use serde::Serialize;
use serde_json::json;
use sqlx::{self, postgres::PgRow, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::filter::FilterData;

/// Thin typed read layer over [`QueryBuilder`]. One instance per table,
/// parameterized by the row type.
pub struct Repository<T> {
    table_name: String,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
{
    pub fn new(table_name: impl Into<String>, pool: PgPool) -> Self {
        Self {
            table_name: table_name.into(),
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(&self.table_name)?
            .filter(filter_data)?
            .select_all(&self.pool)
            .await
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        QueryBuilder::<T>::new(&self.table_name)?
            .filter(filter_data)?
            .select_optional(&self.pool)
            .await
    }

    pub async fn select_by_id(&self, id: i32) -> Result<Option<T>, DatabaseError> {
        let filter = FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        };
        self.select_one(filter).await
    }

    pub async fn select_ids(&self, ids: Vec<i32>) -> Result<Vec<T>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let filter = FilterData {
            where_clause: Some(json!({ "id": { "$in": ids } })),
            ..Default::default()
        };
        self.select_any(filter).await
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        QueryBuilder::<T>::new(&self.table_name)?
            .filter(filter_data)?
            .count(&self.pool)
            .await
    }

    /// Pre-insert duplicate probe: true when a row matches the given
    /// conjunctive conditions. Not transactionally guarded.
    pub async fn exists(&self, where_clause: serde_json::Value) -> Result<bool, DatabaseError> {
        let filter = FilterData { where_clause: Some(where_clause), ..Default::default() };
        Ok(self.count(filter).await? > 0)
    }
}
