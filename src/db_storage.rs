use crate::errors::PersistError;
use crate::gateways::PersistenceGateway;
use crate::models::Collection;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

/// Writes intake records straight into Postgres.
///
/// Rows arrive as JSON objects and are expanded with
/// `jsonb_populate_recordset`, so each collection only needs its column list.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn insert_sql(collection: Collection) -> String {
        let table = collection.as_str();
        let columns = collection.columns().join(", ");
        format!(
            "INSERT INTO {table} ({columns}) \
             SELECT {columns} FROM jsonb_populate_recordset(NULL::{table}, $1)"
        )
    }
}

#[async_trait]
impl PersistenceGateway for PgStore {
    async fn insert(
        &self,
        collection: Collection,
        records: Vec<Value>,
    ) -> Result<(), PersistError> {
        let sql = Self::insert_sql(collection);

        let result = sqlx::query(&sql)
            .bind(Value::Array(records))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::debug!("Insert into {} failed: {:?}", collection, e);
                PersistError::from(e)
            })?;

        tracing::debug!(
            "✓ Inserted {} row(s) into {}",
            result.rows_affected(),
            collection
        );
        Ok(())
    }
}
