//! Seams to the managed backend: the data store and the AI research function.
//!
//! Both are consumed as opaque capabilities so the intake flows can run
//! against Supabase REST, a direct Postgres pool or in-memory fakes.

use crate::errors::{AppError, PersistError};
use crate::models::{Collection, ResearchRequest, ResearchResponse};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Inserts `records` (JSON objects) into `collection`.
    async fn insert(&self, collection: Collection, records: Vec<Value>)
        -> Result<(), PersistError>;
}

#[async_trait]
pub trait ResearchGateway: Send + Sync {
    /// Asks the research function about a company. Latency is typically ~10s.
    async fn research_company(
        &self,
        request: &ResearchRequest,
    ) -> Result<ResearchResponse, AppError>;
}

/// Serializes a single typed record and inserts it.
pub async fn insert_record<T: Serialize + ?Sized>(
    store: &dyn PersistenceGateway,
    collection: Collection,
    record: &T,
) -> Result<(), PersistError> {
    let value = serde_json::to_value(record)?;
    store.insert(collection, vec![value]).await
}
