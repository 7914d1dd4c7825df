//! The record store as seen by the qualification pipeline.

use std::future::Future;

use leadgen_core::{QualifiedLead, RawRecord};
use leadgen_db::{DbError, NewQualifiedLead, UpsertOutcome};
use sqlx::SqlitePool;

/// Read raw and qualified records, and write qualification results.
pub trait LeadStore {
    fn fetch_raw_records(&self) -> impl Future<Output = Result<Vec<RawRecord>, DbError>> + Send;

    /// A store with no qualified table yet returns an empty list.
    fn fetch_qualified_records(
        &self,
    ) -> impl Future<Output = Result<Vec<QualifiedLead>, DbError>> + Send;

    /// Insert or update the qualified row for the lead's identity.
    fn upsert_qualified(
        &self,
        lead: &NewQualifiedLead<'_>,
    ) -> impl Future<Output = Result<UpsertOutcome, DbError>> + Send;
}

/// [`LeadStore`] over the SQLite pool.
#[derive(Debug, Clone)]
pub struct DbLeadStore {
    pool: SqlitePool,
}

impl DbLeadStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl LeadStore for DbLeadStore {
    async fn fetch_raw_records(&self) -> Result<Vec<RawRecord>, DbError> {
        leadgen_db::fetch_raw_records(&self.pool).await
    }

    async fn fetch_qualified_records(&self) -> Result<Vec<QualifiedLead>, DbError> {
        leadgen_db::fetch_qualified_records(&self.pool).await
    }

    async fn upsert_qualified(&self, lead: &NewQualifiedLead<'_>) -> Result<UpsertOutcome, DbError> {
        leadgen_db::upsert_qualified_lead(&self.pool, lead).await
    }
}
