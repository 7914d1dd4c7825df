//! Database operations for the `mentions` table.

use chrono::{DateTime, Utc};
use leadgen_core::{LeadSource, Mention};
use sqlx::SqlitePool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MentionRow {
    pub id: i64,
    pub company_id: i64,
    pub text: String,
    pub source: Option<String>,
    pub mentioned_at: DateTime<Utc>,
}

impl From<MentionRow> for Mention {
    fn from(row: MentionRow) -> Self {
        Mention {
            id: row.id,
            company_id: row.company_id,
            text: row.text,
            source: row.source.map(LeadSource::from),
            mentioned_at: row.mentioned_at,
        }
    }
}

/// Record a mention for an existing company and return its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including when `company_id`
/// does not reference a company.
pub async fn insert_mention(
    pool: &SqlitePool,
    company_id: i64,
    text: &str,
    source: Option<&LeadSource>,
    mentioned_at: DateTime<Utc>,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO mentions (company_id, text, source, mentioned_at) \
         VALUES (?1, ?2, ?3, ?4) RETURNING id",
    )
    .bind(company_id)
    .bind(text)
    .bind(source.map(LeadSource::as_str))
    .bind(mentioned_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// List every mention ordered by company, then chronologically.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_mentions(pool: &SqlitePool) -> Result<Vec<MentionRow>, DbError> {
    let rows = sqlx::query_as::<_, MentionRow>(
        "SELECT id, company_id, text, source, mentioned_at \
         FROM mentions ORDER BY company_id, mentioned_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List the mentions of one company, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_mentions_by_company(
    pool: &SqlitePool,
    company_id: i64,
) -> Result<Vec<MentionRow>, DbError> {
    let rows = sqlx::query_as::<_, MentionRow>(
        "SELECT id, company_id, text, source, mentioned_at \
         FROM mentions WHERE company_id = ?1 ORDER BY mentioned_at, id",
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
