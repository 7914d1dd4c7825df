//! Database operations for the `raw_leads` table.

use chrono::{DateTime, Utc};
use leadgen_core::{IdentityKey, LeadSource, RawLead};
use sqlx::SqlitePool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawLeadRow {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub message: Option<String>,
    pub source: String,
    pub received_at: DateTime<Utc>,
    pub form_filled: Option<f64>,
    pub email_interaction: Option<f64>,
}

impl From<RawLeadRow> for RawLead {
    fn from(row: RawLeadRow) -> Self {
        RawLead {
            id: row.id,
            name: row.name,
            email: row.email,
            message: row.message,
            source: LeadSource::from(row.source),
            received_at: row.received_at,
            form_filled: row.form_filled,
            email_interaction: row.email_interaction,
        }
    }
}

pub struct NewRawLead<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub message: Option<&'a str>,
    pub source: &'a LeadSource,
    pub received_at: DateTime<Utc>,
    pub form_filled: Option<f64>,
    pub email_interaction: Option<f64>,
}

/// Append a raw lead and return its id. Duplicates are allowed here; identity
/// matching happens at qualification time.
///
/// The normalized identity key is stored alongside the row so deletes can find
/// the matching qualified lead without normalizing in SQL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_raw_lead(pool: &SqlitePool, lead: &NewRawLead<'_>) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO raw_leads \
             (identity_key, name, email, message, source, received_at, form_filled, \
              email_interaction) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) RETURNING id",
    )
    .bind(IdentityKey::contact(lead.name, lead.email).storage_key())
    .bind(lead.name)
    .bind(lead.email)
    .bind(lead.message)
    .bind(lead.source.as_str())
    .bind(lead.received_at)
    .bind(lead.form_filled)
    .bind(lead.email_interaction)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// List all raw leads in arrival order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_raw_leads(pool: &SqlitePool) -> Result<Vec<RawLeadRow>, DbError> {
    let rows = sqlx::query_as::<_, RawLeadRow>(
        "SELECT id, name, email, message, source, received_at, form_filled, email_interaction \
         FROM raw_leads ORDER BY received_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Delete a raw lead. The qualified row for its identity goes with it once no
/// other raw lead shares that identity.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has `id`, or [`DbError::Sqlx`] if
/// the delete fails.
pub async fn delete_raw_lead(pool: &SqlitePool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM raw_leads WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
