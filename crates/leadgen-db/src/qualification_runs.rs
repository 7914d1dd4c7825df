//! Database operations for `qualification_runs`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::DbError;

const RUN_COLUMNS: &str = "id, public_id, trigger_source, status, started_at, completed_at, \
                           attempted, succeeded, skipped, error_message, created_at";

/// A row from the `qualification_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QualificationRunRow {
    pub id: i64,
    /// Hyphenated UUID text.
    pub public_id: String,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub attempted: i64,
    pub succeeded: i64,
    pub skipped: i64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-run record counts written on completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub attempted: i64,
    pub succeeded: i64,
    pub skipped: i64,
}

/// Creates a new qualification run in `queued` status.
///
/// Generates a UUID in Rust and binds it to `public_id`. Returns the full
/// newly-created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_qualification_run(
    pool: &SqlitePool,
    trigger_source: &str,
) -> Result<QualificationRunRow, DbError> {
    let public_id = Uuid::new_v4().to_string();

    let row = sqlx::query_as::<_, QualificationRunRow>(&format!(
        "INSERT INTO qualification_runs (public_id, trigger_source, status, created_at) \
         VALUES (?1, ?2, 'queued', ?3) \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(public_id)
    .bind(trigger_source)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a queued run as `running` and stamps `started_at`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `queued`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn start_qualification_run(pool: &SqlitePool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE qualification_runs \
         SET status = 'running', started_at = ?1 \
         WHERE id = ?2 AND status = 'queued'",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a running run as `succeeded` and records its counts.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_qualification_run(
    pool: &SqlitePool,
    id: i64,
    counts: RunCounts,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE qualification_runs \
         SET status = 'succeeded', completed_at = ?1, \
             attempted = ?2, succeeded = ?3, skipped = ?4 \
         WHERE id = ?5 AND status = 'running'",
    )
    .bind(Utc::now())
    .bind(counts.attempted)
    .bind(counts.succeeded)
    .bind(counts.skipped)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a running run as `failed` with an error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_qualification_run(
    pool: &SqlitePool,
    id: i64,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE qualification_runs \
         SET status = 'failed', completed_at = ?1, error_message = ?2 \
         WHERE id = ?3 AND status = 'running'",
    )
    .bind(Utc::now())
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_qualification_run(
    pool: &SqlitePool,
    id: i64,
) -> Result<QualificationRunRow, DbError> {
    let row = sqlx::query_as::<_, QualificationRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM qualification_runs WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_qualification_runs(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<QualificationRunRow>, DbError> {
    let rows = sqlx::query_as::<_, QualificationRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM qualification_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT ?1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
