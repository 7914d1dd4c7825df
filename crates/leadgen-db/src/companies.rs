//! Database operations for the `companies` table.

use chrono::{DateTime, Utc};
use leadgen_core::Company;
use sqlx::SqlitePool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompanyRow {
    pub id: i64,
    pub name: String,
    pub url: Option<String>,
    pub industry: Option<String>,
    pub locality: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Company {
            id: row.id,
            name: row.name,
            url: row.url,
            industry: row.industry,
            locality: row.locality,
            created_at: row.created_at,
        }
    }
}

pub struct NewCompany<'a> {
    pub name: &'a str,
    pub url: Option<&'a str>,
    pub industry: Option<&'a str>,
    pub locality: Option<&'a str>,
}

/// Insert a company, or return the id of the existing company with that name.
///
/// Names are trimmed before matching. Optional details on an existing company
/// are filled in when they were previously empty, never overwritten.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_company(
    pool: &SqlitePool,
    company: &NewCompany<'_>,
    created_at: DateTime<Utc>,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO companies (name, url, industry, locality, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT (name) DO UPDATE SET \
             url = COALESCE(companies.url, excluded.url), \
             industry = COALESCE(companies.industry, excluded.industry), \
             locality = COALESCE(companies.locality, excluded.locality) \
         RETURNING id",
    )
    .bind(company.name.trim())
    .bind(company.url)
    .bind(company.industry)
    .bind(company.locality)
    .bind(created_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Look up a company by exact (trimmed) name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_company_by_name(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<CompanyRow>, DbError> {
    let row = sqlx::query_as::<_, CompanyRow>(
        "SELECT id, name, url, industry, locality, created_at \
         FROM companies WHERE name = ?1",
    )
    .bind(name.trim())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List all companies ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_companies(pool: &SqlitePool) -> Result<Vec<CompanyRow>, DbError> {
    let rows = sqlx::query_as::<_, CompanyRow>(
        "SELECT id, name, url, industry, locality, created_at \
         FROM companies ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
