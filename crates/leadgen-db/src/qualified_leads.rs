//! Database operations for the `qualified_leads` table.
//!
//! Each identity key owns at most one row. Writes go through
//! [`upsert_qualified_lead`], which turns a uniqueness conflict into an update,
//! and the alert timestamp is only ever written by [`mark_leads_alerted`].

use chrono::{DateTime, Utc};
use leadgen_core::{IdentityKey, LabelProvenance, LeadSource, NeedCategory, QualifiedLead};
use sqlx::SqlitePool;

use crate::{is_missing_table, DbError};

const SELECT_QUALIFIED: &str = "SELECT q.id, q.identity_key, q.company_id, \
            c.name AS company_name, c.url AS company_url, c.industry, c.locality, \
            q.contact_name, q.contact_email, q.source, q.qualified, q.intent_score, \
            q.diagnosed_need, q.label_confidence, q.qualified_at, q.alerted_at \
     FROM qualified_leads q \
     LEFT JOIN companies c ON c.id = q.company_id";

/// A row from `qualified_leads`, joined with company details when company-backed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QualifiedLeadRow {
    pub id: i64,
    pub identity_key: String,
    pub company_id: Option<i64>,
    pub company_name: Option<String>,
    pub company_url: Option<String>,
    pub industry: Option<String>,
    pub locality: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub source: Option<String>,
    pub qualified: bool,
    pub intent_score: i64,
    pub diagnosed_need: String,
    pub label_confidence: String,
    pub qualified_at: DateTime<Utc>,
    pub alerted_at: Option<DateTime<Utc>>,
}

impl QualifiedLeadRow {
    #[must_use]
    pub fn identity(&self) -> IdentityKey {
        match self.company_id {
            Some(id) => IdentityKey::Company(id),
            None => IdentityKey::Contact {
                name: self.contact_name.clone().unwrap_or_default(),
                email: self.contact_email.clone().unwrap_or_default(),
            },
        }
    }

    /// Company name for company-backed rows, contact name otherwise.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.company_name
            .as_deref()
            .or(self.contact_name.as_deref())
            .unwrap_or("(unknown)")
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.contact_email.as_deref().filter(|e| !e.is_empty())
    }
}

impl TryFrom<QualifiedLeadRow> for QualifiedLead {
    type Error = DbError;

    fn try_from(row: QualifiedLeadRow) -> Result<Self, Self::Error> {
        Ok(QualifiedLead {
            id: row.id,
            identity: row.identity(),
            qualified: row.qualified,
            intent_score: QualifiedLead::intent_score_from_column(row.intent_score)?,
            need: row.diagnosed_need.parse::<NeedCategory>()?,
            provenance: row.label_confidence.parse::<LabelProvenance>()?,
            qualified_at: row.qualified_at,
            alerted_at: row.alerted_at,
        })
    }
}

pub struct NewQualifiedLead<'a> {
    pub identity: &'a IdentityKey,
    pub source: Option<&'a LeadSource>,
    pub qualified: bool,
    pub intent_score: u8,
    pub need: NeedCategory,
    pub provenance: LabelProvenance,
    pub qualified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Insert or update the qualified row for an identity, atomically.
///
/// A uniqueness conflict on `identity_key` becomes an update of score, need,
/// provenance, and `qualified_at`; `alerted_at` is left untouched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the transaction fails, including a foreign-key
/// violation when a company identity has no company row.
pub async fn upsert_qualified_lead(
    pool: &SqlitePool,
    lead: &NewQualifiedLead<'_>,
) -> Result<UpsertOutcome, DbError> {
    let key = lead.identity.storage_key();
    let (company_id, contact_name, contact_email) = match lead.identity {
        IdentityKey::Company(id) => (Some(*id), None, None),
        IdentityKey::Contact { name, email } => (None, Some(name.as_str()), Some(email.as_str())),
    };

    let mut tx = pool.begin().await?;

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM qualified_leads WHERE identity_key = ?1",
    )
    .bind(&key)
    .fetch_optional(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO qualified_leads \
             (identity_key, company_id, contact_name, contact_email, source, qualified, \
              intent_score, diagnosed_need, label_confidence, qualified_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
         ON CONFLICT (identity_key) DO UPDATE SET \
             source = excluded.source, \
             qualified = excluded.qualified, \
             intent_score = excluded.intent_score, \
             diagnosed_need = excluded.diagnosed_need, \
             label_confidence = excluded.label_confidence, \
             qualified_at = excluded.qualified_at",
    )
    .bind(&key)
    .bind(company_id)
    .bind(contact_name)
    .bind(contact_email)
    .bind(lead.source.map(LeadSource::as_str))
    .bind(lead.qualified)
    .bind(i64::from(lead.intent_score))
    .bind(lead.need.as_str())
    .bind(lead.provenance.as_str())
    .bind(lead.qualified_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(if existing.is_some() {
        UpsertOutcome::Updated
    } else {
        UpsertOutcome::Inserted
    })
}

/// List all qualified rows, most recently qualified first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_qualified_leads(pool: &SqlitePool) -> Result<Vec<QualifiedLeadRow>, DbError> {
    let rows = sqlx::query_as::<_, QualifiedLeadRow>(&format!(
        "{SELECT_QUALIFIED} ORDER BY q.qualified_at DESC, q.id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Load every qualified lead as a validated domain record.
///
/// A store where the table does not exist yet is treated as empty.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on any other query failure, or
/// [`DbError::InvalidRow`] if a stored row fails validation.
pub async fn fetch_qualified_records(pool: &SqlitePool) -> Result<Vec<QualifiedLead>, DbError> {
    let rows = match list_qualified_leads(pool).await {
        Ok(rows) => rows,
        Err(DbError::Sqlx(ref e)) if is_missing_table(e) => {
            tracing::debug!("qualified_leads table missing; treating as empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    rows.into_iter().map(QualifiedLead::try_from).collect()
}

/// Rows at or above `threshold` that have never been alerted, highest score first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_pending_alerts(
    pool: &SqlitePool,
    threshold: u8,
) -> Result<Vec<QualifiedLeadRow>, DbError> {
    let rows = sqlx::query_as::<_, QualifiedLeadRow>(&format!(
        "{SELECT_QUALIFIED} \
         WHERE q.intent_score >= ?1 AND q.alerted_at IS NULL \
         ORDER BY q.intent_score DESC, q.id"
    ))
    .bind(i64::from(threshold))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Stamp `alerted_at` on the given rows, skipping any already stamped.
///
/// Returns the number of rows newly marked.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the transaction fails; no row is marked then.
pub async fn mark_leads_alerted(
    pool: &SqlitePool,
    ids: &[i64],
    alerted_at: DateTime<Utc>,
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut marked: u64 = 0;

    for id in ids {
        let result = sqlx::query(
            "UPDATE qualified_leads SET alerted_at = ?1 \
             WHERE id = ?2 AND alerted_at IS NULL",
        )
        .bind(alerted_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        marked += result.rows_affected();
    }

    tx.commit().await?;
    Ok(usize::try_from(marked).unwrap_or(usize::MAX))
}
