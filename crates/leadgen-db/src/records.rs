//! Assembles scoreable [`RawRecord`]s from the raw tables.

use std::collections::BTreeMap;

use leadgen_core::{Company, Mention, RawLead, RawRecord};
use sqlx::SqlitePool;

use crate::{list_companies, list_mentions, list_raw_leads, DbError};

/// Load every raw record: companies with their mentions, then contacts.
///
/// Companies without any mention have no text to score and are left out.
/// Contact leads sharing an identity are merged into a single record.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any of the underlying queries fail.
pub async fn fetch_raw_records(pool: &SqlitePool) -> Result<Vec<RawRecord>, DbError> {
    let companies = list_companies(pool).await?;
    let mentions = list_mentions(pool).await?;
    let leads = list_raw_leads(pool).await?;

    let mut by_company: BTreeMap<i64, Vec<Mention>> = BTreeMap::new();
    for row in mentions {
        by_company.entry(row.company_id).or_default().push(Mention::from(row));
    }

    let mut records: Vec<RawRecord> = companies
        .into_iter()
        .filter_map(|row| {
            let mentions = by_company.remove(&row.id)?;
            Some(RawRecord::Company {
                company: Company::from(row),
                mentions,
            })
        })
        .collect();

    let company_count = records.len();
    records.extend(RawRecord::contacts_from(
        leads.into_iter().map(RawLead::from).collect(),
    ));

    tracing::debug!(
        companies = company_count,
        contacts = records.len() - company_count,
        "fetched raw records"
    );

    Ok(records)
}
