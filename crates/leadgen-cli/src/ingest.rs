//! Ingestion command handlers: contact forms, web mentions, and intake files.

use std::path::Path;

use chrono::Utc;
use leadgen_core::{IntakeFile, LeadSource};
use leadgen_db::{NewCompany, NewRawLead};
use sqlx::SqlitePool;

/// A contact form submission counts as one completed form.
const FORM_FILLED_SIGNAL: f64 = 1.0;

pub(crate) struct MentionArgs<'a> {
    pub company: &'a str,
    pub text: &'a str,
    pub source: Option<&'a str>,
    pub url: Option<&'a str>,
    pub industry: Option<&'a str>,
    pub locality: Option<&'a str>,
}

/// Store one contact-form submission as a raw lead.
///
/// # Errors
///
/// Returns an error if the name is blank or the insert fails.
pub(crate) async fn run_ingest_form(
    pool: &SqlitePool,
    name: &str,
    email: Option<&str>,
    message: Option<&str>,
) -> anyhow::Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("--name must not be blank");
    }

    let id = leadgen_db::insert_raw_lead(
        pool,
        &NewRawLead {
            name: name.trim(),
            email: email.map(str::trim).filter(|e| !e.is_empty()),
            message,
            source: &LeadSource::ContactForm,
            received_at: Utc::now(),
            form_filled: Some(FORM_FILLED_SIGNAL),
            email_interaction: None,
        },
    )
    .await?;

    tracing::info!(raw_lead_id = id, "contact form recorded");
    println!("recorded raw lead {id}");
    Ok(())
}

/// Store a mention, creating the company on first sight.
///
/// # Errors
///
/// Returns an error if the company or text is blank, or a write fails.
pub(crate) async fn run_ingest_mention(
    pool: &SqlitePool,
    args: &MentionArgs<'_>,
) -> anyhow::Result<()> {
    if args.company.trim().is_empty() {
        anyhow::bail!("--company must not be blank");
    }
    if args.text.trim().is_empty() {
        anyhow::bail!("--text must not be blank");
    }

    let source = args.source.map_or(LeadSource::WebScraping, LeadSource::from);
    let now = Utc::now();
    let company_id = leadgen_db::upsert_company(
        pool,
        &NewCompany {
            name: args.company,
            url: args.url,
            industry: args.industry,
            locality: args.locality,
        },
        now,
    )
    .await?;
    let mention_id =
        leadgen_db::insert_mention(pool, company_id, args.text, Some(&source), now).await?;

    tracing::info!(company_id, mention_id, "mention recorded");
    println!("recorded mention {mention_id} for company {company_id}");
    Ok(())
}

/// Import every lead and mention from a YAML intake file.
///
/// The file is validated in full before anything is written. Rows are written
/// one at a time; a failure part way leaves earlier rows in place.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or a write fails.
pub(crate) async fn run_ingest_file(pool: &SqlitePool, path: &Path) -> anyhow::Result<()> {
    let intake = leadgen_core::load_intake_file(path)?;
    let (leads, mentions) = import_intake(pool, &intake).await?;

    tracing::info!(path = %path.display(), leads, mentions, "intake file imported");
    println!("imported {leads} leads and {mentions} mentions from {}", path.display());
    Ok(())
}

/// Write an already-validated intake batch. Returns `(leads, mentions)` written.
pub(crate) async fn import_intake(
    pool: &SqlitePool,
    intake: &IntakeFile,
) -> anyhow::Result<(usize, usize)> {
    let now = Utc::now();

    for lead in &intake.leads {
        let source = lead.source_or_default();
        leadgen_db::insert_raw_lead(
            pool,
            &NewRawLead {
                name: lead.name.trim(),
                email: lead.email.as_deref().map(str::trim).filter(|e| !e.is_empty()),
                message: lead.message.as_deref(),
                source: &source,
                received_at: now,
                form_filled: lead.form_filled,
                email_interaction: lead.email_interaction,
            },
        )
        .await?;
    }

    for mention in &intake.mentions {
        let company_id = leadgen_db::upsert_company(
            pool,
            &NewCompany {
                name: &mention.company,
                url: mention.url.as_deref(),
                industry: mention.industry.as_deref(),
                locality: mention.locality.as_deref(),
            },
            now,
        )
        .await?;
        leadgen_db::insert_mention(
            pool,
            company_id,
            &mention.text,
            mention.source.as_ref(),
            now,
        )
        .await?;
    }

    Ok((intake.leads.len(), intake.mentions.len()))
}
