//! Qualification pipeline orchestration.

use chrono::{DateTime, Utc};
use leadgen_core::{IdentityKey, LabelProvenance};
use leadgen_db::{NewQualifiedLead, UpsertOutcome};

use crate::dedup::pending_records;
use crate::error::ScoringError;
use crate::model::{LeadModel, Score};
use crate::store::LeadStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct QualifyOptions {
    /// Score every raw record, not only those without a qualified row.
    pub rescore_all: bool,
    /// Score but do not write.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    NoNewLeads,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub identity: IdentityKey,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub identity: IdentityKey,
    pub name: String,
    pub score: Score,
    /// `None` on a dry run.
    pub outcome: Option<UpsertOutcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub status: RunStatus,
    pub attempted: usize,
    pub succeeded: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: Vec<SkippedRecord>,
    pub scored: Vec<ScoredRecord>,
    /// Provenance of the model used; `None` when no model was needed.
    pub provenance: Option<LabelProvenance>,
}

impl RunSummary {
    fn no_new_leads() -> Self {
        Self {
            status: RunStatus::NoNewLeads,
            attempted: 0,
            succeeded: 0,
            inserted: 0,
            updated: 0,
            skipped: Vec::new(),
            scored: Vec::new(),
            provenance: None,
        }
    }
}

/// Run one qualification pass.
///
/// 1. Load raw records from the store.
/// 2. Keep those without a qualified row (all of them when `rescore_all`).
/// 3. Stop with [`RunStatus::NoNewLeads`] if nothing is left; no model is loaded.
/// 4. Load the model via `load_model`.
/// 5. Validate, score, and upsert each record.
///
/// A record that fails validation, scoring, or its write is logged and listed
/// in [`RunSummary::skipped`]; the batch continues.
///
/// # Errors
///
/// Returns [`ScoringError::Store`] if the store cannot be read, or whatever
/// `load_model` returns (typically [`ScoringError::ModelUnavailable`]).
pub async fn run_qualification<S, F>(
    store: &S,
    load_model: F,
    options: QualifyOptions,
    now: DateTime<Utc>,
) -> Result<RunSummary, ScoringError>
where
    S: LeadStore,
    F: FnOnce() -> Result<LeadModel, ScoringError>,
{
    let raw = store.fetch_raw_records().await?;
    let raw_count = raw.len();

    let pending = if options.rescore_all {
        raw
    } else {
        let qualified = store.fetch_qualified_records().await?;
        pending_records(raw, &qualified)
    };

    if pending.is_empty() {
        tracing::info!(raw = raw_count, "no new leads to qualify");
        return Ok(RunSummary::no_new_leads());
    }

    let model = load_model()?;

    let mut summary = RunSummary {
        status: RunStatus::Completed,
        attempted: pending.len(),
        provenance: Some(model.provenance),
        ..RunSummary::no_new_leads()
    };

    tracing::info!(
        pending = pending.len(),
        raw = raw_count,
        rescore_all = options.rescore_all,
        dry_run = options.dry_run,
        "qualifying records"
    );

    for record in &pending {
        let identity = record.identity();
        let mut skip = |reason: String| {
            tracing::warn!(identity = %identity, reason = %reason, "skipping record");
            summary.skipped.push(SkippedRecord {
                identity: identity.clone(),
                reason,
            });
        };

        if let Err(e) = record.validate() {
            skip(e.to_string());
            continue;
        }

        let score = match model.score(record) {
            Ok(score) => score,
            Err(e) => {
                skip(format!("scoring failed: {e}"));
                continue;
            }
        };

        let outcome = if options.dry_run {
            None
        } else {
            let lead = NewQualifiedLead {
                identity: &identity,
                source: record.source(),
                qualified: score.qualified,
                intent_score: score.intent_score,
                need: score.need,
                provenance: model.provenance,
                qualified_at: now,
            };
            match store.upsert_qualified(&lead).await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    skip(format!("write failed: {e}"));
                    continue;
                }
            }
        };

        match outcome {
            Some(UpsertOutcome::Inserted) => summary.inserted += 1,
            Some(UpsertOutcome::Updated) => summary.updated += 1,
            None => {}
        }
        summary.succeeded += 1;
        summary.scored.push(ScoredRecord {
            identity: identity.clone(),
            name: record.name().to_string(),
            score,
            outcome,
        });
    }

    tracing::info!(
        attempted = summary.attempted,
        succeeded = summary.succeeded,
        inserted = summary.inserted,
        updated = summary.updated,
        skipped = summary.skipped.len(),
        "qualification run finished"
    );

    Ok(summary)
}
