//! Training and qualification command handlers.
//!
//! A qualification pass is tracked as a run (queued, running, then completed
//! or failed) so `leadgen runs` can show what happened and when.

use std::path::Path;

use chrono::Utc;
use leadgen_core::AppConfig;
use leadgen_db::RunCounts;
use leadgen_scoring::{
    BootstrapLabelPolicy, DbLeadStore, HistoricalOutcomes, LabelSource, LeadModel, LeadStore,
    QualifyOptions, RunStatus, RunSummary, TrainOptions,
};
use sqlx::SqlitePool;

const RUN_TRIGGER: &str = "cli";

/// Train a model on the current raw records and save it to the configured path.
///
/// Labels come from `outcomes` when given, otherwise from the bootstrap policy.
///
/// # Errors
///
/// Returns an error if the records cannot be read, the outcome file is invalid,
/// training has too little data, or the model cannot be written.
pub(crate) async fn run_train(
    pool: &SqlitePool,
    config: &AppConfig,
    outcomes: Option<&Path>,
) -> anyhow::Result<()> {
    let records = leadgen_db::fetch_raw_records(pool).await?;

    let labels: Box<dyn LabelSource> = match outcomes {
        Some(path) => {
            let file = leadgen_core::load_outcome_file(path)?;
            let historical = HistoricalOutcomes::from_file(&file);
            tracing::info!(path = %path.display(), outcomes = historical.len(), "using historical labels");
            Box::new(historical)
        }
        None => Box::new(BootstrapLabelPolicy::from_app_config(config)),
    };

    let options = TrainOptions::from_app_config(config);
    let model = LeadModel::train(&records, labels.as_ref(), &options, Utc::now())?;
    model.save(&config.model_path)?;

    println!(
        "trained {} model on {} examples ({} positive), saved to {}",
        model.provenance.as_str(),
        model.training_examples,
        model.positive_examples,
        config.model_path.display()
    );
    if let Some(eval) = model.evaluation {
        println!(
            "holdout of {}: accuracy {:.2}, precision {:.2}, recall {:.2}",
            eval.holdout_size, eval.accuracy, eval.precision, eval.recall
        );
    }
    if model.provenance.is_low_confidence() {
        println!("note: bootstrap labels are heuristic; treat scores as lower confidence");
    }
    Ok(())
}

/// Run one qualification pass over the store.
///
/// A dry run scores and prints without writing and is not recorded as a run.
///
/// # Errors
///
/// Returns an error if the run cannot be tracked, the store cannot be read,
/// or the model is needed but unavailable. Per-record failures are reported in
/// the summary and do not fail the run.
pub(crate) async fn run_qualify(
    pool: &SqlitePool,
    config: &AppConfig,
    options: QualifyOptions,
) -> anyhow::Result<()> {
    let store = DbLeadStore::new(pool.clone());
    let model_path = config.model_path.clone();
    let load_model = move || LeadModel::load(&model_path);

    if options.dry_run {
        let summary =
            leadgen_scoring::run_qualification(&store, load_model, options, Utc::now()).await?;
        print_summary(&summary, true);
        return Ok(());
    }

    let run = leadgen_db::create_qualification_run(pool, RUN_TRIGGER).await?;
    if let Err(e) = leadgen_db::start_qualification_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    match qualify_tracked(&store, load_model, options).await {
        Ok(summary) => {
            let counts = RunCounts {
                attempted: to_count(summary.attempted),
                succeeded: to_count(summary.succeeded),
                skipped: to_count(summary.skipped.len()),
            };
            if let Err(e) = leadgen_db::complete_qualification_run(pool, run.id, counts).await {
                fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
                return Err(e.into());
            }
            tracing::info!(run = %run.public_id, attempted = counts.attempted, succeeded = counts.succeeded, "qualification run completed");
            print_summary(&summary, false);
            Ok(())
        }
        Err(e) => {
            fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
            Err(e)
        }
    }
}

async fn qualify_tracked<S, F>(
    store: &S,
    load_model: F,
    options: QualifyOptions,
) -> anyhow::Result<RunSummary>
where
    S: LeadStore,
    F: FnOnce() -> Result<LeadModel, leadgen_scoring::ScoringError>,
{
    let summary = leadgen_scoring::run_qualification(store, load_model, options, Utc::now()).await?;
    Ok(summary)
}

fn print_summary(summary: &RunSummary, dry_run: bool) {
    if summary.status == RunStatus::NoNewLeads {
        println!("no new leads to qualify");
        return;
    }

    for scored in &summary.scored {
        let verdict = if scored.score.qualified {
            "qualified"
        } else {
            "not qualified"
        };
        println!(
            "{:<32} {:>3}%  {:<8} {}",
            scored.name,
            scored.score.intent_score,
            scored.score.need.as_str(),
            verdict
        );
    }
    for skipped in &summary.skipped {
        println!("skipped {}: {}", skipped.identity, skipped.reason);
    }

    if dry_run {
        println!(
            "dry run: scored {} of {} records, nothing written",
            summary.succeeded, summary.attempted
        );
    } else {
        println!(
            "qualified {} of {} records ({} new, {} updated, {} skipped)",
            summary.succeeded,
            summary.attempted,
            summary.inserted,
            summary.updated,
            summary.skipped.len()
        );
    }
    if summary
        .provenance
        .is_some_and(leadgen_core::LabelProvenance::is_low_confidence)
    {
        println!("note: scores come from a bootstrap-labeled model (lower confidence)");
    }
}

/// Print the most recent qualification runs, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn run_list_runs(pool: &SqlitePool, limit: i64) -> anyhow::Result<()> {
    let runs = leadgen_db::list_qualification_runs(pool, limit.max(1)).await?;
    if runs.is_empty() {
        println!("no qualification runs yet; run `leadgen qualify` first");
        return Ok(());
    }

    println!(
        "{:<6}{:<11}{:<22}{:>10}{:>10}{:>9}  ERROR",
        "ID", "STATUS", "STARTED", "ATTEMPTED", "SUCCEEDED", "SKIPPED"
    );
    for run in &runs {
        let started = run
            .started_at
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
        println!(
            "{:<6}{:<11}{:<22}{:>10}{:>10}{:>9}  {}",
            run.id,
            run.status,
            started,
            run.attempted,
            run.succeeded,
            run.skipped,
            run.error_message.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// Attempt to mark a qualification run as failed, logging any secondary error.
async fn fail_run_best_effort(pool: &SqlitePool, run_id: i64, message: String) {
    if let Err(mark_err) = leadgen_db::fail_qualification_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark qualification run as failed"
        );
    }
}

fn to_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
