//! Report and alert command handlers.

use chrono::Utc;
use leadgen_alert::{DispatchOutcome, LeadReport, SmtpNotifier};
use leadgen_core::AppConfig;
use sqlx::SqlitePool;

/// Print the markdown summary of every qualified lead.
///
/// # Errors
///
/// Returns an error if the qualified leads cannot be read.
pub(crate) async fn run_report(pool: &SqlitePool) -> anyhow::Result<()> {
    let rows = leadgen_db::list_qualified_leads(pool).await?;
    if rows.is_empty() {
        println!("no qualified leads yet; run `leadgen qualify` first");
        return Ok(());
    }

    let report = LeadReport::from_rows(&rows);
    print!("{}", report.render_markdown(Utc::now()));
    Ok(())
}

/// Send one alert for every pending lead at or above `threshold`.
///
/// With `dry_run` the alert is printed and nothing is sent or marked.
///
/// # Errors
///
/// Returns an error if SMTP is not configured (outside a dry run), the pending
/// batch cannot be read, or delivery fails. A failed delivery marks nothing.
pub(crate) async fn run_alert(
    pool: &SqlitePool,
    config: &AppConfig,
    threshold: u8,
    dry_run: bool,
) -> anyhow::Result<()> {
    if dry_run {
        let batch = leadgen_db::list_pending_alerts(pool, threshold).await?;
        if batch.is_empty() {
            println!("no new leads at or above intent {threshold}");
            return Ok(());
        }
        let email = leadgen_alert::render_alert_email(&batch);
        println!("[dry-run] would send: {}\n", email.subject);
        print!("{}", email.body);
        return Ok(());
    }

    let Some(smtp) = config.smtp.as_ref() else {
        anyhow::bail!("SMTP is not configured; set LEADGEN_SMTP_HOST or use --dry-run");
    };
    let notifier = SmtpNotifier::from_config(smtp)?;

    match leadgen_alert::dispatch_alerts(pool, &notifier, threshold, Utc::now()).await? {
        DispatchOutcome::NothingPending => {
            println!("no new leads at or above intent {threshold}");
        }
        DispatchOutcome::Sent { leads, marked } => {
            println!("alert sent for {leads} leads ({marked} marked)");
        }
    }
    Ok(())
}
