//! High-intent alert batches: select, send once, mark.

use std::future::Future;

use chrono::{DateTime, Utc};
use leadgen_core::NeedCategory;
use leadgen_db::{list_pending_alerts, mark_leads_alerted, QualifiedLeadRow};
use sqlx::SqlitePool;

use crate::error::AlertError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEmail {
    pub subject: String,
    pub body: String,
}

/// Delivery channel for alert emails.
pub trait Notifier {
    fn send(&self, email: &AlertEmail) -> impl Future<Output = Result<(), AlertError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No lead met the threshold without an earlier alert.
    NothingPending,
    Sent { leads: usize, marked: usize },
}

/// Plain-text alert listing each lead's name, email, intent, need, and source.
#[must_use]
pub fn render_alert_email(batch: &[QualifiedLeadRow]) -> AlertEmail {
    let subject = format!("{} new high-intent lead(s)", batch.len());

    let mut body = String::from("The following leads scored above the alert threshold:\n\n");
    for row in batch {
        let need = row
            .diagnosed_need
            .parse::<NeedCategory>()
            .map_or_else(|_| row.diagnosed_need.clone(), |n| n.label().to_string());
        body.push_str(&format!("- {}\n", row.display_name()));
        body.push_str(&format!("  Email: {}\n", row.email().unwrap_or("-")));
        body.push_str(&format!("  Intent: {}%  Need: {}\n", row.intent_score, need));
        body.push_str(&format!(
            "  Source: {}\n",
            row.source.as_deref().unwrap_or("unknown")
        ));
        if row.label_confidence == "bootstrap" {
            body.push_str("  (bootstrap-labeled model: lower confidence)\n");
        }
        body.push('\n');
    }
    body.push_str("Please follow up soon.\n");

    AlertEmail { subject, body }
}

/// Send one alert covering every pending lead at or above `threshold`.
///
/// The batch is marked alerted only after the notifier reports success, and
/// only rows still unmarked are stamped. On failure nothing is marked and the
/// same leads are offered again next time.
///
/// # Errors
///
/// Returns [`AlertError::Db`] if the batch cannot be read or marked, or the
/// notifier's error if delivery fails.
pub async fn dispatch_alerts<N: Notifier>(
    pool: &SqlitePool,
    notifier: &N,
    threshold: u8,
    now: DateTime<Utc>,
) -> Result<DispatchOutcome, AlertError> {
    let batch = list_pending_alerts(pool, threshold).await?;
    if batch.is_empty() {
        tracing::info!(threshold, "no new high-intent leads to alert");
        return Ok(DispatchOutcome::NothingPending);
    }

    let email = render_alert_email(&batch);
    if let Err(e) = notifier.send(&email).await {
        tracing::error!(leads = batch.len(), error = %e, "alert delivery failed; leads left unmarked");
        return Err(e);
    }

    let ids: Vec<i64> = batch.iter().map(|r| r.id).collect();
    let marked = mark_leads_alerted(pool, &ids, now).await?;
    tracing::info!(leads = batch.len(), marked, "alert sent");

    Ok(DispatchOutcome::Sent {
        leads: batch.len(),
        marked,
    })
}
