//! Alert dispatch against an in-memory store with a recording notifier.

use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use leadgen_alert::{
    dispatch_alerts, render_alert_email, AlertEmail, AlertError, DispatchOutcome, LeadReport,
    Notifier,
};
use leadgen_core::{IdentityKey, LabelProvenance, LeadSource, NeedCategory};
use leadgen_db::{
    connect_in_memory, insert_raw_lead, list_pending_alerts, list_qualified_leads,
    upsert_qualified_lead, NewQualifiedLead, NewRawLead,
};
use sqlx::SqlitePool;

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<AlertEmail>>,
    fail: bool,
}

impl Notifier for RecordingNotifier {
    async fn send(&self, email: &AlertEmail) -> Result<(), AlertError> {
        if self.fail {
            return Err(AlertError::Delivery("relay refused connection".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, hour, 0, 0).unwrap()
}

async fn seed(pool: &SqlitePool, name: &str, score: u8, need: NeedCategory) {
    let email = format!("{}@example.com", name.to_lowercase());
    insert_raw_lead(
        pool,
        &NewRawLead {
            name,
            email: Some(&email),
            message: Some("hello"),
            source: &LeadSource::ContactForm,
            received_at: at(0),
            form_filled: None,
            email_interaction: None,
        },
    )
    .await
    .unwrap();

    let identity = IdentityKey::contact(name, Some(&email));
    upsert_qualified_lead(
        pool,
        &NewQualifiedLead {
            identity: &identity,
            source: Some(&LeadSource::ContactForm),
            qualified: score >= 50,
            intent_score: score,
            need,
            provenance: LabelProvenance::Bootstrap,
            qualified_at: at(1),
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn successful_dispatch_marks_the_batch_once() {
    let pool = connect_in_memory().await.unwrap();
    seed(&pool, "Ana", 92, NeedCategory::Pricing).await;
    seed(&pool, "Bo", 81, NeedCategory::Demo).await;
    seed(&pool, "Cy", 40, NeedCategory::General).await;
    let notifier = RecordingNotifier::default();

    let outcome = dispatch_alerts(&pool, &notifier, 80, at(2)).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Sent { leads: 2, marked: 2 });

    let sent = notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("ana@example.com"));
    assert!(sent[0].body.contains("Bo"));
    assert!(!sent[0].body.contains("Cy"));

    let again = dispatch_alerts(&pool, &notifier, 80, at(3)).await.unwrap();
    assert_eq!(again, DispatchOutcome::NothingPending);
    assert_eq!(notifier.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_dispatch_marks_nothing() {
    let pool = connect_in_memory().await.unwrap();
    seed(&pool, "Ana", 95, NeedCategory::Pricing).await;
    let notifier = RecordingNotifier {
        fail: true,
        ..RecordingNotifier::default()
    };

    let err = dispatch_alerts(&pool, &notifier, 80, at(2)).await.unwrap_err();
    assert!(matches!(err, AlertError::Delivery(_)));
    assert_eq!(list_pending_alerts(&pool, 80).await.unwrap().len(), 1);
}

#[tokio::test]
async fn alert_email_lists_lead_details() {
    let pool = connect_in_memory().await.unwrap();
    seed(&pool, "Ana", 88, NeedCategory::Pricing).await;

    let batch = list_pending_alerts(&pool, 80).await.unwrap();
    let email = render_alert_email(&batch);

    assert_eq!(email.subject, "1 new high-intent lead(s)");
    assert!(email.body.contains("- Ana"));
    assert!(email.body.contains("Intent: 88%"));
    assert!(email.body.contains("Source: contact_form"));
    assert!(email.body.contains("lower confidence"));
}

#[tokio::test]
async fn alert_email_body_layout() {
    let pool = connect_in_memory().await.unwrap();
    seed(&pool, "Ana", 88, NeedCategory::Pricing).await;

    let email = render_alert_email(&list_pending_alerts(&pool, 80).await.unwrap());
    assert_eq!(
        email.body,
        "The following leads scored above the alert threshold:\n\n\
         - Ana\n  \
         Email: ana@example.com\n  \
         Intent: 88%  Need: Pricing / quote request\n  \
         Source: contact_form\n  \
         (bootstrap-labeled model: lower confidence)\n\n\
         Please follow up soon.\n"
    );
}

#[tokio::test]
async fn report_reflects_stored_rows() {
    let pool = connect_in_memory().await.unwrap();
    seed(&pool, "Ana", 88, NeedCategory::Pricing).await;
    seed(&pool, "Bo", 12, NeedCategory::General).await;

    let report = LeadReport::from_rows(&list_qualified_leads(&pool).await.unwrap());
    assert_eq!(report.total, 2);
    assert_eq!(report.qualified, 1);
    assert_eq!(report.sources["contact_form"], 2);
    assert!(report.is_low_confidence());
}
