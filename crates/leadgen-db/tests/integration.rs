//! Store-level tests against a private in-memory SQLite database.

use chrono::{DateTime, TimeZone, Utc};
use leadgen_core::{
    AppConfig, FeatureStrategy, IdentityKey, LabelProvenance, Language, LeadSource, NeedCategory,
    RawRecord,
};
use leadgen_db::{
    complete_qualification_run, connect_in_memory, create_qualification_run, delete_raw_lead,
    fail_qualification_run, fetch_qualified_records, fetch_raw_records, get_qualification_run,
    insert_mention, insert_raw_lead, list_pending_alerts, list_qualification_runs,
    list_qualified_leads, mark_leads_alerted, start_qualification_run, upsert_company,
    upsert_qualified_lead, DbError, NewCompany, NewQualifiedLead, NewRawLead, PoolConfig,
    RunCounts, UpsertOutcome,
};
use sqlx::SqlitePool;
use std::path::PathBuf;

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, minute, 0).unwrap()
}

async fn seed_company(pool: &SqlitePool, name: &str) -> i64 {
    upsert_company(
        pool,
        &NewCompany {
            name,
            url: None,
            industry: Some("logistics"),
            locality: None,
        },
        at(0),
    )
    .await
    .unwrap()
}

async fn seed_lead(pool: &SqlitePool, name: &str, email: Option<&str>, minute: u32) -> i64 {
    insert_raw_lead(
        pool,
        &NewRawLead {
            name,
            email,
            message: Some("please send pricing"),
            source: &LeadSource::ContactForm,
            received_at: at(minute),
            form_filled: Some(1.0),
            email_interaction: None,
        },
    )
    .await
    .unwrap()
}

fn qualified<'a>(identity: &'a IdentityKey, score: u8, when: DateTime<Utc>) -> NewQualifiedLead<'a> {
    NewQualifiedLead {
        identity,
        source: None,
        qualified: score >= 50,
        intent_score: score,
        need: NeedCategory::Pricing,
        provenance: LabelProvenance::Bootstrap,
        qualified_at: when,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "sqlite://leads.db".to_string(),
        log_level: "info".to_string(),
        model_path: PathBuf::from("./models/lead_model.json"),
        feature_strategy: FeatureStrategy::Handcrafted,
        language: Language::English,
        max_vocabulary: 1000,
        decision_threshold: 0.5,
        alert_threshold: 80,
        high_intent_sources: vec!["contact_form".to_string()],
        behavior_threshold: 0.0,
        db_max_connections: 42,
        db_acquire_timeout_secs: 9,
        smtp: None,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[tokio::test]
async fn upsert_company_returns_same_id_and_keeps_details() {
    let pool = connect_in_memory().await.unwrap();
    let first = seed_company(&pool, "Acme Freight").await;
    let second = upsert_company(
        &pool,
        &NewCompany {
            name: "  Acme Freight ",
            url: Some("https://acme.example"),
            industry: Some("shipping"),
            locality: None,
        },
        at(5),
    )
    .await
    .unwrap();

    assert_eq!(first, second);
    let row = leadgen_db::get_company_by_name(&pool, "Acme Freight")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.industry.as_deref(), Some("logistics"));
    assert_eq!(row.url.as_deref(), Some("https://acme.example"));
}

#[tokio::test]
async fn raw_records_group_mentions_and_merge_contacts() {
    let pool = connect_in_memory().await.unwrap();
    let acme = seed_company(&pool, "Acme").await;
    seed_company(&pool, "Silent Co").await;
    insert_mention(&pool, acme, "second", None, at(2)).await.unwrap();
    insert_mention(&pool, acme, "first", Some(&LeadSource::WebScraping), at(1))
        .await
        .unwrap();
    seed_lead(&pool, "Ana", Some("Ana@Example.com"), 3).await;
    seed_lead(&pool, "Ana", Some("ana@example.com "), 4).await;
    seed_lead(&pool, "Bo", None, 5).await;

    let records = fetch_raw_records(&pool).await.unwrap();

    assert_eq!(records.len(), 3, "silent company has no mentions");
    assert_eq!(records[0].identity(), IdentityKey::Company(acme));
    assert_eq!(records[0].text(), "first\nsecond");
    assert_eq!(
        records[1].identity(),
        IdentityKey::contact("Ana", Some("ana@example.com"))
    );
    assert_eq!(records[1].text(), "please send pricing\nplease send pricing");
    assert!(matches!(records[2], RawRecord::Contact(_)));
}

#[tokio::test]
async fn upsert_qualified_lead_inserts_then_updates_one_row() {
    let pool = connect_in_memory().await.unwrap();
    seed_lead(&pool, "Ana", Some("ana@example.com"), 1).await;
    let identity = IdentityKey::contact("Ana", Some("ana@example.com"));

    let first = upsert_qualified_lead(&pool, &qualified(&identity, 40, at(10)))
        .await
        .unwrap();
    let second = upsert_qualified_lead(&pool, &qualified(&identity, 90, at(20)))
        .await
        .unwrap();

    assert_eq!(first, UpsertOutcome::Inserted);
    assert_eq!(second, UpsertOutcome::Updated);

    let records = fetch_qualified_records(&pool).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].intent_score, 90);
    assert!(records[0].qualified);
    assert_eq!(records[0].qualified_at, at(20));
}

#[tokio::test]
async fn company_identity_requires_company_row() {
    let pool = connect_in_memory().await.unwrap();
    let identity = IdentityKey::Company(999);

    let err = upsert_qualified_lead(&pool, &qualified(&identity, 70, at(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Sqlx(_)));
}

#[tokio::test]
async fn alerts_are_marked_exactly_once_and_survive_rescoring() {
    let pool = connect_in_memory().await.unwrap();
    let acme = seed_company(&pool, "Acme").await;
    let beta = seed_company(&pool, "Beta").await;
    let hot = IdentityKey::Company(acme);
    let cold = IdentityKey::Company(beta);
    upsert_qualified_lead(&pool, &qualified(&hot, 95, at(1))).await.unwrap();
    upsert_qualified_lead(&pool, &qualified(&cold, 30, at(1))).await.unwrap();

    let pending = list_pending_alerts(&pool, 80).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].display_name(), "Acme");

    let ids: Vec<i64> = pending.iter().map(|r| r.id).collect();
    assert_eq!(mark_leads_alerted(&pool, &ids, at(2)).await.unwrap(), 1);
    assert_eq!(mark_leads_alerted(&pool, &ids, at(3)).await.unwrap(), 0);

    upsert_qualified_lead(&pool, &qualified(&hot, 99, at(4))).await.unwrap();
    assert!(list_pending_alerts(&pool, 80).await.unwrap().is_empty());

    let rows = list_qualified_leads(&pool).await.unwrap();
    let hot_row = rows.iter().find(|r| r.company_id == Some(acme)).unwrap();
    assert_eq!(hot_row.alerted_at, Some(at(2)));
}

#[tokio::test]
async fn deleting_company_cascades_to_qualified_row() {
    let pool = connect_in_memory().await.unwrap();
    let acme = seed_company(&pool, "Acme").await;
    insert_mention(&pool, acme, "pricing please", None, at(1))
        .await
        .unwrap();
    upsert_qualified_lead(&pool, &qualified(&IdentityKey::Company(acme), 60, at(2)))
        .await
        .unwrap();

    sqlx::query("DELETE FROM companies WHERE id = ?1")
        .bind(acme)
        .execute(&pool)
        .await
        .unwrap();

    assert!(fetch_qualified_records(&pool).await.unwrap().is_empty());
    assert!(fetch_raw_records(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_last_raw_lead_removes_contact_qualified_row() {
    let pool = connect_in_memory().await.unwrap();
    let first = seed_lead(&pool, "Ana", Some("ana@example.com"), 1).await;
    let second = seed_lead(&pool, " Ana", Some("ANA@example.com"), 2).await;
    let identity = IdentityKey::contact("Ana", Some("ana@example.com"));
    upsert_qualified_lead(&pool, &qualified(&identity, 70, at(3)))
        .await
        .unwrap();

    delete_raw_lead(&pool, first).await.unwrap();
    assert_eq!(fetch_qualified_records(&pool).await.unwrap().len(), 1);

    delete_raw_lead(&pool, second).await.unwrap();
    assert!(fetch_qualified_records(&pool).await.unwrap().is_empty());

    assert!(matches!(
        delete_raw_lead(&pool, second).await,
        Err(DbError::NotFound)
    ));
}

#[tokio::test]
async fn deleting_raw_lead_with_non_ascii_email_removes_qualified_row() {
    let pool = connect_in_memory().await.unwrap();
    let id = seed_lead(&pool, "Élena", Some("ÉLENA@example.com"), 1).await;
    let identity = IdentityKey::contact("Élena", Some("ÉLENA@example.com"));
    upsert_qualified_lead(&pool, &qualified(&identity, 75, at(2)))
        .await
        .unwrap();

    delete_raw_lead(&pool, id).await.unwrap();

    assert!(fetch_raw_records(&pool).await.unwrap().is_empty());
    assert!(fetch_qualified_records(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn non_ascii_variant_keeps_qualified_row_while_a_raw_lead_remains() {
    let pool = connect_in_memory().await.unwrap();
    let upper = seed_lead(&pool, "Élena", Some("ÉLENA@example.com"), 1).await;
    seed_lead(&pool, "Élena", Some("élena@example.com"), 2).await;
    let identity = IdentityKey::contact("Élena", Some("élena@example.com"));
    upsert_qualified_lead(&pool, &qualified(&identity, 75, at(3)))
        .await
        .unwrap();

    delete_raw_lead(&pool, upper).await.unwrap();

    assert_eq!(fetch_qualified_records(&pool).await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_qualified_table_reads_as_empty() {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    assert!(fetch_qualified_records(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn qualification_run_follows_lifecycle() {
    let pool = connect_in_memory().await.unwrap();
    let run = create_qualification_run(&pool, "cli").await.unwrap();
    assert_eq!(run.status, "queued");
    assert_eq!(run.public_id.len(), 36);

    let err = complete_qualification_run(&pool, run.id, RunCounts::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::InvalidRunTransition {
            expected_status: "running",
            ..
        }
    ));

    start_qualification_run(&pool, run.id).await.unwrap();
    complete_qualification_run(
        &pool,
        run.id,
        RunCounts {
            attempted: 3,
            succeeded: 2,
            skipped: 1,
        },
    )
    .await
    .unwrap();

    let done = get_qualification_run(&pool, run.id).await.unwrap();
    assert_eq!(done.status, "succeeded");
    assert_eq!((done.attempted, done.succeeded, done.skipped), (3, 2, 1));
    assert!(done.started_at.is_some() && done.completed_at.is_some());

    assert!(fail_qualification_run(&pool, run.id, "late").await.is_err());
}

#[tokio::test]
async fn failed_runs_keep_their_message_and_list_newest_first() {
    let pool = connect_in_memory().await.unwrap();
    let older = create_qualification_run(&pool, "cli").await.unwrap();
    start_qualification_run(&pool, older.id).await.unwrap();
    fail_qualification_run(&pool, older.id, "model unavailable")
        .await
        .unwrap();
    let newer = create_qualification_run(&pool, "pipeline").await.unwrap();

    let runs = list_qualification_runs(&pool, 10).await.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].id, newer.id);
    assert_eq!(runs[1].status, "failed");
    assert_eq!(runs[1].error_message.as_deref(), Some("model unavailable"));

    assert!(matches!(
        get_qualification_run(&pool, 4242).await,
        Err(DbError::NotFound)
    ));
}
