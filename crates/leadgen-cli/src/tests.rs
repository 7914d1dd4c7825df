use std::path::PathBuf;

use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["leadgen", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli = Cli::try_parse_from(["leadgen", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["leadgen"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_ingest_form() {
    let cli = Cli::try_parse_from([
        "leadgen",
        "ingest",
        "form",
        "--name",
        "Ana Ruiz",
        "--email",
        "ana@example.com",
        "--message",
        "please send pricing",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Ingest {
            command: IngestCommands::Form {
                ref name,
                email: Some(ref email),
                message: Some(_),
            }
        }) if name == "Ana Ruiz" && email == "ana@example.com"
    ));
}

#[test]
fn ingest_form_requires_name() {
    assert!(Cli::try_parse_from(["leadgen", "ingest", "form", "--email", "a@b.c"]).is_err());
}

#[test]
fn parses_ingest_mention_with_details() {
    let cli = Cli::try_parse_from([
        "leadgen",
        "ingest",
        "mention",
        "--company",
        "Acme",
        "--text",
        "Acme is looking for a quote",
        "--industry",
        "logistics",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Ingest {
            command: IngestCommands::Mention {
                ref company,
                source: None,
                industry: Some(ref industry),
                ..
            }
        }) if company == "Acme" && industry == "logistics"
    ));
}

#[test]
fn parses_ingest_file_path() {
    let cli = Cli::try_parse_from(["leadgen", "ingest", "file", "leads.yaml"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Ingest {
            command: IngestCommands::File { ref path }
        }) if path == &PathBuf::from("leads.yaml")
    ));
}

#[test]
fn train_defaults_to_bootstrap_labels() {
    let cli = Cli::try_parse_from(["leadgen", "train"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Train { outcomes: None })
    ));
}

#[test]
fn train_accepts_outcomes_file() {
    let cli = Cli::try_parse_from(["leadgen", "train", "--outcomes", "won.yaml"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Train { outcomes: Some(ref p) }) if p == &PathBuf::from("won.yaml")
    ));
}

#[test]
fn qualify_flags_default_off() {
    let cli = Cli::try_parse_from(["leadgen", "qualify"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Qualify {
            rescore: false,
            dry_run: false
        })
    ));
}

#[test]
fn qualify_rescore_dry_run() {
    let cli = Cli::try_parse_from(["leadgen", "qualify", "--rescore", "--dry-run"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Qualify {
            rescore: true,
            dry_run: true
        })
    ));
}

#[test]
fn alert_threshold_is_optional() {
    let cli = Cli::try_parse_from(["leadgen", "alert"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Alert {
            threshold: None,
            dry_run: false
        })
    ));
}

#[test]
fn alert_threshold_override() {
    let cli = Cli::try_parse_from(["leadgen", "alert", "--threshold", "90", "--dry-run"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Alert {
            threshold: Some(90),
            dry_run: true
        })
    ));
}

#[test]
fn alert_threshold_above_100_is_rejected() {
    assert!(Cli::try_parse_from(["leadgen", "alert", "--threshold", "101"]).is_err());
}

#[test]
fn runs_limit_defaults_to_20() {
    let cli = Cli::try_parse_from(["leadgen", "runs"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Runs { limit: 20 })));
}

#[test]
fn parses_report_and_run() {
    let report = Cli::try_parse_from(["leadgen", "report"]).unwrap();
    assert!(matches!(report.command, Some(Commands::Report)));

    let run = Cli::try_parse_from(["leadgen", "run"]).unwrap();
    assert!(matches!(run.command, Some(Commands::Run { outcomes: None })));
}

#[tokio::test]
async fn import_intake_writes_leads_and_mentions() {
    let pool = leadgen_db::connect_in_memory().await.unwrap();
    let intake = load_intake_yaml(
        "leads:\n  - name: Ana\n    email: ana@example.com\n    message: send a quote\n\
         mentions:\n  - company: Acme\n    text: Acme wants a demo\n  - company: Acme\n    text: Acme pricing\n",
    );

    let (leads, mentions) = ingest::import_intake(&pool, &intake).await.unwrap();
    assert_eq!((leads, mentions), (1, 2));

    let raw = leadgen_db::list_raw_leads(&pool).await.unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].source, "event_list");
    assert_eq!(leadgen_db::list_companies(&pool).await.unwrap().len(), 1);
    assert_eq!(leadgen_db::list_mentions(&pool).await.unwrap().len(), 2);
}

fn load_intake_yaml(yaml: &str) -> leadgen_core::IntakeFile {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("intake.yaml");
    std::fs::write(&path, yaml).unwrap();
    leadgen_core::load_intake_file(&path).unwrap()
}
