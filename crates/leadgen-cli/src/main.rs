mod alert;
mod ingest;
mod qualify;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "leadgen")]
#[command(about = "Lead qualification pipeline: ingest, score, report, alert")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database operations
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Record raw leads and company mentions
    Ingest {
        #[command(subcommand)]
        command: IngestCommands,
    },
    /// Train the scoring model from stored records and save it
    Train {
        /// YAML file of known conversions; bootstrap labels are used without it
        #[arg(long)]
        outcomes: Option<PathBuf>,
    },
    /// Score raw records that have not been qualified yet
    Qualify {
        /// Score every raw record again, updating existing qualified rows
        #[arg(long)]
        rescore: bool,

        /// Score and print results without writing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Print a markdown summary of the qualified leads
    Report,
    /// Email the sales team about new high-intent leads
    Alert {
        /// Intent score (0-100) at or above which a lead is alerted
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        threshold: Option<u8>,

        /// Print the alert that would be sent without sending or marking it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show recent qualification runs
    Runs {
        /// Maximum number of runs to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Train, qualify, report, and alert in one pass
    Run {
        /// YAML file of known conversions used for training
        #[arg(long)]
        outcomes: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[derive(Debug, Subcommand)]
enum IngestCommands {
    /// Record a contact-form submission
    Form {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        message: Option<String>,
    },
    /// Record a mention of a company found on the web
    Mention {
        #[arg(long)]
        company: String,

        #[arg(long)]
        text: String,

        /// Channel the mention came from (default `web_scraping`)
        #[arg(long)]
        source: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        industry: Option<String>,

        #[arg(long)]
        locality: Option<String>,
    },
    /// Import leads and mentions from a YAML intake file
    File { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("leadgen: no command given; run `leadgen --help` for usage");
        return Ok(());
    };

    let config = leadgen_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = leadgen_db::PoolConfig::from_app_config(&config);
    let pool = leadgen_db::connect_pool(&config.database_url, pool_config).await?;

    let read_only = matches!(
        command,
        Commands::Db {
            command: DbCommands::Ping
        }
    );
    let applied = if read_only {
        0
    } else {
        leadgen_db::run_migrations(&pool).await?
    };
    tracing::debug!(applied, "migrations checked");

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                leadgen_db::ping(&pool).await?;
                println!("database ok");
            }
            DbCommands::Migrate => println!("migrations applied: {applied}"),
        },
        Commands::Ingest { command } => match command {
            IngestCommands::Form {
                name,
                email,
                message,
            } => {
                ingest::run_ingest_form(&pool, &name, email.as_deref(), message.as_deref()).await?;
            }
            IngestCommands::Mention {
                company,
                text,
                source,
                url,
                industry,
                locality,
            } => {
                let mention = ingest::MentionArgs {
                    company: &company,
                    text: &text,
                    source: source.as_deref(),
                    url: url.as_deref(),
                    industry: industry.as_deref(),
                    locality: locality.as_deref(),
                };
                ingest::run_ingest_mention(&pool, &mention).await?;
            }
            IngestCommands::File { path } => ingest::run_ingest_file(&pool, &path).await?,
        },
        Commands::Train { outcomes } => {
            qualify::run_train(&pool, &config, outcomes.as_deref()).await?;
        }
        Commands::Qualify { rescore, dry_run } => {
            let options = leadgen_scoring::QualifyOptions {
                rescore_all: rescore,
                dry_run,
            };
            qualify::run_qualify(&pool, &config, options).await?;
        }
        Commands::Report => alert::run_report(&pool).await?,
        Commands::Alert { threshold, dry_run } => {
            let threshold = threshold.unwrap_or(config.alert_threshold);
            alert::run_alert(&pool, &config, threshold, dry_run).await?;
        }
        Commands::Runs { limit } => qualify::run_list_runs(&pool, limit).await?,
        Commands::Run { outcomes } => run_all(&pool, &config, outcomes.as_deref()).await?,
    }

    Ok(())
}

/// Full pipeline in one process. Alerts are skipped with a warning when SMTP
/// is not configured.
async fn run_all(
    pool: &sqlx::SqlitePool,
    config: &leadgen_core::AppConfig,
    outcomes: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    qualify::run_train(pool, config, outcomes).await?;
    qualify::run_qualify(pool, config, leadgen_scoring::QualifyOptions::default()).await?;
    alert::run_report(pool).await?;

    if config.smtp.is_some() {
        alert::run_alert(pool, config, config.alert_threshold, false).await?;
    } else {
        tracing::warn!("LEADGEN_SMTP_HOST is not set; skipping alerts");
    }
    Ok(())
}

#[cfg(test)]
mod tests;
