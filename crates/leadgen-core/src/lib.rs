//! Domain types and configuration shared by every leadgen crate.

pub mod app_config;
pub mod config;
pub mod intake;
pub mod leads;
pub mod qualification;

use thiserror::Error;

pub use app_config::{AppConfig, FeatureStrategy, Language, SmtpConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use intake::{
    load_intake_file, load_outcome_file, IntakeFile, IntakeLead, IntakeMention, Outcome,
    OutcomeFile,
};
pub use leads::{Company, IdentityKey, LeadSource, Mention, RawLead, RawRecord};
pub use qualification::{LabelProvenance, NeedCategory, QualifiedLead};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    FileParse(#[from] serde_yaml::Error),

    #[error("validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("data quality problem in {record}: {reason}")]
    DataQuality { record: String, reason: String },

    #[error("unknown need category: {0}")]
    UnknownNeed(String),

    #[error("unknown label provenance: {0}")]
    UnknownProvenance(String),

    #[error("intent score {0} is outside 0..=100")]
    ScoreOutOfRange(i64),
}
