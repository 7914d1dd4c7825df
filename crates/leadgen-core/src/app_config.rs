use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How raw records are turned into feature vectors.
///
/// Chosen once per deployment at training time; the fitted extractor is frozen
/// into the model file and inference never consults this setting again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureStrategy {
    Handcrafted,
    Lexical,
}

impl std::fmt::Display for FeatureStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureStrategy::Handcrafted => write!(f, "handcrafted"),
            FeatureStrategy::Lexical => write!(f, "lexical"),
        }
    }
}

/// Natural language of the ingested text. Selects stopwords and stemming rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Spanish,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::English => write!(f, "english"),
            Language::Spanish => write!(f, "spanish"),
        }
    }
}

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub model_path: PathBuf,
    pub feature_strategy: FeatureStrategy,
    pub language: Language,
    pub max_vocabulary: usize,
    pub decision_threshold: f64,
    pub alert_threshold: u8,
    pub high_intent_sources: Vec<String>,
    pub behavior_threshold: f64,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub smtp: Option<SmtpConfig>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("model_path", &self.model_path)
            .field("feature_strategy", &self.feature_strategy)
            .field("language", &self.language)
            .field("max_vocabulary", &self.max_vocabulary)
            .field("decision_threshold", &self.decision_threshold)
            .field("alert_threshold", &self.alert_threshold)
            .field("high_intent_sources", &self.high_intent_sources)
            .field("behavior_threshold", &self.behavior_threshold)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("smtp", &self.smtp)
            .finish()
    }
}
