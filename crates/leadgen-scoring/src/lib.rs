//! Lead scoring for leadgen.
//!
//! Turns raw records into feature vectors, trains a logistic-regression model
//! from bootstrap or historical labels, and runs the qualification pipeline:
//! deduplicate against already-qualified identities, score what is new, and
//! upsert the results through a [`LeadStore`].

pub mod classifier;
pub mod dedup;
pub mod error;
pub mod features;
pub mod keywords;
pub mod labeling;
pub mod model;
pub mod pipeline;
pub mod store;
pub mod text;

pub use classifier::{Evaluation, TrainingParams};
pub use dedup::pending_records;
pub use error::ScoringError;
pub use features::FeatureExtractor;
pub use keywords::{diagnose_need, keyword_hits, KeywordHits};
pub use labeling::{BootstrapLabelPolicy, HistoricalOutcomes, LabelSource};
pub use model::{intent_score, LeadModel, Score, TrainOptions};
pub use pipeline::{
    run_qualification, QualifyOptions, RunStatus, RunSummary, ScoredRecord, SkippedRecord,
};
pub use store::{DbLeadStore, LeadStore};
