//! Training, scoring, and persistence of the lead qualification model.
//!
//! The model file is a single JSON document: a SHA-256 fingerprint followed by
//! the model payload (fitted extractor, scaler, classifier, label provenance
//! and training metadata). The fingerprint is recomputed on load and a
//! mismatch is rejected.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use leadgen_core::{AppConfig, FeatureStrategy, LabelProvenance, Language, NeedCategory, RawRecord};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::{Evaluation, LogisticRegression, StandardScaler, TrainingParams};
use crate::error::ScoringError;
use crate::features::FeatureExtractor;
use crate::keywords::{diagnose_need, keyword_hits};
use crate::labeling::LabelSource;

pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Seed for the train/holdout shuffle.
pub const HOLDOUT_SEED: u64 = 42;

/// Below this many labeled records everything is used for fitting.
pub const MIN_EXAMPLES_FOR_HOLDOUT: usize = 10;

/// One in this many labeled records is held out for evaluation.
const HOLDOUT_DIVISOR: usize = 5;

#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub strategy: FeatureStrategy,
    pub language: Language,
    pub max_vocabulary: usize,
    pub decision_threshold: f64,
    pub params: TrainingParams,
}

impl TrainOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            strategy: config.feature_strategy,
            language: config.language,
            max_vocabulary: config.max_vocabulary,
            decision_threshold: config.decision_threshold,
            params: TrainingParams::default(),
        }
    }
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            strategy: FeatureStrategy::Handcrafted,
            language: Language::English,
            max_vocabulary: 1000,
            decision_threshold: 0.5,
            params: TrainingParams::default(),
        }
    }
}

/// Result of scoring one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub qualified: bool,
    pub probability: f64,
    pub intent_score: u8,
    pub need: NeedCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadModel {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub provenance: LabelProvenance,
    pub decision_threshold: f64,
    pub training_examples: usize,
    pub positive_examples: usize,
    pub evaluation: Option<Evaluation>,
    pub params: TrainingParams,
    pub extractor: FeatureExtractor,
    pub scaler: StandardScaler,
    pub classifier: LogisticRegression,
}

#[derive(Serialize, Deserialize)]
struct ModelDocument {
    fingerprint: String,
    model: LeadModel,
}

impl LeadModel {
    /// Fit a model on every record the label source labels.
    ///
    /// With at least [`MIN_EXAMPLES_FOR_HOLDOUT`] labeled records, a seeded
    /// shuffle holds out a fifth of them and the model's accuracy, precision
    /// and recall on that slice are recorded. The extractor and scaler are
    /// fitted on the training slice only.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::InsufficientData`] when nothing is labeled, the
    /// training labels are all one class, or the fitted extractor has no
    /// features.
    pub fn train(
        records: &[RawRecord],
        labels: &dyn LabelSource,
        options: &TrainOptions,
        trained_at: DateTime<Utc>,
    ) -> Result<Self, ScoringError> {
        let mut labeled: Vec<(RawRecord, bool)> = Vec::new();
        for record in records {
            if let Err(e) = record.validate() {
                tracing::warn!(identity = %record.identity(), error = %e, "excluding record from training");
                continue;
            }
            if let Some(label) = labels.label(record) {
                labeled.push((record.clone(), label));
            }
        }

        if labeled.is_empty() {
            return Err(ScoringError::InsufficientData(
                "no labeled records to train on".to_string(),
            ));
        }

        let total = labeled.len();
        let holdout = if total >= MIN_EXAMPLES_FOR_HOLDOUT {
            let mut rng = StdRng::seed_from_u64(HOLDOUT_SEED);
            labeled.shuffle(&mut rng);
            labeled.split_off(total - total / HOLDOUT_DIVISOR)
        } else {
            Vec::new()
        };

        let positives = labeled.iter().filter(|(_, l)| *l).count();
        if positives == 0 || positives == labeled.len() {
            return Err(ScoringError::InsufficientData(format!(
                "training labels are all {} ({} records); need both classes",
                if positives == 0 { "negative" } else { "positive" },
                labeled.len()
            )));
        }

        let train_records: Vec<RawRecord> = labeled.iter().map(|(r, _)| r.clone()).collect();
        let train_labels: Vec<bool> = labeled.iter().map(|(_, l)| *l).collect();

        let extractor = FeatureExtractor::fit(
            options.strategy,
            options.language,
            options.max_vocabulary,
            &train_records,
        );
        let dimension = extractor.dimension();
        if dimension == 0 {
            return Err(ScoringError::InsufficientData(
                "feature vocabulary is empty; training text has no usable terms".to_string(),
            ));
        }

        let raw_rows: Vec<Vec<f64>> = train_records.iter().map(|r| extractor.extract(r)).collect();
        let scaler = StandardScaler::fit(&raw_rows, dimension);
        let rows: Vec<Vec<f64>> = raw_rows.iter().map(|r| scaler.transform(r)).collect();
        let classifier = LogisticRegression::fit(&rows, &train_labels, dimension, options.params);

        let mut model = Self {
            format_version: MODEL_FORMAT_VERSION,
            trained_at,
            provenance: labels.provenance(),
            decision_threshold: options.decision_threshold,
            training_examples: labeled.len(),
            positive_examples: positives,
            evaluation: None,
            params: options.params,
            extractor,
            scaler,
            classifier,
        };

        if !holdout.is_empty() {
            let predictions: Vec<bool> = holdout
                .iter()
                .map(|(r, _)| model.probability(r) >= model.decision_threshold)
                .collect();
            let truth: Vec<bool> = holdout.iter().map(|(_, l)| *l).collect();
            let evaluation = Evaluation::compute(&predictions, &truth);
            tracing::info!(
                holdout = evaluation.holdout_size,
                accuracy = evaluation.accuracy,
                precision = evaluation.precision,
                recall = evaluation.recall,
                "holdout evaluation"
            );
            model.evaluation = Some(evaluation);
        }

        tracing::info!(
            strategy = %model.extractor.strategy(),
            provenance = %model.provenance,
            examples = model.training_examples,
            positives = model.positive_examples,
            "model trained"
        );

        Ok(model)
    }

    /// Score one record: qualification decision, intent score, and need.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::DimensionMismatch`] if the extracted features do
    /// not fit the classifier.
    pub fn score(&self, record: &RawRecord) -> Result<Score, ScoringError> {
        let features = self.extractor.extract(record);
        if features.len() != self.classifier.weights.len() {
            return Err(ScoringError::DimensionMismatch {
                expected: self.classifier.weights.len(),
                actual: features.len(),
            });
        }

        let probability = self
            .classifier
            .predict_proba(&self.scaler.transform(&features));

        Ok(Score {
            qualified: probability >= self.decision_threshold,
            probability,
            intent_score: intent_score(probability),
            need: diagnose_need(keyword_hits(&record.text())),
        })
    }

    fn probability(&self, record: &RawRecord) -> f64 {
        let features = self.extractor.extract(record);
        self.classifier
            .predict_proba(&self.scaler.transform(&features))
    }

    /// Hex SHA-256 of the compact JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::ModelFormat`] if serialization fails.
    pub fn fingerprint(&self) -> Result<String, ScoringError> {
        let payload = serde_json::to_vec(self)?;
        Ok(format!("{:x}", Sha256::digest(&payload)))
    }

    /// Serialize the full model document.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::ModelFormat`] if serialization fails.
    pub fn to_document_bytes(&self) -> Result<Vec<u8>, ScoringError> {
        let document = ModelDocument {
            fingerprint: self.fingerprint()?,
            model: self.clone(),
        };
        let mut bytes = serde_json::to_vec_pretty(&document)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Write the model atomically: a sibling temp file is written, synced, and
    /// renamed over `path`. Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::ModelIo`] on any filesystem failure.
    pub fn save(&self, path: &Path) -> Result<(), ScoringError> {
        let bytes = self.to_document_bytes()?;
        let io_err = |source| ScoringError::ModelIo {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let tmp = temp_path(path);
        let mut file = fs::File::create(&tmp).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);
        fs::rename(&tmp, path).map_err(io_err)?;

        tracing::info!(path = %path.display(), "model saved");
        Ok(())
    }

    /// Load and verify a model file.
    ///
    /// # Errors
    ///
    /// - [`ScoringError::ModelUnavailable`] if no file exists at `path`
    /// - [`ScoringError::ModelIo`] if it cannot be read
    /// - [`ScoringError::ModelFormat`] if it is not a model document
    /// - [`ScoringError::UnsupportedVersion`] for an unknown format version
    /// - [`ScoringError::FingerprintMismatch`] if the payload was altered
    /// - [`ScoringError::DimensionMismatch`] if its parts disagree on width
    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ScoringError::ModelUnavailable {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(ScoringError::ModelIo {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let document: ModelDocument = serde_json::from_slice(&bytes)?;
        let model = document.model;

        if model.format_version != MODEL_FORMAT_VERSION {
            return Err(ScoringError::UnsupportedVersion(model.format_version));
        }

        let actual = model.fingerprint()?;
        if actual != document.fingerprint {
            return Err(ScoringError::FingerprintMismatch {
                expected: document.fingerprint,
                actual,
            });
        }

        let expected = model.extractor.dimension();
        for actual in [
            model.scaler.mean.len(),
            model.scaler.scale.len(),
            model.classifier.weights.len(),
        ] {
            if actual != expected {
                return Err(ScoringError::DimensionMismatch { expected, actual });
            }
        }

        tracing::debug!(
            path = %path.display(),
            strategy = %model.extractor.strategy(),
            trained_at = %model.trained_at,
            "model loaded"
        );
        Ok(model)
    }
}

/// `floor(p * 100)` clamped to `0..=100`.
#[must_use]
pub fn intent_score(probability: f64) -> u8 {
    if probability.is_nan() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = (probability * 100.0).floor().clamp(0.0, 100.0) as u8;
    score
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "model".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.tmp"))
}
