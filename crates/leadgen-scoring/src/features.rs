//! Feature extraction: one strategy per deployment, fitted at training time.

use std::collections::HashMap;

use leadgen_core::{FeatureStrategy, Language, RawRecord};
use serde::{Deserialize, Serialize};

use crate::keywords::keyword_hits;
use crate::text::analyze;

pub const HANDCRAFTED_FEATURES: [&str; 5] = [
    "form_filled",
    "email_interaction",
    "message_length",
    "has_pricing_terms",
    "has_demo_terms",
];

/// A fitted extractor. Serialized into the model file so inference always uses
/// the exact vocabulary and strategy the classifier was trained against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum FeatureExtractor {
    Handcrafted,
    Lexical(LexicalVectorizer),
}

impl FeatureExtractor {
    #[must_use]
    pub fn fit(
        strategy: FeatureStrategy,
        language: Language,
        max_vocabulary: usize,
        records: &[RawRecord],
    ) -> Self {
        match strategy {
            FeatureStrategy::Handcrafted => FeatureExtractor::Handcrafted,
            FeatureStrategy::Lexical => {
                let texts: Vec<String> = records.iter().map(RawRecord::text).collect();
                FeatureExtractor::Lexical(LexicalVectorizer::fit(&texts, language, max_vocabulary))
            }
        }
    }

    #[must_use]
    pub fn strategy(&self) -> FeatureStrategy {
        match self {
            FeatureExtractor::Handcrafted => FeatureStrategy::Handcrafted,
            FeatureExtractor::Lexical(_) => FeatureStrategy::Lexical,
        }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        match self {
            FeatureExtractor::Handcrafted => HANDCRAFTED_FEATURES.len(),
            FeatureExtractor::Lexical(v) => v.vocabulary.len(),
        }
    }

    /// Feature vector for one record. Empty text yields zero text features.
    #[must_use]
    pub fn extract(&self, record: &RawRecord) -> Vec<f64> {
        match self {
            FeatureExtractor::Handcrafted => handcrafted(record),
            FeatureExtractor::Lexical(v) => v.transform(&record.text()),
        }
    }
}

/// `[form_filled, email_interaction, message_length, has_pricing_terms, has_demo_terms]`.
/// Missing behavioral signals count as zero.
fn handcrafted(record: &RawRecord) -> Vec<f64> {
    let text = record.text();
    let hits = keyword_hits(&text);
    #[allow(clippy::cast_precision_loss)]
    let length = text.chars().count() as f64;

    vec![
        record.form_filled(),
        record.email_interaction(),
        length,
        f64::from(u8::from(hits.pricing)),
        f64::from(u8::from(hits.demo)),
    ]
}

/// TF-IDF over a fixed vocabulary. Columns are in alphabetical term order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalVectorizer {
    pub language: Language,
    pub vocabulary: Vec<String>,
    pub idf: Vec<f64>,
}

impl LexicalVectorizer {
    /// Keep the `max_vocabulary` most frequent terms (ties alphabetical) and
    /// compute smoothed idf `ln((1 + n) / (1 + df)) + 1` for each.
    #[must_use]
    pub fn fit(texts: &[String], language: Language, max_vocabulary: usize) -> Self {
        let docs: Vec<Vec<String>> = texts.iter().map(|t| analyze(t, language)).collect();

        let mut term_counts: HashMap<&str, usize> = HashMap::new();
        let mut doc_counts: HashMap<&str, usize> = HashMap::new();
        for doc in &docs {
            let mut seen: Vec<&str> = Vec::new();
            for token in doc {
                *term_counts.entry(token.as_str()).or_default() += 1;
                if !seen.contains(&token.as_str()) {
                    seen.push(token.as_str());
                    *doc_counts.entry(token.as_str()).or_default() += 1;
                }
            }
        }

        let mut ranked: Vec<(&str, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(max_vocabulary);

        let mut vocabulary: Vec<String> = ranked.iter().map(|(t, _)| (*t).to_string()).collect();
        vocabulary.sort();

        #[allow(clippy::cast_precision_loss)]
        let n = docs.len() as f64;
        let idf = vocabulary
            .iter()
            .map(|term| {
                #[allow(clippy::cast_precision_loss)]
                let df = doc_counts.get(term.as_str()).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        Self {
            language,
            vocabulary,
            idf,
        }
    }

    /// L2-normalized TF-IDF row. Tokens outside the vocabulary are ignored.
    #[must_use]
    pub fn transform(&self, text: &str) -> Vec<f64> {
        let mut row = vec![0.0; self.vocabulary.len()];
        for token in analyze(text, self.language) {
            if let Ok(index) = self.vocabulary.binary_search(&token) {
                row[index] += 1.0;
            }
        }

        for (value, idf) in row.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut row {
                *value /= norm;
            }
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use leadgen_core::{LeadSource, RawLead};

    use super::*;

    fn contact(message: Option<&str>, form_filled: Option<f64>) -> RawRecord {
        RawRecord::Contact(RawLead {
            id: 1,
            name: "Ana".to_string(),
            email: Some("ana@example.com".to_string()),
            message: message.map(str::to_string),
            source: LeadSource::ContactForm,
            received_at: Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap(),
            form_filled,
            email_interaction: None,
        })
    }

    #[test]
    fn handcrafted_vector_has_fixed_layout() {
        let record = contact(Some("Please send pricing"), Some(1.0));
        let features = FeatureExtractor::Handcrafted.extract(&record);
        assert_eq!(features, vec![1.0, 0.0, 19.0, 1.0, 0.0]);
    }

    #[test]
    fn empty_text_is_the_zero_vector_apart_from_signals() {
        let record = contact(None, None);
        assert_eq!(
            FeatureExtractor::Handcrafted.extract(&record),
            vec![0.0, 0.0, 0.0, 0.0, 0.0]
        );

        let lexical = LexicalVectorizer::fit(&["pricing request".to_string()], Language::English, 10);
        assert!(lexical.transform("").iter().all(|v| *v == 0.0));
    }

    #[test]
    fn vocabulary_keeps_most_frequent_terms_with_alphabetical_ties() {
        let texts = vec![
            "shipping shipping quote".to_string(),
            "quote invoice".to_string(),
            "zebra".to_string(),
        ];
        let v = LexicalVectorizer::fit(&texts, Language::English, 3);
        // shipp:2, quote:2, invoice:1, zebra:1 -> invoice wins the tie.
        assert_eq!(v.vocabulary, vec!["invoice", "quote", "shipp"]);
    }

    #[test]
    fn idf_is_smoothed() {
        let texts = vec!["alpha beta".to_string(), "alpha".to_string()];
        let v = LexicalVectorizer::fit(&texts, Language::English, 10);
        let alpha = v.vocabulary.iter().position(|t| t == "alpha").unwrap();
        let beta = v.vocabulary.iter().position(|t| t == "beta").unwrap();
        assert!((v.idf[alpha] - 1.0).abs() < 1e-12);
        assert!((v.idf[beta] - ((3.0_f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn rows_are_unit_length_and_ignore_unseen_tokens() {
        let v = LexicalVectorizer::fit(
            &["pricing demo".to_string(), "pricing".to_string()],
            Language::English,
            10,
        );
        let row = v.transform("pricing demo unicorn");
        let norm = row.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
        assert_eq!(row.len(), v.vocabulary.len());
    }

    #[test]
    fn extractor_survives_json_round_trip() {
        let extractor = FeatureExtractor::fit(
            FeatureStrategy::Lexical,
            Language::Spanish,
            5,
            &[contact(Some("Necesito una cotización"), None)],
        );
        let json = serde_json::to_string(&extractor).unwrap();
        let back: FeatureExtractor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, extractor);
        assert_eq!(back.strategy(), FeatureStrategy::Lexical);
    }
}
