//! Where training labels come from.
//!
//! Without ground truth the system bootstraps labels from a heuristic; that
//! provenance travels with the model and every row it scores, so reports can
//! flag the results as lower confidence.

use std::collections::HashMap;

use leadgen_core::{AppConfig, IdentityKey, LabelProvenance, LeadSource, OutcomeFile, RawRecord};

use crate::keywords::keyword_hits;

pub trait LabelSource {
    fn provenance(&self) -> LabelProvenance;

    /// Label for one record. `None` leaves the record out of training.
    fn label(&self, record: &RawRecord) -> Option<bool>;
}

/// Heuristic labels: positive when the record came in through a high-intent
/// channel, mentions purchase-intent keywords, or its form-fill signal exceeds
/// the behavior threshold.
///
/// The form-fill rule biases the model toward whoever filled in a form; the
/// `bootstrap` provenance is how that weakness is surfaced downstream.
#[derive(Debug, Clone)]
pub struct BootstrapLabelPolicy {
    high_intent_sources: Vec<LeadSource>,
    behavior_threshold: f64,
}

impl BootstrapLabelPolicy {
    #[must_use]
    pub fn new(high_intent_sources: &[String], behavior_threshold: f64) -> Self {
        Self {
            high_intent_sources: high_intent_sources
                .iter()
                .map(|s| LeadSource::from(s.as_str()))
                .collect(),
            behavior_threshold,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(&config.high_intent_sources, config.behavior_threshold)
    }
}

impl LabelSource for BootstrapLabelPolicy {
    fn provenance(&self) -> LabelProvenance {
        LabelProvenance::Bootstrap
    }

    fn label(&self, record: &RawRecord) -> Option<bool> {
        let high_intent_channel = record
            .source()
            .is_some_and(|s| self.high_intent_sources.contains(s));

        Some(
            high_intent_channel
                || keyword_hits(&record.text()).any()
                || record.form_filled() > self.behavior_threshold,
        )
    }
}

/// Ground-truth conversion outcomes.
///
/// Contacts match on their normalized identity. A company matches an outcome
/// carrying its name and no email. When an identity appears more than once the
/// last outcome wins.
#[derive(Debug, Clone, Default)]
pub struct HistoricalOutcomes {
    outcomes: HashMap<IdentityKey, bool>,
}

impl HistoricalOutcomes {
    #[must_use]
    pub fn from_file(file: &OutcomeFile) -> Self {
        let outcomes = file
            .outcomes
            .iter()
            .map(|o| (o.contact_identity(), o.converted))
            .collect();
        Self { outcomes }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl LabelSource for HistoricalOutcomes {
    fn provenance(&self) -> LabelProvenance {
        LabelProvenance::Historical
    }

    fn label(&self, record: &RawRecord) -> Option<bool> {
        let key = match record {
            RawRecord::Company { company, .. } => IdentityKey::contact(&company.name, None),
            RawRecord::Contact(_) => record.identity(),
        };
        self.outcomes.get(&key).copied()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use leadgen_core::{Company, Mention, Outcome, RawLead};

    use super::*;

    fn contact(name: &str, source: LeadSource, message: &str, form_filled: Option<f64>) -> RawRecord {
        RawRecord::Contact(RawLead {
            id: 1,
            name: name.to_string(),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            message: Some(message.to_string()),
            source,
            received_at: Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap(),
            form_filled,
            email_interaction: None,
        })
    }

    fn policy() -> BootstrapLabelPolicy {
        BootstrapLabelPolicy::new(&["contact_form".to_string()], 0.0)
    }

    #[test]
    fn high_intent_channel_is_positive() {
        let record = contact("Ana", LeadSource::ContactForm, "hello", None);
        assert_eq!(policy().label(&record), Some(true));
    }

    #[test]
    fn intent_keywords_are_positive() {
        let record = contact("Bo", LeadSource::EventList, "could we get a quote", None);
        assert_eq!(policy().label(&record), Some(true));
    }

    #[test]
    fn plural_intent_keywords_are_positive() {
        let record = contact("Eva", LeadSource::EventList, "Quisiera saber sus precios", None);
        assert_eq!(policy().label(&record), Some(true));
    }

    #[test]
    fn form_fill_above_threshold_is_positive() {
        let record = contact("Cy", LeadSource::EventList, "hello", Some(1.0));
        assert_eq!(policy().label(&record), Some(true));
    }

    #[test]
    fn quiet_event_list_contact_is_negative() {
        let record = contact("Di", LeadSource::EventList, "nice booth", Some(0.0));
        assert_eq!(policy().label(&record), Some(false));
        assert_eq!(policy().provenance(), LabelProvenance::Bootstrap);
    }

    #[test]
    fn historical_outcomes_match_normalized_identity() {
        let file = OutcomeFile {
            outcomes: vec![
                Outcome {
                    name: " Ana ".to_string(),
                    email: Some("ANA@example.com".to_string()),
                    converted: true,
                },
                Outcome {
                    name: "Acme".to_string(),
                    email: None,
                    converted: false,
                },
            ],
        };
        let labels = HistoricalOutcomes::from_file(&file);
        assert_eq!(labels.len(), 2);

        let ana = contact("Ana", LeadSource::EventList, "hello", None);
        assert_eq!(labels.label(&ana), Some(true));

        let unknown = contact("Zed", LeadSource::EventList, "hello", None);
        assert_eq!(labels.label(&unknown), None);

        let acme = RawRecord::Company {
            company: Company {
                id: 7,
                name: "Acme".to_string(),
                url: None,
                industry: None,
                locality: None,
                created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            },
            mentions: vec![Mention {
                id: 1,
                company_id: 7,
                text: "expanding".to_string(),
                source: None,
                mentioned_at: Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap(),
            }],
        };
        assert_eq!(labels.label(&acme), Some(false));
        assert_eq!(labels.provenance(), LabelProvenance::Historical);
    }
}
