//! YAML files accepted by the ingestion and training commands.
//!
//! An intake file carries a batch of contact leads (an exported event list, for
//! instance) and company mentions. An outcome file carries ground-truth
//! conversion results used in place of bootstrap labels.

use std::path::Path;

use serde::Deserialize;

use crate::leads::{IdentityKey, LeadSource};
use crate::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct IntakeLead {
    pub name: String,
    pub email: Option<String>,
    pub message: Option<String>,
    pub source: Option<LeadSource>,
    pub form_filled: Option<f64>,
    pub email_interaction: Option<f64>,
}

impl IntakeLead {
    /// Source to store, defaulting to the event-list channel.
    #[must_use]
    pub fn source_or_default(&self) -> LeadSource {
        self.source.clone().unwrap_or(LeadSource::EventList)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntakeMention {
    pub company: String,
    pub url: Option<String>,
    pub industry: Option<String>,
    pub locality: Option<String>,
    pub text: String,
    pub source: Option<LeadSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntakeFile {
    #[serde(default)]
    pub leads: Vec<IntakeLead>,
    #[serde(default)]
    pub mentions: Vec<IntakeMention>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Outcome {
    pub name: String,
    pub email: Option<String>,
    pub converted: bool,
}

impl Outcome {
    /// Identity used to look up a contact outcome.
    #[must_use]
    pub fn contact_identity(&self) -> IdentityKey {
        IdentityKey::contact(&self.name, self.email.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutcomeFile {
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

/// Load and validate an intake batch from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_intake_file(path: &Path) -> Result<IntakeFile, ConfigError> {
    let content = read(path)?;
    let intake: IntakeFile = serde_yaml::from_str(&content)?;
    validate_intake(&intake)?;
    Ok(intake)
}

/// Load and validate historical outcomes from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_outcome_file(path: &Path) -> Result<OutcomeFile, ConfigError> {
    let content = read(path)?;
    let outcomes: OutcomeFile = serde_yaml::from_str(&content)?;

    for (i, outcome) in outcomes.outcomes.iter().enumerate() {
        if outcome.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "outcome #{} has a blank name",
                i + 1
            )));
        }
    }

    Ok(outcomes)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })
}

fn validate_intake(intake: &IntakeFile) -> Result<(), ConfigError> {
    for (i, lead) in intake.leads.iter().enumerate() {
        if lead.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "lead #{} has a blank name",
                i + 1
            )));
        }

        for (label, signal) in [
            ("form_filled", lead.form_filled),
            ("email_interaction", lead.email_interaction),
        ] {
            if let Some(value) = signal {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::Validation(format!(
                        "lead '{}' has invalid {label} {value}",
                        lead.name
                    )));
                }
            }
        }
    }

    for mention in &intake.mentions {
        if mention.company.trim().is_empty() {
            return Err(ConfigError::Validation(
                "mention company must be non-empty".to_string(),
            ));
        }
        if mention.text.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "mention for '{}' has empty text",
                mention.company
            )));
        }
    }

    Ok(())
}
