//! Raw records produced by ingestion and consumed by the scoring pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Channel a lead or mention arrived through.
///
/// Known channels have stable slugs; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeadSource {
    ContactForm,
    EventList,
    WebScraping,
    Other(String),
}

impl LeadSource {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            LeadSource::ContactForm => "contact_form",
            LeadSource::EventList => "event_list",
            LeadSource::WebScraping => "web_scraping",
            LeadSource::Other(label) => label,
        }
    }
}

impl From<&str> for LeadSource {
    fn from(value: &str) -> Self {
        match value.trim() {
            "contact_form" => LeadSource::ContactForm,
            "event_list" => LeadSource::EventList,
            "web_scraping" => LeadSource::WebScraping,
            other => LeadSource::Other(other.to_string()),
        }
    }
}

impl From<String> for LeadSource {
    fn from(value: String) -> Self {
        LeadSource::from(value.as_str())
    }
}

impl From<LeadSource> for String {
    fn from(value: LeadSource) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for LeadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub url: Option<String>,
    pub industry: Option<String>,
    pub locality: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub id: i64,
    pub company_id: i64,
    pub text: String,
    pub source: Option<LeadSource>,
    pub mentioned_at: DateTime<Utc>,
}

/// A flat contact lead from a form, an event list, or a scraped directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLead {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub message: Option<String>,
    pub source: LeadSource,
    pub received_at: DateTime<Utc>,
    /// `1.0` when the contact filled a form, `0.0` or absent otherwise.
    pub form_filled: Option<f64>,
    /// Positive when the contact interacted with an outbound email.
    pub email_interaction: Option<f64>,
}

/// Durable identity used to match raw records against qualified leads.
///
/// Contact keys are normalized on construction: the name is trimmed and the
/// email trimmed and lowercased (absent email becomes empty). Matching is exact
/// equality on the normalized values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentityKey {
    Company(i64),
    Contact { name: String, email: String },
}

impl IdentityKey {
    #[must_use]
    pub fn contact(name: &str, email: Option<&str>) -> Self {
        IdentityKey::Contact {
            name: name.trim().to_string(),
            email: email.map(|e| e.trim().to_lowercase()).unwrap_or_default(),
        }
    }

    /// Stable string form stored in the `identity_key` uniqueness column.
    #[must_use]
    pub fn storage_key(&self) -> String {
        match self {
            IdentityKey::Company(id) => format!("company:{id}"),
            IdentityKey::Contact { name, email } => format!("contact:{name}\u{1f}{email}"),
        }
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityKey::Company(id) => write!(f, "company:{id}"),
            IdentityKey::Contact { name, email } if email.is_empty() => {
                write!(f, "contact:{name}")
            }
            IdentityKey::Contact { name, email } => write!(f, "contact:{name} <{email}>"),
        }
    }
}

/// One scoreable unit: a company with its mentions, or a contact lead.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Company {
        company: Company,
        mentions: Vec<Mention>,
    },
    Contact(RawLead),
}

impl RawRecord {
    #[must_use]
    pub fn identity(&self) -> IdentityKey {
        match self {
            RawRecord::Company { company, .. } => IdentityKey::Company(company.id),
            RawRecord::Contact(lead) => IdentityKey::contact(&lead.name, lead.email.as_deref()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            RawRecord::Company { company, .. } => &company.name,
            RawRecord::Contact(lead) => &lead.name,
        }
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        match self {
            RawRecord::Company { .. } => None,
            RawRecord::Contact(lead) => lead.email.as_deref(),
        }
    }

    /// Free text to score. Company mentions are joined in chronological order.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            RawRecord::Company { mentions, .. } => {
                let mut ordered: Vec<&Mention> = mentions.iter().collect();
                ordered.sort_by_key(|m| (m.mentioned_at, m.id));
                ordered
                    .iter()
                    .map(|m| m.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            RawRecord::Contact(lead) => lead.message.clone().unwrap_or_default(),
        }
    }

    /// Source of the record; for companies, the source of the latest mention.
    #[must_use]
    pub fn source(&self) -> Option<&LeadSource> {
        match self {
            RawRecord::Company { mentions, .. } => mentions
                .iter()
                .max_by_key(|m| (m.mentioned_at, m.id))
                .and_then(|m| m.source.as_ref()),
            RawRecord::Contact(lead) => Some(&lead.source),
        }
    }

    /// Form-fill signal. Missing values count as zero.
    #[must_use]
    pub fn form_filled(&self) -> f64 {
        match self {
            RawRecord::Company { .. } => 0.0,
            RawRecord::Contact(lead) => lead.form_filled.unwrap_or(0.0),
        }
    }

    /// Email-interaction signal. Missing values count as zero.
    #[must_use]
    pub fn email_interaction(&self) -> f64 {
        match self {
            RawRecord::Company { .. } => 0.0,
            RawRecord::Contact(lead) => lead.email_interaction.unwrap_or(0.0),
        }
    }

    /// Check the fields the scorer relies on.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DataQuality`] for a blank name or a negative or
    /// non-finite behavioral signal. Empty text is valid.
    pub fn validate(&self) -> Result<(), CoreError> {
        let problem = |reason: &str| CoreError::DataQuality {
            record: self.identity().to_string(),
            reason: reason.to_string(),
        };

        if self.name().trim().is_empty() {
            return Err(problem("name is blank"));
        }

        if let RawRecord::Contact(lead) = self {
            for (label, signal) in [
                ("form_filled", lead.form_filled),
                ("email_interaction", lead.email_interaction),
            ] {
                if let Some(value) = signal {
                    if !value.is_finite() || value < 0.0 {
                        return Err(problem(&format!(
                            "{label} must be a finite non-negative number, got {value}"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Collapse raw leads sharing an identity into one record each.
    ///
    /// Messages are joined in arrival order, signals take the maximum, and
    /// source, timestamp, and id come from the latest lead. Output order follows
    /// the first appearance of each identity.
    #[must_use]
    pub fn contacts_from(leads: Vec<RawLead>) -> Vec<RawRecord> {
        let mut order: Vec<IdentityKey> = Vec::new();
        let mut groups: std::collections::HashMap<IdentityKey, Vec<RawLead>> =
            std::collections::HashMap::new();

        for lead in leads {
            let key = IdentityKey::contact(&lead.name, lead.email.as_deref());
            let group = groups.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                Vec::new()
            });
            group.push(lead);
        }

        order
            .into_iter()
            .filter_map(|key| groups.remove(&key))
            .filter_map(merge_leads)
            .map(RawRecord::Contact)
            .collect()
    }
}

fn merge_leads(mut group: Vec<RawLead>) -> Option<RawLead> {
    group.sort_by_key(|l| (l.received_at, l.id));

    let messages: Vec<&str> = group
        .iter()
        .filter_map(|l| l.message.as_deref())
        .filter(|m| !m.trim().is_empty())
        .collect();
    let message = if messages.is_empty() {
        None
    } else {
        Some(messages.join("\n"))
    };

    let max_signal = |pick: fn(&RawLead) -> Option<f64>| {
        group
            .iter()
            .filter_map(pick)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    };
    let form_filled = max_signal(|l| l.form_filled);
    let email_interaction = max_signal(|l| l.email_interaction);

    let mut latest = group.pop()?;
    latest.message = message;
    latest.form_filled = form_filled;
    latest.email_interaction = email_interaction;
    Some(latest)
}
