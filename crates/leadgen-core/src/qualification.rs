//! Scored leads and the vocabulary used to describe them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::leads::IdentityKey;
use crate::CoreError;

/// Diagnosed need, in fixed priority order: pricing beats demo beats general.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeedCategory {
    Pricing,
    Demo,
    General,
}

impl NeedCategory {
    /// All categories, highest priority first.
    pub const PRIORITY: [NeedCategory; 3] =
        [NeedCategory::Pricing, NeedCategory::Demo, NeedCategory::General];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NeedCategory::Pricing => "pricing",
            NeedCategory::Demo => "demo",
            NeedCategory::General => "general",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            NeedCategory::Pricing => "Pricing / quote request",
            NeedCategory::Demo => "Demo interest",
            NeedCategory::General => "General interest",
        }
    }
}

impl std::str::FromStr for NeedCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pricing" => Ok(NeedCategory::Pricing),
            "demo" => Ok(NeedCategory::Demo),
            "general" => Ok(NeedCategory::General),
            other => Err(CoreError::UnknownNeed(other.to_string())),
        }
    }
}

impl std::fmt::Display for NeedCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the training labels behind a score came from.
///
/// `Bootstrap` labels are heuristic stand-ins for real outcomes and every report
/// flags them as lower confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelProvenance {
    Bootstrap,
    Historical,
}

impl LabelProvenance {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LabelProvenance::Bootstrap => "bootstrap",
            LabelProvenance::Historical => "historical",
        }
    }

    #[must_use]
    pub fn is_low_confidence(self) -> bool {
        matches!(self, LabelProvenance::Bootstrap)
    }
}

impl std::str::FromStr for LabelProvenance {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bootstrap" => Ok(LabelProvenance::Bootstrap),
            "historical" => Ok(LabelProvenance::Historical),
            other => Err(CoreError::UnknownProvenance(other.to_string())),
        }
    }
}

impl std::fmt::Display for LabelProvenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lead that has been through the scorer. One per identity key.
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedLead {
    pub id: i64,
    pub identity: IdentityKey,
    pub qualified: bool,
    /// Intent score in `0..=100`.
    pub intent_score: u8,
    pub need: NeedCategory,
    pub provenance: LabelProvenance,
    pub qualified_at: DateTime<Utc>,
    /// Set exactly once, when an alert covering this lead was delivered.
    pub alerted_at: Option<DateTime<Utc>>,
}

impl QualifiedLead {
    /// Convert a stored score column into the domain range.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ScoreOutOfRange`] when `raw` is outside `0..=100`.
    pub fn intent_score_from_column(raw: i64) -> Result<u8, CoreError> {
        u8::try_from(raw)
            .ok()
            .filter(|score| *score <= 100)
            .ok_or(CoreError::ScoreOutOfRange(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn need_priority_is_pricing_demo_general() {
        assert_eq!(
            NeedCategory::PRIORITY,
            [NeedCategory::Pricing, NeedCategory::Demo, NeedCategory::General]
        );
        assert!(NeedCategory::Pricing < NeedCategory::Demo);
        assert!(NeedCategory::Demo < NeedCategory::General);
    }

    #[test]
    fn need_parses_its_own_slug() {
        for need in NeedCategory::PRIORITY {
            assert_eq!(need.as_str().parse::<NeedCategory>().unwrap(), need);
        }
        assert!("urgent".parse::<NeedCategory>().is_err());
    }

    #[test]
    fn bootstrap_is_low_confidence() {
        assert!(LabelProvenance::Bootstrap.is_low_confidence());
        assert!(!LabelProvenance::Historical.is_low_confidence());
        assert_eq!(
            "historical".parse::<LabelProvenance>().unwrap(),
            LabelProvenance::Historical
        );
    }

    #[test]
    fn intent_score_column_is_range_checked() {
        assert_eq!(QualifiedLead::intent_score_from_column(0).unwrap(), 0);
        assert_eq!(QualifiedLead::intent_score_from_column(100).unwrap(), 100);
        assert!(QualifiedLead::intent_score_from_column(101).is_err());
        assert!(QualifiedLead::intent_score_from_column(-1).is_err());
    }
}
