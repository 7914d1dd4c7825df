//! Purchase-intent keyword classes and need diagnosis.

use leadgen_core::NeedCategory;

use crate::text::words;

pub const PRICING_TERMS: &[&str] = &[
    "pricing",
    "price",
    "quote",
    "quotation",
    "precio",
    "cotizacion",
    "presupuesto",
];

pub const DEMO_TERMS: &[&str] = &["demo", "demonstration", "demostracion"];

/// Which keyword classes a text mentions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeywordHits {
    pub pricing: bool,
    pub demo: bool,
}

impl KeywordHits {
    #[must_use]
    pub fn any(self) -> bool {
        self.pricing || self.demo
    }

    #[must_use]
    pub fn contains(self, need: NeedCategory) -> bool {
        match need {
            NeedCategory::Pricing => self.pricing,
            NeedCategory::Demo => self.demo,
            NeedCategory::General => true,
        }
    }
}

/// Plural endings accepted after a listed term (`precios`, `cotizaciones`, `demos`).
const PLURAL_ENDINGS: &[&str] = &["s", "es"];

/// Whether `token` is `term` or one of its plurals.
fn is_form_of(token: &str, term: &str) -> bool {
    token
        .strip_prefix(term)
        .is_some_and(|rest| rest.is_empty() || PLURAL_ENDINGS.contains(&rest))
}

/// Match whole words of the accent-folded text against each keyword class,
/// counting singular and plural forms.
#[must_use]
pub fn keyword_hits(text: &str) -> KeywordHits {
    let tokens = words(text);
    let mentions = |terms: &[&str]| {
        tokens
            .iter()
            .any(|t| terms.iter().any(|term| is_form_of(t, term)))
    };

    KeywordHits {
        pricing: mentions(PRICING_TERMS),
        demo: mentions(DEMO_TERMS),
    }
}

/// The highest-priority need whose keywords appear, else `General`.
#[must_use]
pub fn diagnose_need(hits: KeywordHits) -> NeedCategory {
    NeedCategory::PRIORITY
        .into_iter()
        .find(|need| hits.contains(*need))
        .unwrap_or(NeedCategory::General)
}
