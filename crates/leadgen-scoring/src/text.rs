//! Text normalization shared by keyword matching and the lexical vectorizer.

use std::sync::LazyLock;

use leadgen_core::Language;
use regex::Regex;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid digits regex"));
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]|_").expect("valid punctuation regex"));

const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
    "been", "before", "being", "but", "by", "can", "could", "did", "do", "does", "for", "from",
    "had", "has", "have", "he", "her", "here", "hi", "him", "his", "how", "i", "if", "in", "into",
    "is", "it", "its", "just", "me", "more", "my", "no", "not", "of", "on", "or", "our", "out",
    "please", "she", "so", "some", "than", "that", "the", "their", "them", "then", "there",
    "these", "they", "this", "to", "too", "us", "very", "was", "we", "were", "what", "when",
    "which", "who", "will", "with", "would", "you", "your",
];

const SPANISH_STOPWORDS: &[&str] = &[
    "a", "al", "algo", "como", "con", "de", "del", "el", "ella", "en", "es", "esta", "este",
    "estoy", "ha", "hay", "la", "las", "le", "les", "lo", "los", "mas", "me", "mi", "muy", "nos",
    "nuestro", "o", "para", "pero", "por", "que", "quiero", "se", "si", "sin", "su", "sus", "te",
    "tu", "un", "una", "unos", "y", "ya", "yo",
];

const ENGLISH_SUFFIXES: &[&str] = &[
    "ational", "ization", "fulness", "ousness", "iveness", "ations", "ation", "ments", "ment",
    "ness", "ings", "ing", "edly", "ies", "ied", "ers", "er", "ed", "ly", "es", "s",
];

const SPANISH_SUFFIXES: &[&str] = &[
    "amientos", "imientos", "amiento", "imiento", "aciones", "uciones", "acion", "ucion",
    "mente", "ancia", "encia", "ables", "ibles", "able", "ible", "istas", "ista", "osos", "osas",
    "oso", "osa", "ando", "iendo", "ar", "er", "ir", "es", "os", "as", "s",
];

/// Stems shorter than this are left alone.
const MIN_STEM_CHARS: usize = 3;

/// Replace accented Latin letters with their base letter and lowercase the result.
#[must_use]
pub fn fold_accents(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Lowercase, fold accents, and strip digits and punctuation.
#[must_use]
pub fn normalize(text: &str) -> String {
    let folded = fold_accents(text);
    let no_digits = DIGITS.replace_all(&folded, " ");
    PUNCTUATION.replace_all(&no_digits, " ").into_owned()
}

/// Normalized whitespace tokens, before stopword removal.
#[must_use]
pub fn words(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Full lexical pipeline: normalize, tokenize, drop stopwords, stem.
#[must_use]
pub fn analyze(text: &str, language: Language) -> Vec<String> {
    let stopwords = match language {
        Language::English => ENGLISH_STOPWORDS,
        Language::Spanish => SPANISH_STOPWORDS,
    };

    words(text)
        .into_iter()
        .filter(|w| !stopwords.contains(&w.as_str()))
        .map(|w| stem(&w, language))
        .filter(|w| !w.is_empty())
        .collect()
}

/// Strip the first listed suffix that leaves a stem of at least three chars.
#[must_use]
pub fn stem(word: &str, language: Language) -> String {
    let suffixes = match language {
        Language::English => ENGLISH_SUFFIXES,
        Language::Spanish => SPANISH_SUFFIXES,
    };

    let char_len = word.chars().count();
    for suffix in suffixes {
        if let Some(stem) = word.strip_suffix(suffix) {
            if char_len - suffix.chars().count() >= MIN_STEM_CHARS {
                return stem.to_string();
            }
        }
    }
    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_accents_lowercases_and_strips_marks() {
        assert_eq!(fold_accents("Cotización DEMOSTRACIÓN"), "cotizacion demostracion");
    }

    #[test]
    fn normalize_drops_digits_and_punctuation() {
        assert_eq!(
            words("Call me at 555-0101, re: PRICING!"),
            vec!["call", "me", "at", "re", "pricing"]
        );
    }

    #[test]
    fn analyze_removes_stopwords_and_stems() {
        let tokens = analyze("We are requesting the pricing for shipments", Language::English);
        assert_eq!(tokens, vec!["request", "pric", "ship"]);
    }

    #[test]
    fn spanish_analysis_uses_spanish_lists() {
        let tokens = analyze("Quiero una cotización para los envíos", Language::Spanish);
        assert_eq!(tokens, vec!["cotiz", "envi"]);
    }

    #[test]
    fn short_words_are_not_stemmed_away() {
        assert_eq!(stem("is", Language::English), "is");
        assert_eq!(stem("bus", Language::English), "bus");
    }

    #[test]
    fn empty_text_has_no_tokens() {
        assert!(analyze("", Language::English).is_empty());
        assert!(analyze("  123 !!", Language::English).is_empty());
    }
}
