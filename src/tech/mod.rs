// Technology extraction from free text, driven by an externally loaded
// vocabulary so the term list can change without touching the matching
// logic.

pub mod classify;

use std::fs;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

const DEFAULT_VOCABULARY: &str = include_str!("../../data/tech_vocabulary.json");

/// One vocabulary entry: a technology name and its category.
#[derive(Debug, Clone, Deserialize)]
pub struct TechEntry {
    pub name: String,
    pub category: String,
}

/// Build a case-insensitive whole-word pattern for a term. `\b` only
/// anchors against word characters, so terms with non-word edge
/// characters ("C#", "C++") get an explicit non-word guard on that
/// side. Multi-word terms match as contiguous phrases.
fn term_regex(term: &str) -> Result<Regex, regex::Error> {
    let is_word_char = |c: char| c.is_alphanumeric() || c == '_';
    let leading = if term.starts_with(is_word_char) {
        r"\b"
    } else {
        r"(?:^|[^\w])"
    };
    let trailing = if term.ends_with(is_word_char) {
        r"\b"
    } else {
        r"(?:[^\w]|$)"
    };
    RegexBuilder::new(&format!("{leading}{}{trailing}", regex::escape(term)))
        .case_insensitive(true)
        .build()
}

/// A list of terms with their compiled whole-word patterns. Matching is
/// deterministic and proportional to list size × text length, which is
/// fine for lists of a few dozen terms.
pub struct KeywordSet {
    terms: Vec<(String, Regex)>,
}

impl KeywordSet {
    pub fn new(terms: &[String]) -> anyhow::Result<Self> {
        let mut compiled = Vec::with_capacity(terms.len());
        for term in terms {
            let regex = term_regex(term)
                .map_err(|e| anyhow::anyhow!("invalid keyword pattern for '{term}': {e}"))?;
            compiled.push((term.clone(), regex));
        }
        Ok(KeywordSet { terms: compiled })
    }

    pub fn matches_any(&self, text: &str) -> bool {
        !text.is_empty() && self.terms.iter().any(|(_, re)| re.is_match(text))
    }

    /// Distinct terms found in `text`, in list order.
    pub fn matched<'a>(&'a self, text: &str) -> Vec<&'a str> {
        if text.is_empty() {
            return Vec::new();
        }
        self.terms
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(term, _)| term.as_str())
            .collect()
    }
}

/// The technology vocabulary with compiled matchers.
pub struct TechCatalog {
    entries: Vec<(TechEntry, Regex)>,
}

impl TechCatalog {
    /// Load the vocabulary, preferring an override path when given.
    pub fn load(override_path: Option<&Path>) -> anyhow::Result<Self> {
        match override_path {
            Some(path) => {
                let json = fs::read_to_string(path)?;
                Self::from_json(&json)
            }
            None => Self::from_json(DEFAULT_VOCABULARY),
        }
    }

    fn from_json(json: &str) -> anyhow::Result<Self> {
        let raw: Vec<TechEntry> = serde_json::from_str(json)?;
        let mut entries = Vec::with_capacity(raw.len());
        for entry in raw {
            let regex = term_regex(&entry.name)
                .map_err(|e| anyhow::anyhow!("invalid vocabulary term '{}': {e}", entry.name))?;
            entries.push((entry, regex));
        }
        Ok(TechCatalog { entries })
    }

    /// Recognized technologies in `text`, in vocabulary order. Each
    /// entry appears at most once, so the result behaves as a set.
    pub fn extract(&self, text: &str) -> Vec<&TechEntry> {
        if text.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(entry, _)| entry)
            .collect()
    }

    pub fn extract_names(&self, text: &str) -> Vec<String> {
        self.extract(text).iter().map(|e| e.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TechCatalog {
        TechCatalog::load(None).expect("default vocabulary loads")
    }

    #[test]
    fn extracts_known_technologies() {
        let names = catalog()
            .extract_names("We use Python, Docker and PostgreSQL in production");
        assert!(names.contains(&"Python".to_string()));
        assert!(names.contains(&"Docker".to_string()));
        assert!(names.contains(&"PostgreSQL".to_string()));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let names = catalog().extract_names("experience with KUBERNETES and react");
        assert!(names.contains(&"Kubernetes".to_string()));
        assert!(names.contains(&"React".to_string()));
    }

    #[test]
    fn word_boundary_rejects_substrings() {
        let catalog = catalog();
        assert!(catalog.extract_names("pythonic code style").is_empty());
        assert!(catalog.extract_names("we value javascripting").is_empty());
    }

    #[test]
    fn multi_word_name_matches_as_phrase() {
        let names = catalog().extract_names("Senior Ruby on Rails Developer");
        assert!(names.contains(&"Ruby on Rails".to_string()));
        // The phrase also legitimately contains the single term.
        assert!(names.contains(&"Ruby".to_string()));
        // But scattered words are not a phrase match.
        let scattered = catalog().extract_names("Ruby gems shipped on modern Rails");
        assert!(!scattered.contains(&"Ruby on Rails".to_string()));
        assert!(scattered.contains(&"Ruby".to_string()));
    }

    #[test]
    fn non_word_edge_terms_match() {
        let names = catalog().extract_names("Développeur C# ou C++ confirmé");
        assert!(names.contains(&"C#".to_string()));
        assert!(names.contains(&"C++".to_string()));
    }

    #[test]
    fn non_word_edge_terms_do_not_match_inside_words() {
        // "C" alone is not in the vocabulary and "C#" must not fire on it.
        let names = catalog().extract_names("vitamine C incluse");
        assert!(!names.contains(&"C#".to_string()));
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "Python, Docker, Python again, AWS";
        let first = catalog().extract_names(text);
        let second = catalog().extract_names(text);
        assert_eq!(first, second);
        // No duplicates even when a term appears twice.
        assert_eq!(
            first.iter().filter(|n| n.as_str() == "Python").count(),
            1
        );
    }

    #[test]
    fn empty_text_extracts_nothing() {
        assert!(catalog().extract_names("").is_empty());
    }

    #[test]
    fn keyword_set_reports_distinct_matches() {
        let set = KeywordSet::new(&[
            "développeur".to_string(),
            "agile".to_string(),
            "cloud".to_string(),
        ])
        .unwrap();
        assert!(set.matches_any("Développeur backend"));
        assert!(!set.matches_any("développement rapide"));
        let matched = set.matched("équipe agile, pratiques agile, cloud natif");
        assert_eq!(matched, vec!["agile", "cloud"]);
    }
}
