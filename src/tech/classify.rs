// Heuristic tech-relevance classifier. Fixed keyword lists, loaded like
// the vocabulary so they can be tuned without redeploying the decision
// logic.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::KeywordSet;
use crate::sources::CanonicalOffer;

const DEFAULT_LISTS: &str = include_str!("../../data/classifier_lists.json");

#[derive(Debug, Deserialize)]
struct RawLists {
    non_tech_job_titles: Vec<String>,
    exclusion_keywords: Vec<String>,
    tech_keywords: Vec<String>,
    strong_signal_keywords: Vec<String>,
}

/// The classifier's keyword lists with compiled matchers.
pub struct ClassifierLists {
    non_tech_titles: KeywordSet,
    exclusions: KeywordSet,
    tech_keywords: KeywordSet,
    strong_signals: HashSet<String>,
}

impl ClassifierLists {
    pub fn load(override_path: Option<&Path>) -> anyhow::Result<Self> {
        match override_path {
            Some(path) => {
                let json = fs::read_to_string(path)?;
                Self::from_json(&json)
            }
            None => Self::from_json(DEFAULT_LISTS),
        }
    }

    fn from_json(json: &str) -> anyhow::Result<Self> {
        let raw: RawLists = serde_json::from_str(json)?;
        Ok(ClassifierLists {
            non_tech_titles: KeywordSet::new(&raw.non_tech_job_titles)?,
            exclusions: KeywordSet::new(&raw.exclusion_keywords)?,
            tech_keywords: KeywordSet::new(&raw.tech_keywords)?,
            strong_signals: raw
                .strong_signal_keywords
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
        })
    }

    /// Decide whether an offer is a technology job.
    ///
    /// The rules run in a fixed order and the first match decides:
    /// title signals run to completion before the description is ever
    /// inspected, so an excluding title cannot be overridden by
    /// description evidence. A single description keyword only counts
    /// when it belongs to the strong-signal subset.
    pub fn is_tech_offer(&self, offer: &CanonicalOffer) -> bool {
        let title = offer.title.as_str();
        if self.non_tech_titles.matches_any(title) {
            return false;
        }
        if self.exclusions.matches_any(title) {
            return false;
        }
        if self.tech_keywords.matches_any(title) {
            return true;
        }

        let description = offer.description.as_deref().unwrap_or("");
        if self.non_tech_titles.matches_any(description) {
            return false;
        }
        if self.exclusions.matches_any(description) {
            return false;
        }
        let matched = self.tech_keywords.matched(description);
        if matched.len() >= 2 {
            return true;
        }
        if !offer.technologies.is_empty() {
            return true;
        }
        if let [only] = matched.as_slice()
            && self.strong_signals.contains(&only.to_lowercase())
        {
            return true;
        }
        false
    }
}
