// Source adapter module.
// Defines the trait and shared types for external job offer providers.

pub mod adzuna;
pub mod federated;
pub mod france_travail;
pub mod import;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;

pub const FALLBACK_TITLE: &str = "Untitled";
pub const FALLBACK_COMPANY: &str = "Unknown company";

/// Phrases that mark an offer as remote when found in its location or
/// description. Absence of a match is not proof of on-site work.
const REMOTE_MARKERS: [&str; 4] = ["remote", "work from home", "télétravail", "à distance"];

/// Contract vocabulary every source maps into. Raw provider codes never
/// leave the adapter that understands them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContractType {
    Permanent,
    FixedTerm,
    Internship,
    PartTime,
    Freelance,
    Temp,
    Seasonal,
    Other,
    Unspecified,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Permanent => "permanent",
            ContractType::FixedTerm => "fixed-term",
            ContractType::Internship => "internship",
            ContractType::PartTime => "part-time",
            ContractType::Freelance => "freelance",
            ContractType::Temp => "temp",
            ContractType::Seasonal => "seasonal",
            ContractType::Other => "other",
            ContractType::Unspecified => "unspecified",
        }
    }
}

impl std::fmt::Display for ContractType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-facing search criteria, translated by each adapter into its
/// provider's native request parameters.
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    pub keywords: Option<String>,
    pub location: Option<String>,
    pub contract_type: Option<ContractType>,
}

/// Logical page: zero-based number plus size. Adapters translate this
/// into whatever indexing convention their provider uses.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

/// The normalized, source-agnostic offer every adapter maps into.
/// Ephemeral: either returned from a federated search or handed to the
/// import orchestrator for persistence.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalOffer {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub contract_type: ContractType,
    pub remote: bool,
    pub source: String,
    pub source_url: String,
    pub posted_at: DateTime<Utc>,
    pub technologies: Vec<String>,
}

impl CanonicalOffer {
    /// Text the technology extractor runs over.
    pub fn extraction_text(&self) -> String {
        match &self.description {
            Some(description) => format!("{} {description}", self.title),
            None => self.title.clone(),
        }
    }
}

/// Case-insensitive remote-work scan over location and description.
pub fn detect_remote(location: Option<&str>, description: Option<&str>) -> bool {
    [location, description].into_iter().flatten().any(|text| {
        let lower = text.to_lowercase();
        REMOTE_MARKERS.iter().any(|marker| lower.contains(marker))
    })
}

/// Shared HTTP client for provider calls. The timeout bounds how long a
/// hanging provider can stall a federated search or import batch.
pub(crate) fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
}

/// Trait all source adapters implement. One instance per provider,
/// holding that provider's credentials and protocol knowledge.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Registry key, also stored on imported offers.
    fn name(&self) -> &str;

    /// Whether credentials for this provider are present. Unconfigured
    /// adapters stay usable and return empty pages.
    fn is_configured(&self) -> bool;

    /// Fetch one page of raw postings. Never fails: network errors,
    /// non-2xx responses, auth failures and malformed payloads are
    /// logged and yield an empty page, so a degraded provider cannot
    /// take down a federated search.
    async fn search(&self, criteria: &SearchCriteria, page: Page) -> Vec<Value>;

    /// Total mapping from a raw posting to the canonical form. Missing
    /// fields fall back per field; the technologies set is left empty
    /// for the orchestrators to fill from the extractor.
    fn normalize(&self, raw: &Value) -> CanonicalOffer;
}

/// The set of adapters this deployment knows about.
pub struct SourceRegistry {
    sources: Vec<Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    pub fn from_config(config: &Config) -> Self {
        let sources: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(france_travail::FranceTravail::new(
                config.france_travail_client_id.clone(),
                config.france_travail_client_secret.clone(),
            )),
            Arc::new(adzuna::Adzuna::new(
                config.adzuna_app_id.clone(),
                config.adzuna_app_key.clone(),
                config.adzuna_country.clone(),
            )),
        ];
        SourceRegistry { sources }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SourceAdapter>> {
        self.sources.iter().find(|s| s.name() == name).cloned()
    }

    /// Adapters matching a `sources` selector: "all" or one source name.
    pub fn select(&self, selector: &str) -> Vec<Arc<dyn SourceAdapter>> {
        if selector.eq_ignore_ascii_case("all") {
            self.sources.clone()
        } else {
            self.get(selector).into_iter().collect()
        }
    }

    /// Adapters with credentials present, the ones imports run against.
    pub fn configured(&self) -> Vec<Arc<dyn SourceAdapter>> {
        self.sources
            .iter()
            .filter(|s| s.is_configured())
            .cloned()
            .collect()
    }
}
