use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::sources::{
    CanonicalOffer, ContractType, FALLBACK_COMPANY, FALLBACK_TITLE, Page, SearchCriteria,
    SourceAdapter, detect_remote, http_client,
};

const BASE_URL: &str = "https://api.adzuna.com/v1/api/jobs";

/// Adapter for the Adzuna aggregator API. Credentials travel as query
/// parameters; native pagination is a one-based page number in the URL
/// path.
pub struct Adzuna {
    app_id: Option<String>,
    app_key: Option<String>,
    country: String,
}

impl Adzuna {
    pub fn new(app_id: Option<String>, app_key: Option<String>, country: String) -> Self {
        if app_id.is_none() || app_key.is_none() {
            tracing::warn!("Adzuna credentials are not configured, source will return no offers");
        }
        Adzuna {
            app_id,
            app_key,
            country,
        }
    }
}

/// Translate a logical zero-based page into Adzuna's one-based path
/// segment.
fn native_page(page: Page) -> u32 {
    page.number + 1
}

/// Fixed lookup from Adzuna's `contract_type` and `contract_time`
/// fields. `contract_type` decides the kind; `contract_time` only
/// refines when no kind is given.
fn contract_from_fields(contract_type: Option<&str>, contract_time: Option<&str>) -> ContractType {
    match contract_type {
        Some("permanent") => ContractType::Permanent,
        Some("contract") => ContractType::FixedTerm,
        Some(_) => ContractType::Other,
        None => match contract_time {
            Some("part_time") => ContractType::PartTime,
            _ => ContractType::Unspecified,
        },
    }
}

#[async_trait]
impl SourceAdapter for Adzuna {
    fn name(&self) -> &str {
        "adzuna"
    }

    fn is_configured(&self) -> bool {
        self.app_id.is_some() && self.app_key.is_some()
    }

    async fn search(&self, criteria: &SearchCriteria, page: Page) -> Vec<Value> {
        let (Some(app_id), Some(app_key)) = (&self.app_id, &self.app_key) else {
            tracing::debug!("Adzuna search skipped: not configured");
            return Vec::new();
        };

        let client = match http_client() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Failed to build HTTP client for Adzuna: {e}");
                return Vec::new();
            }
        };

        let mut params: Vec<(&str, String)> = vec![
            ("app_id", app_id.clone()),
            ("app_key", app_key.clone()),
            ("results_per_page", page.size.to_string()),
            ("content-type", "application/json".to_string()),
        ];
        if let Some(keywords) = &criteria.keywords {
            params.push(("what", keywords.clone()));
        }
        if let Some(location) = &criteria.location {
            params.push(("where", location.clone()));
        }
        match criteria.contract_type {
            Some(ContractType::Permanent) => params.push(("permanent", "1".to_string())),
            Some(ContractType::FixedTerm) => params.push(("contract", "1".to_string())),
            Some(ContractType::PartTime) => params.push(("part_time", "1".to_string())),
            _ => {}
        }

        let url = format!("{BASE_URL}/{}/search/{}", self.country, native_page(page));
        let response = match client.get(&url).query(&params).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Adzuna search request failed: {e}");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Adzuna search returned {}", response.status());
            return Vec::new();
        }

        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Failed to parse Adzuna response: {e}");
                return Vec::new();
            }
        };

        data.get("results")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default()
    }

    fn normalize(&self, raw: &Value) -> CanonicalOffer {
        let title = raw
            .get("title")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(FALLBACK_TITLE)
            .to_string();

        let company = raw
            .get("company")
            .and_then(|v| v.get("display_name"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(FALLBACK_COMPANY)
            .to_string();

        let location = raw
            .get("location")
            .and_then(|v| v.get("display_name"))
            .and_then(|v| v.as_str())
            .map(String::from);

        let description = raw
            .get("description")
            .and_then(|v| v.as_str())
            .map(String::from);

        let salary_min = raw.get("salary_min").and_then(|v| v.as_f64()).map(|v| v as i32);
        let salary_max = raw.get("salary_max").and_then(|v| v.as_f64()).map(|v| v as i32);

        let contract_type = contract_from_fields(
            raw.get("contract_type").and_then(|v| v.as_str()),
            raw.get("contract_time").and_then(|v| v.as_str()),
        );

        let source_url = raw
            .get("redirect_url")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let posted_at = raw
            .get("created")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let remote = detect_remote(location.as_deref(), description.as_deref());

        CanonicalOffer {
            title,
            company,
            location,
            description,
            salary_min,
            salary_max,
            contract_type,
            remote,
            source: self.name().to_string(),
            source_url,
            posted_at,
            technologies: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapter() -> Adzuna {
        Adzuna::new(None, None, "fr".to_string())
    }

    #[test]
    fn native_page_is_one_based() {
        assert_eq!(native_page(Page { number: 0, size: 20 }), 1);
        assert_eq!(native_page(Page { number: 2, size: 20 }), 3);
    }

    #[test]
    fn normalize_maps_full_posting() {
        let raw = json!({
            "title": "Full Stack Developer",
            "company": {"display_name": "WebSolutions"},
            "location": {"display_name": "Lyon, Rhône"},
            "description": "JavaScript, Node.js, React. Fully remote position.",
            "salary_min": 40000.0,
            "salary_max": 55000.5,
            "contract_type": "permanent",
            "contract_time": "full_time",
            "redirect_url": "https://adzuna.example/job/42",
            "created": "2026-02-10T00:00:00Z"
        });

        let offer = adapter().normalize(&raw);
        assert_eq!(offer.title, "Full Stack Developer");
        assert_eq!(offer.company, "WebSolutions");
        assert_eq!(offer.salary_min, Some(40000));
        assert_eq!(offer.salary_max, Some(55000));
        assert_eq!(offer.contract_type, ContractType::Permanent);
        assert!(offer.remote);
        assert_eq!(offer.source, "adzuna");
        assert_eq!(offer.source_url, "https://adzuna.example/job/42");
    }

    #[test]
    fn normalize_falls_back_on_missing_fields() {
        let offer = adapter().normalize(&json!({}));
        assert_eq!(offer.title, FALLBACK_TITLE);
        assert_eq!(offer.company, FALLBACK_COMPANY);
        assert_eq!(offer.contract_type, ContractType::Unspecified);
        assert_eq!(offer.salary_min, None);
        assert_eq!(offer.source_url, "");
    }

    #[test]
    fn contract_lookup_precedence() {
        assert_eq!(
            contract_from_fields(Some("contract"), Some("part_time")),
            ContractType::FixedTerm
        );
        assert_eq!(
            contract_from_fields(None, Some("part_time")),
            ContractType::PartTime
        );
        assert_eq!(
            contract_from_fields(Some("apprenticeship"), None),
            ContractType::Other
        );
        assert_eq!(
            contract_from_fields(None, Some("full_time")),
            ContractType::Unspecified
        );
    }
}
