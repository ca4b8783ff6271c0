use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::sources::{
    CanonicalOffer, ContractType, FALLBACK_COMPANY, FALLBACK_TITLE, Page, SearchCriteria,
    SourceAdapter, detect_remote, http_client,
};

const BASE_URL: &str = "https://api.francetravail.io/partenaire/offresdemploi/v2";
const AUTH_URL: &str = "https://entreprise.francetravail.fr/connexion/oauth2/access_token";
const AUTH_SCOPE: &str = "api_offresdemploiv2 o2dsoffre";

/// Tokens are refreshed this many seconds before their announced expiry
/// so an in-flight search never races the cutoff.
const TOKEN_MARGIN_SECS: i64 = 60;

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Adapter for the France Travail (government employment service) offer
/// API. OAuth2 client-credentials with a cached bearer token; native
/// pagination is a zero-based offset range.
pub struct FranceTravail {
    client_id: Option<String>,
    client_secret: Option<String>,
    token: Mutex<Option<CachedToken>>,
}

impl FranceTravail {
    pub fn new(client_id: Option<String>, client_secret: Option<String>) -> Self {
        if client_id.is_none() || client_secret.is_none() {
            tracing::warn!("France Travail credentials are not configured, source will return no offers");
        }
        FranceTravail {
            client_id,
            client_secret,
            token: Mutex::new(None),
        }
    }

    /// Return a bearer token, re-authenticating when the cached one is
    /// absent or inside the expiry margin. On auth failure the caller
    /// proceeds without credentials and lets the search fail soft.
    async fn get_valid_token(&self) -> Option<String> {
        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret)
        else {
            return None;
        };

        let mut cached = self.token.lock().await;
        if let Some(entry) = cached.as_ref()
            && entry.expires_at > Utc::now() + Duration::seconds(TOKEN_MARGIN_SECS)
        {
            return Some(entry.token.clone());
        }

        let client = match http_client() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Failed to build HTTP client for France Travail auth: {e}");
                return None;
            }
        };

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("scope", AUTH_SCOPE),
        ];

        let response = client
            .post(AUTH_URL)
            .query(&[("realm", "/partenaire")])
            .form(&params)
            .send()
            .await;

        let data: Value = match response {
            Ok(resp) if resp.status().is_success() => match resp.json().await {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("France Travail auth response was not valid JSON: {e}");
                    return None;
                }
            },
            Ok(resp) => {
                tracing::warn!("France Travail authentication returned {}", resp.status());
                return None;
            }
            Err(e) => {
                tracing::warn!("France Travail authentication failed: {e}");
                return None;
            }
        };

        let token = data.get("access_token").and_then(|v| v.as_str())?.to_string();
        let expires_in = data.get("expires_in").and_then(|v| v.as_i64()).unwrap_or(3600);
        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at: Utc::now() + Duration::seconds(expires_in),
        });
        tracing::debug!("France Travail token refreshed, valid for {expires_in}s");
        Some(token)
    }
}

/// Translate a logical page into the API's zero-based offset range,
/// e.g. page 2 of size 20 becomes "40-59".
fn offset_range(page: Page) -> String {
    let start = page.number * page.size;
    format!("{start}-{}", start + page.size - 1)
}

/// Fixed lookup from the API's contract codes.
fn contract_from_code(code: Option<&str>) -> ContractType {
    match code {
        Some("CDI") => ContractType::Permanent,
        Some("CDD") => ContractType::FixedTerm,
        Some("MIS") => ContractType::Temp,
        Some("SAI") => ContractType::Seasonal,
        Some("LIB") => ContractType::Freelance,
        Some(_) => ContractType::Other,
        None => ContractType::Unspecified,
    }
}

/// Reverse lookup for the `typeContrat` request parameter; canonical
/// types without a native code are filtered after the fetch instead.
fn native_contract_code(contract_type: ContractType) -> Option<&'static str> {
    match contract_type {
        ContractType::Permanent => Some("CDI"),
        ContractType::FixedTerm => Some("CDD"),
        ContractType::Temp => Some("MIS"),
        ContractType::Seasonal => Some("SAI"),
        ContractType::Freelance => Some("LIB"),
        _ => None,
    }
}

#[async_trait]
impl SourceAdapter for FranceTravail {
    fn name(&self) -> &str {
        "francetravail"
    }

    fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    async fn search(&self, criteria: &SearchCriteria, page: Page) -> Vec<Value> {
        let token = self.get_valid_token().await;

        let client = match http_client() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Failed to build HTTP client for France Travail: {e}");
                return Vec::new();
            }
        };

        let mut params: Vec<(&str, String)> = vec![("range", offset_range(page))];
        if let Some(keywords) = &criteria.keywords {
            params.push(("motsCles", keywords.clone()));
        }
        if let Some(location) = &criteria.location {
            params.push(("commune", location.clone()));
        }
        if let Some(code) = criteria.contract_type.and_then(native_contract_code) {
            params.push(("typeContrat", code.to_string()));
        }

        let mut request = client.get(format!("{BASE_URL}/offres/search")).query(&params);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("France Travail search request failed: {e}");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            tracing::warn!("France Travail search returned {}", response.status());
            return Vec::new();
        }

        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Failed to parse France Travail response: {e}");
                return Vec::new();
            }
        };

        data.get("resultats")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default()
    }

    fn normalize(&self, raw: &Value) -> CanonicalOffer {
        let title = raw
            .get("intitule")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(FALLBACK_TITLE)
            .to_string();

        let company = raw
            .get("entreprise")
            .and_then(|v| v.get("nom"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(FALLBACK_COMPANY)
            .to_string();

        let location = raw
            .get("lieuTravail")
            .and_then(|v| v.get("libelle"))
            .and_then(|v| v.as_str())
            .map(String::from);

        let description = raw
            .get("description")
            .and_then(|v| v.as_str())
            .map(String::from);

        let contract_type =
            contract_from_code(raw.get("typeContrat").and_then(|v| v.as_str()));

        let source_url = raw
            .get("origineOffre")
            .and_then(|v| v.get("urlOrigine"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let posted_at = raw
            .get("dateCreation")
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
            // Salary is only exposed as a free-text label.
            salary_min: None,
            salary_max: None,
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

    fn adapter() -> FranceTravail {
        FranceTravail::new(None, None)
    }

    #[test]
    fn offset_range_is_zero_based() {
        assert_eq!(offset_range(Page { number: 0, size: 20 }), "0-19");
        assert_eq!(offset_range(Page { number: 2, size: 20 }), "40-59");
        assert_eq!(offset_range(Page { number: 1, size: 5 }), "5-9");
    }

    #[test]
    fn normalize_maps_full_posting() {
        let raw = json!({
            "intitule": "Ingénieur DevOps",
            "description": "Docker, Kubernetes, AWS. Télétravail partiel.",
            "entreprise": {"nom": "CloudTech"},
            "lieuTravail": {"libelle": "Bordeaux"},
            "typeContrat": "CDI",
            "origineOffre": {"urlOrigine": "https://example.com/offres/101"},
            "dateCreation": "2026-03-01T08:30:00Z"
        });

        let offer = adapter().normalize(&raw);
        assert_eq!(offer.title, "Ingénieur DevOps");
        assert_eq!(offer.company, "CloudTech");
        assert_eq!(offer.location.as_deref(), Some("Bordeaux"));
        assert_eq!(offer.contract_type, ContractType::Permanent);
        assert!(offer.remote);
        assert_eq!(offer.source, "francetravail");
        assert_eq!(offer.source_url, "https://example.com/offres/101");
        assert_eq!(offer.posted_at.to_rfc3339(), "2026-03-01T08:30:00+00:00");
    }

    #[test]
    fn normalize_never_leaves_title_or_company_empty() {
        let offer = adapter().normalize(&json!({}));
        assert_eq!(offer.title, FALLBACK_TITLE);
        assert_eq!(offer.company, FALLBACK_COMPANY);
        assert_eq!(offer.contract_type, ContractType::Unspecified);
        assert!(!offer.remote);
        assert_eq!(offer.source_url, "");
        assert!(offer.technologies.is_empty());
    }

    #[test]
    fn unmapped_contract_code_becomes_other() {
        let offer = adapter().normalize(&json!({"typeContrat": "CCE"}));
        assert_eq!(offer.contract_type, ContractType::Other);
    }

    #[test]
    fn native_contract_codes_round_trip() {
        assert_eq!(native_contract_code(ContractType::Permanent), Some("CDI"));
        assert_eq!(native_contract_code(ContractType::Seasonal), Some("SAI"));
        assert_eq!(native_contract_code(ContractType::Internship), None);
    }
}
