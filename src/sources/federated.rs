// Federated search: live multi-source fan-out with no persistence.

use std::sync::Arc;

use serde::Deserialize;

use crate::sources::{CanonicalOffer, ContractType, Page, SearchCriteria, SourceAdapter};
use crate::tech::TechCatalog;
use crate::tech::classify::ClassifierLists;

pub const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Date,
    Relevance,
}

/// Explicit query object for a federated search; every filter is
/// independently optional.
#[derive(Debug, Clone)]
pub struct FederatedQuery {
    pub keywords: Option<String>,
    pub location: Option<String>,
    pub contract_type: Option<ContractType>,
    pub remote: Option<bool>,
    pub tech_only: bool,
    pub sort_by: SortBy,
    pub limit: usize,
    pub page: u32,
}

impl Default for FederatedQuery {
    fn default() -> Self {
        FederatedQuery {
            keywords: None,
            location: None,
            contract_type: None,
            remote: None,
            tech_only: true,
            sort_by: SortBy::Date,
            limit: DEFAULT_LIMIT,
            page: 0,
        }
    }
}

/// Query the given adapters live and return a bounded, filtered result
/// page. A degraded source contributes nothing instead of failing the
/// aggregate (its adapter already absorbed the failure).
pub async fn federated_search(
    adapters: &[Arc<dyn SourceAdapter>],
    catalog: &TechCatalog,
    classifier: &ClassifierLists,
    query: &FederatedQuery,
) -> Vec<CanonicalOffer> {
    let criteria = SearchCriteria {
        keywords: query.keywords.clone(),
        location: query.location.clone(),
        contract_type: query.contract_type,
    };
    let page = Page {
        number: query.page,
        size: query.limit as u32,
    };

    let mut results = Vec::new();
    for adapter in adapters {
        let postings = adapter.search(&criteria, page).await;
        tracing::debug!(
            source = adapter.name(),
            count = postings.len(),
            "Fetched federated search page"
        );
        for raw in &postings {
            let mut offer = adapter.normalize(raw);
            offer.technologies = catalog.extract_names(&offer.extraction_text());

            if let Some(wanted) = query.contract_type
                && offer.contract_type != wanted
            {
                continue;
            }
            if let Some(wanted) = query.remote
                && offer.remote != wanted
            {
                continue;
            }
            if query.tech_only && !classifier.is_tech_offer(&offer) {
                continue;
            }
            results.push(offer);
        }
    }

    if query.sort_by == SortBy::Date {
        results.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
    }
    results.truncate(query.limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    /// Test adapter whose raw postings are already canonical-shaped.
    struct FakeSource {
        name: &'static str,
        postings: Vec<Value>,
    }

    #[async_trait]
    impl SourceAdapter for FakeSource {
        fn name(&self) -> &str {
            self.name
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn search(&self, _criteria: &SearchCriteria, page: Page) -> Vec<Value> {
            if page.number == 0 {
                self.postings.clone()
            } else {
                Vec::new()
            }
        }

        fn normalize(&self, raw: &Value) -> CanonicalOffer {
            CanonicalOffer {
                title: raw["title"].as_str().unwrap_or("Untitled").to_string(),
                company: "Acme".to_string(),
                location: None,
                description: raw
                    .get("description")
                    .and_then(|v| v.as_str())
                    .map(String::from),
                salary_min: None,
                salary_max: None,
                contract_type: raw
                    .get("contract_type")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .unwrap_or(ContractType::Unspecified),
                remote: raw.get("remote").and_then(|v| v.as_bool()).unwrap_or(false),
                source: self.name.to_string(),
                source_url: String::new(),
                posted_at: raw
                    .get("day")
                    .and_then(|v| v.as_i64())
                    .map(|d| Utc.with_ymd_and_hms(2026, 3, d as u32, 0, 0, 0).unwrap())
                    .unwrap_or_else(Utc::now),
                technologies: Vec::new(),
            }
        }
    }

    fn arc(source: FakeSource) -> Arc<dyn SourceAdapter> {
        Arc::new(source)
    }

    fn catalog() -> TechCatalog {
        TechCatalog::load(None).unwrap()
    }

    fn classifier() -> ClassifierLists {
        ClassifierLists::load(None).unwrap()
    }

    #[tokio::test]
    async fn degraded_source_still_yields_partial_results() {
        let healthy = arc(FakeSource {
            name: "healthy",
            postings: vec![json!({"title": "Développeur Python", "day": 1})],
        });
        // A failing provider surfaces as an empty page (the adapter
        // absorbed the error).
        let degraded = arc(FakeSource {
            name: "degraded",
            postings: vec![],
        });

        let results = federated_search(
            &[healthy, degraded],
            &catalog(),
            &classifier(),
            &FederatedQuery::default(),
        )
        .await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "healthy");
    }

    #[tokio::test]
    async fn contract_and_remote_filters_are_exact() {
        let source = arc(FakeSource {
            name: "one",
            postings: vec![
                json!({"title": "Développeur A", "contract_type": "permanent", "remote": true}),
                json!({"title": "Développeur B", "contract_type": "permanent", "remote": false}),
                json!({"title": "Développeur C", "contract_type": "fixed-term", "remote": true}),
            ],
        });

        let query = FederatedQuery {
            contract_type: Some(ContractType::Permanent),
            remote: Some(true),
            ..FederatedQuery::default()
        };
        let results = federated_search(&[source], &catalog(), &classifier(), &query).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Développeur A");
    }

    #[tokio::test]
    async fn tech_only_applies_the_classifier() {
        let source = arc(FakeSource {
            name: "one",
            postings: vec![
                json!({"title": "Développeur backend"}),
                json!({"title": "Chef de cuisine"}),
            ],
        });

        let all = federated_search(
            &[Arc::clone(&source)],
            &catalog(),
            &classifier(),
            &FederatedQuery {
                tech_only: false,
                ..FederatedQuery::default()
            },
        )
        .await;
        assert_eq!(all.len(), 2);

        let tech_only = federated_search(
            &[source],
            &catalog(),
            &classifier(),
            &FederatedQuery::default(),
        )
        .await;
        assert_eq!(tech_only.len(), 1);
        assert_eq!(tech_only[0].title, "Développeur backend");
    }

    #[tokio::test]
    async fn date_sort_is_descending_and_limit_truncates() {
        let source = arc(FakeSource {
            name: "one",
            postings: vec![
                json!({"title": "Développeur vieux", "day": 2}),
                json!({"title": "Développeur récent", "day": 9}),
                json!({"title": "Développeur moyen", "day": 5}),
            ],
        });

        let query = FederatedQuery {
            limit: 2,
            ..FederatedQuery::default()
        };
        let results = federated_search(&[source], &catalog(), &classifier(), &query).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Développeur récent");
        assert_eq!(results[1].title, "Développeur moyen");
    }

    #[tokio::test]
    async fn technologies_are_attached_from_the_extractor() {
        let source = arc(FakeSource {
            name: "one",
            postings: vec![json!({
                "title": "Développeur",
                "description": "Stack: Python, Docker et PostgreSQL"
            })],
        });

        let results = federated_search(
            &[source],
            &catalog(),
            &classifier(),
            &FederatedQuery::default(),
        )
        .await;
        assert_eq!(results.len(), 1);
        assert!(results[0].technologies.contains(&"Python".to_string()));
        assert!(results[0].technologies.contains(&"Docker".to_string()));
    }
}
