// Import orchestrator: drives one or more source adapters page by page
// and persists new offers, de-duplicated against the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::offer::Offer;
use crate::models::technology::Technology;
use crate::sources::{CanonicalOffer, Page, SearchCriteria, SourceAdapter};
use crate::tech::TechCatalog;

const IMPORT_PAGE_SIZE: u32 = 20;

/// The store the orchestrator writes through. Kept as a trait so the
/// import logic is exercised in tests without a database.
#[async_trait]
pub trait OfferStore: Send + Sync {
    async fn find_by_source_url(&self, url: &str) -> Result<Option<i32>, AppError>;
    async fn find_by_title_and_company(
        &self,
        title: &str,
        company: &str,
    ) -> Result<Option<i32>, AppError>;
    async fn find_or_create_technology(
        &self,
        name: &str,
        category: &str,
    ) -> Result<i32, AppError>;
    async fn insert_offer(
        &self,
        offer: &CanonicalOffer,
        technology_ids: &[i32],
    ) -> Result<i32, AppError>;
}

#[async_trait]
impl OfferStore for PgPool {
    async fn find_by_source_url(&self, url: &str) -> Result<Option<i32>, AppError> {
        Ok(Offer::find_by_source_url(self, url).await?.map(|o| o.id))
    }

    async fn find_by_title_and_company(
        &self,
        title: &str,
        company: &str,
    ) -> Result<Option<i32>, AppError> {
        Ok(Offer::find_by_title_and_company(self, title, company)
            .await?
            .map(|o| o.id))
    }

    async fn find_or_create_technology(
        &self,
        name: &str,
        category: &str,
    ) -> Result<i32, AppError> {
        Ok(Technology::find_or_create(self, name, category).await?.id)
    }

    async fn insert_offer(
        &self,
        offer: &CanonicalOffer,
        technology_ids: &[i32],
    ) -> Result<i32, AppError> {
        Ok(Offer::insert_canonical(self, offer, technology_ids).await?.id)
    }
}

/// What a single-source import did: postings seen vs offers actually
/// created (re-encountered postings are not counted).
#[derive(Debug, Default, Clone, Copy)]
pub struct ImportReport {
    pub fetched: usize,
    pub imported: usize,
}

/// Import up to `max_offers` new offers from one source. Pages through
/// the adapter until the target is reached or the source runs dry; one
/// bad posting never aborts the batch.
pub async fn import_from_source(
    store: &dyn OfferStore,
    adapter: &dyn SourceAdapter,
    catalog: &TechCatalog,
    criteria: &SearchCriteria,
    max_offers: usize,
) -> Result<ImportReport, AppError> {
    let mut report = ImportReport::default();
    let mut page_number = 0u32;

    'pages: loop {
        let page = Page {
            number: page_number,
            size: IMPORT_PAGE_SIZE,
        };
        let postings = adapter.search(criteria, page).await;
        if postings.is_empty() {
            break;
        }

        for raw in &postings {
            if report.imported >= max_offers {
                break 'pages;
            }
            report.fetched += 1;

            let offer = adapter.normalize(raw);
            let title = offer.title.clone();
            let company = offer.company.clone();
            match import_offer(store, catalog, offer).await {
                Ok(true) => {
                    report.imported += 1;
                    tracing::info!(source = adapter.name(), "Imported offer: {title} - {company}");
                }
                Ok(false) => {
                    tracing::debug!(source = adapter.name(), "Offer already known: {title} - {company}");
                }
                Err(e) => {
                    tracing::warn!(
                        source = adapter.name(),
                        "Failed to import offer '{title}' from '{company}': {e}"
                    );
                }
            }
        }

        if postings.len() < IMPORT_PAGE_SIZE as usize {
            break;
        }
        page_number += 1;
    }

    Ok(report)
}

/// Persist one normalized posting. Returns false when the offer is
/// already stored (matched by source URL, then by title+company).
async fn import_offer(
    store: &dyn OfferStore,
    catalog: &TechCatalog,
    mut offer: CanonicalOffer,
) -> Result<bool, AppError> {
    let entries = catalog.extract(&offer.extraction_text());
    let mut technology_ids = Vec::with_capacity(entries.len());
    for entry in &entries {
        technology_ids.push(
            store
                .find_or_create_technology(&entry.name, &entry.category)
                .await?,
        );
    }
    offer.technologies = entries.iter().map(|e| e.name.clone()).collect();

    if !offer.source_url.is_empty()
        && store.find_by_source_url(&offer.source_url).await?.is_some()
    {
        return Ok(false);
    }
    if store
        .find_by_title_and_company(&offer.title, &offer.company)
        .await?
        .is_some()
    {
        return Ok(false);
    }

    store.insert_offer(&offer, &technology_ids).await?;
    Ok(true)
}

/// Run a capped import against every given adapter. A source-level
/// failure records 0 for that source and the others keep going.
pub async fn import_from_all_sources(
    store: &dyn OfferStore,
    adapters: &[Arc<dyn SourceAdapter>],
    catalog: &TechCatalog,
    criteria: &SearchCriteria,
    max_offers_per_source: usize,
) -> BTreeMap<String, usize> {
    let mut results = BTreeMap::new();
    for adapter in adapters {
        let imported = match import_from_source(
            store,
            adapter.as_ref(),
            catalog,
            criteria,
            max_offers_per_source,
        )
        .await
        {
            Ok(report) => report.imported,
            Err(e) => {
                tracing::error!(source = adapter.name(), "Import failed: {e}");
                0
            }
        };
        results.insert(adapter.name().to_string(), imported);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    use crate::sources::{ContractType, FALLBACK_COMPANY, FALLBACK_TITLE};
    use chrono::Utc;

    #[derive(Default)]
    struct MemoryStore {
        offers: Mutex<Vec<(i32, String, String, String)>>,
        technologies: Mutex<Vec<(i32, String)>>,
        reject_titles: Vec<String>,
    }

    #[async_trait]
    impl OfferStore for MemoryStore {
        async fn find_by_source_url(&self, url: &str) -> Result<Option<i32>, AppError> {
            Ok(self
                .offers
                .lock()
                .unwrap()
                .iter()
                .find(|(_, _, _, stored)| !stored.is_empty() && stored == url)
                .map(|(id, _, _, _)| *id))
        }

        async fn find_by_title_and_company(
            &self,
            title: &str,
            company: &str,
        ) -> Result<Option<i32>, AppError> {
            Ok(self
                .offers
                .lock()
                .unwrap()
                .iter()
                .find(|(_, t, c, _)| {
                    t.eq_ignore_ascii_case(title) && c.eq_ignore_ascii_case(company)
                })
                .map(|(id, _, _, _)| *id))
        }

        async fn find_or_create_technology(
            &self,
            name: &str,
            _category: &str,
        ) -> Result<i32, AppError> {
            let mut techs = self.technologies.lock().unwrap();
            if let Some((id, _)) = techs
                .iter()
                .find(|(_, n)| n.eq_ignore_ascii_case(name))
            {
                return Ok(*id);
            }
            let id = techs.len() as i32 + 1;
            techs.push((id, name.to_string()));
            Ok(id)
        }

        async fn insert_offer(
            &self,
            offer: &CanonicalOffer,
            _technology_ids: &[i32],
        ) -> Result<i32, AppError> {
            if self.reject_titles.contains(&offer.title) {
                return Err(AppError::Internal("simulated store rejection".into()));
            }
            let mut offers = self.offers.lock().unwrap();
            let id = offers.len() as i32 + 1;
            offers.push((
                id,
                offer.title.clone(),
                offer.company.clone(),
                offer.source_url.clone(),
            ));
            Ok(id)
        }
    }

    /// Adapter returning scripted pages of `{title, company, url, description}`.
    struct ScriptedSource {
        name: &'static str,
        pages: Vec<Vec<Value>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Vec<Value>>) -> Self {
            ScriptedSource {
                name: "scripted",
                pages,
            }
        }
    }

    #[async_trait]
    impl SourceAdapter for ScriptedSource {
        fn name(&self) -> &str {
            self.name
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn search(&self, _criteria: &SearchCriteria, page: Page) -> Vec<Value> {
            self.pages
                .get(page.number as usize)
                .cloned()
                .unwrap_or_default()
        }

        fn normalize(&self, raw: &Value) -> CanonicalOffer {
            CanonicalOffer {
                title: raw
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or(FALLBACK_TITLE)
                    .to_string(),
                company: raw
                    .get("company")
                    .and_then(|v| v.as_str())
                    .unwrap_or(FALLBACK_COMPANY)
                    .to_string(),
                location: None,
                description: raw
                    .get("description")
                    .and_then(|v| v.as_str())
                    .map(String::from),
                salary_min: None,
                salary_max: None,
                contract_type: ContractType::Unspecified,
                remote: false,
                source: "scripted".to_string(),
                source_url: raw
                    .get("url")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                posted_at: Utc::now(),
                technologies: Vec::new(),
            }
        }
    }

    fn posting(title: &str, company: &str, url: &str, description: &str) -> Value {
        json!({"title": title, "company": company, "url": url, "description": description})
    }

    fn catalog() -> TechCatalog {
        TechCatalog::load(None).unwrap()
    }

    #[tokio::test]
    async fn imports_new_offers_and_counts_them() {
        let store = MemoryStore::default();
        let source = ScriptedSource::new(vec![vec![
            posting("Dev Python", "Acme", "https://jobs/1", "Python et Docker"),
            posting("Dev Rust", "Acme", "https://jobs/2", "Rust et PostgreSQL"),
        ]]);

        let report =
            import_from_source(&store, &source, &catalog(), &SearchCriteria::default(), 50)
                .await
                .unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.fetched, 2);
        assert_eq!(store.offers.lock().unwrap().len(), 2);
        // Docker, Python, Rust, PostgreSQL resolved once each.
        assert_eq!(store.technologies.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn second_import_is_idempotent() {
        let store = MemoryStore::default();
        let source = ScriptedSource::new(vec![vec![
            posting("Dev Python", "Acme", "https://jobs/1", ""),
            posting("Dev Rust", "Acme", "", ""),
        ]]);

        let first =
            import_from_source(&store, &source, &catalog(), &SearchCriteria::default(), 50)
                .await
                .unwrap();
        assert_eq!(first.imported, 2);

        // First candidate matches by URL, second (no URL) by title+company.
        let second =
            import_from_source(&store, &source, &catalog(), &SearchCriteria::default(), 50)
                .await
                .unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(store.offers.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn one_rejected_posting_does_not_abort_the_batch() {
        let store = MemoryStore {
            reject_titles: vec!["Poisoned".to_string()],
            ..MemoryStore::default()
        };
        let source = ScriptedSource::new(vec![vec![
            posting("Dev Python", "Acme", "https://jobs/1", ""),
            posting("Poisoned", "Acme", "https://jobs/2", ""),
            posting("Dev Rust", "Acme", "https://jobs/3", ""),
        ]]);

        let report =
            import_from_source(&store, &source, &catalog(), &SearchCriteria::default(), 50)
                .await
                .unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.fetched, 3);
    }

    #[tokio::test]
    async fn stops_at_max_offers() {
        let store = MemoryStore::default();
        let source = ScriptedSource::new(vec![vec![
            posting("A", "Acme", "https://jobs/1", ""),
            posting("B", "Acme", "https://jobs/2", ""),
            posting("C", "Acme", "https://jobs/3", ""),
        ]]);

        let report =
            import_from_source(&store, &source, &catalog(), &SearchCriteria::default(), 2)
                .await
                .unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(store.offers.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn short_page_ends_the_loop() {
        // A single short page must not trigger a second fetch; a second
        // fetch would return nothing here anyway, so assert via counts.
        let store = MemoryStore::default();
        let source = ScriptedSource::new(vec![
            vec![posting("A", "Acme", "https://jobs/1", "")],
            vec![posting("B", "Acme", "https://jobs/2", "")],
        ]);

        let report =
            import_from_source(&store, &source, &catalog(), &SearchCriteria::default(), 50)
                .await
                .unwrap();
        // Page 0 is short (1 < 20) so page 1 is never requested.
        assert_eq!(report.imported, 1);
    }

    #[tokio::test]
    async fn technologies_resolve_case_insensitively() {
        let store = MemoryStore::default();
        let source = ScriptedSource::new(vec![vec![
            posting("A", "Acme", "https://jobs/1", "docker everywhere"),
            posting("B", "Acme", "https://jobs/2", "Docker again"),
        ]]);

        import_from_source(&store, &source, &catalog(), &SearchCriteria::default(), 50)
            .await
            .unwrap();
        assert_eq!(store.technologies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn all_sources_fan_out_reports_per_source() {
        let store = MemoryStore::default();
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(ScriptedSource {
                name: "first",
                pages: vec![vec![posting("A", "Acme", "https://jobs/1", "")]],
            }),
            Arc::new(ScriptedSource {
                name: "second",
                pages: vec![],
            }),
        ];

        let results = import_from_all_sources(
            &store,
            &adapters,
            &catalog(),
            &SearchCriteria::default(),
            10,
        )
        .await;
        assert_eq!(results.get("first"), Some(&1));
        assert_eq!(results.get("second"), Some(&0));
        assert_eq!(store.offers.lock().unwrap().len(), 1);
    }
}
