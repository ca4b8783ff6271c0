use std::sync::Arc;

use sqlx::PgPool;

use crate::sources::SourceRegistry;
use crate::tech::TechCatalog;
use crate::tech::classify::ClassifierLists;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub sources: Arc<SourceRegistry>,
    pub catalog: Arc<TechCatalog>,
    pub classifier: Arc<ClassifierLists>,
    pub session_ttl_hours: i64,
}
