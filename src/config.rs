use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "jobtech-radar", about = "Job offer aggregation and tech trend portal")]
pub struct Config {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Run database migrations on startup
    #[arg(long, env = "RUN_MIGRATIONS", default_value = "true")]
    pub run_migrations: bool,

    /// France Travail API client id
    #[arg(long, env = "FRANCE_TRAVAIL_CLIENT_ID")]
    pub france_travail_client_id: Option<String>,

    /// France Travail API client secret
    #[arg(long, env = "FRANCE_TRAVAIL_CLIENT_SECRET")]
    pub france_travail_client_secret: Option<String>,

    /// Adzuna application id
    #[arg(long, env = "ADZUNA_APP_ID")]
    pub adzuna_app_id: Option<String>,

    /// Adzuna application key
    #[arg(long, env = "ADZUNA_APP_KEY")]
    pub adzuna_app_key: Option<String>,

    /// Adzuna country code for search requests
    #[arg(long, env = "ADZUNA_COUNTRY", default_value = "fr")]
    pub adzuna_country: String,

    /// Override path for the technology vocabulary (JSON)
    #[arg(long, env = "TECH_VOCABULARY_PATH")]
    pub tech_vocabulary: Option<std::path::PathBuf>,

    /// Override path for the relevance classifier keyword lists (JSON)
    #[arg(long, env = "CLASSIFIER_LISTS_PATH")]
    pub classifier_lists: Option<std::path::PathBuf>,

    /// Session lifetime in hours
    #[arg(long, env = "SESSION_TTL_HOURS", default_value = "24")]
    pub session_ttl_hours: i64,
}
