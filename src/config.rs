use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub scheduling_base_url: String,
    pub scheduling_api_key: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "reconcile.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            scheduling_base_url: env::var("SCHEDULING_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api".to_string()),
            scheduling_api_key: env::var("SCHEDULING_API_KEY").unwrap_or_default(),
        }
    }
}
