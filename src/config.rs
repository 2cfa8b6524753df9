use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub google_api_key: String,
    pub gemini_model: String,
    pub gemini_api_url: String,
    pub sendgrid_api_key: String,
    pub sendgrid_api_url: String,
    pub from_email: String,
    /// Base URL of the retrieval API; `None` disables knowledge-base lookups.
    pub rag_api_url: Option<String>,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "booking.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            google_api_key: env::var("GOOGLE_API_KEY").unwrap_or_default(),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            gemini_api_url: env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            sendgrid_api_key: env::var("SENDGRID_API_KEY").unwrap_or_default(),
            sendgrid_api_url: env::var("SENDGRID_API_URL")
                .unwrap_or_else(|_| "https://api.sendgrid.com".to_string()),
            from_email: env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "bookings@example.com".to_string()),
            rag_api_url: env::var("RAG_API_URL").ok().filter(|v| !v.trim().is_empty()),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }
}
