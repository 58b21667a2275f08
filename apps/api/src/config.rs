use anyhow::{Context, Result};

const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "openai/gpt-4o";
const DEFAULT_CRITERIA_SOURCE: &str = "data/schools.json";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub openrouter_api_key: String,
    pub openrouter_base_url: String,
    /// Model used when a request does not name one.
    pub default_model: String,
    /// Local `.json` catalogue, `.txt` briefs, or `s3://bucket/key`.
    pub criteria_source: String,
    /// Custom S3 endpoint (MinIO in local development).
    pub s3_endpoint: Option<String>,
    pub daily_credit_limit: i32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            openrouter_api_key: require_env("OPENROUTER_API_KEY")?,
            openrouter_base_url: optional_env("OPENROUTER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.to_string()),
            default_model: optional_env("DEFAULT_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            criteria_source: optional_env("CRITERIA_SOURCE")
                .unwrap_or_else(|| DEFAULT_CRITERIA_SOURCE.to_string()),
            s3_endpoint: optional_env("S3_ENDPOINT"),
            daily_credit_limit: optional_env("DAILY_CREDIT_LIMIT")
                .unwrap_or_else(|| "5".to_string())
                .parse::<i32>()
                .context("DAILY_CREDIT_LIMIT must be an integer")?,
            port: optional_env("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
impl Config {
    /// Config with placeholder connection strings; handlers under test never dial them.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/committee_test".to_string(),
            redis_url: "redis://localhost".to_string(),
            openrouter_api_key: "test-key".to_string(),
            openrouter_base_url: DEFAULT_OPENROUTER_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            criteria_source: DEFAULT_CRITERIA_SOURCE.to_string(),
            s3_endpoint: None,
            daily_credit_limit: 5,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}
