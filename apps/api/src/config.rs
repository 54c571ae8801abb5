use anyhow::{Context, Result};

/// Which backend screens CVs submitted with an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenerBackend {
    Gemini,
    Keyword,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub gemini_api_key: String,
    pub openai_api_key: String,
    pub youtube_api_key: String,
    pub auth_secret: String,
    pub token_ttl_hours: i64,
    pub screener: ScreenerBackend,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            youtube_api_key: require_env("YOUTUBE_API_KEY")?,
            auth_secret: require_env("AUTH_SECRET")
                .or_else(|_| require_env("NEXTAUTH_SECRET"))
                .context("Either AUTH_SECRET or NEXTAUTH_SECRET must be set")?,
            token_ttl_hours: std::env::var("TOKEN_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse::<i64>()
                .context("TOKEN_TTL_HOURS must be an integer")?,
            screener: parse_screener(
                &std::env::var("CV_SCREENER").unwrap_or_else(|_| "gemini".to_string()),
            )?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_screener(value: &str) -> Result<ScreenerBackend> {
    match value.trim().to_ascii_lowercase().as_str() {
        "gemini" => Ok(ScreenerBackend::Gemini),
        "keyword" => Ok(ScreenerBackend::Keyword),
        other => anyhow::bail!("CV_SCREENER must be 'gemini' or 'keyword', got '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_screener_accepts_known_backends() {
        assert_eq!(parse_screener("gemini").unwrap(), ScreenerBackend::Gemini);
        assert_eq!(parse_screener(" Keyword ").unwrap(), ScreenerBackend::Keyword);
    }

    #[test]
    fn test_parse_screener_rejects_unknown() {
        let err = parse_screener("openai").unwrap_err();
        assert!(err.to_string().contains("openai"));
    }
}
