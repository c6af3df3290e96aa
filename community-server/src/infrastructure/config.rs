use std::time::Duration;

pub const DEFAULT_POSTS_PER_PAGE: u64 = 10;
pub const DEFAULT_INDEX_CACHE_TTL_SECS: u64 = 20;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 3600;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// No URL means the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
    pub posts_per_page: u64,
    pub index_cache_ttl: Duration,
    pub session_ttl: Duration,
    pub admin_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = parse_var("PORT", 8080)?;
        let database_url = optional_var("DATABASE_URL");
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let posts_per_page = parse_var("POSTS_PER_PAGE", DEFAULT_POSTS_PER_PAGE)?;
        if posts_per_page == 0 {
            anyhow::bail!("POSTS_PER_PAGE must be positive");
        }
        let index_cache_ttl =
            Duration::from_secs(parse_var("INDEX_CACHE_TTL_SECS", DEFAULT_INDEX_CACHE_TTL_SECS)?);
        let session_ttl =
            Duration::from_secs(parse_var("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?);
        let admin_token = optional_var("ADMIN_TOKEN");

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            cors_origins,
            posts_per_page,
            index_cache_ttl,
            session_ttl,
            admin_token,
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {}: {}", name, e)),
        None => Ok(default),
    }
}
