use serde::Deserialize;

/// Longest accepted access token lifetime (30 days)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 30;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL. When unset the in-memory store is used.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Maximum pooled database connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// TMDb v3 API key
    #[serde(default)]
    pub tmdb_api_key: String,

    /// TMDb API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Prefix used to turn TMDb image paths into absolute URLs
    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    /// Language sent with every TMDb request
    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    /// HMAC secret for access tokens
    pub jwt_secret: String,

    /// Access token lifetime
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,

    /// bcrypt work factor for stored passwords
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_db_max_connections() -> u32 {
    5
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_tmdb_language() -> String {
    "en-US".to_string()
}

fn default_token_ttl_minutes() -> i64 {
    60
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of `KEY=value` pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.jwt_secret.trim().is_empty() {
            anyhow::bail!("Failed to load config: JWT_SECRET must not be empty");
        }

        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&config.token_ttl_minutes) {
            anyhow::bail!(
                "Failed to load config: TOKEN_TTL_MINUTES must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_MINUTES,
                config.token_ttl_minutes
            );
        }

        if !(4..=31).contains(&config.bcrypt_cost) {
            anyhow::bail!(
                "Failed to load config: BCRYPT_COST must be between 4 and 31, got {}",
                config.bcrypt_cost
            );
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
