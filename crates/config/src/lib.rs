//! Bundlescope configuration
use clap::Parser;
use url::Url;

/// Origins allowed by default when `ALLOWED_ORIGINS` is not set.
pub const DEFAULT_ALLOWED_ORIGINS: &str =
    "https://bundlescope.xyz,https://www.bundlescope.xyz";

/// Clickhouse database configuration options
#[derive(Debug, Clone, Parser)]
pub struct ClickhouseOpts {
    /// Clickhouse URL
    #[clap(long, env = "CLICKHOUSE_URL")]
    pub url: Url,
    /// Clickhouse database
    #[clap(long, env = "CLICKHOUSE_DB")]
    pub db: String,
    /// Clickhouse username
    #[clap(long, env = "CLICKHOUSE_USERNAME")]
    pub username: String,
    /// Clickhouse password
    #[clap(long, env = "CLICKHOUSE_PASSWORD")]
    pub password: String,
}

/// HTTP listener configuration options
#[derive(Debug, Clone, Parser)]
pub struct ApiOpts {
    /// Host the API server binds to
    #[clap(long, env = "API_HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// Port the API server binds to
    #[clap(long, env = "API_PORT", default_value = "3000")]
    pub port: u16,
    /// Comma-separated list of origins allowed by CORS
    #[clap(long, env = "ALLOWED_ORIGINS", default_value = DEFAULT_ALLOWED_ORIGINS, value_delimiter = ',')]
    pub allowed_origins: Vec<String>,
    /// Maximum requests allowed per rate limiting period
    #[clap(long, env = "RATE_LIMIT_MAX_REQUESTS", default_value_t = u64::MAX)]
    pub rate_limit_max_requests: u64,
    /// Rate limiting period in seconds
    #[clap(long, env = "RATE_LIMIT_PERIOD_SECS", default_value = "1")]
    pub rate_limit_period_secs: u64,
}

/// Response cache configuration options
#[derive(Debug, Clone, Parser)]
pub struct CacheOpts {
    /// TTL for cached endpoint responses, in seconds
    #[clap(long, env = "CACHE_TTL_SECS", default_value = "21600")]
    pub ttl_secs: u64,
    /// Maximum number of cached responses held at once
    #[clap(long, env = "CACHE_MAX_ENTRIES", default_value = "1024")]
    pub max_entries: u64,
}

/// CLI options for the Bundlescope API server
#[derive(Debug, Clone, Parser)]
pub struct Opts {
    /// Clickhouse database configuration
    #[clap(flatten)]
    pub clickhouse: ClickhouseOpts,

    /// HTTP listener configuration
    #[clap(flatten)]
    pub api: ApiOpts,

    /// Response cache configuration
    #[clap(flatten)]
    pub cache: CacheOpts,
}
