use crate::config::{
    validate_provider, DEFAULT_CACHE_TTL_SECONDS, DEFAULT_PHONE_COUNTRY, DEFAULT_RECONNECT_ATTEMPTS,
    DEFAULT_RECONNECT_BASE_MS, DEFAULT_RECONNECT_MAX_MS, DEFAULT_STORAGE_DIR,
    DEFAULT_TIMEOUT_SECONDS,
};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand};
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "salon-client")]
#[command(about = "Client core for the salon CRM API: namespace resolution, API calls, cache and live updates")]
pub struct CliConfig {
    /// Path to a TOML configuration file; replaces the connection flags below
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, default_value = "http://localhost:8000")]
    pub api_base_url: String,

    /// Origin of the web app itself, treated as same-origin for rewriting
    #[arg(long)]
    pub app_origin: Option<String>,

    #[arg(long)]
    pub ws_base_url: Option<String>,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub timeout_seconds: u64,

    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECONDS)]
    pub cache_ttl_seconds: u64,

    #[arg(long, default_value = DEFAULT_STORAGE_DIR)]
    pub storage_dir: String,

    #[arg(long, default_value_t = DEFAULT_RECONNECT_BASE_MS)]
    pub reconnect_base_ms: u64,

    #[arg(long, default_value_t = DEFAULT_RECONNECT_MAX_MS)]
    pub reconnect_max_ms: u64,

    #[arg(long, default_value_t = DEFAULT_RECONNECT_ATTEMPTS)]
    pub reconnect_max_attempts: u32,

    #[arg(long)]
    pub geo_endpoint: Option<String>,

    #[arg(long, default_value = DEFAULT_PHONE_COUNTRY)]
    pub default_phone_country: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Resolve an endpoint through the API namespace rules
    Resolve { endpoint: String },
    /// Build the full API URL for an endpoint
    Url { endpoint: String },
    /// Build the WebSocket URL for an endpoint
    WsUrl { endpoint: String },
    /// Call the API and print the JSON response
    Call {
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        endpoint: String,
        /// JSON request body
        #[arg(long)]
        body: Option<String>,
        /// Store this bearer token before the call
        #[arg(long)]
        token: Option<String>,
    },
    /// GET through the TTL cache
    CacheGet {
        endpoint: String,
        #[arg(long)]
        ttl_seconds: Option<u64>,
    },
    /// Remove every cached response
    CacheClear,
    /// Connect to a WebSocket endpoint and print incoming messages
    Listen {
        #[arg(default_value = "/ws/notifications")]
        endpoint: String,
        /// Exit after this many messages
        #[arg(long)]
        max_messages: Option<usize>,
    },
    /// Show or set the preferred phone country
    PhoneCountry {
        #[arg(long)]
        set: Option<String>,
    },
}

impl ConfigProvider for CliConfig {
    fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    fn app_origin(&self) -> Option<&str> {
        self.app_origin.as_deref()
    }

    fn ws_base_url(&self) -> Option<&str> {
        self.ws_base_url.as_deref()
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    fn storage_dir(&self) -> &str {
        &self.storage_dir
    }

    fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_ms)
    }

    fn reconnect_max_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_ms)
    }

    fn reconnect_max_attempts(&self) -> u32 {
        self.reconnect_max_attempts
    }

    fn geo_endpoint(&self) -> Option<&str> {
        self.geo_endpoint.as_deref()
    }

    fn default_phone_country(&self) -> &str {
        &self.default_phone_country
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
