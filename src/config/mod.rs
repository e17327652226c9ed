#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};
pub use toml_config::TomlConfig;

use crate::core::ConfigProvider;
use crate::utils::error::{Result, SalonError};
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_url, validate_ws_url,
};

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;
pub const DEFAULT_STORAGE_DIR: &str = "./.salon-client";
pub const DEFAULT_RECONNECT_BASE_MS: u64 = 1000;
pub const DEFAULT_RECONNECT_MAX_MS: u64 = 30_000;
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_PHONE_COUNTRY: &str = "US";

/// CLI 與 TOML 共用的檢查
pub fn validate_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_url("api.base_url", config.api_base_url())?;

    if let Some(origin) = config.app_origin() {
        validate_url("api.app_origin", origin)?;
    }
    if let Some(ws_base) = config.ws_base_url() {
        validate_ws_url("websocket.base_url", ws_base)?;
    }
    if let Some(geo) = config.geo_endpoint() {
        validate_url("preferences.geo_endpoint", geo)?;
    }

    validate_path("cache.storage_dir", config.storage_dir())?;
    validate_positive_number(
        "websocket.max_attempts",
        u64::from(config.reconnect_max_attempts()),
        1,
    )?;

    if config.reconnect_base_delay() > config.reconnect_max_delay() {
        return Err(SalonError::ConfigValidationError {
            field: "websocket.base_delay_ms".to_string(),
            message: "base delay cannot exceed max delay".to_string(),
        });
    }

    let country = config.default_phone_country();
    if country.len() != 2 || !country.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(SalonError::InvalidConfigValueError {
            field: "preferences.default_phone_country".to_string(),
            value: country.to_string(),
            reason: "Expected a two-letter uppercase country code".to_string(),
        });
    }

    Ok(())
}
