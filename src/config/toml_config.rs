use crate::config::{
    validate_provider, DEFAULT_CACHE_TTL_SECONDS, DEFAULT_PHONE_COUNTRY, DEFAULT_RECONNECT_ATTEMPTS,
    DEFAULT_RECONNECT_BASE_MS, DEFAULT_RECONNECT_MAX_MS, DEFAULT_STORAGE_DIR,
    DEFAULT_TIMEOUT_SECONDS,
};
use crate::core::ConfigProvider;
use crate::utils::error::{Result, SalonError};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub api: ApiConfig,
    pub websocket: Option<WebSocketConfig>,
    pub cache: Option<CacheConfig>,
    pub preferences: Option<PreferencesConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub app_origin: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebSocketConfig {
    pub base_url: Option<String>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    pub default_ttl_seconds: Option<u64>,
    pub storage_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesConfig {
    pub geo_endpoint: Option<String>,
    pub default_phone_country: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SalonError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SalonError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SALON_API_URL})，未定義的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or("info")
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    fn websocket(&self) -> Option<&WebSocketConfig> {
        self.websocket.as_ref()
    }
}

impl ConfigProvider for TomlConfig {
    fn api_base_url(&self) -> &str {
        &self.api.base_url
    }

    fn app_origin(&self) -> Option<&str> {
        self.api.app_origin.as_deref()
    }

    fn ws_base_url(&self) -> Option<&str> {
        self.websocket().and_then(|w| w.base_url.as_deref())
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(
            self.cache
                .as_ref()
                .and_then(|c| c.default_ttl_seconds)
                .unwrap_or(DEFAULT_CACHE_TTL_SECONDS),
        )
    }

    fn storage_dir(&self) -> &str {
        self.cache
            .as_ref()
            .and_then(|c| c.storage_dir.as_deref())
            .unwrap_or(DEFAULT_STORAGE_DIR)
    }

    fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(
            self.websocket()
                .and_then(|w| w.base_delay_ms)
                .unwrap_or(DEFAULT_RECONNECT_BASE_MS),
        )
    }

    fn reconnect_max_delay(&self) -> Duration {
        Duration::from_millis(
            self.websocket()
                .and_then(|w| w.max_delay_ms)
                .unwrap_or(DEFAULT_RECONNECT_MAX_MS),
        )
    }

    fn reconnect_max_attempts(&self) -> u32 {
        self.websocket()
            .and_then(|w| w.max_attempts)
            .unwrap_or(DEFAULT_RECONNECT_ATTEMPTS)
    }

    fn geo_endpoint(&self) -> Option<&str> {
        self.preferences
            .as_ref()
            .and_then(|p| p.geo_endpoint.as_deref())
    }

    fn default_phone_country(&self) -> &str {
        self.preferences
            .as_ref()
            .and_then(|p| p.default_phone_country.as_deref())
            .unwrap_or(DEFAULT_PHONE_COUNTRY)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let toml_content = r#"
[api]
base_url = "https://salon.example.com"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.api_base_url(), "https://salon.example.com");
        assert_eq!(config.ws_base_url(), None);
        assert_eq!(config.reconnect_max_attempts(), 5);
        assert_eq!(config.reconnect_max_delay(), Duration::from_secs(30));
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.log_level(), "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[api]
base_url = "https://api.salon.example.com"
app_origin = "https://salon.example.com"
timeout_seconds = 10

[websocket]
base_url = "wss://rt.salon.example.com"
base_delay_ms = 500
max_delay_ms = 8000
max_attempts = 3

[cache]
default_ttl_seconds = 60
storage_dir = "/tmp/salon-cache"

[preferences]
geo_endpoint = "https://ipapi.co/json/"
default_phone_country = "AE"

[logging]
level = "debug"
json = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.app_origin(), Some("https://salon.example.com"));
        assert_eq!(config.ws_base_url(), Some("wss://rt.salon.example.com"));
        assert_eq!(config.reconnect_base_delay(), Duration::from_millis(500));
        assert_eq!(config.reconnect_max_attempts(), 3);
        assert_eq!(config.storage_dir(), "/tmp/salon-cache");
        assert_eq!(config.default_phone_country(), "AE");
        assert!(config.json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SALON_TEST_API_BASE", "https://env.salon.example.com");

        let toml_content = r#"
[api]
base_url = "${SALON_TEST_API_BASE}"
app_origin = "${SALON_TEST_UNSET_ORIGIN}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api.base_url, "https://env.salon.example.com");
        assert_eq!(config.app_origin(), Some("${SALON_TEST_UNSET_ORIGIN}"));
        assert!(config.validate().is_err());

        std::env::remove_var("SALON_TEST_API_BASE");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[api]
base_url = "https://salon.example.com"

[websocket]
base_delay_ms = 60000
max_delay_ms = 1000
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let toml_content = r#"
[api]
base_url = "https://salon.example.com"

[websocket]
max_attempts = 0
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_api_section_is_an_error() {
        assert!(TomlConfig::from_toml_str("[cache]\ndefault_ttl_seconds = 5\n").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[api]
base_url = "http://localhost:8000"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.api_base_url(), "http://localhost:8000");
    }
}
