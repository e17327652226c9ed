use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 持久化鍵值儲存 (localStorage / AsyncStorage 的對應)
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
    async fn keys(&self) -> Result<Vec<String>>;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    /// 應用程式本身的 origin，用於判斷同源請求
    fn app_origin(&self) -> Option<&str>;
    /// 未設定時使用 API base URL
    fn ws_base_url(&self) -> Option<&str>;
    fn request_timeout(&self) -> Duration;
    fn cache_ttl(&self) -> Duration;
    fn storage_dir(&self) -> &str;
    fn reconnect_base_delay(&self) -> Duration;
    fn reconnect_max_delay(&self) -> Duration;
    fn reconnect_max_attempts(&self) -> u32;
    fn geo_endpoint(&self) -> Option<&str>;
    fn default_phone_country(&self) -> &str;
}
