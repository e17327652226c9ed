use crate::core::cache::TtlCache;
use crate::core::interceptor::{installed_interceptor, InterceptedClient, NamespaceInterceptor};
use crate::core::namespace::{build_api_url, resolve_api_endpoint, with_leading_slash};
use crate::core::{ApiErrorBody, ConfigProvider, KeyValueStore};
use crate::utils::error::{Result, SalonError};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const TOKEN_KEY: &str = "auth_token";

/// 後端 REST API 的薄封裝 (apiCall)
///
/// 所有 endpoint 先經過 namespace 改寫，token 從 KeyValueStore 讀取。
/// REST 呼叫不做重試。
#[derive(Debug, Clone)]
pub struct ApiClient<S: KeyValueStore + Clone> {
    base_url: String,
    http: InterceptedClient,
    store: S,
    cache: TtlCache<S>,
}

impl<S: KeyValueStore + Clone> ApiClient<S> {
    pub fn new(base_url: impl Into<String>, http: InterceptedClient, store: S, cache_ttl: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            http,
            cache: TtlCache::new(store.clone(), cache_ttl),
            store,
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C, store: S) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        let interceptor = installed_interceptor()
            .unwrap_or_else(|| Arc::new(NamespaceInterceptor::from_config(config)));

        Ok(Self::new(
            config.api_base_url(),
            InterceptedClient::new(client, interceptor),
            store,
            config.cache_ttl(),
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &InterceptedClient {
        &self.http
    }

    pub fn cache(&self) -> &TtlCache<S> {
        &self.cache
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        build_api_url(endpoint, &self.base_url)
    }

    pub async fn token(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(TOKEN_KEY)
            .await?
            .filter(|t| !t.trim().is_empty()))
    }

    pub async fn set_token(&self, token: &str) -> Result<()> {
        self.store.set(TOKEN_KEY, token).await
    }

    pub async fn clear_token(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY).await
    }

    pub async fn api_call<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        let url = self.url_for(endpoint);
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(ACCEPT, "application/json");
        if let Some(token) = self.token().await? {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
                .ok()
                .and_then(ApiErrorBody::into_message)
                .unwrap_or_else(|| generic_message(status));
            tracing::warn!("{} {} failed with {}: {}", method, url, status, message);
            return Err(SalonError::ApiStatusError {
                status: status.as_u16(),
                message,
            });
        }

        // 204 或空 body 視為 JSON null
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.api_call(Method::GET, endpoint, None).await
    }

    pub async fn post<T: DeserializeOwned>(&self, endpoint: &str, body: &Value) -> Result<T> {
        self.api_call(Method::POST, endpoint, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned>(&self, endpoint: &str, body: &Value) -> Result<T> {
        self.api_call(Method::PUT, endpoint, Some(body)).await
    }

    pub async fn patch<T: DeserializeOwned>(&self, endpoint: &str, body: &Value) -> Result<T> {
        self.api_call(Method::PATCH, endpoint, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.api_call(Method::DELETE, endpoint, None).await
    }

    /// GET 並以改寫後的 endpoint 作為快取 key
    pub async fn get_cached<T>(&self, endpoint: &str, ttl: Option<Duration>) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let key = resolve_api_endpoint(&with_leading_slash(endpoint));
        self.cache
            .get_or_fetch(&key, ttl, || self.get::<T>(endpoint))
            .await
    }
}

fn generic_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("Request failed: {} {}", status.as_u16(), reason),
        None => format!("Request failed: {}", status.as_u16()),
    }
}
