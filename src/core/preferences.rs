use crate::core::KeyValueStore;
use crate::utils::error::{Result, SalonError};
use serde_json::Value;

pub const PHONE_COUNTRY_KEY: &str = "preferred_phone_country";

/// 電話國碼預設值：已儲存的優先，其次為 IP 定位，最後是 default
///
/// 定位失敗不會回傳錯誤。
pub async fn resolve_phone_country<S: KeyValueStore>(
    store: &S,
    http: &reqwest::Client,
    geo_endpoint: Option<&str>,
    default: &str,
) -> String {
    match store.get(PHONE_COUNTRY_KEY).await {
        Ok(Some(stored)) if is_country_code(&stored) => return stored,
        Ok(_) => {}
        Err(e) => tracing::debug!("Could not read stored phone country: {}", e),
    }

    let Some(endpoint) = geo_endpoint else {
        return default.to_string();
    };

    match lookup_country(http, endpoint).await {
        Some(code) => {
            if let Err(e) = store.set(PHONE_COUNTRY_KEY, &code).await {
                tracing::warn!("Could not persist phone country: {}", e);
            }
            code
        }
        None => default.to_string(),
    }
}

pub async fn set_phone_country<S: KeyValueStore>(store: &S, code: &str) -> Result<()> {
    let code = code.trim().to_ascii_uppercase();
    if !is_country_code(&code) {
        return Err(SalonError::ValidationError {
            message: format!("'{}' is not a two-letter country code", code),
        });
    }
    store.set(PHONE_COUNTRY_KEY, &code).await
}

async fn lookup_country(http: &reqwest::Client, endpoint: &str) -> Option<String> {
    let response = match http.get(endpoint).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            tracing::debug!("Geolocation lookup returned {}", response.status());
            return None;
        }
        Err(e) => {
            tracing::debug!("Geolocation lookup failed: {}", e);
            return None;
        }
    };

    let body: Value = response.json().await.ok()?;
    let code = body
        .get("country_code")
        .or_else(|| body.get("countryCode"))
        .and_then(Value::as_str)?
        .to_ascii_uppercase();
    is_country_code(&code).then_some(code)
}

fn is_country_code(code: &str) -> bool {
    code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase())
}
