//! API namespace resolution.
//!
//! The backend serves everything under `/api/*`; the legacy `/api/crm/*` and
//! `/api/site/*` prefixes are collapsed onto it before any request leaves the
//! client.

pub const API_ROOT: &str = "/api";

pub const NAMESPACE_PREFIXES: [&str; 2] = ["/api/crm", "/api/site"];

/// 將 `/api/crm/...` 與 `/api/site/...` 改寫為 `/api/...`
///
/// 只在完整路徑段相符時改寫，`/api/sitewide` 不會被視為 `/api/site`。
pub fn resolve_api_endpoint(endpoint: &str) -> String {
    if !endpoint.starts_with(API_ROOT) {
        return endpoint.to_string();
    }

    let split_at = endpoint.find(['?', '#']).unwrap_or(endpoint.len());
    let (path, suffix) = endpoint.split_at(split_at);

    for prefix in NAMESPACE_PREFIXES {
        if path == prefix {
            return format!("{}{}", API_ROOT, suffix);
        }
        if let Some(rest) = path.strip_prefix(prefix) {
            if rest.starts_with('/') {
                return format!("{}{}{}", API_ROOT, rest, suffix);
            }
        }
    }

    endpoint.to_string()
}

pub fn build_api_url(endpoint: &str, base_url: &str) -> String {
    if is_absolute(endpoint) {
        return endpoint.to_string();
    }
    join(base_url, &resolve_api_endpoint(&with_leading_slash(endpoint)))
}

/// 同 `build_api_url`，但 scheme 換成 ws/wss
pub fn build_websocket_url(endpoint: &str, base_url: &str) -> String {
    let base = base_url.trim();
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    join(&ws_base, &resolve_api_endpoint(&with_leading_slash(endpoint)))
}

fn is_absolute(endpoint: &str) -> bool {
    endpoint.starts_with("http://") || endpoint.starts_with("https://")
}

pub(crate) fn with_leading_slash(endpoint: &str) -> String {
    if endpoint.starts_with('/') {
        endpoint.to_string()
    } else {
        format!("/{}", endpoint)
    }
}

fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
