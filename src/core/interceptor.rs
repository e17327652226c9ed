use crate::core::namespace::resolve_api_endpoint;
use crate::core::ConfigProvider;
use reqwest::{Client, Method, Request, RequestBuilder, Response};
use std::sync::{Arc, OnceLock};
use url::{Origin, Url};

static INSTALLED: OnceLock<Arc<NamespaceInterceptor>> = OnceLock::new();

/// 請求目標的三種型態：字串、已解析的 URL、完整的 Request
#[derive(Debug)]
pub enum RequestTarget {
    Path(String),
    Url(Url),
    Request(Request),
}

/// 對同源請求套用 namespace 改寫，其他來源一律不動
#[derive(Debug, Clone, Default)]
pub struct NamespaceInterceptor {
    allowed_origins: Vec<Origin>,
}

impl NamespaceInterceptor {
    pub fn new(app_origin: Option<&str>, api_base_url: &str) -> Self {
        let mut allowed_origins = Vec::new();

        for candidate in app_origin.into_iter().chain(std::iter::once(api_base_url)) {
            match Url::parse(candidate) {
                Ok(url) => {
                    let origin = url.origin();
                    if origin.is_tuple() && !allowed_origins.contains(&origin) {
                        allowed_origins.push(origin);
                    }
                }
                // 無效的 base URL 直接略過，不影響請求
                Err(e) => tracing::debug!("Ignoring malformed origin '{}': {}", candidate, e),
            }
        }

        Self { allowed_origins }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self::new(config.app_origin(), config.api_base_url())
    }

    pub fn allowed_origins(&self) -> &[Origin] {
        &self.allowed_origins
    }

    pub fn is_same_origin(&self, url: &Url) -> bool {
        self.allowed_origins.contains(&url.origin())
    }

    /// 回傳改寫後的 URL；沒有變化時回傳 None
    pub fn rewrite_url(&self, raw: &str) -> Option<String> {
        if raw.starts_with('/') && !raw.starts_with("//") {
            let resolved = resolve_api_endpoint(raw);
            return (resolved != raw).then_some(resolved);
        }

        let url = Url::parse(raw).ok()?;
        self.rewrite_parsed(&url).map(String::from)
    }

    pub fn rewrite_parsed(&self, url: &Url) -> Option<Url> {
        if !self.is_same_origin(url) {
            return None;
        }

        let mut relative = url.path().to_string();
        if let Some(query) = url.query() {
            relative.push('?');
            relative.push_str(query);
        }
        if let Some(fragment) = url.fragment() {
            relative.push('#');
            relative.push_str(fragment);
        }

        let resolved = resolve_api_endpoint(&relative);
        if resolved == relative {
            return None;
        }
        url.join(&resolved).ok()
    }

    pub fn intercept(&self, target: RequestTarget) -> RequestTarget {
        match target {
            RequestTarget::Path(path) => match self.rewrite_url(&path) {
                Some(rewritten) => {
                    tracing::trace!("Rewrote {} -> {}", path, rewritten);
                    RequestTarget::Path(rewritten)
                }
                None => RequestTarget::Path(path),
            },
            RequestTarget::Url(url) => match self.rewrite_parsed(&url) {
                Some(rewritten) => RequestTarget::Url(rewritten),
                None => RequestTarget::Url(url),
            },
            RequestTarget::Request(request) => {
                RequestTarget::Request(self.intercept_request(request))
            }
        }
    }

    pub fn intercept_request(&self, mut request: Request) -> Request {
        if let Some(rewritten) = self.rewrite_parsed(request.url()) {
            tracing::trace!("Rewrote {} -> {}", request.url(), rewritten);
            *request.url_mut() = rewritten;
        }
        request
    }
}

/// 全域只安裝一次，第一次呼叫回傳 true，之後皆為 no-op
pub fn install_api_namespace_interceptor<C: ConfigProvider + ?Sized>(config: &C) -> bool {
    let mut installed_now = false;
    INSTALLED.get_or_init(|| {
        installed_now = true;
        Arc::new(NamespaceInterceptor::from_config(config))
    });

    if installed_now {
        tracing::info!("API namespace interceptor installed");
    } else {
        tracing::debug!("API namespace interceptor already installed, skipping");
    }
    installed_now
}

pub fn installed_interceptor() -> Option<Arc<NamespaceInterceptor>> {
    INSTALLED.get().cloned()
}

/// 包裝 reqwest::Client，所有請求都先經過 interceptor
#[derive(Debug, Clone)]
pub struct InterceptedClient {
    client: Client,
    interceptor: Arc<NamespaceInterceptor>,
}

impl InterceptedClient {
    pub fn new(client: Client, interceptor: Arc<NamespaceInterceptor>) -> Self {
        Self {
            client,
            interceptor,
        }
    }

    /// 使用全域 interceptor；尚未安裝時不改寫任何請求
    pub fn from_installed(client: Client) -> Self {
        let interceptor = installed_interceptor().unwrap_or_default();
        Self::new(client, interceptor)
    }

    pub fn interceptor(&self) -> &NamespaceInterceptor {
        &self.interceptor
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let target = match self.interceptor.rewrite_url(url) {
            Some(rewritten) => rewritten,
            None => url.to_string(),
        };
        self.client.request(method, target)
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub async fn execute(&self, request: Request) -> reqwest::Result<Response> {
        let request = self.interceptor.intercept_request(request);
        self.client.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interceptor() -> NamespaceInterceptor {
        NamespaceInterceptor::new(Some("https://salon.example.com"), "https://api.example.com/")
    }

    #[test]
    fn test_relative_paths_are_always_rewritten() {
        let i = interceptor();
        assert_eq!(i.rewrite_url("/api/crm/clients").as_deref(), Some("/api/clients"));
        assert_eq!(i.rewrite_url("/api/clients"), None);
        assert_eq!(i.rewrite_url("/ws/chat"), None);
    }

    #[test]
    fn test_same_origin_absolute_urls_are_rewritten() {
        let i = interceptor();
        assert_eq!(
            i.rewrite_url("https://salon.example.com/api/site/services?lang=en").as_deref(),
            Some("https://salon.example.com/api/services?lang=en")
        );
        assert_eq!(
            i.rewrite_url("https://api.example.com/api/crm/audit-log#latest").as_deref(),
            Some("https://api.example.com/api/audit-log#latest")
        );
    }

    #[test]
    fn test_foreign_origins_are_never_rewritten() {
        let i = interceptor();
        assert_eq!(i.rewrite_url("https://cdn.example.net/api/crm/clients"), None);
        assert_eq!(i.rewrite_url("http://salon.example.com/api/crm/clients"), None);
    }

    #[test]
    fn test_malformed_origins_are_ignored() {
        let i = NamespaceInterceptor::new(Some("not a url"), "::::");
        assert!(i.allowed_origins().is_empty());
        assert_eq!(i.rewrite_url("https://salon.example.com/api/crm/x"), None);
        assert_eq!(i.rewrite_url("/api/crm/x").as_deref(), Some("/api/x"));
    }

    #[test]
    fn test_intercept_handles_every_target_shape() {
        let i = interceptor();

        match i.intercept(RequestTarget::Path("/api/site/faq".to_string())) {
            RequestTarget::Path(p) => assert_eq!(p, "/api/faq"),
            other => panic!("unexpected target {:?}", other),
        }

        let url = Url::parse("https://salon.example.com/api/crm/clients/7").unwrap();
        match i.intercept(RequestTarget::Url(url)) {
            RequestTarget::Url(u) => assert_eq!(u.as_str(), "https://salon.example.com/api/clients/7"),
            other => panic!("unexpected target {:?}", other),
        }

        let request = Request::new(
            Method::POST,
            Url::parse("https://api.example.com/api/crm/gallery/reorder").unwrap(),
        );
        match i.intercept(RequestTarget::Request(request)) {
            RequestTarget::Request(r) => {
                assert_eq!(r.url().as_str(), "https://api.example.com/api/gallery/reorder");
                assert_eq!(r.method(), &Method::POST);
            }
            other => panic!("unexpected target {:?}", other),
        }
    }

    #[test]
    fn test_unchanged_request_passes_through() {
        let i = interceptor();
        let request = Request::new(
            Method::GET,
            Url::parse("https://cdn.example.net/api/crm/x").unwrap(),
        );
        match i.intercept(RequestTarget::Request(request)) {
            RequestTarget::Request(r) => assert_eq!(r.url().path(), "/api/crm/x"),
            other => panic!("unexpected target {:?}", other),
        }
    }
}
