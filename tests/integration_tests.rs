use httpmock::prelude::*;
use salon_client::core::interceptor::{InterceptedClient, NamespaceInterceptor};
use salon_client::{ApiClient, FileStore, SalonError, TomlConfig, TtlCache};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn config_for(server: &MockServer, storage_dir: &str) -> TomlConfig {
    let content = format!(
        r#"
[api]
base_url = "{}"
timeout_seconds = 5

[cache]
default_ttl_seconds = 60
storage_dir = "{}"
"#,
        server.base_url(),
        storage_dir.replace('\\', "/")
    );
    TomlConfig::from_toml_str(&content).unwrap()
}

#[tokio::test]
async fn test_end_to_end_api_call_with_file_store() {
    let temp_dir = TempDir::new().unwrap();
    let storage_dir = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let audit_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/audit-log")
            .query_param("limit", "2")
            .header("authorization", "Bearer admin-token");
        then.status(200).json_body(json!([
            {"id": 1, "action": "update_service"},
            {"id": 2, "action": "delete_image"}
        ]));
    });

    let config = config_for(&server, &storage_dir);
    let client = ApiClient::from_config(&config, FileStore::new(&storage_dir)).unwrap();
    client.set_token("admin-token").await.unwrap();

    let entries: Vec<Value> = client.get("/api/crm/audit-log?limit=2").await.unwrap();

    audit_mock.assert();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["action"], "delete_image");

    // token 存在檔案中，新的 client 也讀得到
    let reopened = ApiClient::from_config(&config, FileStore::new(&storage_dir)).unwrap();
    assert_eq!(reopened.token().await.unwrap().as_deref(), Some("admin-token"));
}

#[tokio::test]
async fn test_cached_responses_survive_restart() {
    let temp_dir = TempDir::new().unwrap();
    let storage_dir = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let services_mock = server.mock(|when, then| {
        when.method(GET).path("/api/services");
        then.status(200)
            .json_body(json!([{"id": 1, "name": "Haircut", "duration": 45}]));
    });

    let config = config_for(&server, &storage_dir);

    let first = ApiClient::from_config(&config, FileStore::new(&storage_dir)).unwrap();
    let services: Value = first.get_cached("/api/site/services", None).await.unwrap();
    assert_eq!(services[0]["name"], "Haircut");

    let second = ApiClient::from_config(&config, FileStore::new(&storage_dir)).unwrap();
    let again: Value = second.get_cached("/api/site/services", None).await.unwrap();
    assert_eq!(again, services);

    services_mock.assert_hits(1);

    let cache = TtlCache::new(FileStore::new(&storage_dir), Duration::from_secs(60));
    assert_eq!(cache.clear().await.unwrap(), 1);
    assert!(second.token().await.unwrap().is_none());
}

#[tokio::test]
async fn test_server_message_reaches_the_user() {
    let temp_dir = TempDir::new().unwrap();
    let storage_dir = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/referrals/invite");
        then.status(422)
            .json_body(json!({"message": "Referral limit reached"}));
    });

    let config = config_for(&server, &storage_dir);
    let client = ApiClient::from_config(&config, FileStore::new(&storage_dir)).unwrap();

    let err = client
        .post::<Value>("/api/site/referrals/invite", &json!({"phone": "+10000000000"}))
        .await
        .unwrap_err();

    assert!(matches!(err, SalonError::ApiStatusError { status: 422, .. }));
    assert_eq!(err.user_friendly_message(), "Referral limit reached");
}

#[tokio::test]
async fn test_ad_hoc_requests_are_rewritten_for_same_origin_only() {
    let server = MockServer::start();
    let rewritten_mock = server.mock(|when, then| {
        when.method(GET).path("/api/challenges");
        then.status(200).json_body(json!([]));
    });
    let legacy_mock = server.mock(|when, then| {
        when.method(GET).path("/api/crm/challenges");
        then.status(200).json_body(json!([]));
    });

    // 同源：改寫後打到 /api/challenges
    let same_origin = InterceptedClient::new(
        reqwest::Client::new(),
        Arc::new(NamespaceInterceptor::new(None, &server.base_url())),
    );
    let request = reqwest::Client::new()
        .get(server.url("/api/crm/challenges"))
        .build()
        .unwrap();
    let response = same_origin.execute(request).await.unwrap();
    assert!(response.status().is_success());

    // 非同源：原樣送出
    let foreign = InterceptedClient::new(
        reqwest::Client::new(),
        Arc::new(NamespaceInterceptor::new(
            Some("https://salon.example.com"),
            "https://api.salon.example.com",
        )),
    );
    let response = foreign
        .get(&server.url("/api/crm/challenges"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    rewritten_mock.assert_hits(1);
    legacy_mock.assert_hits(1);
}
