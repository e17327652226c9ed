use crate::core::api_client::ApiClient;
use crate::core::{BookingDraft, KeyValueStore, TimeSlot};
use crate::utils::error::Result;
use chrono::NaiveDate;
use serde_json::Value;

pub const AVAILABLE_SLOTS_ENDPOINT: &str = "/api/site/available-slots";
pub const BOOKINGS_ENDPOINT: &str = "/api/site/bookings";

pub async fn available_slots<S: KeyValueStore + Clone>(
    client: &ApiClient<S>,
    service_id: i64,
    date: NaiveDate,
) -> Result<Vec<TimeSlot>> {
    let endpoint = format!(
        "{}?service_id={}&date={}",
        AVAILABLE_SLOTS_ENDPOINT,
        service_id,
        date.format("%Y-%m-%d")
    );
    let slots: Vec<TimeSlot> = client.get(&endpoint).await?;
    Ok(slots.into_iter().filter(|s| s.available).collect())
}

/// 先在本地驗證，缺欄位時不會送出請求
pub async fn create_booking<S: KeyValueStore + Clone>(
    client: &ApiClient<S>,
    draft: &BookingDraft,
) -> Result<Value> {
    let payload = draft.to_payload()?;
    let created: Value = client.post(BOOKINGS_ENDPOINT, &payload).await?;
    tracing::info!(
        "Booking created for {} on {}",
        draft.client_name.trim(),
        payload["date"].as_str().unwrap_or("?")
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::core::interceptor::{InterceptedClient, NamespaceInterceptor};
    use crate::utils::error::SalonError;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn client_for(server: &MockServer) -> ApiClient<MemoryStore> {
        ApiClient::new(
            server.base_url(),
            InterceptedClient::new(
                reqwest::Client::new(),
                Arc::new(NamespaceInterceptor::default()),
            ),
            MemoryStore::new(),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_available_slots_drops_taken_slots() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/available-slots")
                .query_param("service_id", "4")
                .query_param("date", "2024-06-01");
            then.status(200).json_body(json!([
                {"time": "10:00", "available": true},
                {"time": "11:00", "available": false},
                {"time": "12:00"}
            ]));
        });

        let client = client_for(&server);
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let slots = available_slots(&client, 4, date).await.unwrap();

        api_mock.assert();
        let times: Vec<&str> = slots.iter().map(|s| s.time.as_str()).collect();
        assert_eq!(times, vec!["10:00", "12:00"]);
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_server() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/api/bookings");
            then.status(201).json_body(json!({"id": 1}));
        });

        let client = client_for(&server);
        let err = create_booking(&client, &BookingDraft::default()).await.unwrap_err();

        assert!(matches!(err, SalonError::ValidationError { .. }));
        api_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_create_booking_posts_payload() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/bookings")
                .json_body(json!({
                    "service_ids": [2],
                    "date": "2024-06-01",
                    "time": "09:30",
                    "name": "Maria",
                    "phone": "+79000000000"
                }));
            then.status(201).json_body(json!({"id": 77, "status": "pending"}));
        });

        let draft = BookingDraft {
            service_ids: vec![2],
            date: NaiveDate::from_ymd_opt(2024, 6, 1),
            time: Some("09:30".to_string()),
            client_name: "Maria".to_string(),
            phone: "+79000000000".to_string(),
            ..Default::default()
        };

        let client = client_for(&server);
        let created = create_booking(&client, &draft).await.unwrap();

        api_mock.assert();
        assert_eq!(created["id"], 77);
    }
}
