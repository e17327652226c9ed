use serde::{Deserialize, Serialize};

/// `/ws/chat` 與 `/ws/notifications` 上的訊息格式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Chat,
    Notification,
    Status,
}

impl WsMessage {
    pub fn chat(content: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: now.timestamp_millis().to_string(),
            kind: MessageType::Chat,
            content: content.into(),
            sender_id: None,
            sender_name: None,
            timestamp: now.to_rfc3339(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// 快取項目，時間皆為 epoch 毫秒
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub timestamp: i64,
    pub expires_at: i64,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, now_ms: i64, ttl_ms: i64) -> Self {
        Self {
            value,
            timestamp: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
        }
    }

    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms <= self.expires_at
    }
}

/// 後端錯誤回應，`detail` (FastAPI 風格) 或 `message`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    pub fn into_message(self) -> Option<String> {
        match self.detail {
            Some(serde_json::Value::String(s)) => {
                if !s.is_empty() {
                    return Some(s);
                }
            }
            Some(serde_json::Value::Null) | None => {}
            Some(other) => return Some(other.to_string()),
        }
        self.message.filter(|m| !m.is_empty())
    }
}
