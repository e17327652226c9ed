pub mod api_client;
pub mod booking;
pub mod cache;
pub mod interceptor;
pub mod namespace;
pub mod preferences;
pub mod websocket;

pub use crate::domain::booking::{format_duration, BookingDraft, TimeSlot};
pub use crate::domain::model::{ApiErrorBody, CacheEntry, ConnectionState, MessageType, WsMessage};
pub use crate::domain::ports::{ConfigProvider, KeyValueStore};
pub use crate::utils::error::Result;
