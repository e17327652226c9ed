use crate::utils::error::{Result, SalonError};
use crate::utils::validation::{validate_non_empty_string, validate_required_field, Validate};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// 預約精靈收集到的資料，送出前先在本地驗證
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingDraft {
    pub service_ids: Vec<i64>,
    pub master_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub client_name: String,
    pub phone: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub time: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Validate for BookingDraft {
    fn validate(&self) -> Result<()> {
        if self.service_ids.is_empty() {
            return Err(SalonError::ValidationError {
                message: "service is required".to_string(),
            });
        }
        validate_required_field("date", &self.date)?;
        let time = validate_required_field("time", &self.time)?;
        if NaiveTime::parse_from_str(time, "%H:%M").is_err() {
            return Err(SalonError::ValidationError {
                message: format!("time '{}' must be HH:MM", time),
            });
        }
        validate_non_empty_string("name", &self.client_name)?;
        validate_non_empty_string("phone", &self.phone)?;
        Ok(())
    }
}

impl BookingDraft {
    pub fn to_payload(&self) -> Result<serde_json::Value> {
        self.validate()?;

        let mut payload = serde_json::json!({
            "service_ids": self.service_ids,
            "date": self.date.map(|d| d.format("%Y-%m-%d").to_string()),
            "time": self.time,
            "name": self.client_name.trim(),
            "phone": self.phone.trim(),
        });
        if let Some(master_id) = self.master_id {
            payload["master_id"] = master_id.into();
        }
        if let Some(comment) = self.comment.as_deref().filter(|c| !c.trim().is_empty()) {
            payload["comment"] = comment.trim().into();
        }
        Ok(payload)
    }
}

/// 服務時長 (分鐘) 顯示，沒有資料時為 `--:--`
pub fn format_duration(minutes: Option<u32>) -> String {
    match minutes {
        Some(m) => format!("{:02}:{:02}", m / 60, m % 60),
        None => "--:--".to_string(),
    }
}
