use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalonError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API responded with status {status}: {message}")]
    ApiStatusError { status: u16, message: String },

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, SalonError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Storage,
    Data,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SalonError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SalonError::ApiError(_)
            | SalonError::ApiStatusError { .. }
            | SalonError::WebSocketError(_) => ErrorCategory::Network,
            SalonError::ConfigValidationError { .. }
            | SalonError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            SalonError::IoError(_) => ErrorCategory::Storage,
            SalonError::SerializationError(_) => ErrorCategory::Data,
            SalonError::ValidationError { .. } => ErrorCategory::Validation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SalonError::ValidationError { .. } => ErrorSeverity::Low,
            SalonError::ApiError(_) | SalonError::WebSocketError(_) => ErrorSeverity::Medium,
            SalonError::ApiStatusError { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            SalonError::ApiStatusError { .. } | SalonError::SerializationError(_) => {
                ErrorSeverity::High
            }
            SalonError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// 網路或 5xx 錯誤可以由使用者重試
    pub fn is_retryable(&self) -> bool {
        match self {
            SalonError::ApiError(e) => e.is_timeout() || e.is_connect(),
            SalonError::ApiStatusError { status, .. } => *status >= 500 || *status == 429,
            SalonError::WebSocketError(_) => true,
            _ => false,
        }
    }

    /// 給使用者看的訊息 (toast)，伺服器的 detail/message 優先
    pub fn user_friendly_message(&self) -> String {
        match self {
            SalonError::ApiStatusError { message, .. } => message.clone(),
            SalonError::ApiError(_) => {
                "Could not reach the server. Please check your connection.".to_string()
            }
            SalonError::WebSocketError(_) => "Live connection lost.".to_string(),
            SalonError::ValidationError { message } => message.clone(),
            SalonError::ConfigValidationError { field, .. }
            | SalonError::InvalidConfigValueError { field, .. } => {
                format!("Configuration problem in '{}'", field)
            }
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the API base URL and network connectivity, then retry",
            ErrorCategory::Configuration => "Review the configuration file and CLI arguments",
            ErrorCategory::Storage => "Check that the storage directory exists and is writable",
            ErrorCategory::Data => "The server returned unexpected data; check the API version",
            ErrorCategory::Validation => "Fill in the missing fields and submit again",
        }
    }
}
