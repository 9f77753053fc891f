use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Rejected input (bad query, malformed payload)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote record store answered with a non-2xx status
    #[error("Remote error {status}: {message}")]
    Remote { status: u16, message: String },

    /// Network-level failure talking to the record store
    #[error("Transport error: {0}")]
    Transport(String),

    /// Remote call exceeded its deadline
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return AppError::Transport(format!("timeout: {}", err));
        }
        match err.status() {
            Some(status) => AppError::Remote {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => AppError::Transport(err.to_string()),
        }
    }
}

impl From<reqwest_middleware::Error> for AppError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            reqwest_middleware::Error::Middleware(e) => AppError::Transport(e.to_string()),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        HttpResponse::build(status_code).json(serde_json::json!({
            "error": {
                "message": error_message,
                "code": status_code.as_u16(),
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Remote { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn remote(status: u16, msg: impl Into<String>) -> Self {
        AppError::Remote {
            status,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Whether retrying the same call could succeed (network, timeout, 5xx)
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Transport(_) | AppError::Timeout(_) => true,
            AppError::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
