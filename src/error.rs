use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("location unavailable: {0}")]
    Geolocation(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("no access token available")]
    MissingToken,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MissingToken => StatusCode::UNAUTHORIZED,
            AppError::Status { status, .. } if (400..500).contains(status) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Status { .. } | AppError::Network(_) | AppError::Decode(_) => StatusCode::BAD_GATEWAY,
            AppError::Geolocation(_) | AppError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Storage(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for failures where a local fallback may stand in for the backend:
    /// transport errors, 5xx, 408/429 and unreadable bodies. Other 4xx answers
    /// are the backend refusing the caller and pass through as they are.
    pub fn is_backend_failure(&self) -> bool {
        match self {
            AppError::Network(_) | AppError::Decode(_) => true,
            AppError::Status { status, .. } => *status >= 500 || matches!(status, 408 | 429),
            _ => false,
        }
    }

    /// The backend refused this particular write; resending it will not help.
    pub fn is_rejection(&self) -> bool {
        matches!(self, AppError::Status { status, .. } if (400..500).contains(status) && !matches!(status, 401 | 408 | 429))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::MissingToken | AppError::Status { status: 401, .. })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
