use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Upstream brokerage error: {0}")]
    Upstream(String),
}

impl From<crate::datasource::BrokerageError> for AppError {
    fn from(err: crate::datasource::BrokerageError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl From<crate::orchestration::CycleError> for AppError {
    fn from(err: crate::orchestration::CycleError) -> Self {
        match err {
            crate::orchestration::CycleError::Brokerage(e) => e.into(),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            AppError::Internal(msg) | AppError::Upstream(msg) => msg,
        };

        let body = Json(json!({
            "statusCode": status.as_u16(),
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
