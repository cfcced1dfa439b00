use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Uniform JSON envelope for every handler response.
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response
    pub fn success(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            success: true,
            status_code: status.as_u16(),
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
            data: Some(data),
            errors: None,
        }
    }

    /// Create an error response
    pub fn error(
        status: StatusCode,
        message: impl Into<String>,
        errors: Option<serde_json::Value>,
    ) -> Self {
        ApiResponse {
            success: false,
            status_code: status.as_u16(),
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
            data: None,
            errors,
        }
    }
}

impl ApiResponse<()> {
    /// 500 with the underlying database error attached under `errors.db_error`.
    pub fn db_error(message: impl Into<String>, e: sqlx::Error) -> Self {
        ApiResponse::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            Some(json!({ "db_error": e.to_string() })),
        )
    }

    /// Plain 404.
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiResponse::error(StatusCode::NOT_FOUND, message, None)
    }

    /// 400 carrying the full list of human-readable validation failures.
    pub fn validation_failed(messages: Vec<String>) -> Self {
        ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            Some(json!({ "validation_errors": messages })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_carries_data() {
        let resp = ApiResponse::success(StatusCode::OK, "ok", 5);
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["status_code"], 200);
        assert_eq!(value["data"], 5);
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn validation_envelope_lists_messages() {
        let resp = ApiResponse::validation_failed(vec!["Task 1: name is required".into()]);
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(
            value["errors"]["validation_errors"][0],
            "Task 1: name is required"
        );
    }
}
