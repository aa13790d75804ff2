use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        match self {
            AppError::Validation(msg) => error_resp(
                StatusCode::BAD_REQUEST,
                ErrorCode::ValidationError,
                Some(msg),
                vec![],
            ),
            AppError::Auth => error_resp(
                StatusCode::UNAUTHORIZED,
                ErrorCode::AuthError,
                None,
                vec![],
            ),
            AppError::Upstream {
                message,
                user_errors,
            } => error_resp(
                StatusCode::BAD_GATEWAY,
                ErrorCode::UpstreamError,
                Some(message),
                user_errors,
            ),
            AppError::NotFound => {
                error_resp(StatusCode::NOT_FOUND, ErrorCode::NotFound, None, vec![])
            }
            AppError::Storage(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::StorageError,
                None,
                vec![],
            ),
        }
    }
}

fn error_resp(
    status: StatusCode,
    code: ErrorCode,
    message: Option<String>,
    user_errors: Vec<String>,
) -> Response {
    let mut body = serde_json::json!({ "code": code.as_str() });
    if let Some(msg) = message {
        body["message"] = serde_json::Value::String(msg);
    }
    if !user_errors.is_empty() {
        body["user_errors"] = serde_json::json!(user_errors);
    }
    (status, Json(body)).into_response()
}
