use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Missing or invalid credentials")]
    Auth,

    #[error("Upstream billing call failed: {message}")]
    Upstream {
        message: String,
        /// Business-rule rejections reported by the provider, surfaced to the
        /// caller verbatim.
        user_errors: Vec<String>,
    },

    #[error("Not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    pub fn upstream(message: impl Into<String>) -> Self {
        AppError::Upstream {
            message: message.into(),
            user_errors: vec![],
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ErrorCode {
    ValidationError,
    AuthError,
    UpstreamError,
    NotFound,
    StorageError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::AuthError => "AUTH_ERROR",
            ErrorCode::UpstreamError => "UPSTREAM_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::StorageError => "STORAGE_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
