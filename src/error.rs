use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// An authentication error.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Request without a valid session.
    #[error("Authorization failed")]
    Unauthorized,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A honeypot / dwell-time rejection.
    #[error("Bot detected")]
    BotDetected,

    /// An email already registered or pending verification.
    #[error("Duplicate email")]
    DuplicateEmail,

    /// A failed OTP verification (wrong code, unknown email or expired row).
    #[error("Verification failed")]
    VerificationFailed,

    /// A verification-mail delivery failure.
    #[error("Mail delivery error: {0}")]
    MailDelivery(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again.".to_string(),
                )
            }

            AppError::Pool(ref e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again.".to_string(),
                )
            }

            AppError::Redis(ref e) => {
                tracing::error!("Redis error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again.".to_string(),
                )
            }

            AppError::Authentication(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone())
            }

            AppError::Unauthorized => {
                tracing::warn!("Request without a valid session");
                (
                    StatusCode::UNAUTHORIZED,
                    "Session expired. Please log in.".to_string(),
                )
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::BotDetected => {
                tracing::warn!("Honeypot rejection");
                (StatusCode::BAD_REQUEST, "Bot detected.".to_string())
            }

            AppError::DuplicateEmail => {
                tracing::debug!("Duplicate registration attempt");
                (
                    StatusCode::CONFLICT,
                    "Email already registered or pending verification.".to_string(),
                )
            }

            AppError::VerificationFailed => {
                tracing::debug!("OTP verification failed");
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid verification code or email.".to_string(),
                )
            }

            AppError::MailDelivery(ref e) => {
                tracing::error!("Mail delivery error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Could not send verification email. Please check your email address and try again."
                        .to_string(),
                )
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again.".to_string(),
                )
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "success": false,
            "message": message
        }))
        .unwrap_or_else(|_| r#"{"success":false,"message":"Internal server error"}"#.to_string());

        (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}
