//! Error type shared by the database layer, business logic and HTTP layer.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};

/// Errors that can occur in any organizer operation.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Entity absent (match, player, registration).
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Malformed input: empty name, negative score, rating out of range...
    #[error("validation failed: {0}")]
    Validation(String),
    /// Database unreachable or write rejected.
    #[error("persistence failure: {0}")]
    Persistence(String),
    /// Gateway session creation/verification failed, or a bad webhook signature.
    #[error("payment failure: {0}")]
    Payment(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// Human-readable message shown to players (the app is used in Turkish).
    pub fn localized(&self) -> String {
        match self {
            AppError::NotFound("match") => "Maç bulunamadı".to_string(),
            AppError::NotFound("player") => "Oyuncu bulunamadı".to_string(),
            AppError::NotFound("registration") => "Kayıt bulunamadı".to_string(),
            AppError::NotFound(_) => "Kayıt bulunamadı".to_string(),
            AppError::Validation(msg) => format!("Geçersiz bilgi: {msg}"),
            AppError::Persistence(_) => "Veritabanı hatası, lütfen tekrar deneyin".to_string(),
            AppError::Payment(_) => "Ödeme işlemi başarısız oldu".to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Persistence(e.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("record"),
            other => AppError::Persistence(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Payment(e.to_string())
    }
}

impl From<openssl::error::ErrorStack> for AppError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        AppError::Payment(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Payment(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        log::error!("request failed: {self}");
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": self.localized() }))
    }
}
