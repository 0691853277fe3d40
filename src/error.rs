// region:    --- Imports
use crate::config::ConfigError;
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

// endregion: --- Imports

const STORAGE_ERROR_MESSAGE: &str = "Unable to complete request. Try again.";

// region:    --- App Error
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("No such item")]
    NotFound,
    #[error("Bid too low")]
    Conflict,
    #[error("Auction is not open")]
    AuctionClosed,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::AuctionClosed => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Storage(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 사용자에게 보여줄 메시지 (저장소 오류 상세는 노출하지 않음)
    pub fn public_message(&self) -> String {
        match self {
            AppError::Storage(_) | AppError::Config(_) => STORAGE_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Storage(_) | AppError::Config(_) = &self {
            error!("{:<12} --> 요청 처리 실패: {:?}", "Handler", self);
        }
        (
            self.status_code(),
            Json(serde_json::json!({ "error": self.public_message() })),
        )
            .into_response()
    }
}
// endregion: --- App Error

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_detail_is_hidden() {
        let err = AppError::Storage(StoreError::Poisoned);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), STORAGE_ERROR_MESSAGE);
    }

    #[test]
    fn rejections_keep_their_message() {
        assert_eq!(AppError::NotFound.public_message(), "No such item");
        assert_eq!(AppError::AuctionClosed.status_code(), StatusCode::FORBIDDEN);
    }
}
