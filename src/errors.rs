use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Everything a handler can fail with. Each variant maps to one HTTP status
/// and renders as `{"success": false, "error": "..."}` — messages are written
/// for the person reading the site, never internals.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(&'static str),

    #[error("Invalid security token. Please refresh the page and try again.")]
    Csrf,

    #[error("Review not found.")]
    NotFound,

    #[error("Method not allowed.")]
    Method,

    #[error("Too many submissions. Please try again later.")]
    RateLimited,

    #[error("{0}")]
    Delivery(String),

    #[error("Something went wrong on our end. Please try again later.")]
    Internal,
}

impl ApiError {
    pub fn validation(errors: Vec<String>) -> Self {
        ApiError::Validation(errors.join(" "))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Csrf => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Method => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Delivery(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.to_string(),
        }))
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        log::error!("store failure: {:?}", e);
        ApiError::Internal
    }
}
