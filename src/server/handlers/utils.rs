use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;

use crate::core::errors::ApiError;

pub fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
}

pub fn query_rejection(rejection: QueryRejection) -> ApiError {
    ApiError::BadRequest(format!("Invalid query: {}", rejection.body_text()))
}

pub fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge(err.body_text());
    }
    ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
}
