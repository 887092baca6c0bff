//! HTTP error responses.
//!
//! Every failure leaves the API as `{ "error": message }`, plus a
//! `duplicates` list when a room batch collides with existing numbers.
//! Conflicts are 400 like validation errors; only missing entities are 404.
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::api::types::ErrorResponse;
use crate::engine::{EngineError, Entity};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn api_bad_request(message: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        body: ErrorResponse {
            error: message.into(),
            duplicates: None,
        },
    }
}

pub fn api_not_found(entity: Entity) -> ApiError {
    let message = match entity {
        Entity::Room => "Room not found",
        Entity::Guest => "Guest not found",
        Entity::Booking => "Booking not found",
    };
    ApiError {
        status: StatusCode::NOT_FOUND,
        body: ErrorResponse {
            error: message.to_string(),
            duplicates: None,
        },
    }
}

/// Logs the cause server-side and returns a generic message.
pub fn api_internal(err: &EngineError) -> ApiError {
    tracing::error!(error = %err, "request failed");
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse {
            error: "internal server error".to_string(),
            duplicates: None,
        },
    }
}

/// Single-room wording for a number collision; other errors map as usual.
pub fn single_room_error(err: EngineError) -> ApiError {
    match err {
        EngineError::DuplicateNumbers(_) => api_bad_request("Room number already exists"),
        other => other.into(),
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound(entity, _) => api_not_found(entity),
            EngineError::InvalidRange { .. } => api_bad_request("checkOut must be after checkIn"),
            EngineError::Overlap(_) => api_bad_request("Room is already booked for that date range"),
            EngineError::DuplicateNumbers(numbers) => ApiError {
                status: StatusCode::BAD_REQUEST,
                body: ErrorResponse {
                    error: "Some room numbers already exist".to_string(),
                    duplicates: Some(numbers),
                },
            },
            EngineError::DuplicateEmail(_) => {
                api_bad_request("Guest with this email already exists")
            }
            EngineError::Validation(message) => api_bad_request(message),
            err @ EngineError::LimitExceeded(_) => api_bad_request(err.to_string()),
            err @ EngineError::WalError(_) => api_internal(&err),
        }
    }
}
