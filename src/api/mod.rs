//! HTTP API: router wiring, shared extract helpers, and request metrics.
pub mod bookings;
pub mod error;
pub mod guests;
pub mod rooms;
pub mod system;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{MatchedPath, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use ulid::Ulid;

use crate::api::error::{ApiError, api_bad_request};
use crate::engine::Engine;
use crate::limits::MAX_PAGE_LIMIT;
use crate::model::PageRequest;
use crate::validate::{Mode, Schema, validate};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
            )
        });

    Router::new()
        .route("/health", get(system::health))
        .route("/rooms", get(rooms::list_rooms).post(rooms::create_rooms))
        .route("/rooms/available", get(rooms::list_available))
        .route(
            "/rooms/:id",
            get(rooms::get_room)
                .put(rooms::update_room)
                .delete(rooms::delete_room),
        )
        .route("/guests", get(guests::list_guests).post(guests::create_guest))
        .route(
            "/guests/:id",
            get(guests::get_guest)
                .put(guests::update_guest)
                .delete(guests::delete_guest),
        )
        .route("/guests/:id/bookings", get(bookings::list_by_guest))
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/bookings/:id",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .delete(bookings::delete_booking),
        )
        .route("/bookings/guest/:id", get(bookings::list_by_guest))
        .route_layer(middleware::from_fn(track_metrics))
        .layer(trace_layer)
        .with_state(state)
}

/// Count and time every routed request, labelled by route template.
async fn track_metrics(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = request.method().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::histogram!(
        crate::observability::HTTP_REQUEST_DURATION_SECONDS,
        "route" => route.clone(),
        "method" => method.clone()
    )
    .record(start.elapsed().as_secs_f64());
    metrics::counter!(
        crate::observability::HTTP_REQUESTS_TOTAL,
        "route" => route,
        "method" => method,
        "status" => status
    )
    .increment(1);
    response
}

// ── Extract helpers ──────────────────────────────────────

pub(crate) fn parse_id(raw: &str) -> Result<Ulid, ApiError> {
    Ulid::from_string(raw).map_err(|_| api_bad_request(format!("invalid id: {raw}")))
}

/// Unwrap a JSON body, turning axum's rejection into our error shape.
pub(crate) fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| api_bad_request(rejection.body_text()))
}

/// Validate against `schema`, then deserialize into the request type.
pub(crate) fn checked<T: DeserializeOwned>(
    schema: &Schema,
    body: Value,
    mode: Mode,
) -> Result<T, ApiError> {
    validate(schema, &body, mode).map_err(|e| api_bad_request(e.0))?;
    serde_json::from_value(body).map_err(|e| api_bad_request(e.to_string()))
}

/// `page` and `limit` from the query string. Both must be positive integers;
/// `limit` is capped.
pub(crate) fn page_request(query: &HashMap<String, String>) -> Result<PageRequest, ApiError> {
    let defaults = PageRequest::default();
    let positive = |key: &str, default: usize| -> Result<usize, ApiError> {
        match query.get(key) {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(api_bad_request(format!("\"{key}\" must be a positive integer"))),
            },
        }
    };
    Ok(PageRequest {
        page: positive("page", defaults.page)?,
        limit: positive("limit", defaults.limit)?.min(MAX_PAGE_LIMIT),
    })
}

/// An optional id-valued query parameter.
pub(crate) fn query_id(query: &HashMap<String, String>, key: &str) -> Result<Option<Ulid>, ApiError> {
    query
        .get(key)
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            Ulid::from_string(raw).map_err(|_| api_bad_request(format!("\"{key}\" must be a valid id")))
        })
        .transpose()
}
