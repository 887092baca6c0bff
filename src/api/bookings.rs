//! Booking lifecycle handlers.
use std::collections::HashMap;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::Value;

use crate::api::error::{ApiError, api_bad_request};
use crate::api::types::{
    BookingResponse, CreateBookingRequest, ListResponse, MessageResponse, TimestampInput,
    UpdateBookingRequest,
};
use crate::api::{AppState, checked, json_body, page_request, parse_id, query_id};
use crate::model::*;
use crate::validate::{BOOKING, BOOKING_PATCH, Mode};

fn to_ms(field: &str, input: &TimestampInput) -> Result<Ms, ApiError> {
    input
        .to_ms()
        .ok_or_else(|| api_bad_request(format!("\"{field}\" must be a valid date")))
}

/// `GET /bookings?guestId&roomId`: newest first, guest and room attached.
pub(crate) async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ListResponse<BookingResponse>>, ApiError> {
    let page = page_request(&query)?;
    let filter = BookingFilter {
        guest_id: query_id(&query, "guestId")?,
        room_id: query_id(&query, "roomId")?,
    };
    let bookings = state.engine.list_bookings(filter, page).await;
    Ok(Json(ListResponse::new(bookings, page, BookingResponse::from)))
}

pub(crate) async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let view = state.engine.get_booking(parse_id(&id)?).await?;
    Ok(Json(view.into()))
}

pub(crate) async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let req: CreateBookingRequest = checked(&BOOKING, json_body(payload)?, Mode::Create)?;
    let new = NewBooking {
        guest_id: req.guest_id,
        room_id: req.room_id,
        check_in: to_ms("checkIn", &req.check_in)?,
        check_out: to_ms("checkOut", &req.check_out)?,
        status: req.status,
    };
    let view = state.engine.create_booking(new).await?;
    Ok((StatusCode::CREATED, Json(view.into())))
}

/// `PUT /bookings/:id`: any of checkIn, checkOut, status.
pub(crate) async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BookingResponse>, ApiError> {
    let id = parse_id(&id)?;
    let req: UpdateBookingRequest = checked(&BOOKING_PATCH, json_body(payload)?, Mode::Patch)?;
    let patch = BookingPatch {
        check_in: req.check_in.as_ref().map(|t| to_ms("checkIn", t)).transpose()?,
        check_out: req.check_out.as_ref().map(|t| to_ms("checkOut", t)).transpose()?,
        status: req.status,
    };
    let view = state.engine.update_booking(id, patch).await?;
    Ok(Json(view.into()))
}

pub(crate) async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.engine.delete_booking(parse_id(&id)?).await?;
    Ok(Json(MessageResponse {
        message: "Booking deleted",
    }))
}

/// `GET /guests/:id/bookings` and `GET /bookings/guest/:id`.
pub(crate) async fn list_by_guest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = state.engine.list_bookings_by_guest(parse_id(&id)?).await;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}
