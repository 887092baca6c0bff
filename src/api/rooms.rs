//! Room directory handlers.
use std::collections::HashMap;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::api::error::{ApiError, api_bad_request, single_room_error};
use crate::api::types::{
    BulkRoomsResponse, CreateRoomRequest, DataResponse, ListResponse, MessageResponse,
    RoomResponse, UpdateRoomRequest,
};
use crate::api::{AppState, checked, json_body, page_request, parse_id};
use crate::limits::MAX_SEARCH_LEN;
use crate::model::*;
use crate::validate::{Mode, ROOM, parse_timestamp};

/// `GET /rooms`: filtered, newest first, paginated after filtering.
pub(crate) async fn list_rooms(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ListResponse<RoomResponse>>, ApiError> {
    let page = page_request(&query)?;
    let filter = room_filter(&query)?;
    let rooms = state.engine.list_rooms(&filter, page).await?;
    Ok(Json(ListResponse::new(rooms, page, RoomResponse::from)))
}

fn room_filter(query: &HashMap<String, String>) -> Result<RoomFilter, ApiError> {
    let param = |key: &str| query.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
    let price = |key: &str| -> Result<Option<f64>, ApiError> {
        param(key)
            .map(|raw| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|p| p.is_finite())
                    .ok_or_else(|| api_bad_request(format!("\"{key}\" must be a number")))
            })
            .transpose()
    };

    let status = param("status")
        .map(|raw| {
            RoomStatus::parse(raw).ok_or_else(|| {
                api_bad_request(format!(
                    "\"status\" must be one of [{}]",
                    RoomStatus::NAMES.join(", ")
                ))
            })
        })
        .transpose()?;
    let kind = param("type")
        .map(|raw| {
            RoomType::parse(raw).ok_or_else(|| {
                api_bad_request(format!(
                    "\"type\" must be one of [{}]",
                    RoomType::NAMES.join(", ")
                ))
            })
        })
        .transpose()?;
    let search = param("search").map(str::to_string);
    if search.as_ref().is_some_and(|s| s.len() > MAX_SEARCH_LEN) {
        return Err(api_bad_request("\"search\" is too long"));
    }

    // The availability window only applies when both ends are given.
    let free_during = match (param("checkIn"), param("checkOut")) {
        (Some(check_in), Some(check_out)) => Some(date_window(check_in, check_out)?),
        _ => None,
    };

    Ok(RoomFilter {
        status,
        kind,
        min_price: price("minPrice")?,
        max_price: price("maxPrice")?,
        free_during,
        search,
    })
}

fn date_window(check_in: &str, check_out: &str) -> Result<Span, ApiError> {
    let (Some(start), Some(end)) = (parse_timestamp(check_in), parse_timestamp(check_out)) else {
        return Err(api_bad_request("Invalid dates"));
    };
    if start >= end {
        return Err(api_bad_request("checkOut must be after checkIn"));
    }
    Ok(Span::new(start, end))
}

/// `GET /rooms/available?checkIn&checkOut`
pub(crate) async fn list_available(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<DataResponse<Vec<RoomResponse>>>, ApiError> {
    let (Some(check_in), Some(check_out)) = (query.get("checkIn"), query.get("checkOut")) else {
        return Err(api_bad_request("checkIn and checkOut dates are required"));
    };
    let window = date_window(check_in, check_out)?;
    let rooms = state.engine.list_available(window.start, window.end).await?;
    Ok(Json(DataResponse {
        data: rooms.into_iter().map(RoomResponse::from).collect(),
    }))
}

pub(crate) async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RoomResponse>, ApiError> {
    let room = state.engine.get_room(parse_id(&id)?).await?;
    Ok(Json(room.into()))
}

/// `POST /rooms`: a single room object, or an array created all-or-nothing.
pub(crate) async fn create_rooms(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    match json_body(payload)? {
        Value::Array(items) => {
            if items.is_empty() {
                return Err(api_bad_request("at least one room is required"));
            }
            let batch = items
                .into_iter()
                .map(|item| checked::<CreateRoomRequest>(&ROOM, item, Mode::Create).map(NewRoom::from))
                .collect::<Result<Vec<_>, _>>()?;
            let rooms = state.engine.create_rooms(batch).await?;
            let body = BulkRoomsResponse {
                message: "Rooms added successfully",
                data: rooms.into_iter().map(RoomResponse::from).collect(),
            };
            Ok((StatusCode::CREATED, Json(body)).into_response())
        }
        body => {
            let req: CreateRoomRequest = checked(&ROOM, body, Mode::Create)?;
            let room = state
                .engine
                .create_room(req.into())
                .await
                .map_err(single_room_error)?;
            Ok((StatusCode::CREATED, Json(RoomResponse::from(room))).into_response())
        }
    }
}

/// `PUT /rooms/:id`: partial update; setting `status` directly is how a
/// room is blocked or released by hand.
pub(crate) async fn update_room(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RoomResponse>, ApiError> {
    let id = parse_id(&id)?;
    let req: UpdateRoomRequest = checked(&ROOM, json_body(payload)?, Mode::Patch)?;
    let room = state
        .engine
        .update_room(id, req.into())
        .await
        .map_err(single_room_error)?;
    Ok(Json(room.into()))
}

/// `DELETE /rooms/:id`: also removes every booking of the room.
pub(crate) async fn delete_room(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.engine.delete_room(parse_id(&id)?).await?;
    Ok(Json(MessageResponse {
        message: "Room deleted",
    }))
}
