//! Guest directory handlers.
use std::collections::HashMap;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::{
    CreateGuestRequest, GuestResponse, ListResponse, MessageResponse, UpdateGuestRequest,
};
use crate::api::{AppState, checked, json_body, page_request, parse_id};
use crate::validate::{GUEST, Mode};

/// `GET /guests`: newest first, each with its room attached.
pub(crate) async fn list_guests(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ListResponse<GuestResponse>>, ApiError> {
    let page = page_request(&query)?;
    let guests = state.engine.list_guests(page).await;
    Ok(Json(ListResponse::new(guests, page, GuestResponse::from)))
}

pub(crate) async fn get_guest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GuestResponse>, ApiError> {
    let view = state.engine.get_guest(parse_id(&id)?).await?;
    Ok(Json(view.into()))
}

pub(crate) async fn create_guest(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<GuestResponse>), ApiError> {
    let req: CreateGuestRequest = checked(&GUEST, json_body(payload)?, Mode::Create)?;
    let guest = state.engine.create_guest(req.into()).await?;
    let view = state.engine.view_guest(guest).await;
    Ok((StatusCode::CREATED, Json(view.into())))
}

/// `PUT /guests/:id`: partial update; `null` clears `phone` or `room`.
pub(crate) async fn update_guest(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GuestResponse>, ApiError> {
    let id = parse_id(&id)?;
    let req: UpdateGuestRequest = checked(&GUEST, json_body(payload)?, Mode::Patch)?;
    let guest = state.engine.update_guest(id, req.into()).await?;
    let view = state.engine.view_guest(guest).await;
    Ok(Json(view.into()))
}

pub(crate) async fn delete_guest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.engine.delete_guest(parse_id(&id)?).await?;
    Ok(Json(MessageResponse {
        message: "Guest deleted successfully",
    }))
}
