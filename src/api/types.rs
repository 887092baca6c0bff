//! Wire types for the HTTP API.
//!
//! Requests are checked against a `validate` schema before they are
//! deserialized here, so serde errors only surface for shapes the schema
//! cannot express. Responses use camelCase keys and RFC 3339 timestamps.
use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Deserializer, Serialize};
use ulid::Ulid;

use crate::model::*;
use crate::validate::parse_timestamp;

// ── Requests ─────────────────────────────────────────────

/// A date as sent by clients: a date/datetime string or unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TimestampInput {
    Millis(i64),
    Text(String),
}

impl TimestampInput {
    pub fn to_ms(&self) -> Option<Ms> {
        match self {
            TimestampInput::Millis(ms) => Some(*ms),
            TimestampInput::Text(s) => parse_timestamp(s),
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomRequest {
    pub number: String,
    #[serde(rename = "type", default)]
    pub kind: RoomType,
    pub price: f64,
    #[serde(default)]
    pub status: RoomStatus,
}

impl From<CreateRoomRequest> for NewRoom {
    fn from(req: CreateRoomRequest) -> Self {
        NewRoom {
            number: req.number,
            kind: req.kind,
            price: req.price,
            status: req.status,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRoomRequest {
    pub number: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<RoomType>,
    pub price: Option<f64>,
    pub status: Option<RoomStatus>,
}

impl From<UpdateRoomRequest> for RoomPatch {
    fn from(req: UpdateRoomRequest) -> Self {
        RoomPatch {
            number: req.number,
            kind: req.kind,
            price: req.price,
            status: req.status,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGuestRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub room: Option<Ulid>,
}

impl From<CreateGuestRequest> for NewGuest {
    fn from(req: CreateGuestRequest) -> Self {
        NewGuest {
            name: req.name,
            email: req.email,
            phone: req.phone,
            room_id: req.room,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGuestRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub room: Option<Option<Ulid>>,
}

impl From<UpdateGuestRequest> for GuestPatch {
    fn from(req: UpdateGuestRequest) -> Self {
        GuestPatch {
            name: req.name,
            email: req.email,
            phone: req.phone,
            room_id: req.room,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub guest_id: Ulid,
    pub room_id: Ulid,
    pub check_in: TimestampInput,
    pub check_out: TimestampInput,
    #[serde(default)]
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    pub check_in: Option<TimestampInput>,
    pub check_out: Option<TimestampInput>,
    pub status: Option<BookingStatus>,
}

// ── Responses ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> ListResponse<T> {
    pub fn new<U>(page: Page<U>, request: PageRequest, f: impl FnMut(U) -> T) -> Self {
        ListResponse {
            data: page.items.into_iter().map(f).collect(),
            meta: PageMeta {
                total: page.total,
                page: request.page,
                limit: request.limit,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkRoomsResponse {
    pub message: &'static str,
    pub data: Vec<RoomResponse>,
}

/// RFC 3339 with millisecond precision, UTC.
pub fn rfc3339(ms: Ms) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub id: Ulid,
    pub number: String,
    #[serde(rename = "type")]
    pub kind: RoomType,
    pub price: f64,
    pub status: RoomStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        RoomResponse {
            id: room.id,
            number: room.number,
            kind: room.kind,
            price: room.price,
            status: room.status,
            created_at: rfc3339(room.created_at),
            updated_at: rfc3339(room.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestResponse {
    pub id: Ulid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub room_id: Option<Ulid>,
    /// The referenced room, `null` if none or no longer present.
    pub room: Option<RoomResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl GuestResponse {
    fn new(guest: Guest, room: Option<Room>) -> Self {
        GuestResponse {
            id: guest.id,
            name: guest.name,
            email: guest.email,
            phone: guest.phone,
            room_id: guest.room_id,
            room: room.map(RoomResponse::from),
            created_at: rfc3339(guest.created_at),
            updated_at: rfc3339(guest.updated_at),
        }
    }
}

impl From<GuestView> for GuestResponse {
    fn from(view: GuestView) -> Self {
        GuestResponse::new(view.guest, view.room)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Ulid,
    pub guest_id: Ulid,
    pub room_id: Ulid,
    pub guest: Option<GuestResponse>,
    pub room: Option<RoomResponse>,
    pub check_in: String,
    pub check_out: String,
    pub status: BookingStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BookingView> for BookingResponse {
    fn from(view: BookingView) -> Self {
        let BookingView {
            booking,
            guest,
            room,
        } = view;
        BookingResponse {
            id: booking.id,
            guest_id: booking.guest_id,
            room_id: booking.room_id,
            guest: guest.map(|g| GuestResponse::new(g, None)),
            room: room.map(RoomResponse::from),
            check_in: rfc3339(booking.span.start),
            check_out: rfc3339(booking.span.end),
            status: booking.status,
            created_at: rfc3339(booking.created_at),
            updated_at: rfc3339(booking.updated_at),
        }
    }
}
