use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds, the only time type.
pub type Ms = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// The one overlap predicate. Spans that only touch at a boundary do not overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

/// `[a_start, a_end)` and `[b_start, b_end)` intersect.
pub fn overlaps(a_start: Ms, a_end: Ms, b_start: Ms, b_end: Ms) -> bool {
    a_start < b_end && b_start < a_end
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    #[default]
    Single,
    Double,
    Suite,
}

impl RoomType {
    pub const NAMES: &'static [&'static str] = &["single", "double", "suite"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single" => Some(Self::Single),
            "double" => Some(Self::Double),
            "suite" => Some(Self::Suite),
            _ => None,
        }
    }
}

/// Cached occupancy of a room. Bookings are the source of truth for
/// `Available`/`Occupied`; `Unavailable` is a manual block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    #[default]
    Available,
    Occupied,
    Unavailable,
}

impl RoomStatus {
    pub const NAMES: &'static [&'static str] = &["available", "occupied", "unavailable"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(Self::Available),
            "occupied" => Some(Self::Occupied),
            "unavailable" => Some(Self::Unavailable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    #[default]
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const NAMES: &'static [&'static str] = &["pending", "confirmed", "cancelled", "completed"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Pending and confirmed bookings hold the room: they count for
    /// conflicts and occupancy.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: Ulid,
    pub number: String,
    pub kind: RoomType,
    pub price: f64,
    pub status: RoomStatus,
    pub created_at: Ms,
    pub updated_at: Ms,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub id: Ulid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Weak back-reference; the room may no longer exist.
    pub room_id: Option<Ulid>,
    pub created_at: Ms,
    pub updated_at: Ms,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub guest_id: Ulid,
    pub room_id: Ulid,
    /// `[check_in, check_out)`.
    pub span: Span,
    pub status: BookingStatus,
    pub created_at: Ms,
    pub updated_at: Ms,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// A room together with every booking that references it.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub room: Room,
    /// All bookings for the room, sorted by `span.start`.
    pub bookings: Vec<Booking>,
}

impl RoomState {
    pub fn new(room: Room) -> Self {
        Self {
            room,
            bookings: Vec::new(),
        }
    }

    /// Insert booking maintaining sort order by span.start.
    pub fn insert_booking(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .binary_search_by_key(&booking.span.start, |b| b.span.start)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    pub fn remove_booking(&mut self, id: Ulid) -> Option<Booking> {
        let pos = self.bookings.iter().position(|b| b.id == id)?;
        Some(self.bookings.remove(pos))
    }

    /// Replace a booking in place, re-sorting if its start moved.
    pub fn replace_booking(&mut self, booking: Booking) {
        self.remove_booking(booking.id);
        self.insert_booking(booking);
    }

    pub fn booking(&self, id: Ulid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    /// Return only bookings whose span overlaps the query window.
    /// Uses binary search to skip bookings starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &Booking> {
        let right_bound = self.bookings.partition_point(|b| b.span.start < query.end);
        let query = *query;
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.span.overlaps(&query))
    }

    /// Active bookings overlapping `query`, skipping `exclude`.
    pub fn active_overlapping(
        &self,
        query: &Span,
        exclude: Option<Ulid>,
    ) -> impl Iterator<Item = &Booking> {
        self.overlapping(query)
            .filter(move |b| b.is_active() && Some(b.id) != exclude)
    }

    /// First active booking whose span contains `now`.
    pub fn active_at(&self, now: Ms) -> Option<&Booking> {
        self.bookings
            .iter()
            .take_while(|b| b.span.start <= now)
            .find(|b| b.is_active() && b.span.contains_instant(now))
    }
}

// ── Mutation inputs ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct NewRoom {
    pub number: String,
    pub kind: RoomType,
    pub price: f64,
    pub status: RoomStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomPatch {
    pub number: Option<String>,
    pub kind: Option<RoomType>,
    pub price: Option<f64>,
    pub status: Option<RoomStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGuest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub room_id: Option<Ulid>,
}

/// `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub room_id: Option<Option<Ulid>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewBooking {
    pub guest_id: Ulid,
    pub room_id: Ulid,
    pub check_in: Ms,
    pub check_out: Ms,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingPatch {
    pub check_in: Option<Ms>,
    pub check_out: Option<Ms>,
    pub status: Option<BookingStatus>,
}

// ── Query inputs and results ────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: crate::limits::DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Slice one page out of an already filtered and ordered list.
    pub fn apply<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let items = items.into_iter().skip(self.offset()).take(self.limit).collect();
        Page { items, total }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the filtered set, independent of the page window.
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomFilter {
    pub status: Option<RoomStatus>,
    pub kind: Option<RoomType>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Exclude rooms with an active booking overlapping this span.
    pub free_during: Option<Span>,
    /// Case-insensitive substring of the room number.
    pub search: Option<String>,
}

impl RoomFilter {
    pub fn matches_room(&self, room: &Room) -> bool {
        if self.status.is_some_and(|s| s != room.status) {
            return false;
        }
        if self.kind.is_some_and(|k| k != room.kind) {
            return false;
        }
        if self.min_price.is_some_and(|min| room.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| room.price > max) {
            return false;
        }
        if let Some(ref needle) = self.search
            && !room.number.to_lowercase().contains(&needle.to_lowercase())
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub guest_id: Option<Ulid>,
    pub room_id: Option<Ulid>,
}

/// Booking with its guest and room joined at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingView {
    pub booking: Booking,
    pub guest: Option<Guest>,
    pub room: Option<Room>,
}

/// Guest with its referenced room joined at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct GuestView {
    pub guest: Guest,
    pub room: Option<Room>,
}

/// WAL record format. Flat, no nesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// One record per batch so a bulk insert replays all-or-nothing.
    RoomsCreated {
        rooms: Vec<Room>,
    },
    RoomUpdated {
        room: Room,
    },
    RoomStatusChanged {
        id: Ulid,
        status: RoomStatus,
        updated_at: Ms,
    },
    /// Also removes every booking of the room.
    RoomDeleted {
        id: Ulid,
    },
    GuestCreated {
        guest: Guest,
    },
    GuestUpdated {
        guest: Guest,
    },
    GuestDeleted {
        id: Ulid,
    },
    BookingCreated {
        booking: Booking,
    },
    BookingUpdated {
        booking: Booking,
    },
    BookingDeleted {
        id: Ulid,
        room_id: Ulid,
    },
}
