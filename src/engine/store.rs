use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::model::*;

use super::SharedRoomState;

/// Case-insensitive key for the email index.
pub(crate) fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Directories plus the secondary indexes that keep lookups O(1).
pub struct InMemoryStore {
    rooms: DashMap<Ulid, SharedRoomState>,
    room_numbers: DashMap<String, Ulid>,
    guests: DashMap<Ulid, Guest>,
    guest_emails: DashMap<String, Ulid>,
    booking_to_room: DashMap<Ulid, Ulid>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            room_numbers: DashMap::new(),
            guests: DashMap::new(),
            guest_emails: DashMap::new(),
            booking_to_room: DashMap::new(),
        }
    }

    // ── Rooms ────────────────────────────────────────────────

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn contains_room(&self, id: &Ulid) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn get_room(&self, id: &Ulid) -> Option<SharedRoomState> {
        self.rooms.get(id).map(|e| e.value().clone())
    }

    /// Handles to every room. Locks are taken by the caller, after the
    /// map shards are released.
    pub fn room_handles(&self) -> Vec<SharedRoomState> {
        self.rooms.iter().map(|e| e.value().clone()).collect()
    }

    pub fn room_id_for_number(&self, number: &str) -> Option<Ulid> {
        self.room_numbers.get(number).map(|e| *e.value())
    }

    pub fn insert_room(&self, room: Room) {
        self.room_numbers.insert(room.number.clone(), room.id);
        self.rooms
            .insert(room.id, Arc::new(RwLock::new(RoomState::new(room))));
    }

    /// Drop a room and unindex its number and bookings. Caller holds the
    /// room's write lock (or owns the state exclusively during replay).
    pub fn remove_room(&self, rs: &RoomState) {
        let id = rs.room.id;
        self.room_numbers
            .remove_if(&rs.room.number, |_, owner| *owner == id);
        for booking in &rs.bookings {
            self.booking_to_room.remove(&booking.id);
        }
        self.rooms.remove(&id);
    }

    // ── Guests ───────────────────────────────────────────────

    pub fn guest_count(&self) -> usize {
        self.guests.len()
    }

    pub fn get_guest(&self, id: &Ulid) -> Option<Guest> {
        self.guests.get(id).map(|e| e.value().clone())
    }

    pub fn guests(&self) -> Vec<Guest> {
        self.guests.iter().map(|e| e.value().clone()).collect()
    }

    pub fn guest_id_for_email(&self, email: &str) -> Option<Ulid> {
        self.guest_emails.get(&email_key(email)).map(|e| *e.value())
    }

    pub fn release_email(&self, email: &str, guest_id: Ulid) {
        self.guest_emails
            .remove_if(&email_key(email), |_, owner| *owner == guest_id);
    }

    pub fn upsert_guest(&self, guest: Guest) {
        if let Some(previous) = self.guests.get(&guest.id).map(|e| e.email.clone())
            && email_key(&previous) != email_key(&guest.email)
        {
            self.release_email(&previous, guest.id);
        }
        self.guest_emails.insert(email_key(&guest.email), guest.id);
        self.guests.insert(guest.id, guest);
    }

    pub fn remove_guest(&self, id: &Ulid) -> Option<Guest> {
        let (_, guest) = self.guests.remove(id)?;
        self.release_email(&guest.email, guest.id);
        Some(guest)
    }

    // ── Booking index ────────────────────────────────────────

    pub fn booking_count(&self) -> usize {
        self.booking_to_room.len()
    }

    pub fn room_for_booking(&self, booking_id: &Ulid) -> Option<Ulid> {
        self.booking_to_room.get(booking_id).map(|e| *e.value())
    }

    // ── Event application ────────────────────────────────────

    /// Apply a directory-level event (no room lock involved).
    pub fn apply_directory_event(&self, event: &Event) {
        match event {
            Event::RoomsCreated { rooms } => {
                for room in rooms {
                    self.insert_room(room.clone());
                }
            }
            Event::GuestCreated { guest } | Event::GuestUpdated { guest } => {
                self.upsert_guest(guest.clone());
            }
            Event::GuestDeleted { id } => {
                self.remove_guest(id);
            }
            _ => {}
        }
    }

    /// Apply a room-scoped event. Caller holds the room's write lock.
    pub fn apply_to_room(&self, rs: &mut RoomState, event: &Event) {
        match event {
            Event::RoomUpdated { room } => {
                if rs.room.number != room.number {
                    self.room_numbers
                        .remove_if(&rs.room.number, |_, owner| *owner == room.id);
                    self.room_numbers.insert(room.number.clone(), room.id);
                }
                rs.room = room.clone();
            }
            Event::RoomStatusChanged {
                status, updated_at, ..
            } => {
                rs.room.status = *status;
                rs.room.updated_at = *updated_at;
            }
            Event::BookingCreated { booking } => {
                self.booking_to_room.insert(booking.id, booking.room_id);
                rs.insert_booking(booking.clone());
            }
            Event::BookingUpdated { booking } => {
                rs.replace_booking(booking.clone());
            }
            Event::BookingDeleted { id, .. } => {
                rs.remove_booking(*id);
                self.booking_to_room.remove(id);
            }
            Event::RoomDeleted { .. } => self.remove_room(rs),
            Event::RoomsCreated { .. }
            | Event::GuestCreated { .. }
            | Event::GuestUpdated { .. }
            | Event::GuestDeleted { .. } => {}
        }
    }
}

/// The room an event is scoped to, for room-level events.
pub(crate) fn event_room_id(event: &Event) -> Option<Ulid> {
    match event {
        Event::RoomUpdated { room } => Some(room.id),
        Event::RoomStatusChanged { id, .. } | Event::RoomDeleted { id } => Some(*id),
        Event::BookingCreated { booking } | Event::BookingUpdated { booking } => {
            Some(booking.room_id)
        }
        Event::BookingDeleted { room_id, .. } => Some(*room_id),
        Event::RoomsCreated { .. }
        | Event::GuestCreated { .. }
        | Event::GuestUpdated { .. }
        | Event::GuestDeleted { .. } => None,
    }
}
