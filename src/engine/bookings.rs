use std::cmp::Reverse;

use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::conflict::{check_no_overlap, now_ms, stay_span};
use super::{Engine, EngineError, Entity};

impl Engine {
    /// Book a room for a guest. The room's write lock is held from the
    /// overlap check through the WAL append, so concurrent bookings for the
    /// same room serialize and the loser sees the winner's booking. The
    /// shared directory lock keeps the guest alive until the booking is durable.
    pub async fn create_booking(&self, new: NewBooking) -> Result<BookingView, EngineError> {
        let span = stay_span(new.check_in, new.check_out)?;

        let _shared = self.commit_gate.read().await;
        let _directory = self.directory.read().await;
        let guest = self
            .store
            .get_guest(&new.guest_id)
            .ok_or(EngineError::NotFound(Entity::Guest, new.guest_id))?;
        let mut guard = self.room_write(new.room_id).await?;
        if guard.bookings.len() >= MAX_BOOKINGS_PER_ROOM {
            return Err(EngineError::LimitExceeded("too many bookings for room"));
        }
        if new.status.is_active()
            && let Err(e) = check_no_overlap(&guard, &span, None)
        {
            tracing::warn!("booking conflict on room {}: {e}", guard.room.number);
            return Err(e);
        }

        let now = now_ms();
        let booking = Booking {
            id: self.next_id(),
            guest_id: new.guest_id,
            room_id: new.room_id,
            span,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        self.persist_to_room(
            &mut guard,
            &Event::BookingCreated {
                booking: booking.clone(),
            },
        )
        .await?;

        // The booking is durable at this point. A failed status write leaves
        // the room stale until the next reconcile, not the booking missing.
        if booking.is_active()
            && span.contains_instant(now)
            && guard.room.status == RoomStatus::Available
            && let Err(e) = self.set_room_status(&mut guard, RoomStatus::Occupied, now).await
        {
            tracing::error!("booking {} created but room status not updated: {e}", booking.id);
        }

        tracing::info!(
            "booked room {} for guest {} [{}, {})",
            guard.room.number,
            guest.id,
            span.start,
            span.end
        );
        Ok(BookingView {
            booking,
            guest: Some(guest),
            room: Some(guard.room.clone()),
        })
    }

    pub async fn get_booking(&self, id: Ulid) -> Result<BookingView, EngineError> {
        let room_id = self
            .store
            .room_for_booking(&id)
            .ok_or(EngineError::NotFound(Entity::Booking, id))?;
        let rs = self
            .store
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(Entity::Booking, id))?;
        let guard = rs.read().await;
        let booking = guard
            .booking(id)
            .cloned()
            .ok_or(EngineError::NotFound(Entity::Booking, id))?;
        Ok(BookingView {
            guest: self.store.get_guest(&booking.guest_id),
            room: Some(guard.room.clone()),
            booking,
        })
    }

    /// Apply the supplied fields to a copy of the booking. Nothing is written
    /// if the result is invalid or collides with another active booking.
    pub async fn update_booking(
        &self,
        id: Ulid,
        patch: BookingPatch,
    ) -> Result<BookingView, EngineError> {
        let _shared = self.commit_gate.read().await;
        let mut guard = self.booking_room_write(id).await?;
        let mut booking = guard
            .booking(id)
            .cloned()
            .ok_or(EngineError::NotFound(Entity::Booking, id))?;

        let check_in = patch.check_in.unwrap_or(booking.span.start);
        let check_out = patch.check_out.unwrap_or(booking.span.end);
        booking.span = stay_span(check_in, check_out)?;
        if let Some(status) = patch.status {
            booking.status = status;
        }
        if booking.is_active()
            && let Err(e) = check_no_overlap(&guard, &booking.span, Some(id))
        {
            tracing::warn!("booking {id} update conflicts on room {}: {e}", guard.room.number);
            return Err(e);
        }
        booking.updated_at = now_ms();

        self.persist_to_room(
            &mut guard,
            &Event::BookingUpdated {
                booking: booking.clone(),
            },
        )
        .await?;
        if let Err(e) = self.reconcile_locked(&mut guard, now_ms()).await {
            tracing::error!("booking {id} updated but room not reconciled: {e}");
        }

        Ok(BookingView {
            guest: self.store.get_guest(&booking.guest_id),
            room: Some(guard.room.clone()),
            booking,
        })
    }

    pub async fn delete_booking(&self, id: Ulid) -> Result<Booking, EngineError> {
        let _shared = self.commit_gate.read().await;
        let mut guard = self.booking_room_write(id).await?;
        let booking = guard
            .booking(id)
            .cloned()
            .ok_or(EngineError::NotFound(Entity::Booking, id))?;

        self.persist_to_room(
            &mut guard,
            &Event::BookingDeleted {
                id,
                room_id: booking.room_id,
            },
        )
        .await?;
        if let Err(e) = self.reconcile_locked(&mut guard, now_ms()).await {
            tracing::error!("booking {id} deleted but room not reconciled: {e}");
        }
        tracing::info!("deleted booking {id} on room {}", guard.room.number);
        Ok(booking)
    }

    /// Newest first, with guest and room joined. `total` counts the filtered set.
    pub async fn list_bookings(
        &self,
        filter: BookingFilter,
        page: PageRequest,
    ) -> Page<BookingView> {
        let matching = self.collect_bookings(filter).await;
        let Page { items, total } = page.apply(matching);
        let items = items
            .into_iter()
            .map(|(booking, room)| BookingView {
                guest: self.store.get_guest(&booking.guest_id),
                room: Some(room),
                booking,
            })
            .collect();
        Page { items, total }
    }

    /// Every booking of a guest, newest first, with its room attached.
    pub async fn list_bookings_by_guest(&self, guest_id: Ulid) -> Vec<BookingView> {
        let filter = BookingFilter {
            guest_id: Some(guest_id),
            room_id: None,
        };
        self.collect_bookings(filter)
            .await
            .into_iter()
            .map(|(booking, room)| BookingView {
                booking,
                guest: None,
                room: Some(room),
            })
            .collect()
    }

    /// Matching bookings paired with a snapshot of their room, ordered
    /// by creation time descending.
    async fn collect_bookings(&self, filter: BookingFilter) -> Vec<(Booking, Room)> {
        let handles = match filter.room_id {
            Some(room_id) => self.store.get_room(&room_id).into_iter().collect(),
            None => self.store.room_handles(),
        };
        let mut matching = Vec::new();
        for rs in handles {
            let guard = rs.read().await;
            matching.extend(
                guard
                    .bookings
                    .iter()
                    .filter(|b| filter.guest_id.is_none_or(|g| g == b.guest_id))
                    .map(|b| (b.clone(), guard.room.clone())),
            );
        }
        matching.sort_by_key(|(b, _)| Reverse((b.created_at, b.id)));
        matching
    }
}
