//! Room occupancy reconciliation.
//!
//! `Room.status` is a cached view over the room's bookings. Every booking
//! mutation recomputes it synchronously while still holding the room lock.
//! A room marked `unavailable` is a manual block and is never overwritten.

use ulid::Ulid;

use crate::model::*;

use super::conflict::now_ms;
use super::{Engine, EngineError};

/// Status the room should have at `now`, or `None` to leave it alone.
pub fn derive_status(rs: &RoomState, now: Ms) -> Option<RoomStatus> {
    if rs.room.status == RoomStatus::Unavailable {
        return None;
    }
    Some(if rs.active_at(now).is_some() {
        RoomStatus::Occupied
    } else {
        RoomStatus::Available
    })
}

impl Engine {
    /// Recompute a room's status from its bookings. A missing room is a no-op.
    pub async fn reconcile_room(&self, room_id: Ulid) -> Result<(), EngineError> {
        let _shared = self.commit_gate.read().await;
        let Some(rs) = self.store.get_room(&room_id) else {
            return Ok(());
        };
        let mut guard = rs.write().await;
        if !self.store.contains_room(&room_id) {
            return Ok(());
        }
        self.reconcile_locked(&mut guard, now_ms()).await
    }

    /// Reconcile every room. Used by the periodic sweeper as time moves
    /// stays in and out of "now" without any mutation.
    pub async fn reconcile_all(&self) -> Result<usize, EngineError> {
        let _shared = self.commit_gate.read().await;
        let now = now_ms();
        let mut changed = 0;
        for rs in self.store.room_handles() {
            let mut guard = rs.write().await;
            if !self.store.contains_room(&guard.room.id) {
                continue;
            }
            let before = guard.room.status;
            self.reconcile_locked(&mut guard, now).await?;
            if guard.room.status != before {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Reconcile with the room lock already held. Only writes when the status changes.
    pub(super) async fn reconcile_locked(
        &self,
        rs: &mut RoomState,
        now: Ms,
    ) -> Result<(), EngineError> {
        let Some(status) = derive_status(rs, now) else {
            tracing::debug!("room {} is unavailable, skipping reconcile", rs.room.number);
            return Ok(());
        };
        metrics::counter!(crate::observability::ROOM_RECONCILIATIONS_TOTAL, "status" => status.as_str())
            .increment(1);
        if status == rs.room.status {
            return Ok(());
        }
        self.set_room_status(rs, status, now).await
    }

    pub(super) async fn set_room_status(
        &self,
        rs: &mut RoomState,
        status: RoomStatus,
        now: Ms,
    ) -> Result<(), EngineError> {
        tracing::debug!(
            "room {} status {} -> {}",
            rs.room.number,
            rs.room.status.as_str(),
            status.as_str()
        );
        let event = Event::RoomStatusChanged {
            id: rs.room.id,
            status,
            updated_at: now,
        };
        self.persist_to_room(rs, &event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(status: RoomStatus, bookings: &[(Ms, Ms, BookingStatus)]) -> RoomState {
        let room_id = Ulid::new();
        let mut rs = RoomState::new(Room {
            id: room_id,
            number: "101".into(),
            kind: RoomType::Single,
            price: 100.0,
            status,
            created_at: 0,
            updated_at: 0,
        });
        for &(start, end, status) in bookings {
            rs.insert_booking(Booking {
                id: Ulid::new(),
                guest_id: Ulid::new(),
                room_id,
                span: Span::new(start, end),
                status,
                created_at: 0,
                updated_at: 0,
            });
        }
        rs
    }

    #[test]
    fn occupied_when_active_booking_covers_now() {
        let rs = state(RoomStatus::Available, &[(100, 200, BookingStatus::Pending)]);
        assert_eq!(derive_status(&rs, 150), Some(RoomStatus::Occupied));
    }

    #[test]
    fn available_at_check_out_instant() {
        let rs = state(RoomStatus::Occupied, &[(100, 200, BookingStatus::Confirmed)]);
        assert_eq!(derive_status(&rs, 200), Some(RoomStatus::Available));
    }

    #[test]
    fn inactive_bookings_do_not_occupy() {
        let rs = state(
            RoomStatus::Occupied,
            &[
                (100, 200, BookingStatus::Cancelled),
                (100, 200, BookingStatus::Completed),
            ],
        );
        assert_eq!(derive_status(&rs, 150), Some(RoomStatus::Available));
    }

    #[test]
    fn unavailable_is_left_alone() {
        let rs = state(RoomStatus::Unavailable, &[(100, 200, BookingStatus::Confirmed)]);
        assert_eq!(derive_status(&rs, 150), None);
        assert_eq!(derive_status(&rs, 500), None);
    }
}
