use std::cmp::Reverse;

use crate::model::*;

use super::conflict::query_span;
use super::{Engine, EngineError};

impl Engine {
    /// Rooms bookable over `[check_in, check_out)`: no active booking overlaps
    /// the window and the room is not blocked. Read-only.
    pub async fn list_available(&self, check_in: Ms, check_out: Ms) -> Result<Vec<Room>, EngineError> {
        let window = query_span(check_in, check_out)?;
        let mut rooms = Vec::new();
        for rs in self.store.room_handles() {
            let guard = rs.read().await;
            if guard.room.status == RoomStatus::Unavailable {
                continue;
            }
            if guard.active_overlapping(&window, None).next().is_none() {
                rooms.push(guard.room.clone());
            }
        }
        rooms.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(rooms)
    }

    /// Filtered room directory, newest first, paginated after filtering.
    pub async fn list_rooms(
        &self,
        filter: &RoomFilter,
        page: PageRequest,
    ) -> Result<Page<Room>, EngineError> {
        if let Some(window) = filter.free_during {
            query_span(window.start, window.end)?;
        }
        let mut rooms = Vec::new();
        for rs in self.store.room_handles() {
            let guard = rs.read().await;
            if !filter.matches_room(&guard.room) {
                continue;
            }
            if let Some(window) = filter.free_during
                && guard.active_overlapping(&window, None).next().is_some()
            {
                continue;
            }
            rooms.push(guard.room.clone());
        }
        rooms.sort_by_key(|r| Reverse((r.created_at, r.id)));
        Ok(page.apply(rooms))
    }
}
