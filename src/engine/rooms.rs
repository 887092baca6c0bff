use std::collections::HashSet;

use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::conflict::now_ms;
use super::{Engine, EngineError, Entity};

fn normalize_number(number: &str) -> Result<String, EngineError> {
    let number = number.trim();
    if number.is_empty() {
        return Err(EngineError::Validation("room number is required".into()));
    }
    if number.len() > MAX_ROOM_NUMBER_LEN {
        return Err(EngineError::LimitExceeded("room number too long"));
    }
    Ok(number.to_string())
}

fn check_price(price: f64) -> Result<(), EngineError> {
    if !price.is_finite() || price < 0.0 {
        return Err(EngineError::Validation("price must be a non-negative number".into()));
    }
    if price > MAX_ROOM_PRICE {
        return Err(EngineError::LimitExceeded("price too large"));
    }
    Ok(())
}

/// A new room has no bookings, so only a manual block survives creation.
fn initial_status(requested: RoomStatus) -> RoomStatus {
    match requested {
        RoomStatus::Unavailable => RoomStatus::Unavailable,
        RoomStatus::Available | RoomStatus::Occupied => RoomStatus::Available,
    }
}

impl Engine {
    pub async fn create_room(&self, new: NewRoom) -> Result<Room, EngineError> {
        let mut rooms = self.create_rooms(vec![new]).await?;
        rooms
            .pop()
            .ok_or_else(|| EngineError::WalError("room batch applied empty".into()))
    }

    /// Create a batch of rooms. All-or-nothing: any duplicate number, against
    /// the directory or within the batch, rejects the whole batch and every
    /// duplicate is reported.
    pub async fn create_rooms(&self, batch: Vec<NewRoom>) -> Result<Vec<Room>, EngineError> {
        if batch.is_empty() {
            return Err(EngineError::Validation("at least one room is required".into()));
        }
        if batch.len() > MAX_BATCH_SIZE {
            return Err(EngineError::LimitExceeded("batch too large"));
        }
        let mut normalized = Vec::with_capacity(batch.len());
        for new in batch {
            let number = normalize_number(&new.number)?;
            check_price(new.price)?;
            normalized.push(NewRoom { number, ..new });
        }

        let _shared = self.commit_gate.read().await;
        let _directory = self.directory.write().await;
        if self.store.room_count() + normalized.len() > MAX_ROOMS {
            return Err(EngineError::LimitExceeded("too many rooms"));
        }

        let duplicates = self.duplicate_numbers(&normalized);
        if !duplicates.is_empty() {
            tracing::warn!("rejected room batch, duplicate numbers: {duplicates:?}");
            return Err(EngineError::DuplicateNumbers(duplicates));
        }

        let now = now_ms();
        let rooms: Vec<Room> = normalized
            .into_iter()
            .map(|new| Room {
                id: self.next_id(),
                number: new.number,
                kind: new.kind,
                price: new.price,
                status: initial_status(new.status),
                created_at: now,
                updated_at: now,
            })
            .collect();

        let event = Event::RoomsCreated {
            rooms: rooms.clone(),
        };
        self.persist_directory(&event).await?;
        tracing::info!("created {} room(s)", rooms.len());
        Ok(rooms)
    }

    /// Numbers already in the directory or repeated within the batch, in batch order.
    fn duplicate_numbers(&self, batch: &[NewRoom]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates: Vec<String> = Vec::new();
        for new in batch {
            let taken = self.store.room_id_for_number(&new.number).is_some();
            if (taken || !seen.insert(new.number.as_str())) && !duplicates.contains(&new.number) {
                duplicates.push(new.number.clone());
            }
        }
        duplicates
    }

    pub async fn get_room(&self, id: Ulid) -> Result<Room, EngineError> {
        let rs = self
            .store
            .get_room(&id)
            .ok_or(EngineError::NotFound(Entity::Room, id))?;
        let guard = rs.read().await;
        Ok(guard.room.clone())
    }

    /// Apply the supplied fields. Setting `status` directly is how a room is
    /// blocked (`unavailable`) or released by hand. Any other status is
    /// recomputed from the room's bookings.
    pub async fn update_room(&self, id: Ulid, patch: RoomPatch) -> Result<Room, EngineError> {
        let number = patch.number.as_deref().map(normalize_number).transpose()?;
        if let Some(price) = patch.price {
            check_price(price)?;
        }

        let _shared = self.commit_gate.read().await;
        let _directory = self.directory.write().await;
        let mut guard = self.room_write(id).await?;

        if let Some(ref n) = number
            && self.store.room_id_for_number(n).is_some_and(|owner| owner != id)
        {
            return Err(EngineError::DuplicateNumbers(vec![n.clone()]));
        }

        let mut room = guard.room.clone();
        if let Some(n) = number {
            room.number = n;
        }
        if let Some(kind) = patch.kind {
            room.kind = kind;
        }
        if let Some(price) = patch.price {
            room.price = price;
        }
        if let Some(status) = patch.status {
            room.status = status;
        }

        let now = now_ms();
        room.updated_at = now;

        let event = Event::RoomUpdated { room };
        self.persist_to_room(&mut guard, &event).await?;
        if let Err(e) = self.reconcile_locked(&mut guard, now).await {
            tracing::error!("room {id} updated but not reconciled: {e}");
        }
        Ok(guard.room.clone())
    }

    /// Delete a room together with every booking that references it.
    pub async fn delete_room(&self, id: Ulid) -> Result<Room, EngineError> {
        let _shared = self.commit_gate.read().await;
        let _directory = self.directory.write().await;
        let mut guard = self.room_write(id).await?;

        let room = guard.room.clone();
        let cascaded = guard.bookings.len();
        let event = Event::RoomDeleted { id };
        self.persist_to_room(&mut guard, &event).await?;
        tracing::info!("deleted room {} and {cascaded} booking(s)", room.number);
        Ok(room)
    }
}
