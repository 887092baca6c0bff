use std::cmp::Reverse;

use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::validate::is_valid_email;

use super::conflict::now_ms;
use super::{Engine, EngineError, Entity};

fn normalize_name(name: &str) -> Result<String, EngineError> {
    let name = name.trim();
    if name.chars().count() < MIN_GUEST_NAME_LEN {
        return Err(EngineError::Validation(format!(
            "name must be at least {MIN_GUEST_NAME_LEN} characters"
        )));
    }
    if name.len() > MAX_GUEST_NAME_LEN {
        return Err(EngineError::LimitExceeded("name too long"));
    }
    Ok(name.to_string())
}

fn normalize_email(email: &str) -> Result<String, EngineError> {
    let email = email.trim();
    if email.len() > MAX_EMAIL_LEN {
        return Err(EngineError::LimitExceeded("email too long"));
    }
    if !is_valid_email(email) {
        return Err(EngineError::Validation("email must be a valid email".into()));
    }
    Ok(email.to_string())
}

/// Empty phone numbers are stored as absent.
fn normalize_phone(phone: Option<String>) -> Result<Option<String>, EngineError> {
    let Some(phone) = phone else {
        return Ok(None);
    };
    let phone = phone.trim();
    if phone.len() > MAX_PHONE_LEN {
        return Err(EngineError::LimitExceeded("phone too long"));
    }
    Ok((!phone.is_empty()).then(|| phone.to_string()))
}

impl Engine {
    pub async fn create_guest(&self, new: NewGuest) -> Result<Guest, EngineError> {
        let name = normalize_name(&new.name)?;
        let email = normalize_email(&new.email)?;
        let phone = normalize_phone(new.phone)?;

        let _shared = self.commit_gate.read().await;
        let _directory = self.directory.write().await;
        if self.store.guest_count() >= MAX_GUESTS {
            return Err(EngineError::LimitExceeded("too many guests"));
        }
        self.check_room_ref(new.room_id)?;
        if self.store.guest_id_for_email(&email).is_some() {
            return Err(EngineError::DuplicateEmail(email));
        }

        let now = now_ms();
        let guest = Guest {
            id: self.next_id(),
            name,
            email,
            phone,
            room_id: new.room_id,
            created_at: now,
            updated_at: now,
        };
        self.persist_directory(&Event::GuestCreated {
            guest: guest.clone(),
        })
        .await?;
        tracing::debug!("created guest {}", guest.id);
        Ok(guest)
    }

    pub async fn get_guest(&self, id: Ulid) -> Result<GuestView, EngineError> {
        let guest = self
            .store
            .get_guest(&id)
            .ok_or(EngineError::NotFound(Entity::Guest, id))?;
        Ok(self.view_guest(guest).await)
    }

    /// Newest first, each with its room joined.
    pub async fn list_guests(&self, page: PageRequest) -> Page<GuestView> {
        let mut guests = self.store.guests();
        guests.sort_by_key(|g| Reverse((g.created_at, g.id)));
        let Page { items, total } = page.apply(guests);
        let mut views = Vec::with_capacity(items.len());
        for guest in items {
            views.push(self.view_guest(guest).await);
        }
        Page {
            items: views,
            total,
        }
    }

    pub async fn update_guest(&self, id: Ulid, patch: GuestPatch) -> Result<Guest, EngineError> {
        let name = patch.name.as_deref().map(normalize_name).transpose()?;
        let email = patch.email.as_deref().map(normalize_email).transpose()?;
        let phone = patch.phone.map(normalize_phone).transpose()?;

        let _shared = self.commit_gate.read().await;
        let _directory = self.directory.write().await;
        let mut guest = self
            .store
            .get_guest(&id)
            .ok_or(EngineError::NotFound(Entity::Guest, id))?;

        if let Some(room_id) = patch.room_id {
            self.check_room_ref(room_id)?;
            guest.room_id = room_id;
        }
        if let Some(email) = email {
            if self
                .store
                .guest_id_for_email(&email)
                .is_some_and(|owner| owner != id)
            {
                return Err(EngineError::DuplicateEmail(email));
            }
            guest.email = email;
        }
        if let Some(name) = name {
            guest.name = name;
        }
        if let Some(phone) = phone {
            guest.phone = phone;
        }
        guest.updated_at = now_ms();

        self.persist_directory(&Event::GuestUpdated {
            guest: guest.clone(),
        })
        .await?;
        Ok(guest)
    }

    /// Remove a guest. Their bookings stay and render without a guest.
    pub async fn delete_guest(&self, id: Ulid) -> Result<Guest, EngineError> {
        let _shared = self.commit_gate.read().await;
        let _directory = self.directory.write().await;
        let guest = self
            .store
            .get_guest(&id)
            .ok_or(EngineError::NotFound(Entity::Guest, id))?;
        self.persist_directory(&Event::GuestDeleted { id }).await?;
        tracing::debug!("deleted guest {id}");
        Ok(guest)
    }

    /// A guest's room reference must name a live room when written.
    fn check_room_ref(&self, room_id: Option<Ulid>) -> Result<(), EngineError> {
        match room_id {
            Some(room_id) if !self.store.contains_room(&room_id) => {
                Err(EngineError::NotFound(Entity::Room, room_id))
            }
            _ => Ok(()),
        }
    }

    /// Snapshot of a room's record, `None` if it no longer exists.
    async fn room_snapshot(&self, room_id: Ulid) -> Option<Room> {
        let rs = self.store.get_room(&room_id)?;
        let guard = rs.read().await;
        Some(guard.room.clone())
    }

    /// Attach the guest's referenced room, if it still exists.
    pub async fn view_guest(&self, guest: Guest) -> GuestView {
        let room = match guest.room_id {
            Some(room_id) => self.room_snapshot(room_id).await,
            None => None,
        };
        GuestView { guest, room }
    }
}
