use crate::model::*;

use super::{Engine, EngineError};

const SAMPLE_GUESTS: &[(&str, &str, &str)] = &[
    ("Alice Mercado", "alice@example.com", "09171234567"),
    ("Bob Santos", "bob@example.com", "09179876543"),
    ("Juan Perez", "juan@example.com", "09179876543"),
    ("Pedro Lopez", "pedro@example.com", "09179876543"),
    ("Vivian Joy Elemento", "vivian@example.com", "09179876543"),
];

fn sample_rooms() -> Vec<NewRoom> {
    (101..=110)
        .map(|n| {
            let (kind, price) = match n {
                101 => (RoomType::Single, 1500.0),
                110 => (RoomType::Suite, 5000.0),
                _ => (RoomType::Double, 2500.0),
            };
            NewRoom {
                number: n.to_string(),
                kind,
                price,
                status: RoomStatus::Available,
            }
        })
        .collect()
}

impl Engine {
    /// Load demo rooms 101-110 and a handful of guests. Each directory is
    /// only seeded when it is empty. Returns how many rooms and guests were added.
    pub async fn seed_sample_data(&self) -> Result<(usize, usize), EngineError> {
        let mut rooms = 0;
        if self.store.room_count() == 0 {
            rooms = self.create_rooms(sample_rooms()).await?.len();
        }
        let mut guests = 0;
        if self.store.guest_count() == 0 {
            for &(name, email, phone) in SAMPLE_GUESTS {
                self.create_guest(NewGuest {
                    name: name.into(),
                    email: email.into(),
                    phone: Some(phone.into()),
                    room_id: None,
                })
                .await?;
                guests += 1;
            }
        }
        if rooms + guests > 0 {
            tracing::info!("seeded {rooms} rooms and {guests} guests");
        }
        Ok((rooms, guests))
    }
}
