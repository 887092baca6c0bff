mod availability;
mod bookings;
mod conflict;
mod error;
mod guests;
mod occupancy;
mod rooms;
mod seed;
mod store;

pub use error::{EngineError, Entity};
pub use occupancy::derive_status;
pub use store::InMemoryStore;
pub(crate) use conflict::now_ms;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{OwnedRwLockWriteGuard, RwLock, mpsc, oneshot};
use ulid::Ulid;

use crate::model::*;
use crate::wal::Wal;

use store::event_room_id;

pub type SharedRoomState = Arc<RwLock<RoomState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond to all senders.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WalCommand::Append { event, response } => {
                let mut batch = vec![(event, response)];
                let mut deferred = None;
                loop {
                    match rx.try_recv() {
                        Ok(WalCommand::Append { event, response }) => batch.push((event, response)),
                        Ok(other) => {
                            deferred = Some(other);
                            break;
                        }
                        Err(_) => break,
                    }
                }
                commit_batch(&mut wal, &mut batch);
                if let Some(other) = deferred {
                    handle_non_append(&mut wal, other);
                }
            }
            other => handle_non_append(&mut wal, other),
        }
    }
}

fn commit_batch(wal: &mut Wal, batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>) {
    metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let flush_start = std::time::Instant::now();

    let mut result = batch
        .iter()
        .try_for_each(|(event, _)| wal.append_buffered(event));
    // Flush even after an append error so half-written bytes don't leak
    // into the next batch.
    let flushed = wal.flush_sync();
    if result.is_ok() {
        result = flushed;
    }

    metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
        .record(flush_start.elapsed().as_secs_f64());
    if let Err(ref e) = result {
        tracing::error!("WAL flush failed for batch of {}: {e}", batch.len());
    }
    for (_, tx) in batch.drain(..) {
        let r = match &result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result =
                Wal::write_compact_file(wal.path(), &events).and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { .. } => unreachable!("appends are batched by the caller"),
    }
}

/// The hotel: rooms with their bookings, guests, and the log that makes
/// them durable.
pub struct Engine {
    pub(super) store: InMemoryStore,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
    /// Shared by every mutation across its WAL append + apply; exclusive for compaction.
    pub(super) commit_gate: RwLock<()>,
    /// Exclusive for room and guest directory writes. Booking creates hold
    /// it shared so the guest they reference cannot vanish mid-write.
    pub(super) directory: RwLock<()>,
    /// Monotonic within a millisecond, so id order is creation order.
    ids: std::sync::Mutex<ulid::Generator>,
}

impl Engine {
    /// Replay the WAL at `wal_path`, dropping any torn tail, and start its
    /// writer task. Must be called inside a tokio runtime.
    pub fn new(wal_path: PathBuf) -> io::Result<Self> {
        let events = Wal::recover(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self {
            store: InMemoryStore::new(),
            wal_tx,
            commit_gate: RwLock::new(()),
            directory: RwLock::new(()),
            ids: std::sync::Mutex::new(ulid::Generator::new()),
        };

        // We're the sole owner of every room lock here, so try_write always
        // succeeds. Never block: this may run inside an async context.
        for event in &events {
            match event_room_id(event) {
                None => engine.store.apply_directory_event(event),
                Some(room_id) => {
                    let Some(rs) = engine.store.get_room(&room_id) else {
                        continue;
                    };
                    let Ok(mut guard) = rs.try_write() else {
                        continue;
                    };
                    engine.store.apply_to_room(&mut guard, event);
                }
            }
        }

        tracing::info!(
            "replayed {} events: {} rooms, {} guests, {} bookings",
            events.len(),
            engine.store.room_count(),
            engine.store.guest_count(),
            engine.store.booking_count()
        );
        Ok(engine)
    }

    pub(super) fn next_id(&self) -> Ulid {
        match self.ids.lock() {
            Ok(mut generator) => generator.generate().unwrap_or_else(|_| Ulid::new()),
            Err(_) => Ulid::new(),
        }
    }

    /// Write event to WAL via the background group-commit writer.
    async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    /// WAL-append then apply a room-scoped event. Caller holds the room lock.
    pub(super) async fn persist_to_room(
        &self,
        rs: &mut RoomState,
        event: &Event,
    ) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        self.store.apply_to_room(rs, event);
        Ok(())
    }

    /// WAL-append then apply a directory event.
    pub(super) async fn persist_directory(&self, event: &Event) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        self.store.apply_directory_event(event);
        Ok(())
    }

    /// Lock a room for writing. Fails if the room is gone, including when it
    /// was deleted while we waited for the lock.
    pub(super) async fn room_write(
        &self,
        room_id: Ulid,
    ) -> Result<OwnedRwLockWriteGuard<RoomState>, EngineError> {
        let rs = self
            .store
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(Entity::Room, room_id))?;
        let guard = rs.write_owned().await;
        if !self.store.contains_room(&room_id) {
            return Err(EngineError::NotFound(Entity::Room, room_id));
        }
        Ok(guard)
    }

    /// Lookup booking → room, then lock that room for writing.
    pub(super) async fn booking_room_write(
        &self,
        booking_id: Ulid,
    ) -> Result<OwnedRwLockWriteGuard<RoomState>, EngineError> {
        let room_id = self
            .store
            .room_for_booking(&booking_id)
            .ok_or(EngineError::NotFound(Entity::Booking, booking_id))?;
        let guard = self
            .room_write(room_id)
            .await
            .map_err(|_| EngineError::NotFound(Entity::Booking, booking_id))?;
        if guard.booking(booking_id).is_none() {
            return Err(EngineError::NotFound(Entity::Booking, booking_id));
        }
        Ok(guard)
    }

    /// Compact the WAL into the minimal event set that recreates the current state.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let _exclusive = self.commit_gate.write().await;

        let mut events = Vec::new();
        for rs in self.store.room_handles() {
            let guard = rs.read().await;
            events.push(Event::RoomsCreated {
                rooms: vec![guard.room.clone()],
            });
            events.extend(guard.bookings.iter().map(|b| Event::BookingCreated {
                booking: b.clone(),
            }));
        }
        events.extend(
            self.store
                .guests()
                .into_iter()
                .map(|guest| Event::GuestCreated { guest }),
        );

        let count = events.len();
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact { events, response: tx })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))?;
        tracing::info!("compacted WAL to {count} events");
        Ok(())
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
