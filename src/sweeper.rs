use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::engine::Engine;

/// Periodically recompute every room's status so occupancy follows the
/// clock even when no booking changes.
pub async fn run_reconciler(engine: Arc<Engine>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        match engine.reconcile_all().await {
            Ok(0) => {}
            Ok(changed) => info!("reconciled status of {changed} room(s)"),
            Err(e) => tracing::error!("reconcile sweep failed: {e}"),
        }
    }
}

/// Compact the WAL once it has grown by `threshold` appends.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(30));
    loop {
        interval.tick().await;
        compact_if_due(&engine, threshold).await;
    }
}

/// Returns whether a compaction ran.
async fn compact_if_due(engine: &Engine, threshold: u64) -> bool {
    let appends = engine.wal_appends_since_compact().await;
    if appends < threshold {
        return false;
    }
    match engine.compact_wal().await {
        Ok(()) => {
            info!("compacted WAL after {appends} appends");
            true
        }
        Err(e) => {
            tracing::error!("WAL compaction failed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use std::path::PathBuf;

    fn test_wal_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("innkeep_test_sweeper");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    fn room(number: &str) -> NewRoom {
        NewRoom {
            number: number.into(),
            kind: RoomType::Single,
            price: 1500.0,
            status: RoomStatus::Available,
        }
    }

    #[tokio::test]
    async fn compacts_only_past_threshold() {
        let engine = Engine::new(test_wal_path("compact_threshold.wal")).unwrap();
        engine.create_room(room("101")).await.unwrap();
        engine.create_room(room("102")).await.unwrap();

        assert!(!compact_if_due(&engine, 3).await);
        engine.create_room(room("103")).await.unwrap();
        assert!(compact_if_due(&engine, 3).await);
        assert_eq!(engine.wal_appends_since_compact().await, 0);
    }

    #[tokio::test]
    async fn reconciler_releases_room_when_stay_ends() {
        let engine = Arc::new(Engine::new(test_wal_path("reconciler.wal")).unwrap());
        let created = engine.create_room(room("101")).await.unwrap();
        let guest = engine
            .create_guest(NewGuest {
                name: "Alice".into(),
                email: "alice@example.com".into(),
                phone: None,
                room_id: None,
            })
            .await
            .unwrap();
        let now = crate::engine::now_ms();
        engine
            .create_booking(NewBooking {
                guest_id: guest.id,
                room_id: created.id,
                check_in: now - 3_600_000,
                check_out: now + 300,
                status: BookingStatus::Confirmed,
            })
            .await
            .unwrap();
        assert_eq!(
            engine.get_room(created.id).await.unwrap().status,
            RoomStatus::Occupied
        );

        let task = tokio::spawn(run_reconciler(engine.clone(), Duration::from_millis(10)));
        let mut status = RoomStatus::Occupied;
        for _ in 0..200 {
            status = engine.get_room(created.id).await.unwrap().status;
            if status == RoomStatus::Available {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        task.abort();
        assert_eq!(status, RoomStatus::Available);
    }
}
