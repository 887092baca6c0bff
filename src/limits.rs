//! Hard limits on input sizes and store growth.

use crate::model::Ms;

pub const MAX_ROOMS: usize = 100_000;
pub const MAX_GUESTS: usize = 1_000_000;
pub const MAX_BOOKINGS_PER_ROOM: usize = 100_000;

/// Rooms accepted by one bulk create.
pub const MAX_BATCH_SIZE: usize = 1_000;

/// Largest WAL payload. A full room batch encodes to well under 1 MiB.
pub const MAX_WAL_FRAME_LEN: u32 = 16 * 1024 * 1024;

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;

pub const MAX_ROOM_NUMBER_LEN: usize = 32;
pub const MIN_GUEST_NAME_LEN: usize = 2;
pub const MAX_GUEST_NAME_LEN: usize = 256;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_PHONE_LEN: usize = 32;
pub const MAX_SEARCH_LEN: usize = 64;

pub const MAX_ROOM_PRICE: f64 = 1_000_000_000.0;

/// 1970-01-01T00:00:00Z
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;
/// 2100-01-01T00:00:00Z
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;

/// Longest single stay: 366 days.
pub const MAX_STAY_MS: Ms = 366 * 24 * 3_600_000;
