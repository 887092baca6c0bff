use ulid::Ulid;

use crate::model::Ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Room,
    Guest,
    Booking,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Room => f.write_str("room"),
            Entity::Guest => f.write_str("guest"),
            Entity::Booking => f.write_str("booking"),
        }
    }
}

#[derive(Debug)]
pub enum EngineError {
    NotFound(Entity, Ulid),
    InvalidRange { check_in: Ms, check_out: Ms },
    /// Another active booking on the room overlaps the requested stay.
    Overlap(Ulid),
    DuplicateNumbers(Vec<String>),
    DuplicateEmail(String),
    Validation(String),
    LimitExceeded(&'static str),
    WalError(String),
}

impl EngineError {
    /// Uniqueness and non-overlap violations.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            EngineError::Overlap(_) | EngineError::DuplicateNumbers(_) | EngineError::DuplicateEmail(_)
        )
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(entity, id) => write!(f, "{entity} not found: {id}"),
            EngineError::InvalidRange { check_in, check_out } => write!(
                f,
                "checkOut must be after checkIn (checkIn={check_in}, checkOut={check_out})"
            ),
            EngineError::Overlap(id) => {
                write!(f, "room is already booked for that date range (booking {id})")
            }
            EngineError::DuplicateNumbers(numbers) => {
                write!(f, "room numbers already exist: {}", numbers.join(", "))
            }
            EngineError::DuplicateEmail(email) => {
                write!(f, "guest with email {email} already exists")
            }
            EngineError::Validation(msg) => write!(f, "{msg}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
