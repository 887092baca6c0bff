use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::EngineError;

pub(crate) fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as Ms)
        .unwrap_or(0)
}

/// Build the stay span, rejecting inverted, empty, or out-of-range stays.
pub(crate) fn stay_span(check_in: Ms, check_out: Ms) -> Result<Span, EngineError> {
    if check_in >= check_out {
        return Err(EngineError::InvalidRange { check_in, check_out });
    }
    if check_in < MIN_VALID_TIMESTAMP_MS || check_out > MAX_VALID_TIMESTAMP_MS {
        return Err(EngineError::LimitExceeded("timestamp out of range"));
    }
    let span = Span::new(check_in, check_out);
    if span.duration_ms() > MAX_STAY_MS {
        return Err(EngineError::LimitExceeded("stay too long"));
    }
    Ok(span)
}

/// Query span for availability searches: ordered, but without a stay-length cap.
pub(crate) fn query_span(check_in: Ms, check_out: Ms) -> Result<Span, EngineError> {
    if check_in >= check_out {
        return Err(EngineError::InvalidRange { check_in, check_out });
    }
    Ok(Span::new(check_in, check_out))
}

/// Fail with the first active booking (other than `exclude`) overlapping `span`.
pub(crate) fn check_no_overlap(
    rs: &RoomState,
    span: &Span,
    exclude: Option<Ulid>,
) -> Result<(), EngineError> {
    match rs.active_overlapping(span, exclude).next() {
        Some(existing) => {
            metrics::counter!(crate::observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            Err(EngineError::Overlap(existing.id))
        }
        None => Ok(()),
    }
}
