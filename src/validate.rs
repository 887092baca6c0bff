//! Request body validation.
//!
//! Each request shape is a static [`Schema`]: a list of typed field rules
//! checked by the one generic [`validate`] function before the body is
//! deserialized into its request type.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use ulid::Ulid;

use crate::limits::*;
use crate::model::{BookingStatus, Ms, RoomStatus, RoomType};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text { min_len: usize, max_len: usize },
    Email,
    Number { min: Option<f64>, max: Option<f64> },
    OneOf(&'static [&'static str]),
    /// RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD`, or unix milliseconds.
    Timestamp,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRule {
    pub name: &'static str,
    pub required: bool,
    pub nullable: bool,
    pub kind: FieldKind,
}

impl FieldRule {
    const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            required: true,
            nullable: false,
            kind,
        }
    }

    const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            required: false,
            nullable: false,
            kind,
        }
    }

    const fn nullable(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            required: false,
            nullable: true,
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldRule],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Required fields must be present.
    Create,
    /// Every field is optional; only supplied ones are checked.
    Patch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ValidationError {}

pub static ROOM: Schema = Schema {
    name: "room",
    fields: &[
        FieldRule::required(
            "number",
            FieldKind::Text {
                min_len: 1,
                max_len: MAX_ROOM_NUMBER_LEN,
            },
        ),
        FieldRule::optional("type", FieldKind::OneOf(RoomType::NAMES)),
        FieldRule::required(
            "price",
            FieldKind::Number {
                min: Some(0.0),
                max: Some(MAX_ROOM_PRICE),
            },
        ),
        FieldRule::optional("status", FieldKind::OneOf(RoomStatus::NAMES)),
    ],
};

pub static GUEST: Schema = Schema {
    name: "guest",
    fields: &[
        FieldRule::required(
            "name",
            FieldKind::Text {
                min_len: MIN_GUEST_NAME_LEN,
                max_len: MAX_GUEST_NAME_LEN,
            },
        ),
        FieldRule::required("email", FieldKind::Email),
        FieldRule::nullable(
            "phone",
            FieldKind::Text {
                min_len: 0,
                max_len: MAX_PHONE_LEN,
            },
        ),
        FieldRule::nullable("room", FieldKind::Id),
    ],
};

pub static BOOKING: Schema = Schema {
    name: "booking",
    fields: &[
        FieldRule::required("guestId", FieldKind::Id),
        FieldRule::required("roomId", FieldKind::Id),
        FieldRule::required("checkIn", FieldKind::Timestamp),
        FieldRule::required("checkOut", FieldKind::Timestamp),
        FieldRule::optional("status", FieldKind::OneOf(BookingStatus::NAMES)),
    ],
};

/// Bookings can only move in time or change status; guest and room are fixed.
pub static BOOKING_PATCH: Schema = Schema {
    name: "booking",
    fields: &[
        FieldRule::optional("checkIn", FieldKind::Timestamp),
        FieldRule::optional("checkOut", FieldKind::Timestamp),
        FieldRule::optional("status", FieldKind::OneOf(BookingStatus::NAMES)),
    ],
};

/// Check `body` against `schema`. The first failing field wins.
pub fn validate(schema: &Schema, body: &Value, mode: Mode) -> Result<(), ValidationError> {
    let Value::Object(obj) = body else {
        return Err(ValidationError(format!("{} must be a JSON object", schema.name)));
    };
    if let Some(unknown) = obj
        .keys()
        .find(|k| !schema.fields.iter().any(|f| f.name == k.as_str()))
    {
        return Err(ValidationError(format!("\"{unknown}\" is not allowed")));
    }
    for rule in schema.fields {
        check_field(rule, obj, mode)?;
    }
    Ok(())
}

fn check_field(rule: &FieldRule, obj: &Map<String, Value>, mode: Mode) -> Result<(), ValidationError> {
    let name = rule.name;
    let value = match obj.get(name) {
        None => {
            if rule.required && mode == Mode::Create {
                return Err(ValidationError(format!("\"{name}\" is required")));
            }
            return Ok(());
        }
        Some(Value::Null) if rule.nullable => return Ok(()),
        Some(Value::Null) => {
            return Err(ValidationError(format!("\"{name}\" must not be null")));
        }
        Some(v) => v,
    };

    match rule.kind {
        FieldKind::Text { min_len, max_len } => {
            let s = expect_str(name, value)?;
            let len = s.trim().chars().count();
            if len < min_len {
                return Err(if min_len <= 1 {
                    ValidationError(format!("\"{name}\" is not allowed to be empty"))
                } else {
                    ValidationError(format!(
                        "\"{name}\" length must be at least {min_len} characters long"
                    ))
                });
            }
            if len > max_len {
                return Err(ValidationError(format!(
                    "\"{name}\" length must be at most {max_len} characters long"
                )));
            }
        }
        FieldKind::Email => {
            let s = expect_str(name, value)?;
            if s.len() > MAX_EMAIL_LEN || !is_valid_email(s) {
                return Err(ValidationError(format!("\"{name}\" must be a valid email")));
            }
        }
        FieldKind::Number { min, max } => {
            let n = value
                .as_f64()
                .ok_or_else(|| ValidationError(format!("\"{name}\" must be a number")))?;
            if let Some(min) = min
                && n < min
            {
                return Err(ValidationError(format!(
                    "\"{name}\" must be greater than or equal to {min}"
                )));
            }
            if let Some(max) = max
                && n > max
            {
                return Err(ValidationError(format!(
                    "\"{name}\" must be less than or equal to {max}"
                )));
            }
        }
        FieldKind::OneOf(allowed) => {
            let s = expect_str(name, value)?;
            if !allowed.contains(&s) {
                return Err(ValidationError(format!(
                    "\"{name}\" must be one of [{}]",
                    allowed.join(", ")
                )));
            }
        }
        FieldKind::Timestamp => {
            if timestamp_value(value).is_none() {
                return Err(ValidationError(format!("\"{name}\" must be a valid date")));
            }
        }
        FieldKind::Id => {
            let s = expect_str(name, value)?;
            if Ulid::from_string(s).is_err() {
                return Err(ValidationError(format!("\"{name}\" must be a valid id")));
            }
        }
    }
    Ok(())
}

fn expect_str<'a>(name: &str, value: &'a Value) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| ValidationError(format!("\"{name}\" must be a string")))
}

/// Parse a JSON date: a string in one of the accepted formats, or integer unix ms.
pub fn timestamp_value(value: &Value) -> Option<Ms> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

/// Parse RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` (UTC), or a bare
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<Ms> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = s.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }
    domain.split('.').count() >= 2 && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn err(schema: &Schema, body: Value, mode: Mode) -> String {
        validate(schema, &body, mode).unwrap_err().0
    }

    #[test]
    fn room_requires_number_and_price() {
        assert!(validate(&ROOM, &json!({"number": "101", "price": 1500}), Mode::Create).is_ok());
        assert_eq!(
            err(&ROOM, json!({"price": 1500}), Mode::Create),
            "\"number\" is required"
        );
        assert_eq!(
            err(&ROOM, json!({"number": "101"}), Mode::Create),
            "\"price\" is required"
        );
    }

    #[test]
    fn room_rejects_negative_price_and_bad_enum() {
        assert!(err(&ROOM, json!({"number": "1", "price": -1}), Mode::Create)
            .contains("greater than or equal to 0"));
        assert!(
            err(&ROOM, json!({"number": "1", "price": 1, "type": "penthouse"}), Mode::Create)
                .contains("must be one of [single, double, suite]")
        );
        assert!(err(&ROOM, json!({"number": "1", "price": "cheap"}), Mode::Create)
            .contains("must be a number"));
    }

    #[test]
    fn patch_mode_skips_required() {
        assert!(validate(&ROOM, &json!({"status": "unavailable"}), Mode::Patch).is_ok());
        assert!(validate(&ROOM, &json!({}), Mode::Patch).is_ok());
        assert!(validate(&ROOM, &json!({"price": -5}), Mode::Patch).is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        assert_eq!(
            err(&ROOM, json!({"number": "1", "price": 1, "floor": 3}), Mode::Create),
            "\"floor\" is not allowed"
        );
        assert!(validate(&BOOKING_PATCH, &json!({"roomId": Ulid::new().to_string()}), Mode::Patch)
            .is_err());
    }

    #[test]
    fn body_must_be_object() {
        assert!(validate(&GUEST, &json!([1, 2]), Mode::Create).is_err());
        assert!(validate(&GUEST, &json!("alice"), Mode::Create).is_err());
    }

    #[test]
    fn guest_rules() {
        assert!(
            validate(
                &GUEST,
                &json!({"name": "Alice", "email": "alice@example.com", "phone": null}),
                Mode::Create
            )
            .is_ok()
        );
        assert!(err(&GUEST, json!({"name": "A", "email": "a@example.com"}), Mode::Create)
            .contains("at least 2"));
        assert!(err(&GUEST, json!({"name": "Al", "email": "nope"}), Mode::Create)
            .contains("valid email"));
        assert!(
            err(&GUEST, json!({"name": "Al", "email": "a@b.co", "room": "xyz"}), Mode::Create)
                .contains("valid id")
        );
    }

    #[test]
    fn booking_dates_must_parse() {
        let ids = (Ulid::new().to_string(), Ulid::new().to_string());
        assert!(
            validate(
                &BOOKING,
                &json!({"guestId": ids.0, "roomId": ids.1, "checkIn": "2025-01-01", "checkOut": "2025-01-03"}),
                Mode::Create
            )
            .is_ok()
        );
        assert!(
            err(
                &BOOKING,
                json!({"guestId": ids.0, "roomId": ids.1, "checkIn": "soon", "checkOut": "2025-01-03"}),
                Mode::Create
            )
            .contains("\"checkIn\" must be a valid date")
        );
    }

    #[test]
    fn timestamp_formats() {
        let day = parse_timestamp("2025-03-01").unwrap();
        assert_eq!(parse_timestamp("2025-03-01T00:00:00Z"), Some(day));
        assert_eq!(parse_timestamp("2025-03-01T00:00:00"), Some(day));
        assert_eq!(parse_timestamp("2025-03-01T08:00:00+08:00"), Some(day));
        assert_eq!(parse_timestamp("2025-03-01T12:00:00.500Z"), Some(day + 12 * 3_600_000 + 500));
        assert_eq!(timestamp_value(&json!(day)), Some(day));
        assert!(parse_timestamp("03/01/2025").is_none());
        assert!(timestamp_value(&json!(true)).is_none());
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@@example.com"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@example..com"));
    }
}
