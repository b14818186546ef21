//! Request field validation.

use chrono::{NaiveDate, NaiveTime};

use super::error::{AppError, FieldError};

/// Collects field errors so one response can report all of them.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &'static str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(FieldError {
                field,
                message: message.into(),
            });
        }
        self
    }

    pub fn non_empty(&mut self, field: &'static str, value: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "must not be empty")
    }

    pub fn range(&mut self, field: &'static str, value: i32, min: i32, max: i32) -> &mut Self {
        self.check(
            (min..=max).contains(&value),
            field,
            format!("must be between {min} and {max}"),
        )
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

/// 4 to 8 ASCII digits.
pub fn is_valid_pin(pin: &str) -> bool {
    (4..=8).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit())
}

/// `#rrggbb`.
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// Parse a 24h `HH:MM` clock time.
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    if value.len() != 5 {
        return None;
    }
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Trim and drop empty optional strings.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_format() {
        assert!(is_valid_pin("1234"));
        assert!(is_valid_pin("12345678"));
        assert!(!is_valid_pin("123"));
        assert!(!is_valid_pin("123456789"));
        assert!(!is_valid_pin("12a4"));
        assert!(!is_valid_pin("１２３４"));
    }

    #[test]
    fn colors_and_times() {
        assert!(is_hex_color("#A1b2C3"));
        assert!(!is_hex_color("a1b2c3"));
        assert!(!is_hex_color("#12345"));
        assert_eq!(parse_hhmm("07:30"), NaiveTime::from_hms_opt(7, 30, 0));
        assert!(parse_hhmm("7:30").is_none());
        assert!(parse_hhmm("24:00").is_none());
        assert!(parse_date("2026-02-30").is_none());
    }

    #[test]
    fn validator_reports_every_field() {
        let err = Validator::new()
            .non_empty("name", " ")
            .range("points", -1, 0, 10_000)
            .range("day", 3, 0, 6)
            .finish()
            .unwrap_err();
        match err {
            AppError::Validation(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.field).collect();
                assert_eq!(names, ["name", "points"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
