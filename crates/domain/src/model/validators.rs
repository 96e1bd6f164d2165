//! Field rules shared by the forms. Each helper records its failure on the
//! passed [`ValidationError`] instead of returning early so one form run
//! reports every bad field.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{FieldErrorKind, ValidationError};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("email regex is valid")
});

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username regex is valid"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

/// Trims the value and treats an empty result as absent
pub fn blank_to_none(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

pub fn max_length(errors: &mut ValidationError, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            FieldErrorKind::Invalid,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}

/// Required, trimmed, length limited text. Returns the trimmed value.
pub fn required_text(errors: &mut ValidationError, field: &str, value: &str, max: usize) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, FieldErrorKind::Required, "This field is required.");
    } else {
        max_length(errors, field, value, max);
    }
    value.to_owned()
}

pub fn non_negative_count(errors: &mut ValidationError, field: &str, value: i64) -> u32 {
    match u32::try_from(value) {
        Ok(v) => v,
        Err(_) if value < 0 => {
            errors.add(
                field,
                FieldErrorKind::Invalid,
                "Ensure this value is greater than or equal to 0.",
            );
            0
        }
        Err(_) => {
            errors.add(field, FieldErrorKind::Invalid, format!("Ensure this value is at most {}.", u32::MAX));
            0
        }
    }
}

pub fn non_negative_decimal(errors: &mut ValidationError, field: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        errors.add(
            field,
            FieldErrorKind::Invalid,
            "Ensure this value is greater than or equal to 0.",
        );
    }
}
