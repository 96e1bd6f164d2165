use std::{fmt, str::FromStr};

use rusqlite::{
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
    ToSql,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const HEIGHT_FORMAT_MESSAGE: &str = "Enter height in the format 5'4\" or 5'4";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{HEIGHT_FORMAT_MESSAGE} (got {input:?})")]
pub struct HeightFormatError {
    pub input: String,
}

/// A height persisted as a whole number of inches. Parsed from `F'I` or
/// `F'I"`, displayed as `F'I"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Height(u32);

impl Height {
    pub const fn from_inches(inches: u32) -> Self {
        Self(inches)
    }

    pub const fn inches(&self) -> u32 {
        self.0
    }

    pub const fn feet_and_inches(&self) -> (u32, u32) {
        (self.0 / 12, self.0 % 12)
    }
}

impl FromStr for Height {
    type Err = HeightFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || HeightFormatError { input: s.to_owned() };

        let mut parts = s.split('\'');
        let (feet, inches) = match (parts.next(), parts.next(), parts.next()) {
            (Some(feet), Some(inches), None) => (feet, inches),
            _ => return Err(err()),
        };

        let inches = inches.trim();
        let inches = inches.strip_suffix('"').unwrap_or(inches);

        let feet: u32 = feet.trim().parse().map_err(|_| err())?;
        let inches: u32 = inches.trim().parse().map_err(|_| err())?;

        feet.checked_mul(12)
            .and_then(|f| f.checked_add(inches))
            .map(Height)
            .ok_or_else(err)
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (feet, inches) = self.feet_and_inches();
        write!(f, "{feet}'{inches}\"")
    }
}

impl From<Height> for sea_query::Value {
    fn from(value: Height) -> Self {
        value.0.into()
    }
}

impl ToSql for Height {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Height {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let inches = value.as_i64()?;
        u32::try_from(inches)
            .map(Height)
            .map_err(|_| FromSqlError::OutOfRange(inches))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_with_and_without_quote() {
        assert_eq!("5'4\"".parse::<Height>().unwrap().inches(), 64);
        assert_eq!("5'4".parse::<Height>().unwrap().inches(), 64);
        assert_eq!("6'0\"".parse::<Height>().unwrap().inches(), 72);
        assert_eq!("0'0".parse::<Height>().unwrap().inches(), 0);
    }

    #[test]
    fn test_parse_strips_whitespace() {
        assert_eq!(" 5 ' 11 \"".parse::<Height>().unwrap().inches(), 71);
        assert_eq!("5' 4\" ".parse::<Height>().unwrap().inches(), 64);
    }

    #[test]
    fn test_feet_times_twelve_plus_inches() {
        for feet in 0..9u32 {
            for inches in 0..24u32 {
                let h: Height = format!("{feet}'{inches}\"").parse().unwrap();
                assert_eq!(h.inches(), feet * 12 + inches);
            }
        }
    }

    #[test]
    fn test_parse_failures() {
        for input in ["", "5", "54\"", "five'4", "5'four", "5'", "'4", "5'4'3", "-5'4", "5'-4", "5'4\"\""] {
            let e = input.parse::<Height>().unwrap_err();
            assert_eq!(e.input, input);
        }
    }

    #[test]
    fn test_overflow_is_format_error() {
        assert!("4294967295'0".parse::<Height>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Height::from_inches(64).to_string(), "5'4\"");
    }
}
