//! A type for Atom date constructs.
//!
//! This module uses [`time`] under the hood.

use std::{fmt, time::SystemTime};

use thiserror::Error;
pub use time::Month;
use time::{
    macros::{format_description, time},
    Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
};

/// A date and time with an offset.
///
/// Comparisons are made on the instant, so `12:00:00Z` equals
/// `08:00:00-04:00`. The offset is kept for output.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct DateTime(OffsetDateTime);

impl DateTime {
    /// Create an UTC date from the year, month, day, hour, minute, second, and
    /// nanosecond components.
    ///
    /// Nanoseconds are truncated to microseconds.
    pub fn new(
        year: i32,
        month: Month,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        nanosecond: u32,
    ) -> Result<Self, DateTimeError> {
        Ok(Self::from(OffsetDateTime::new_utc(
            Date::from_calendar_date(year, month, day)?,
            Time::from_hms_nano(hour, minute, second, nanosecond)?,
        )))
    }

    /// The current time, truncated to microseconds.
    pub fn now() -> Self {
        Self::from(OffsetDateTime::now_utc())
    }

    /// Parse a date string.
    ///
    /// Accepts RFC 3339 / ISO 8601 timestamps, `yyyy-mm-dd hh:mm[:ss]`,
    /// `yyyy-mm-dd` and RFC 2822 dates. Dates without an offset are UTC.
    pub fn parse(input: &str) -> Result<Self, DateTimeError> {
        use time::format_description::well_known::{Iso8601, Rfc2822, Rfc3339};

        let input = input.trim();

        let dt = OffsetDateTime::parse(input, &Rfc3339)
            .or_else(|_| OffsetDateTime::parse(input, &Iso8601::DEFAULT))
            .or_else(|_| {
                PrimitiveDateTime::parse(
                    input,
                    format_description!("[year]-[month]-[day] [hour]:[minute][optional [:[second]]]"),
                )
                .map(|dt| dt.assume_utc())
            })
            .or_else(|_| {
                PrimitiveDateTime::parse(
                    input,
                    format_description!("[year]-[month]-[day]T[hour]:[minute][optional [:[second]]]"),
                )
                .map(|dt| dt.assume_utc())
            })
            .or_else(|_| {
                Date::parse(input, format_description!("[year]-[month]-[day]"))
                    .map(|d| d.with_time(time!(0:00)).assume_utc())
            })
            .or_else(|_| OffsetDateTime::parse(input, &Rfc2822))
            .map_err(|_| DateTimeError::Parse(input.to_owned()))?;

        Ok(Self::from(dt))
    }

    /// Return the inner [`OffsetDateTime`].
    pub fn as_offset_date_time(&self) -> &OffsetDateTime {
        &self.0
    }

    /// Return the offset of the date.
    pub fn offset(&self) -> UtcOffset {
        self.0.offset()
    }

    /// Format as an HTTP date (RFC 7231 `IMF-fixdate`).
    pub fn to_http_date(&self) -> String {
        let utc = self.0.to_offset(UtcOffset::UTC);
        utc.format(format_description!(
            "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
        ))
        .unwrap_or_default()
    }
}

impl fmt::Display for DateTime {
    /// Write `YYYY-MM-DDTHH:MM:SS[.ffffff](Z|±HH:MM)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self
            .0
            .format(format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second]"
            ))
            .map_err(|_| fmt::Error)?;
        f.write_str(&s)?;

        let microsecond = self.0.microsecond();
        if microsecond != 0 {
            write!(f, ".{microsecond:06}")?;
        }

        let offset = self.0.offset();
        if offset.is_utc() {
            f.write_str("Z")
        } else {
            let s = offset
                .format(format_description!(
                    "[offset_hour sign:mandatory]:[offset_minute]"
                ))
                .map_err(|_| fmt::Error)?;
            f.write_str(&s)
        }
    }
}

impl From<SystemTime> for DateTime {
    fn from(value: SystemTime) -> Self {
        Self::from(OffsetDateTime::from(value))
    }
}

impl From<OffsetDateTime> for DateTime {
    /// Keep microsecond precision, the finest one written out.
    fn from(value: OffsetDateTime) -> Self {
        let nanosecond = value.nanosecond() - value.nanosecond() % 1_000;
        Self(value.replace_nanosecond(nanosecond).unwrap_or(value))
    }
}

impl std::str::FromStr for DateTime {
    type Err = DateTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Date error.
#[derive(Debug, Error)]
pub enum DateTimeError {
    /// Component out of range error.
    #[error(transparent)]
    ComponentRange(#[from] time::error::ComponentRange),
    /// Parse error.
    #[error("failed to parse date and time {0:?}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::{DateTime, Month};

    #[test]
    fn parse() {
        // yyyy-mm-dd hh:mm:ss
        assert_eq!(
            DateTime::new(1985, Month::April, 12, 23, 20, 50, 0).unwrap(),
            DateTime::parse("1985-04-12 23:20:50").unwrap()
        );

        // yyyy-mm-dd hh:mm
        assert_eq!(
            DateTime::new(1985, Month::April, 12, 23, 20, 0, 0).unwrap(),
            DateTime::parse("1985-04-12 23:20").unwrap()
        );

        // yyyy-mm-dd
        assert_eq!(
            DateTime::new(1990, Month::April, 7, 0, 0, 0, 0).unwrap(),
            DateTime::parse("1990-04-07").unwrap()
        );

        // RFC 3339 with offset
        assert_eq!(
            DateTime::new(2003, Month::December, 13, 12, 29, 29, 0).unwrap(),
            DateTime::parse("2003-12-13T08:29:29-04:00").unwrap()
        );

        // RFC 3339
        assert_eq!(
            DateTime::new(1985, Month::April, 12, 23, 20, 50, 520_000_000).unwrap(),
            DateTime::parse("1985-04-12T23:20:50.52Z").unwrap()
        );

        // RFC 2822
        assert_eq!(
            DateTime::new(1993, Month::June, 12, 13, 25, 19, 0).unwrap(),
            DateTime::parse("Sat, 12 Jun 1993 13:25:19 GMT").unwrap()
        );

        assert!(DateTime::parse("yesterday").is_err());
    }

    #[test]
    fn to_string() {
        const CASES: [(&str, &str); 4] = [
            ("2005-07-31T12:29:29Z", "2005-07-31T12:29:29Z"),
            ("2003-12-13T08:29:29-04:00", "2003-12-13T08:29:29-04:00"),
            ("1985-04-12T23:20:50.52Z", "1985-04-12T23:20:50.520000Z"),
            ("1990-04-07", "1990-04-07T00:00:00Z"),
        ];

        for (input, expected) in CASES {
            let result = DateTime::parse(input).unwrap().to_string();
            assert_eq!(result, expected, "\nformatting {input:?}");
        }
    }

    #[test]
    fn now_round_trips() {
        let now = DateTime::now();
        assert_eq!(DateTime::parse(&now.to_string()).unwrap(), now);
    }

    #[test]
    fn truncate_to_microseconds() {
        let date = DateTime::new(1985, Month::April, 12, 23, 20, 50, 123_456_789).unwrap();
        assert_eq!(date.to_string(), "1985-04-12T23:20:50.123456Z");
        assert_eq!(DateTime::parse(&date.to_string()).unwrap(), date);
        assert_eq!(
            DateTime::parse("1985-04-12T23:20:50.123456789Z").unwrap(),
            date
        );
    }

    #[test]
    fn http_date() {
        assert_eq!(
            DateTime::parse("1994-11-06T08:49:37Z")
                .unwrap()
                .to_http_date(),
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );
    }
}
