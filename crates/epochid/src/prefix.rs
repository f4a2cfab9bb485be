//! Epoch prefix rendering.
//!
//! A prefix is derived once per epoch from wall-clock time, either by
//! formatting the time with a [`CalendarPattern`] or by encoding the Unix
//! timestamp (seconds) in the configured radix.

use crate::{ConfigError, Result, is_valid_base, push_radix};
use chrono::{DateTime, Datelike, Timelike, Utc};
use core::fmt::Write;
use core::str::FromStr;

/// A calendar component a pattern must contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

/// Pattern tokens in match order. `YYYY` comes first because it is the only
/// four-character token; the remaining tokens are case sensitive, so `MM`
/// (month) and `mm` (minute) never collide.
const TOKENS: [(&str, Field); 6] = [
    ("YYYY", Field::Year),
    ("MM", Field::Month),
    ("DD", Field::Day),
    ("hh", Field::Hour),
    ("mm", Field::Minute),
    ("ss", Field::Second),
];

impl Field {
    const fn name(self) -> &'static str {
        match self {
            Self::Year => "year (YYYY)",
            Self::Month => "month (MM)",
            Self::Day => "day (DD)",
            Self::Hour => "hour (hh)",
            Self::Minute => "minute (mm)",
            Self::Second => "second (ss)",
        }
    }

    fn write(self, out: &mut String, now: &DateTime<Utc>) {
        // Writing into a `String` cannot fail.
        let _ = match self {
            Self::Year => write!(out, "{:04}", now.year()),
            Self::Month => write!(out, "{:02}", now.month()),
            Self::Day => write!(out, "{:02}", now.day()),
            Self::Hour => write!(out, "{:02}", now.hour()),
            Self::Minute => write!(out, "{:02}", now.minute()),
            Self::Second => write!(out, "{:02}", now.second()),
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// A parsed calendar prefix pattern such as `YYYYMMDDhhmmss-`.
///
/// Recognised tokens are `YYYY`, `MM`, `DD`, `hh`, `mm` and `ss`; every other
/// character is copied literally. A pattern is only accepted when all six
/// tokens appear, in any arrangement, so that two different seconds always
/// render to two different prefixes.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use epochid::CalendarPattern;
///
/// let pattern: CalendarPattern = "YYYYMMDDhhmmss-".parse().unwrap();
/// let now = Utc.with_ymd_and_hms(2018, 2, 22, 23, 23, 32).unwrap();
/// assert_eq!(pattern.render(&now), "20180222232332-");
///
/// assert!("YYYYMMDD".parse::<CalendarPattern>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalendarPattern {
    segments: Vec<Segment>,
}

impl FromStr for CalendarPattern {
    type Err = ConfigError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        let mut rest = pattern;

        while let Some(c) = rest.chars().next() {
            if let Some((token, field)) = TOKENS.iter().find(|(token, _)| rest.starts_with(token))
            {
                segments.push(Segment::Field(*field));
                rest = &rest[token.len()..];
                continue;
            }

            // Merge consecutive literal characters into one segment.
            if let Some(Segment::Literal(lit)) = segments.last_mut() {
                lit.push(c);
            } else {
                segments.push(Segment::Literal(c.to_string()));
            }
            rest = &rest[c.len_utf8()..];
        }

        for (_, field) in TOKENS {
            if !segments.contains(&Segment::Field(field)) {
                return Err(ConfigError::MissingCalendarComponent {
                    pattern: pattern.to_owned(),
                    component: field.name(),
                });
            }
        }

        Ok(Self { segments })
    }
}

impl CalendarPattern {
    /// Formats `now` using this pattern.
    pub fn render(&self, now: &DateTime<Utc>) -> String {
        let mut out = String::with_capacity(32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => out.push_str(lit),
                Segment::Field(field) => field.write(&mut out, now),
            }
        }
        out
    }
}

/// Derives the prefix for each new epoch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrefixEncoder {
    /// Format the epoch's start time with a calendar pattern.
    Calendar(CalendarPattern),
    /// Encode the epoch's Unix timestamp (seconds) in `base`.
    Timestamp { base: u32 },
}

impl PrefixEncoder {
    /// Builds an encoder from a raw pattern and radix.
    ///
    /// An empty `prefix_format` selects [`PrefixEncoder::Timestamp`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BaseOutOfRange`] if `base` is outside `[2, 36]`
    /// and [`ConfigError::MissingCalendarComponent`] if a non-empty pattern
    /// lacks any of the six calendar tokens.
    pub fn new(prefix_format: &str, base: u32) -> Result<Self, ConfigError> {
        if !is_valid_base(base) {
            return Err(ConfigError::BaseOutOfRange { base });
        }

        if prefix_format.is_empty() {
            Ok(Self::Timestamp { base })
        } else {
            prefix_format.parse().map(Self::Calendar)
        }
    }

    /// Renders the prefix for an epoch starting at `now`.
    pub fn render(&self, now: &DateTime<Utc>) -> String {
        match self {
            Self::Calendar(pattern) => pattern.render(now),
            Self::Timestamp { base } => {
                // Pre-1970 clocks are outside the supported range.
                let secs = u64::try_from(now.timestamp()).unwrap_or_default();
                let mut out = String::with_capacity(16);
                push_radix(&mut out, secs, *base);
                out
            }
        }
    }
}
