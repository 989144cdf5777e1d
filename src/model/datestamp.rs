use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::cmp::Ordering;
use std::fmt;

const DAY_FORMAT: &str = "%Y-%m-%d";
const SECOND_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Datestamp granularity supported by a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// `YYYY-MM-DD`
    Day,
    /// `YYYY-MM-DDThh:mm:ssZ`
    Second,
}

impl Granularity {
    /// Parses the `granularity` element of an Identify response
    pub fn from_identify(value: &str) -> Option<Self> {
        match value.trim() {
            "YYYY-MM-DD" => Some(Self::Day),
            "YYYY-MM-DDThh:mm:ssZ" => Some(Self::Second),
            _ => None,
        }
    }
}

/// A UTC datestamp as used by OAI-PMH for `from`, `until` and header datestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datestamp {
    Day(NaiveDate),
    Second(NaiveDateTime),
}

impl Datestamp {
    /// Parses a datestamp in either granularity
    ///
    /// Returns `None` for anything else, including fractional seconds and
    /// non-UTC offsets, which the protocol does not allow.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Ok(day) = NaiveDate::parse_from_str(value, DAY_FORMAT) {
            return Some(Self::Day(day));
        }
        NaiveDateTime::parse_from_str(value, SECOND_FORMAT)
            .ok()
            .map(Self::Second)
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Self::Day(_) => Granularity::Day,
            Self::Second(_) => Granularity::Second,
        }
    }

    /// Returns the instant this datestamp denotes (midnight for day granularity)
    pub fn to_utc(&self) -> DateTime<Utc> {
        let naive = match self {
            Self::Day(day) => day.and_hms_opt(0, 0, 0).unwrap_or_default(),
            Self::Second(time) => *time,
        };
        naive.and_utc()
    }
}

impl PartialOrd for Datestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.to_utc().cmp(&other.to_utc()))
    }
}

impl fmt::Display for Datestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day(day) => write!(f, "{}", day.format(DAY_FORMAT)),
            Self::Second(time) => write!(f, "{}", time.format(SECOND_FORMAT)),
        }
    }
}
