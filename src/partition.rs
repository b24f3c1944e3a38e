use std::fmt;

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};

use crate::error::SyncError;

pub const WINDOW_FORMAT: &str = "%Y-%m-%d_%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePartition {
    pub year: i32,
    pub day_of_year: u32,
    pub hour: u32,
    /// Narrows the listing within the hour; does not change the prefix.
    pub minute: Option<u32>,
}

impl TimePartition {
    pub fn new(year: i32, day_of_year: u32, hour: u32) -> Self {
        Self {
            year,
            day_of_year,
            hour,
            minute: None,
        }
    }

    pub fn with_minute(mut self, minute: u32) -> Self {
        self.minute = Some(minute);
        self
    }

    pub fn from_datetime(datetime: &NaiveDateTime) -> Self {
        Self::new(datetime.year(), datetime.ordinal(), datetime.hour())
    }

    pub fn day_str(self: &Self) -> String {
        format!("{:0>3}", self.day_of_year)
    }

    pub fn hour_str(self: &Self) -> String {
        format!("{:0>2}", self.hour)
    }

    pub fn minute_str(self: &Self) -> Option<String> {
        self.minute.map(|minute| format!("{:0>2}", minute))
    }
}

impl fmt::Display for TimePartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.year, self.day_str(), self.hour_str())
    }
}

#[derive(Debug, Clone)]
pub enum TimeWindow {
    Single(TimePartition),
    Range {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

impl TimeWindow {
    pub fn parse_range(start: &str, end: &str) -> Result<Self, SyncError> {
        Ok(Self::Range {
            start: parse_instant(start)?,
            end: parse_instant(end)?,
        })
    }

    /// Hour partitions to scan, in increasing order, endpoints inclusive.
    /// An inverted range expands to nothing; callers treat that as a no-op.
    pub fn expand(self: &Self) -> Vec<TimePartition> {
        match self {
            Self::Single(partition) => vec![*partition],
            Self::Range { start, end } => {
                let mut partitions = Vec::new();
                let mut current = *start;
                while current <= *end {
                    partitions.push(TimePartition::from_datetime(&current));
                    current = current + Duration::hours(1);
                }
                partitions
            }
        }
    }
}

pub fn parse_instant(text: &str) -> Result<NaiveDateTime, SyncError> {
    NaiveDateTime::parse_from_str(text, WINDOW_FORMAT)
        .map_err(|err| SyncError::Window(format!("{text}: {err}")))
}
