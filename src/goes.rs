//! Naming conventions of the public GOES archive.

use regex::Regex;

use crate::partition::TimePartition;

pub fn bucket_name(satellite: &str) -> String {
    format!("noaa-goes{satellite}")
}

/// `{product}/{year}/{day:03}/{hour:02}/`. A mis-padded prefix lists nothing.
pub fn key_prefix(product: &str, partition: &TimePartition) -> String {
    format!(
        "{}/{}/{}/{}/",
        product,
        partition.year,
        partition.day_str(),
        partition.hour_str()
    )
}

pub fn band_token(band: &str) -> String {
    format!("C{:0>2}", band)
}

// Wildcarded components render as empty strings, so a year-only filter
// still matches by prefix.
pub fn time_token(
    year: Option<&str>,
    day: Option<&str>,
    hour: Option<&str>,
    minute: Option<&str>,
) -> String {
    format!(
        "_s{}{}{}{}",
        year.unwrap_or(""),
        day.unwrap_or(""),
        hour.unwrap_or(""),
        minute.unwrap_or("")
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTokens {
    pub satellite: String,
    pub product: String,
    /// Raw digits of the `_s` start-time token (`YYYYDDDHHMMSSs`).
    pub start_time: String,
}

impl FileTokens {
    pub fn partition(self: &Self) -> Option<TimePartition> {
        if self.start_time.len() < 11 || !self.start_time.is_ascii() {
            return None;
        }
        let year = self.start_time[0..4].parse().ok()?;
        let day = self.start_time[4..7].parse().ok()?;
        let hour = self.start_time[7..9].parse().ok()?;
        let minute = self.start_time[9..11].parse().ok()?;
        Some(TimePartition::new(year, day, hour).with_minute(minute))
    }
}

/// Decode satellite, product and start time from a filename like
/// `OR_ABI-L2-LSTF-M6_G19_s20250311500204_e20250311509512_c20250311511094.nc`.
/// The mode/band suffix (`-M6C13`) is scan mode, not product name, and is
/// stripped.
pub fn decode_tokens(filename: &str) -> Option<FileTokens> {
    let re = Regex::new(
        r"^OR_(?<product>[0-9A-Za-z-]+?)(?:-M\d+(?:C\d{2})?)?_G(?<satellite>\d{2})_s(?<start>\d{11,})",
    )
    .expect("Regex pattern should always compile");

    let captures = re.captures(filename)?;
    Some(FileTokens {
        satellite: captures["satellite"].to_string(),
        product: captures["product"].to_string(),
        start_time: captures["start"].to_string(),
    })
}

pub fn band_of(filename: &str) -> Option<String> {
    let re = Regex::new(r"C(\d{2})").expect("Regex pattern should always compile");
    re.captures(filename).map(|captures| captures[1].to_string())
}
