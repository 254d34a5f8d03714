//! Timestamp helpers shared by batch and live records

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serializer;

/// Wall-clock instant of a sample. Series are naive (UTC) and hourly in batch mode.
pub type Timestamp = NaiveDateTime;

/// Wire format for timestamps; fractional seconds only appear when non-zero.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// `count` hourly timestamps starting at `origin`.
pub fn hourly_timestamps(origin: Timestamp, count: usize) -> Vec<Timestamp> {
    (0..count).map(|i| origin + Duration::hours(i as i64)).collect()
}

/// Midnight, 1 January 2025: the origin of every batch series.
pub fn default_origin() -> Timestamp {
    NaiveDate::from_ymd_opt(2025, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)).unwrap_or_default()
}

pub fn format(timestamp: &Timestamp) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn serialize<S: Serializer>(
    timestamp: &Timestamp,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hourly_timestamps_format() {
        let stamps = hourly_timestamps(default_origin(), 24);
        assert_eq!(stamps.len(), 24);
        assert_eq!(format(&stamps[0]), "2025-01-01 00:00:00");
        assert_eq!(format(&stamps[23]), "2025-01-01 23:00:00");
    }

    #[test]
    fn test_fractional_seconds_are_kept() {
        let ts = default_origin() + Duration::microseconds(1);
        assert_eq!(format(&ts), "2025-01-01 00:00:00.000001");
    }
}
