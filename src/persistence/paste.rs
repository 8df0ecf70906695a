//! Rows copied back out of the timeline widget after interactive edits.

use crate::entry::ScheduleEntry;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Error)]
pub enum PasteError {
    #[error("payload is not a list of timeline rows: {0}")]
    Json(#[from] serde_json::Error),
    #[error("row {row}: {field} value '{value}' is not an ISO date-time")]
    InvalidInstant {
        row: usize,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteRow {
    #[serde(rename = "Resource")]
    pub resource: String,
    #[serde(rename = "Start_ISO")]
    pub start_iso: String,
    #[serde(rename = "End_ISO")]
    pub end_iso: String,
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "Color")]
    pub color: String,
}

impl PasteRow {
    pub fn from_entry(entry: &ScheduleEntry) -> Self {
        Self {
            resource: entry.resource.clone(),
            start_iso: entry.start.format(ISO_FORMAT).to_string(),
            end_iso: entry.end.format(ISO_FORMAT).to_string(),
            label: entry.label.clone(),
            color: entry.color.clone(),
        }
    }

    fn into_entry(self, row: usize) -> Result<ScheduleEntry, PasteError> {
        let start = parse_iso_instant(&self.start_iso).ok_or_else(|| PasteError::InvalidInstant {
            row,
            field: "Start_ISO",
            value: self.start_iso.clone(),
        })?;
        let end = parse_iso_instant(&self.end_iso).ok_or_else(|| PasteError::InvalidInstant {
            row,
            field: "End_ISO",
            value: self.end_iso.clone(),
        })?;
        Ok(ScheduleEntry::new(
            self.resource,
            start,
            end,
            self.label,
            self.color,
        ))
    }
}

/// Parse an ISO-8601 date-time. Offsets are dropped and the wall-clock time
/// is kept.
pub fn parse_iso_instant(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(input) {
        return Some(with_offset.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Parse a whole payload; one bad row rejects all of it.
pub fn parse_paste_payload(payload: &str) -> Result<Vec<ScheduleEntry>, PasteError> {
    let rows: Vec<PasteRow> = serde_json::from_str(payload)?;
    rows.into_iter()
        .enumerate()
        .map(|(row, paste_row)| paste_row.into_entry(row))
        .collect()
}

/// The payload the timeline widget would emit for `entries`.
pub fn to_paste_payload(entries: &[ScheduleEntry]) -> serde_json::Result<String> {
    let rows: Vec<PasteRow> = entries.iter().map(PasteRow::from_entry).collect();
    serde_json::to_string(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, ISO_FORMAT).unwrap()
    }

    #[test]
    fn parses_local_and_offset_instants() {
        assert_eq!(
            parse_iso_instant("2024-01-02T05:40:00"),
            Some(dt("2024-01-02T05:40:00"))
        );
        assert_eq!(
            parse_iso_instant("2024-01-02T05:40:00.000Z"),
            Some(dt("2024-01-02T05:40:00"))
        );
        assert_eq!(
            parse_iso_instant("2024-01-02T05:40:00+09:00"),
            Some(dt("2024-01-02T05:40:00"))
        );
        assert_eq!(
            parse_iso_instant("2024-01-02 05:40"),
            Some(dt("2024-01-02T05:40:00"))
        );
        assert_eq!(parse_iso_instant("yesterday"), None);
    }

    #[test]
    fn bad_row_is_reported_with_its_index() {
        let payload = r##"[
            {"Resource":"#1","Start_ISO":"2024-01-01T10:00:00","End_ISO":"2024-01-01T12:00:00","Label":"LAX","Color":"#FFB6C1"},
            {"Resource":"#2","Start_ISO":"2024-01-01T10:00:00","End_ISO":"later","Label":"EWR","Color":"#ADD8E6"}
        ]"##;
        match parse_paste_payload(payload) {
            Err(PasteError::InvalidInstant { row, field, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(field, "End_ISO");
            }
            other => panic!("expected invalid instant, got {other:?}"),
        }
    }
}
