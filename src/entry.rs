use crate::cycle::TimeCycle;
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_RESOURCE: &str = "Unassigned";
pub const DEFAULT_LABEL: &str = "Flight";
pub const DEFAULT_COLOR: &str = "#ADD8E6";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("entry {index} requires a non-empty resource")]
    BlankResource { index: usize },
    #[error("entry {index} requires a non-empty color")]
    BlankColor { index: usize },
}

/// One rotation segment on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Lane currently holding the entry. The only field the optimizer rewrites.
    pub resource: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub label: String,
    /// Display color, passed through untouched.
    pub color: String,
}

impl ScheduleEntry {
    pub fn new(
        resource: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        label: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            resource: resource.into(),
            start,
            end,
            label: label.into(),
            color: color.into(),
        }
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }

    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &ScheduleEntry) -> bool {
        !(self.end <= other.start || other.end <= self.start)
    }

    pub fn start_token(&self, cycle: &TimeCycle) -> String {
        cycle.encode(self.start)
    }

    pub fn end_token(&self, cycle: &TimeCycle) -> String {
        cycle.encode(self.end)
    }

    pub fn validate(&self, index: usize) -> Result<(), EntryError> {
        if self.resource.trim().is_empty() {
            return Err(EntryError::BlankResource { index });
        }
        if self.color.trim().is_empty() {
            return Err(EntryError::BlankColor { index });
        }
        Ok(())
    }
}

pub fn validate_entries(entries: &[ScheduleEntry]) -> Result<(), EntryError> {
    entries
        .iter()
        .enumerate()
        .try_for_each(|(idx, entry)| entry.validate(idx))
}

/// Which day tokens of a record fell back to the cycle base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenFallbacks {
    pub start: bool,
    pub end: bool,
}

impl TokenFallbacks {
    pub fn any(&self) -> bool {
        self.start || self.end
    }
}

/// A tabular row as it arrives from an upload, with every column optional.
///
/// Defaults are applied once, in [`EntryRecord::decode`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    #[serde(rename = "Resource", default)]
    pub resource: Option<String>,
    #[serde(rename = "Start_D", default)]
    pub start_d: Option<String>,
    #[serde(rename = "End_D", default)]
    pub end_d: Option<String>,
    #[serde(rename = "Label", default)]
    pub label: Option<String>,
    #[serde(rename = "Color", default)]
    pub color: Option<String>,
}

impl EntryRecord {
    pub fn new(start_d: impl Into<String>, end_d: impl Into<String>) -> Self {
        Self {
            start_d: Some(start_d.into()),
            end_d: Some(end_d.into()),
            ..Self::default()
        }
    }

    pub fn decode(self, cycle: &TimeCycle) -> (ScheduleEntry, TokenFallbacks) {
        let start = cycle.decode(self.start_d.as_deref());
        let end = cycle.decode(self.end_d.as_deref());
        let fallbacks = TokenFallbacks {
            start: start.is_fallback(),
            end: end.is_fallback(),
        };
        let entry = ScheduleEntry {
            resource: non_blank_or(self.resource, DEFAULT_RESOURCE),
            start: start.instant(),
            end: end.instant(),
            label: non_blank_or(self.label, DEFAULT_LABEL),
            color: non_blank_or(self.color, DEFAULT_COLOR),
        };
        (entry, fallbacks)
    }
}

fn non_blank_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// The two overlapping rotations a fresh board starts with.
pub fn sample_entries(cycle: &TimeCycle) -> Vec<ScheduleEntry> {
    [
        ("#1", "D1 1320", "D2 1620", "LAX", "#FFB6C1"),
        ("#2", "D1 2155", "D2 0540", "EWR", "#ADD8E6"),
    ]
    .into_iter()
    .map(|(resource, start, end, label, color)| EntryRecord {
        resource: Some(resource.into()),
        start_d: Some(start.into()),
        end_d: Some(end.into()),
        label: Some(label.into()),
        color: Some(color.into()),
    })
    .map(|record| record.decode(cycle).0)
    .collect()
}
