use crate::cycle::TimeCycle;
use crate::entry::{EntryError, ScheduleEntry, sample_entries, validate_entries};
use crate::lanes::{self, LaneError};
use crate::metadata::BoardMetadata;
use crate::persistence::{PasteError, PersistenceResult, parse_paste_payload};
use crate::resource::LaneRoster;
use crate::timeline::{TimelineView, build_timeline};
use chrono::{NaiveTime, TimeDelta};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub const COPY_SUFFIX: &str = " (Copy)";
pub const FORM_DEFAULT_LABEL: &str = "ICN-LAX";
pub const FORM_DEFAULT_COLOR: &str = "#90EE90";

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("invalid entry form: {0}")]
    InvalidForm(String),
    #[error("entry {0} does not exist")]
    EntryNotFound(usize),
    #[error("lane name must not be blank")]
    BlankLane,
    #[error("invalid metadata: {0}")]
    Metadata(String),
    #[error(transparent)]
    Entry(#[from] EntryError),
    #[error(transparent)]
    Lanes(#[from] LaneError),
    #[error(transparent)]
    Paste(#[from] PasteError),
}

/// Fields of the "add schedule" form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub resource: String,
    #[serde(default = "default_form_label")]
    pub label: String,
    #[serde(default = "default_form_color")]
    pub color: String,
    /// 1-based cycle day, `1..=7`.
    pub day: u32,
    pub departure: NaiveTime,
    #[serde(default = "default_form_hours")]
    pub duration_hours: u32,
    #[serde(default)]
    pub duration_minutes: u32,
}

fn default_form_label() -> String {
    FORM_DEFAULT_LABEL.to_string()
}

fn default_form_color() -> String {
    FORM_DEFAULT_COLOR.to_string()
}

fn default_form_hours() -> u32 {
    10
}

impl NewEntry {
    pub fn new(resource: impl Into<String>, day: u32, departure: NaiveTime) -> Self {
        Self {
            resource: resource.into(),
            label: default_form_label(),
            color: default_form_color(),
            day,
            departure,
            duration_hours: default_form_hours(),
            duration_minutes: 0,
        }
    }

    fn check_ranges(&self) -> Result<(), BoardError> {
        if !(1..=7).contains(&self.day) {
            return Err(BoardError::InvalidForm(format!(
                "day must be between 1 and 7 (got {})",
                self.day
            )));
        }
        if self.duration_hours > 24 {
            return Err(BoardError::InvalidForm(format!(
                "duration hours must be between 0 and 24 (got {})",
                self.duration_hours
            )));
        }
        if self.duration_minutes > 59 {
            return Err(BoardError::InvalidForm(format!(
                "duration minutes must be between 0 and 59 (got {})",
                self.duration_minutes
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeSummary {
    pub entry_count: usize,
    pub lane_count: usize,
    pub peak_overlap: usize,
    pub clamped_count: usize,
    /// Lanes registered beyond the base set.
    pub extra_lanes: Vec<String>,
}

impl OptimizeSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = vec![
            format!("entries={}", self.entry_count),
            format!("lanes={}", self.lane_count),
            format!("peak={}", self.peak_overlap),
        ];
        if self.clamped_count > 0 {
            parts.push(format!("clamped={}", self.clamped_count));
        }
        if !self.extra_lanes.is_empty() {
            parts.push(format!("extra={}", self.extra_lanes.join(",")));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteSummary {
    pub received: usize,
    pub kept: usize,
    /// Resources of rows dropped because their lane is not visible.
    pub dropped_resources: Vec<String>,
}

/// Working state of one rotation board: entries plus lane visibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationBoard {
    metadata: BoardMetadata,
    cycle: TimeCycle,
    entries: Vec<ScheduleEntry>,
    roster: LaneRoster,
}

impl Default for RotationBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl RotationBoard {
    pub fn new() -> Self {
        Self::new_with_metadata(BoardMetadata::default())
    }

    pub fn new_with_metadata(metadata: BoardMetadata) -> Self {
        Self {
            cycle: metadata.cycle(),
            roster: LaneRoster::new(metadata.base_lane_count),
            entries: Vec::new(),
            metadata,
        }
    }

    /// A board holding the two default sample rotations.
    pub fn with_sample_entries(metadata: BoardMetadata) -> Self {
        let mut board = Self::new_with_metadata(metadata);
        board.entries = sample_entries(&board.cycle);
        board
    }

    pub(crate) fn from_parts(
        metadata: BoardMetadata,
        roster: LaneRoster,
        entries: Vec<ScheduleEntry>,
    ) -> PersistenceResult<Self> {
        metadata.validate()?;
        validate_entries(&entries)?;
        let mut roster = roster;
        roster.set_base_lane_count(metadata.base_lane_count);
        Ok(Self {
            cycle: metadata.cycle(),
            metadata,
            entries,
            roster,
        })
    }

    pub fn metadata(&self) -> &BoardMetadata {
        &self.metadata
    }

    pub fn cycle(&self) -> TimeCycle {
        self.cycle
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&ScheduleEntry> {
        self.entries.get(index)
    }

    pub fn roster(&self) -> &LaneRoster {
        &self.roster
    }

    /// Entries keep their absolute instants; only their day tokens move.
    pub fn set_metadata(&mut self, metadata: BoardMetadata) -> Result<(), BoardError> {
        metadata
            .validate()
            .map_err(|err| BoardError::Metadata(err.to_string()))?;
        self.cycle = metadata.cycle();
        self.roster.set_base_lane_count(metadata.base_lane_count);
        self.metadata = metadata;
        Ok(())
    }

    pub fn replace_entries(&mut self, entries: Vec<ScheduleEntry>) -> Result<(), BoardError> {
        validate_entries(&entries)?;
        self.entries = entries;
        Ok(())
    }

    pub fn visible_lanes(&self) -> Vec<String> {
        self.roster.visible_lanes(&self.entries)
    }

    pub fn visible_entries(&self) -> Vec<&ScheduleEntry> {
        let lanes = self.visible_lanes();
        self.entries
            .iter()
            .filter(|entry| lanes.contains(&entry.resource))
            .collect()
    }

    pub fn push_entry(&mut self, entry: ScheduleEntry) -> Result<usize, BoardError> {
        entry.validate(self.entries.len())?;
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    pub fn add_entry(&mut self, form: NewEntry) -> Result<usize, BoardError> {
        form.check_ranges()?;
        if self.roster.deleted().contains(&form.resource) {
            return Err(BoardError::InvalidForm(format!(
                "lane '{}' has been removed",
                form.resource
            )));
        }
        let start = self.cycle.at(form.day, form.departure);
        let duration = TimeDelta::hours(i64::from(form.duration_hours))
            + TimeDelta::minutes(i64::from(form.duration_minutes));
        let entry = ScheduleEntry::new(form.resource, start, start + duration, form.label, form.color);
        self.push_entry(entry)
    }

    pub fn delete_entry(&mut self, index: usize) -> Result<ScheduleEntry, BoardError> {
        if index >= self.entries.len() {
            return Err(BoardError::EntryNotFound(index));
        }
        Ok(self.entries.remove(index))
    }

    /// Append a copy one hour later, labelled as a copy.
    pub fn duplicate_entry(&mut self, index: usize) -> Result<usize, BoardError> {
        let mut copy = self
            .entries
            .get(index)
            .cloned()
            .ok_or(BoardError::EntryNotFound(index))?;
        copy.label.push_str(COPY_SUFFIX);
        copy.start += TimeDelta::hours(1);
        copy.end += TimeDelta::hours(1);
        self.push_entry(copy)
    }

    pub fn add_lane(&mut self, name: &str) -> Result<bool, BoardError> {
        if name.trim().is_empty() {
            return Err(BoardError::BlankLane);
        }
        Ok(self.roster.add_lane(name))
    }

    /// Hide a lane and drop every entry on it. Returns the dropped count.
    pub fn remove_lane(&mut self, name: &str) -> Result<usize, BoardError> {
        if name.trim().is_empty() {
            return Err(BoardError::BlankLane);
        }
        self.roster.remove_lane(name);
        let before = self.entries.len();
        self.entries.retain(|entry| entry.resource != name);
        Ok(before - self.entries.len())
    }

    /// Repack every entry into the fewest lanes and reset lane visibility.
    pub fn optimize(&mut self) -> Result<OptimizeSummary, BoardError> {
        if self.entries.is_empty() {
            return Ok(OptimizeSummary {
                entry_count: 0,
                lane_count: 0,
                peak_overlap: 0,
                clamped_count: 0,
                extra_lanes: Vec::new(),
            });
        }

        let peak_overlap = lanes::peak_overlap(&self.entries);
        let assignment = lanes::assign_lanes(&self.entries)?;
        let lane_count = assignment.lane_count;
        let clamped_count = assignment.clamped.len();
        self.entries = assignment.into_entries();
        let extra_lanes = self.roster.register_lane_count(lane_count).to_vec();

        info!(
            entries = self.entries.len(),
            lanes = lane_count,
            clamped = clamped_count,
            "optimized lane assignment"
        );
        Ok(OptimizeSummary {
            entry_count: self.entries.len(),
            lane_count,
            peak_overlap,
            clamped_count,
            extra_lanes,
        })
    }

    /// Replace the entries with rows pasted back from the timeline.
    ///
    /// Rows on lanes that are not currently visible are dropped.
    pub fn apply_paste(&mut self, payload: &str) -> Result<PasteSummary, BoardError> {
        let pasted = parse_paste_payload(payload)?;
        validate_entries(&pasted)?;
        let lanes = self.visible_lanes();
        let received = pasted.len();

        let mut dropped_resources = Vec::new();
        let mut kept = Vec::with_capacity(received);
        for entry in pasted {
            if lanes.contains(&entry.resource) {
                kept.push(entry);
            } else {
                warn!(resource = %entry.resource, "dropping pasted row on a hidden lane");
                dropped_resources.push(entry.resource);
            }
        }

        self.entries = kept;
        Ok(PasteSummary {
            received,
            kept: self.entries.len(),
            dropped_resources,
        })
    }

    /// All entries ordered by the position of their lane in the visible
    /// lane list; entries on unknown lanes go last.
    pub fn export_rows(&self) -> Vec<ScheduleEntry> {
        let lanes = self.visible_lanes();
        let mut rows = self.entries.clone();
        rows.sort_by_key(|entry| {
            lanes
                .iter()
                .position(|lane| *lane == entry.resource)
                .unwrap_or(usize::MAX)
        });
        rows
    }

    pub fn timeline(&self) -> TimelineView {
        build_timeline(&self.cycle, &self.visible_lanes(), &self.entries)
    }

    /// Tabular view of the entries with day tokens instead of instants.
    pub fn dataframe(&self) -> PolarsResult<DataFrame> {
        let idx: Vec<u32> = (0..self.entries.len() as u32).collect();
        let resources: Vec<&str> = self.entries.iter().map(|e| e.resource.as_str()).collect();
        let start_tokens: Vec<String> = self
            .entries
            .iter()
            .map(|e| e.start_token(&self.cycle))
            .collect();
        let end_tokens: Vec<String> = self
            .entries
            .iter()
            .map(|e| e.end_token(&self.cycle))
            .collect();
        let labels: Vec<&str> = self.entries.iter().map(|e| e.label.as_str()).collect();
        let colors: Vec<&str> = self.entries.iter().map(|e| e.color.as_str()).collect();

        let start_refs: Vec<&str> = start_tokens.iter().map(String::as_str).collect();
        let end_refs: Vec<&str> = end_tokens.iter().map(String::as_str).collect();

        let columns: Vec<Column> = vec![
            Series::new(PlSmallStr::from_static("idx"), idx).into_column(),
            Series::new(PlSmallStr::from_static("Resource"), resources).into_column(),
            Series::new(PlSmallStr::from_static("Start_D"), start_refs).into_column(),
            Series::new(PlSmallStr::from_static("End_D"), end_refs).into_column(),
            Series::new(PlSmallStr::from_static("Label"), labels).into_column(),
            Series::new(PlSmallStr::from_static("Color"), colors).into_column(),
        ];
        DataFrame::new(columns)
    }
}
