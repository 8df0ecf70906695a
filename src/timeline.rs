//! Data handed to the timeline widget: one group per lane, one item per entry.

use crate::cycle::TimeCycle;
use crate::entry::ScheduleEntry;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineGroup {
    pub id: String,
    pub content: String,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineItem {
    /// Index of the entry on the board.
    pub id: usize,
    pub group: String,
    pub content: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineView {
    pub window_start: NaiveDateTime,
    pub window_end: NaiveDateTime,
    pub groups: Vec<TimelineGroup>,
    pub items: Vec<TimelineItem>,
}

pub fn item_style(color: &str) -> String {
    format!("background-color: {color}; border-color: black;")
}

/// Entries on lanes outside `lanes` are left off the timeline.
pub fn build_timeline(
    cycle: &TimeCycle,
    lanes: &[String],
    entries: &[ScheduleEntry],
) -> TimelineView {
    let groups = lanes
        .iter()
        .enumerate()
        .map(|(order, lane)| TimelineGroup {
            id: lane.clone(),
            content: lane.clone(),
            order,
        })
        .collect();

    let items = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| lanes.contains(&entry.resource))
        .map(|(id, entry)| TimelineItem {
            id,
            group: entry.resource.clone(),
            content: entry.label.clone(),
            start: entry.start,
            end: entry.end,
            style: item_style(&entry.color),
        })
        .collect();

    TimelineView {
        window_start: cycle.base(),
        window_end: cycle.end(),
        groups,
        items,
    }
}
