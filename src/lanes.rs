//! Greedy interval partitioning of schedule entries into lanes.

use crate::entry::ScheduleEntry;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Upper bound on the entries a single optimization run accepts.
pub const MAX_ENTRIES: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaneError {
    #[error("cannot assign {count} entries: the limit is {limit}")]
    TooManyEntries { count: usize, limit: usize },
}

/// Resource identifier for a 1-based lane index.
pub fn lane_name(lane: usize) -> String {
    format!("#{lane}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedEntry {
    /// Position of the entry in the input slice.
    pub source_index: usize,
    /// 1-based lane index.
    pub lane: usize,
    pub entry: ScheduleEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneAssignment {
    /// Entries in processing order, ascending by `(start, end)`.
    pub entries: Vec<AssignedEntry>,
    pub lane_count: usize,
    /// Source indices of entries whose end preceded their start.
    pub clamped: Vec<usize>,
}

impl LaneAssignment {
    pub fn lane_of(&self, source_index: usize) -> Option<usize> {
        self.entries
            .iter()
            .find(|assigned| assigned.source_index == source_index)
            .map(|assigned| assigned.lane)
    }

    pub fn into_entries(self) -> Vec<ScheduleEntry> {
        self.entries.into_iter().map(|a| a.entry).collect()
    }
}

/// Assign every entry to the first lane whose last end is at or before the
/// entry's start, opening a new lane when none qualifies.
///
/// Entries are visited by `(start, end)` with ties kept in input order, and
/// lanes are scanned by index. An inverted entry is treated as zero-length at
/// its start for ordering and lane bookkeeping; its stored end is untouched.
pub fn assign_lanes(entries: &[ScheduleEntry]) -> Result<LaneAssignment, LaneError> {
    if entries.len() > MAX_ENTRIES {
        return Err(LaneError::TooManyEntries {
            count: entries.len(),
            limit: MAX_ENTRIES,
        });
    }

    let mut clamped = Vec::new();
    let mut order: Vec<(usize, NaiveDateTime, NaiveDateTime)> = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            if entry.is_inverted() {
                warn!(
                    index = idx,
                    start = %entry.start,
                    end = %entry.end,
                    "entry ends before it starts; treating it as zero-length"
                );
                clamped.push(idx);
            }
            (idx, entry.start, effective_end(entry))
        })
        .collect();
    order.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.2.cmp(&b.2)));

    let mut lane_ends: Vec<NaiveDateTime> = Vec::new();
    let mut assigned = Vec::with_capacity(order.len());
    for (source_index, start, end) in order {
        let lane_idx = match lane_ends.iter().position(|&last_end| start >= last_end) {
            Some(idx) => {
                lane_ends[idx] = end;
                idx
            }
            None => {
                lane_ends.push(end);
                lane_ends.len() - 1
            }
        };

        let lane = lane_idx + 1;
        let mut entry = entries[source_index].clone();
        entry.resource = lane_name(lane);
        assigned.push(AssignedEntry {
            source_index,
            lane,
            entry,
        });
    }

    Ok(LaneAssignment {
        entries: assigned,
        lane_count: lane_ends.len(),
        clamped,
    })
}

/// Largest number of entries open at any single instant.
///
/// This is the lower bound on lanes, and [`assign_lanes`] always meets it.
pub fn peak_overlap(entries: &[ScheduleEntry]) -> usize {
    let mut events: Vec<(NaiveDateTime, SweepEvent)> = Vec::with_capacity(entries.len() * 2);
    for entry in entries {
        let end = effective_end(entry);
        if end == entry.start {
            events.push((entry.start, SweepEvent::Point));
        } else {
            events.push((entry.start, SweepEvent::Open));
            events.push((end, SweepEvent::Close));
        }
    }
    events.sort();

    let mut open = 0usize;
    let mut peak = 0usize;
    for (_, event) in events {
        match event {
            SweepEvent::Close => open -= 1,
            SweepEvent::Point => peak = peak.max(open + 1),
            SweepEvent::Open => {
                open += 1;
                peak = peak.max(open);
            }
        }
    }
    peak
}

// At equal instants: closes, then zero-length entries, then opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SweepEvent {
    Close,
    Point,
    Open,
}

fn effective_end(entry: &ScheduleEntry) -> NaiveDateTime {
    entry.end.max(entry.start)
}
