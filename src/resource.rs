use crate::entry::ScheduleEntry;
use crate::lanes::lane_name;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Lanes every board shows before any optimization.
pub const BASE_LANE_COUNT: usize = 8;

/// Largest base lane count a board may be configured with.
pub const MAX_BASE_LANES: usize = 1_000;

/// One chunk of a natural sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NaturalChunk {
    Text(String),
    /// Digit run with leading zeros stripped, compared by numeric value.
    Number(String),
}

impl Ord for NaturalChunk {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (NaturalChunk::Text(a), NaturalChunk::Text(b)) => a.cmp(b),
            (NaturalChunk::Number(a), NaturalChunk::Number(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (NaturalChunk::Text(_), NaturalChunk::Number(_)) => Ordering::Less,
            (NaturalChunk::Number(_), NaturalChunk::Text(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for NaturalChunk {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Split into alternating lowercase text and numeric chunks.
///
/// The key always starts and ends with a (possibly empty) text chunk, so two
/// keys line up chunk-for-chunk: `"#10"` becomes `["#", 10, ""]`.
pub fn natural_key(s: &str) -> Vec<NaturalChunk> {
    let mut key = Vec::new();
    let mut text = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            key.push(NaturalChunk::Text(std::mem::take(&mut text).to_lowercase()));
            let mut digits = String::from(c);
            while let Some(&next) = chars.peek() {
                if !next.is_ascii_digit() {
                    break;
                }
                digits.push(next);
                chars.next();
            }
            let trimmed = digits.trim_start_matches('0');
            key.push(NaturalChunk::Number(trimmed.to_string()));
        } else {
            text.push(c);
        }
    }
    key.push(NaturalChunk::Text(text.to_lowercase()));
    key
}

/// Numeric-aware ordering: `"#2" < "#10"`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a)
        .cmp(&natural_key(b))
        .then_with(|| a.cmp(b))
}

/// Which lanes are shown, beyond the ones entries already occupy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneRoster {
    base_lane_count: usize,
    custom: Vec<String>,
    deleted: Vec<String>,
}

impl Default for LaneRoster {
    fn default() -> Self {
        Self::new(BASE_LANE_COUNT)
    }
}

impl LaneRoster {
    pub fn new(base_lane_count: usize) -> Self {
        Self {
            base_lane_count,
            custom: Vec::new(),
            deleted: Vec::new(),
        }
    }

    pub fn base_lane_count(&self) -> usize {
        self.base_lane_count
    }

    pub fn set_base_lane_count(&mut self, count: usize) {
        self.base_lane_count = count;
    }

    pub fn custom(&self) -> &[String] {
        &self.custom
    }

    pub fn deleted(&self) -> &[String] {
        &self.deleted
    }

    pub fn base_lanes(&self) -> Vec<String> {
        (1..=self.base_lane_count).map(lane_name).collect()
    }

    /// Base, occupied and custom lanes minus deleted ones, in natural order.
    pub fn visible_lanes(&self, entries: &[ScheduleEntry]) -> Vec<String> {
        let candidates: BTreeSet<String> = self
            .base_lanes()
            .into_iter()
            .chain(entries.iter().map(|e| e.resource.clone()))
            .chain(self.custom.iter().cloned())
            .collect();

        let mut lanes: Vec<String> = candidates
            .into_iter()
            .filter(|lane| !self.deleted.contains(lane))
            .collect();
        lanes.sort_by(|a, b| natural_cmp(a, b));
        lanes
    }

    /// Returns false when the name is blank or the lane was already custom
    /// and visible.
    pub fn add_lane(&mut self, name: &str) -> bool {
        if name.trim().is_empty() {
            return false;
        }
        let mut changed = false;
        if !self.custom.iter().any(|lane| lane == name) {
            self.custom.push(name.to_string());
            changed = true;
        }
        if let Some(pos) = self.deleted.iter().position(|lane| lane == name) {
            self.deleted.remove(pos);
            changed = true;
        }
        changed
    }

    pub fn remove_lane(&mut self, name: &str) {
        if !self.deleted.iter().any(|lane| lane == name) {
            self.deleted.push(name.to_string());
        }
        self.custom.retain(|lane| lane != name);
    }

    /// Reset after an optimization run produced `lane_count` lanes.
    ///
    /// Lanes past the base set become the custom list, replacing whatever was
    /// there, and every deleted marker is cleared.
    pub fn register_lane_count(&mut self, lane_count: usize) -> &[String] {
        self.custom = (self.base_lane_count.saturating_add(1)..=lane_count)
            .map(lane_name)
            .collect();
        self.deleted.clear();
        &self.custom
    }
}
