use super::{PersistenceError, PersistenceResult};
use crate::{
    BoardMetadata, RotationBoard, ScheduleEntry,
    cycle::TimeCycle,
    entry::{EntryRecord, validate_entries},
    resource::LaneRoster,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

const REQUIRED_COLUMNS: [&str; 2] = ["Start_D", "End_D"];
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Serialize, Deserialize)]
struct BoardSnapshot {
    metadata: BoardMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    roster: Option<LaneRoster>,
    entries: Vec<ScheduleEntry>,
}

impl BoardSnapshot {
    fn from_board(board: &RotationBoard) -> PersistenceResult<Self> {
        validate_entries(board.entries())?;
        Ok(Self {
            metadata: board.metadata().clone(),
            roster: Some(board.roster().clone()),
            entries: board.entries().to_vec(),
        })
    }

    fn into_board(self) -> PersistenceResult<RotationBoard> {
        let roster = self
            .roster
            .unwrap_or_else(|| LaneRoster::new(self.metadata.base_lane_count));
        RotationBoard::from_parts(self.metadata, roster, self.entries)
    }
}

pub fn save_board_to_json<P: AsRef<Path>>(board: &RotationBoard, path: P) -> PersistenceResult<()> {
    let snapshot = BoardSnapshot::from_board(board)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_board_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<RotationBoard> {
    let file = File::open(path)?;
    let snapshot: BoardSnapshot = serde_json::from_reader(file)?;
    snapshot.into_board()
}

#[derive(Serialize)]
struct ExportRecord<'a> {
    #[serde(rename = "Resource")]
    resource: &'a str,
    #[serde(rename = "Start_D")]
    start_d: String,
    #[serde(rename = "End_D")]
    end_d: String,
    #[serde(rename = "Label")]
    label: &'a str,
    #[serde(rename = "Color")]
    color: &'a str,
    #[serde(rename = "Start")]
    start: String,
    #[serde(rename = "End")]
    end: String,
}

impl<'a> ExportRecord<'a> {
    fn new(entry: &'a ScheduleEntry, cycle: &TimeCycle) -> Self {
        Self {
            resource: &entry.resource,
            start_d: entry.start_token(cycle),
            end_d: entry.end_token(cycle),
            label: &entry.label,
            color: &entry.color,
            start: entry.start.format(ISO_FORMAT).to_string(),
            end: entry.end.format(ISO_FORMAT).to_string(),
        }
    }
}

/// Write every entry as a row, ordered by lane.
pub fn write_board_csv<W: Write>(board: &RotationBoard, writer: W) -> PersistenceResult<()> {
    let cycle = board.cycle();
    let mut writer = csv::Writer::from_writer(writer);
    let rows = board.export_rows();
    for entry in &rows {
        writer.serialize(ExportRecord::new(entry, &cycle))?;
    }
    writer.flush()?;
    info!(rows = rows.len(), "exported schedule rows");
    Ok(())
}

pub fn save_board_to_csv<P: AsRef<Path>>(board: &RotationBoard, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    write_board_csv(board, file)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub entries: Vec<ScheduleEntry>,
    /// Zero-based data rows with at least one day token that fell back to
    /// the cycle base.
    pub fallback_rows: Vec<usize>,
}

/// Read uploaded rows. `Start_D` and `End_D` columns are required; the rest
/// default when absent.
pub fn read_entries_csv<R: Read>(reader: R, cycle: &TimeCycle) -> PersistenceResult<ImportReport> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(PersistenceError::InvalidData(format!(
                "missing required column '{required}'"
            )));
        }
    }

    let mut report = ImportReport::default();
    for (row, record) in reader.deserialize::<EntryRecord>().enumerate() {
        let (entry, fallbacks) = record?.decode(cycle);
        if fallbacks.any() {
            warn!(
                row,
                start = fallbacks.start,
                end = fallbacks.end,
                "unreadable day token, using cycle base"
            );
            report.fallback_rows.push(row);
        }
        report.entries.push(entry);
    }
    info!(
        rows = report.entries.len(),
        fallbacks = report.fallback_rows.len(),
        "imported schedule rows"
    );
    Ok(report)
}

pub fn load_board_from_csv<P: AsRef<Path>>(
    path: P,
    metadata: BoardMetadata,
) -> PersistenceResult<RotationBoard> {
    let file = File::open(path)?;
    let report = read_entries_csv(file, &metadata.cycle())?;
    let roster = LaneRoster::new(metadata.base_lane_count);
    RotationBoard::from_parts(metadata, roster, report.entries)
}
